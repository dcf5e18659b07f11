pub mod http;
pub mod trace_id;

pub use http::{add_response_time_header, add_security_headers, request_log};
pub use trace_id::{trace_id_middleware, TraceId, Traced};
