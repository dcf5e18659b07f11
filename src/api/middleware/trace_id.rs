//! Trace ID 中间件
//! 为每个请求生成或透传 trace_id，写入请求扩展和响应头

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

use crate::error::AppError;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// 请求扩展中的 trace_id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// 优先使用请求头中的值
    pub fn from_request(req: &Request) -> Self {
        req.headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(Self::generate)
    }
}

pub async fn trace_id_middleware(mut req: Request, next: Next) -> Response {
    let trace_id = TraceId::from_request(&req);
    req.extensions_mut().insert(trace_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&trace_id.0) {
        response.headers_mut().insert(TRACE_ID_HEADER, header_value);
    }

    response
}

/// 给错误附上 trace_id
pub trait Traced<T> {
    fn traced(self, trace_id: &TraceId) -> Result<T, AppError>;
}

impl<T> Traced<T> for Result<T, AppError> {
    fn traced(self, trace_id: &TraceId) -> Result<T, AppError> {
        self.map_err(|e| e.with_trace_id(trace_id.0.clone()))
    }
}
