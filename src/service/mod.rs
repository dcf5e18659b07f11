pub mod balance_loader;
pub mod fee_estimator;
pub mod network_sync;
pub mod swap_console;
pub mod swap_executor;
pub mod wallet_session;

pub use swap_console::{ConsoleSnapshot, SwapConsole};
