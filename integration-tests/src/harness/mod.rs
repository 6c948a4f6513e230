pub mod server;
pub mod tracing;

pub use server::{SERVICE_PATH, TestServer};
pub use tracing::{CapturedEvent, init_test_tracing};
