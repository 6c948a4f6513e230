pub mod cli;
pub mod conf;
pub mod discovery;
pub mod dispatch;
pub mod logging;
pub mod server;
pub mod source;
