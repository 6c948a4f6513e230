mod ctx;
mod endpoint;
mod ranking;
mod registry;
mod stat;
mod window;

#[cfg(test)]
mod tests;

pub use ctx::*;
pub use endpoint::*;
pub use ranking::*;
pub use registry::*;
pub use stat::*;
pub use window::*;
