mod bridge;
mod debug;
mod event;

#[cfg(test)]
mod tests;

pub use bridge::*;
pub use debug::*;
pub use event::*;
