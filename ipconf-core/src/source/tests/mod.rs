mod bridge;
mod debug;
