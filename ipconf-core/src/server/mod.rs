mod gateway;
pub mod handler;
mod setup;


pub use gateway::IpConfGateway;
pub use setup::{ControlPlane, build_pingora_server, run, start_control_plane};
