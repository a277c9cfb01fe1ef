//! The PREDICT client protocol: one UDP datagram per request, answered
//! from the tracker's snapshot table.

mod command;
mod error;
pub mod response;
mod udp;

pub use command::{Command, Request};
pub use error::ServerError;
pub use udp::{ServerContext, UdpServer, DEFAULT_PORT};
