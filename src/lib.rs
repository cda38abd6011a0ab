// Setrans: Library root
//
// Client for mcstransd, the daemon that translates between raw and
// human-readable security contexts over a local Unix domain socket.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
#[cfg(all(feature = "selinux", unix))]
pub mod transport;
pub mod wire;

pub use client::{Client, ENABLED};
pub use config::ClientConfig;
pub use error::{Result, SetransError};
pub use wire::RequestKind;
