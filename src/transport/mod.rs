// Setrans: Transport Module
//
// Owns the single Unix domain socket to mcstransd and moves raw bytes over
// it. No framing or protocol knowledge lives here.

mod uds;

pub use uds::{Interrupt, UdsTransport};
