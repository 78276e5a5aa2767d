//! Simulated network between the peers and the relay.
//!
//! Each direction of each peer's connection is a [`DelayedLink`] with its own
//! latency. Links are FIFO, so a peer always sees the relay's messages in the
//! order the relay sent them.

mod link;
mod protocol;

pub use link::{DelayedLink, InFlight};
pub use protocol::{Downlink, Uplink};
