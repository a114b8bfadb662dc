//! Message types exchanged with the network actor.

pub mod network;

pub use network::{NetworkCommand, NetworkResponse};
