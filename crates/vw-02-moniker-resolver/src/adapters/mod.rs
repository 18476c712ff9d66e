//! Adapters for the Moniker Resolver ports

pub mod memory;
pub mod rpc;
