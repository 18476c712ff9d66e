//! Block source adapters

pub mod memory;
pub mod rpc;
mod wire;
