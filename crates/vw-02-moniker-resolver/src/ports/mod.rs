//! Ports for the Moniker Resolver

pub mod inbound;
pub mod outbound;
