//! Moniker resolution domain

pub mod book;
pub mod resolve;
