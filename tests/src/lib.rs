//! # Validator-Watch Test Suite
//!
//! End-to-end flows across subsystem crates, run against in-memory block
//! sources and real SQLite databases.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs          # Shared chain and resolver builders
//! └── integration/
//!     ├── ingest.rs        # Backfill + real-time collector + restart
//!     ├── alerting.rs      # Collector output → missed-block alerts → alert log
//!     └── reporting.rs     # Stored participation → scheduled daily report
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vw-tests
//! cargo test -p vw-tests integration::ingest
//! ```

pub mod fixtures;
pub mod integration;
