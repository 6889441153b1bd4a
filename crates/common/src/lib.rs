//! Error helpers shared by the arbor crates.

pub mod error;

pub use error::FromMessage;
