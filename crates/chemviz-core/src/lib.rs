//! Domain core for the Chemviz client.
//!
//! Holds the state the dashboard keeps consistent (session, upload history,
//! selection) and the pure projection derived from it. Network and storage
//! are reached only through the [`api::EquipmentApi`] and
//! [`session::TokenRepository`] seams.

pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod projection;
pub mod sequence;
pub mod session;
pub mod upload;

// Re-export common error type
pub use error::{ChemvizError, ValidationError};
