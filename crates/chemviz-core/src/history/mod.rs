//! Upload history model.
//!
//! Holds the server's list of past uploads and the single selected upload
//! that drives the dashboard projection.

mod state;

pub use state::HistoryState;
