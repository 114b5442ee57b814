//! Application layer for Chemviz.
//!
//! This crate provides the dashboard controller that coordinates the session,
//! the upload history and the transport in response to user actions.

pub mod dashboard;
pub mod notice;


pub use dashboard::{DashboardController, FetchOrigin, HistoryRequest, UploadRequest};
pub use notice::{Notice, NoticeLevel};
