//! HTTP transport for the Chemviz client.
//!
//! [`HttpEquipmentApi`] implements [`chemviz_core::api::EquipmentApi`] on top
//! of reqwest. It holds no session state; the bearer token is passed per call.

pub mod dto;
pub mod http_api;

pub use http_api::HttpEquipmentApi;
