//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: the explicit session value (`Session`, `AuthState`)
//! - `credentials`: client-side registration checks
//! - `repository`: persistence seam for the bearer token

mod credentials;
mod model;
mod repository;

pub use credentials::{MIN_PASSWORD_LEN, is_valid_email, validate_registration};
pub use model::{AuthState, Session};
pub use repository::TokenRepository;
