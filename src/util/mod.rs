//! Utility functions shared across the crate.
//!
//! - **Validation**: presence, username, password and email rules for forms
//! - **URL validation**: the content API base URL policy
//! - **Text**: Unicode-aware truncation and control-character stripping
//!   for terminal tables

mod text;
mod url_validator;
mod validate;

pub use text::{display_width, strip_control_chars, table_cell, truncate_to_width};
pub use url_validator::{validate_api_url, UrlValidationError};
pub use validate::{
    require, validate_email, validate_new_password, validate_username, ValidationError,
    MIN_PASSWORD_LEN, MIN_USERNAME_LEN,
};
