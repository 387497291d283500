//! Remote content API: typed REST calls with bearer-token handling.

mod client;
mod tokens;

pub use client::{ApiClient, ApiError};
pub use tokens::TokenStore;
