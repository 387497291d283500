//! Admin back-office for a SACCO website.
//!
//! Content (news, FAQs, downloads, gallery, team, feedback) is managed
//! through per-type controllers that persist either to the site's REST
//! API or to a local SQLite key-value store.

pub mod api;
pub mod auth;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod domain;
pub mod notify;
pub mod render;
pub mod repository;
pub mod resource;
pub mod storage;
pub mod util;
