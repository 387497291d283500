//! Fixed keys for client-local persisted state.

/// Admin username and password digest (JSON object).
pub const CREDENTIALS_KEY: &str = "auth.credentials";
/// `"true"` while an admin session exists.
pub const SESSION_LOGGED_IN_KEY: &str = "session.logged_in";
/// Login time in epoch milliseconds.
pub const SESSION_LOGIN_TIME_KEY: &str = "session.login_time";
pub const ACCESS_TOKEN_KEY: &str = "api.access_token";
pub const REFRESH_TOKEN_KEY: &str = "api.refresh_token";
pub const HERO_IMAGE_KEY: &str = "site.hero_image";

/// Prefix for per-resource local lists: `content.news`, `content.team`, ...
pub const CONTENT_KEY_PREFIX: &str = "content.";
