use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors from validating a content API base URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP to a non-local host would leak bearer tokens.
    #[error("Insecure API URL: HTTPS required (except localhost for development)")]
    InsecureScheme,
}

/// Validate the base URL of the content API.
///
/// HTTPS is required because every admin request carries a bearer token.
/// Plain HTTP is accepted only for loopback hosts, where the development
/// server usually runs.
///
/// The returned URL always ends with `/` so endpoint paths can be joined
/// onto it without dropping the last segment.
///
/// ```
/// use sacco_admin::util::validate_api_url;
///
/// let url = validate_api_url("http://localhost:8000/api").unwrap();
/// assert_eq!(url.as_str(), "http://localhost:8000/api/");
///
/// assert!(validate_api_url("http://sacco.example.com/api").is_err());
/// assert!(validate_api_url("https://sacco.example.com/api").is_ok());
/// ```
pub fn validate_api_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "https" => {}
        "http" => {
            if !is_loopback_host(&url) {
                tracing::error!(url = %url, "Rejecting non-HTTPS API URL");
                return Err(UrlValidationError::InsecureScheme);
            }
            tracing::warn!(url = %url, "Using non-HTTPS API URL (localhost only)");
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

fn is_loopback_host(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => {
            let host = host
                .strip_prefix('[')
                .and_then(|h| h.strip_suffix(']'))
                .unwrap_or(host);
            host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
        }
        None => false,
    }
}
