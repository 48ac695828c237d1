//! Error types with fix suggestions (v0.1)

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Failures surfaced by `FetchCache::fetch_shared`.
///
/// Cloneable because one settled request is handed to every coalesced caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("FB-010: Request to '{url}' failed: {reason}")]
    Network {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("FB-011: Provider limit reached for '{url}' ({marker}): {message}")]
    ProviderLimit {
        url: String,
        marker: String,
        message: String,
    },

    #[error("FB-012: Response from '{url}' is not valid JSON: {details}")]
    Parse { url: String, details: String },

    #[error("FB-013: Request to '{url}' was abandoned before it settled")]
    Abandoned { url: String },
}

impl FetchError {
    /// URL the failed request was issued for
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. }
            | Self::ProviderLimit { url, .. }
            | Self::Parse { url, .. }
            | Self::Abandoned { url } => url,
        }
    }

    /// HTTP status when the server answered with a non-2xx code
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_provider_limit(&self) -> bool {
        matches!(self, Self::ProviderLimit { .. })
    }
}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum FinboardError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration (FB-020 to FB-021)
    // ─────────────────────────────────────────────────────────────

    #[error("FB-020: Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("FB-021: Could not build HTTP client: {reason}")]
    HttpClient { reason: String },

    // ─────────────────────────────────────────────────────────────
    // Widget store (FB-030 to FB-033)
    // ─────────────────────────────────────────────────────────────

    #[error("FB-030: Widget '{id}' not found")]
    WidgetNotFound { id: String },

    #[error("FB-031: Invalid widget: {reason}")]
    InvalidWidget { reason: String },

    #[error("FB-032: Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("FB-033: Import rejected, nothing was changed: {reason}")]
    ImportRejected { reason: String },
}

pub type Result<T> = std::result::Result<T, FinboardError>;

impl FixSuggestion for FetchError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            FetchError::Network { status: Some(_), .. } => {
                Some("Check the endpoint URL and any API key embedded in it")
            }
            FetchError::Network { status: None, .. } => {
                Some("Check your network connection, then retry")
            }
            FetchError::ProviderLimit { .. } => {
                Some("The API provider is throttling requests; wait or raise the poll interval")
            }
            FetchError::Parse { .. } => Some("The endpoint must return a JSON document"),
            FetchError::Abandoned { .. } => Some("Retry the request"),
        }
    }
}

impl FixSuggestion for FinboardError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            FinboardError::Fetch(e) => e.fix_suggestion(),
            FinboardError::Io(_) => Some("Check file path and permissions"),
            FinboardError::Json(_) => Some("Ensure the file is valid JSON (try parsing with jq)"),
            FinboardError::ConfigError { .. } => {
                Some("Fix ~/.config/finboard/config.toml or the FINBOARD_* environment variables")
            }
            FinboardError::HttpClient { .. } => Some("Check the [http] section of the config"),
            FinboardError::WidgetNotFound { .. } => Some("Run `finboard list` to see widget ids"),
            FinboardError::InvalidWidget { .. } => {
                Some("Every widget needs an id, a non-empty title and an endpoint")
            }
            FinboardError::InvalidEndpoint { .. } => {
                Some("Use an absolute http:// or https:// URL")
            }
            FinboardError::ImportRejected { .. } => {
                Some("Import a file produced by `finboard export` (a JSON array of widgets)")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_messages_carry_codes() {
        let err = FetchError::ProviderLimit {
            url: "https://x/y".into(),
            marker: "Note".into(),
            message: "rate limit".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("FB-011"));
        assert!(msg.contains("https://x/y"));
        assert!(err.is_provider_limit());
    }

    #[test]
    fn status_only_for_network_errors() {
        let net = FetchError::Network {
            url: "u".into(),
            status: Some(503),
            reason: "HTTP 503".into(),
        };
        let parse = FetchError::Parse {
            url: "u".into(),
            details: "eof".into(),
        };
        assert_eq!(net.status(), Some(503));
        assert_eq!(parse.status(), None);
        assert_eq!(parse.url(), "u");
    }

    #[test]
    fn wrapped_fetch_error_keeps_suggestion() {
        let err: FinboardError = FetchError::Parse {
            url: "u".into(),
            details: "x".into(),
        }
        .into();
        assert_eq!(
            err.fix_suggestion(),
            Some("The endpoint must return a JSON document")
        );
        assert!(err.to_string().starts_with("FB-012"));
    }

    #[test]
    fn every_store_error_has_a_suggestion() {
        let errors = [
            FinboardError::WidgetNotFound { id: "1".into() },
            FinboardError::InvalidWidget { reason: "r".into() },
            FinboardError::ImportRejected { reason: "r".into() },
            FinboardError::InvalidEndpoint {
                url: "x".into(),
                reason: "r".into(),
            },
        ];
        for err in &errors {
            assert!(err.fix_suggestion().is_some(), "{err}");
        }
    }
}
