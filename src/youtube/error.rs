// src/youtube/error.rs
use serde::Deserialize;
use thiserror::Error;

/// Failure of one upstream call, classified so callers can tell
/// "fix your key/quota" apart from "try again later".
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream rejected the API key: {0}")]
    Auth(String),
    #[error("upstream quota exhausted: {0}")]
    QuotaExceeded(String),
    #[error("comments are disabled: {0}")]
    CommentsDisabled(String),
    #[error("upstream resource not found: {0}")]
    NotFound(String),
    #[error("upstream unavailable: {0}")]
    Transient(String),
    #[error("unexpected upstream payload: {0}")]
    Decode(String),
    #[error("upstream rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

// Google API error envelope: {"error": {"code", "message", "errors": [{"reason"}]}}
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    error: EnvelopeBody,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<EnvelopeReason>,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeReason {
    #[serde(default)]
    reason: String,
}

impl UpstreamError {
    /// Classify a non-2xx upstream response by status and the `reason` of its error body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let env: Envelope = serde_json::from_str(body).unwrap_or_default();
        let reason = env
            .error
            .errors
            .first()
            .map(|r| r.reason.as_str())
            .unwrap_or("");
        let message = if env.error.message.is_empty() {
            format!("HTTP {status}")
        } else {
            env.error.message.clone()
        };

        match (status, reason) {
            (_, "commentsDisabled") => UpstreamError::CommentsDisabled(message),
            (_, "quotaExceeded" | "dailyLimitExceeded" | "rateLimitExceeded") => {
                UpstreamError::QuotaExceeded(message)
            }
            (429, _) => UpstreamError::QuotaExceeded(message),
            (_, "keyInvalid" | "keyExpired" | "accessNotConfigured" | "ipRefererBlocked") => {
                UpstreamError::Auth(message)
            }
            (401 | 403, _) => UpstreamError::Auth(message),
            (404, _) | (_, "videoNotFound") => UpstreamError::NotFound(message),
            (500..=599, _) => UpstreamError::Transient(message),
            _ => UpstreamError::Rejected { status, message },
        }
    }

    /// Short label used for metrics and machine-readable error codes.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Auth(_) => "auth",
            UpstreamError::QuotaExceeded(_) => "quota",
            UpstreamError::CommentsDisabled(_) => "comments_disabled",
            UpstreamError::NotFound(_) => "not_found",
            UpstreamError::Transient(_) => "transient",
            UpstreamError::Decode(_) => "decode",
            UpstreamError::Rejected { .. } => "rejected",
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            UpstreamError::Decode(e.to_string())
        } else {
            // connect / timeout / body read: nothing the caller can fix
            UpstreamError::Transient(e.to_string())
        }
    }
}
