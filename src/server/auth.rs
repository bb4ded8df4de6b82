//! Static bearer-token authentication.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use tracing::warn;

use super::error::ApiError;

/// Why a request was refused. Never carries the presented credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingHeader,
    Mismatch,
}

impl AuthFailure {
    fn as_str(self) -> &'static str {
        match self {
            AuthFailure::MissingHeader => "missing_header",
            AuthFailure::Mismatch => "mismatch",
        }
    }
}

/// Shared-secret check against `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerAuth {
    expected: String,
}

impl BearerAuth {
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            expected: format!("Bearer {}", token.as_ref()),
        }
    }

    /// Compare a raw header value against the expected credential.
    ///
    /// The whole header must match byte for byte: no scheme case folding, no
    /// surrounding whitespace.
    pub fn verify(&self, header: Option<&[u8]>) -> Result<(), AuthFailure> {
        let presented = header.ok_or(AuthFailure::MissingHeader)?;
        if constant_time_eq(presented, self.expected.as_bytes()) {
            Ok(())
        } else {
            Err(AuthFailure::Mismatch)
        }
    }

    /// Check request headers, logging every refused attempt.
    pub fn check(&self, headers: &HeaderMap, request_id: &str) -> Result<(), ApiError> {
        let header = headers.get(AUTHORIZATION).map(|v| v.as_bytes());
        self.verify(header).map_err(|failure| {
            warn!(
                request_id = request_id,
                reason = failure.as_str(),
                "Unauthorized access attempt"
            );
            ApiError::Unauthorized
        })
    }
}

/// Equality whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
