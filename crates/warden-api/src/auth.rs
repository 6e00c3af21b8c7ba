//! Shared-secret authorization with a one-time bootstrap.
//!
//! The gate starts uninitialized unless a non-empty key file exists. While
//! uninitialized every endpoint is open. [`AuthGate::initialize`] moves it
//! to initialized exactly once, after which gated endpoints require the
//! secret in the `X-Auth-Key` header or the `warden_key` cookie.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the secret.
pub const AUTH_HEADER: &str = "x-auth-key";
/// Cookie carrying the secret.
pub const AUTH_COOKIE: &str = "warden_key";
/// Shortest caller-supplied secret accepted by [`AuthGate::initialize`].
pub const MIN_KEY_LENGTH: usize = 8;

/// Holds the secret and the path it is persisted to.
#[derive(Debug)]
pub struct AuthGate {
    key: RwLock<Option<String>>,
    key_file: PathBuf,
}

impl AuthGate {
    /// Read `key_file` if present. A missing, empty, or unreadable file
    /// leaves the gate uninitialized.
    pub fn load(key_file: impl Into<PathBuf>) -> Self {
        let key_file = key_file.into();
        let key = match std::fs::read_to_string(&key_file) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    info!(path = %key_file.display(), "Loaded API key");
                    Some(trimmed.to_owned())
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %key_file.display(), error = %err, "Could not read API key file");
                None
            }
        };
        Self {
            key: RwLock::new(key),
            key_file,
        }
    }

    /// Where the secret is persisted.
    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    /// Whether a secret has been established.
    pub fn is_initialized(&self) -> bool {
        self.key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Establish the secret. A supplied key is trimmed and must be at least
    /// [`MIN_KEY_LENGTH`] characters; without one, 32 random bytes are
    /// generated and rendered as lowercase hex. Returns the secret.
    pub fn initialize(&self, requested: Option<&str>) -> Result<String, ApiError> {
        let mut slot = self.key.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(ApiError::AlreadyInitialized);
        }

        let key = match requested.map(str::trim).filter(|k| !k.is_empty()) {
            Some(supplied) if supplied.chars().count() < MIN_KEY_LENGTH => {
                return Err(ApiError::KeyTooShort);
            }
            Some(supplied) => supplied.to_owned(),
            None => hex::encode(rand::random::<[u8; 32]>()),
        };

        std::fs::write(&self.key_file, &key).map_err(|e| {
            warn!(path = %self.key_file.display(), error = %e, "Could not write API key file");
            ApiError::Internal(format!("could not persist key: {e}"))
        })?;

        *slot = Some(key.clone());
        info!(path = %self.key_file.display(), "API key initialized");
        Ok(key)
    }

    /// Whether a request may reach a gated endpoint. Always true while
    /// uninitialized.
    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let slot = self.key.read().unwrap_or_else(PoisonError::into_inner);
        let Some(expected) = slot.as_deref() else {
            return true;
        };

        let from_header = headers
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| key_matches(v, expected));
        from_header
            || cookie_value(headers, AUTH_COOKIE).is_some_and(|v| key_matches(v, expected))
    }
}

/// Compare a presented secret without short-circuiting on the first
/// differing byte.
fn key_matches(presented: &str, expected: &str) -> bool {
    bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Middleware rejecting unauthorized requests with 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.auth.is_authorized(request.headers()) {
        Ok(next.run(request).await)
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn gate() -> (tempfile::TempDir, AuthGate) {
        let dir = tempfile::tempdir().unwrap();
        let gate = AuthGate::load(dir.path().join("key.txt"));
        (dir, gate)
    }

    #[test]
    fn missing_file_is_uninitialized_and_open() {
        let (_dir, gate) = gate();
        assert!(!gate.is_initialized());
        assert!(gate.is_authorized(&HeaderMap::new()));
    }

    #[test]
    fn generated_key_is_64_hex_and_persisted() {
        let (_dir, gate) = gate();
        let key = gate.initialize(None).unwrap();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(std::fs::read_to_string(gate.key_file()).unwrap(), key);
        assert!(gate.is_initialized());
    }

    #[test]
    fn supplied_key_is_trimmed_and_checked() {
        let (_dir, gate) = gate();
        assert!(matches!(gate.initialize(Some("short")), Err(ApiError::KeyTooShort)));
        assert!(!gate.is_initialized());
        assert_eq!(gate.initialize(Some("  longenough  ")).unwrap(), "longenough");
        assert!(matches!(
            gate.initialize(Some("anotherkey")),
            Err(ApiError::AlreadyInitialized)
        ));
    }

    #[test]
    fn existing_file_means_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.txt");
        std::fs::write(&path, "secretkey1\n").unwrap();
        let gate = AuthGate::load(&path);
        assert!(gate.is_initialized());

        let mut headers = HeaderMap::new();
        assert!(!gate.is_authorized(&headers));
        headers.insert(AUTH_HEADER, HeaderValue::from_static("secretkey1"));
        assert!(gate.is_authorized(&headers));
    }

    #[test]
    fn blank_file_is_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.txt");
        std::fs::write(&path, "  \n").unwrap();
        assert!(!AuthGate::load(&path).is_initialized());
    }

    #[test]
    fn cookie_is_accepted_and_match_is_exact() {
        let (_dir, gate) = gate();
        gate.initialize(Some("cookiekey")).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; warden_key=cookiekey"));
        assert!(gate.is_authorized(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("warden_key=cookiekey2"));
        assert!(!gate.is_authorized(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, HeaderValue::from_static("COOKIEKEY"));
        assert!(!gate.is_authorized(&headers));
    }

    #[test]
    fn key_comparison_is_exact() {
        assert!(key_matches("cookiekey", "cookiekey"));
        assert!(!key_matches("cookiekez", "cookiekey"));
        assert!(!key_matches("cookie", "cookiekey"));
        assert!(!key_matches("", "cookiekey"));
    }

    #[test]
    fn unwritable_key_file_stays_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let gate = AuthGate::load(dir.path().join("missing").join("key.txt"));
        assert!(matches!(gate.initialize(None), Err(ApiError::Internal(_))));
        assert!(!gate.is_initialized());
    }
}
