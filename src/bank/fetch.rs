//! Keeps the local copy of the bank table fresh.
//!
//! The fetcher never touches the network while the local copy is younger than
//! its TTL. Once it is older, a conditional GET is sent with
//! `If-Modified-Since` set to the file's modification time: a `304` only bumps
//! the modification time, so the TTL starts over without a download; a `200`
//! replaces the file. With no local copy the GET is unconditional.
//!
//! New content is written to a temporary file in the same directory and
//! renamed into place, so readers never see a partial file.

use crate::error::RegistryError;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Raw answer from a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body; empty for error statuses.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// A `200 OK` response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// A `304 Not Modified` response.
    pub fn not_modified() -> Self {
        Self {
            status: 304,
            body: Vec::new(),
        }
    }
}

/// HTTP client used to download the bank table.
///
/// Implementations return any status the server sends as a
/// [`TransportResponse`]; only failures to complete the exchange are errors.
pub trait Transport: Send + Sync {
    /// Performs a GET, optionally conditional on `If-Modified-Since`.
    fn get(
        &self,
        url: &str,
        if_modified_since: Option<&str>,
    ) -> Result<TransportResponse, RegistryError>;
}

/// What [`SourceFetcher::ensure_fresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The local copy was within its TTL; nothing was requested.
    Fresh,
    /// A new copy was downloaded and written.
    Downloaded,
    /// The server answered 304; the modification time was bumped.
    Revalidated,
    /// The server answered 200 with an empty body; the local copy was kept.
    Unchanged,
}

/// Check run on a downloaded body before it may replace the local copy.
pub type BodyCheck<'a> = &'a dyn Fn(&[u8]) -> Result<(), RegistryError>;

/// Refreshes the local copy of the bank table.
pub struct SourceFetcher<'a> {
    transport: &'a dyn Transport,
    check: Option<BodyCheck<'a>>,
}

impl<'a> SourceFetcher<'a> {
    /// Creates a fetcher using the given transport.
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            check: None,
        }
    }

    /// Builder method to vet downloaded bodies.
    ///
    /// A body the check rejects is never written; the error is returned and
    /// the existing local copy stays in place.
    pub fn with_check(mut self, check: BodyCheck<'a>) -> Self {
        self.check = Some(check);
        self
    }

    /// Makes sure `local_path` holds a copy of `url` no older than `ttl`.
    ///
    /// # Errors
    ///
    /// `Io` if the local file cannot be inspected or written, `Network` if
    /// the request fails or the server answers with an unusable status, or
    /// whatever the body check returns for a rejected download.
    pub fn ensure_fresh(
        &self,
        local_path: &Path,
        url: &str,
        ttl: Duration,
    ) -> Result<FetchOutcome, RegistryError> {
        let modified = match fs::metadata(local_path) {
            Ok(meta) => Some(
                meta.modified()
                    .map_err(|e| RegistryError::io(local_path, e))?,
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(RegistryError::io(local_path, e)),
        };

        let if_modified_since = match modified {
            Some(mtime) if age(mtime) < ttl => {
                debug!(path = %local_path.display(), "bank table within TTL, not refreshing");
                return Ok(FetchOutcome::Fresh);
            }
            Some(mtime) => Some(http_date(mtime)),
            None => None,
        };

        debug!(url, if_modified_since = ?if_modified_since, "requesting bank table");
        let response = self.transport.get(url, if_modified_since.as_deref())?;
        let has_local = modified.is_some();

        match response.status {
            200 if !response.body.is_empty() => {
                if let Some(check) = self.check {
                    check(&response.body)?;
                }
                write_atomically(local_path, &response.body)?;
                info!(
                    path = %local_path.display(),
                    bytes = response.body.len(),
                    "downloaded bank table"
                );
                Ok(FetchOutcome::Downloaded)
            }
            200 if has_local => {
                warn!(url, "server sent an empty bank table, keeping local copy");
                Ok(FetchOutcome::Unchanged)
            }
            304 if has_local => {
                touch(local_path)?;
                info!(path = %local_path.display(), "bank table not modified");
                Ok(FetchOutcome::Revalidated)
            }
            200 | 304 => Err(RegistryError::Network(format!(
                "{} returned no content and there is no local copy",
                url
            ))),
            status => Err(RegistryError::Network(format!(
                "{} returned status {}",
                url, status
            ))),
        }
    }
}

/// Formats a time as an HTTP date, e.g. `Tue, 15 Nov 1994 08:12:31 GMT`.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

fn age(modified: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO)
}

fn touch(path: &Path) -> Result<(), RegistryError> {
    fs::File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(SystemTime::now()))
        .map_err(|e| RegistryError::io(path, e))
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), RegistryError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| RegistryError::io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| RegistryError::io(dir, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| RegistryError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| RegistryError::io(path, e.error))?;
    Ok(())
}

/// Blocking HTTP transport backed by `ureq`.
///
/// Requires the `http` feature.
#[cfg(feature = "http")]
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Creates a transport with an overall request timeout and a body size cap.
    pub fn new(timeout: Duration, max_body_bytes: u64) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            max_body_bytes,
        }
    }
}

#[cfg(feature = "http")]
impl Transport for HttpTransport {
    fn get(
        &self,
        url: &str,
        if_modified_since: Option<&str>,
    ) -> Result<TransportResponse, RegistryError> {
        let mut request = self.agent.get(url);
        if let Some(since) = if_modified_since {
            request = request.set("If-Modified-Since", since);
        }

        match request.call() {
            Ok(response) => {
                let status = response.status();
                let body = read_capped(response.into_reader(), self.max_body_bytes, url)?;
                Ok(TransportResponse { status, body })
            }
            Err(ureq::Error::Status(status, _)) => Ok(TransportResponse {
                status,
                body: Vec::new(),
            }),
            Err(e) => Err(RegistryError::Network(e.to_string())),
        }
    }
}

/// Reads a response body, failing if it is longer than `limit` bytes.
#[cfg(feature = "http")]
fn read_capped<R: io::Read>(reader: R, limit: u64, url: &str) -> Result<Vec<u8>, RegistryError> {
    use std::io::Read;

    let mut body = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|e| RegistryError::Network(format!("reading {}: {}", url, e)))?;

    if body.len() as u64 > limit {
        return Err(RegistryError::Network(format!(
            "{} body exceeds {} bytes",
            url, limit
        )));
    }
    Ok(body)
}
