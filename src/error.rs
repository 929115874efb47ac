//! Error types for account validation and bank registry construction.
//!
//! Validation failures are ordinary outcomes and carry enough detail to tell
//! a user what is wrong with the number. Registry failures are split into the
//! three ways building a registry can go wrong: the network, the local
//! filesystem, or the bank table itself.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Reasons an account number fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The input string was empty.
    Empty,

    /// The input contained no digits at all.
    NoDigits,

    /// The number does not have exactly 11 digits.
    WrongLength {
        /// The number of digits found after stripping separators.
        length: usize,
        /// The required number of digits (11).
        expected: usize,
    },

    /// The payload digits give remainder 1, for which no check digit exists.
    NoValidCheckDigit,

    /// The declared check digit does not match the computed one.
    InvalidChecksum {
        /// The check digit computed from the first 10 digits.
        expected: u8,
        /// The check digit present in the input.
        found: u8,
    },

    /// The checksum is valid but the prefix does not belong to a known bank.
    UnknownBankPrefix {
        /// The 4-digit prefix that failed to resolve.
        prefix: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "account number is empty"),

            Self::NoDigits => write!(f, "account number contains no digits"),

            Self::WrongLength { length, expected } => {
                write!(
                    f,
                    "account number must have {} digits, got {}",
                    expected, length
                )
            }

            Self::NoValidCheckDigit => {
                write!(f, "no check digit exists for this account number (remainder 1)")
            }

            Self::InvalidChecksum { expected, found } => {
                write!(
                    f,
                    "invalid check digit: expected {}, found {}",
                    expected, found
                )
            }

            Self::UnknownBankPrefix { prefix } => {
                write!(f, "prefix {} does not belong to a known bank", prefix)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Coarse classification of a [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Remote fetch failed.
    Network,
    /// Local file could not be read or written.
    Io,
    /// Bank table could not be decoded.
    Parse,
}

/// Errors raised while building a bank registry.
#[derive(Debug)]
pub enum RegistryError {
    /// The remote table could not be fetched and no local copy exists.
    Network(String),
    /// A local path could not be read or written.
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// The bank table is not a readable spreadsheet of the expected layout.
    Parse(String),
}

impl RegistryError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Io { .. } => ErrorKind::Io,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {}", msg),
            Self::Io { path, source } => write!(f, "IO error on {}: {}", path.display(), source),
            Self::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<calamine::Error> for RegistryError {
    fn from(err: calamine::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(feature = "source-csv")]
impl From<csv::Error> for RegistryError {
    fn from(err: csv::Error) -> Self {
        Self::Parse(format!("CSV error: {}", err))
    }
}
