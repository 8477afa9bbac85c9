/*
 * wadboost - Doomworld /idgames archive client and mirror downloader.
 * Copyright (C) 2025  compiledkernel-idk and wadboost contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Error types for archive queries, filtering and transfers.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for wadboost operations
#[derive(Debug, Error)]
pub enum WadboostError {
    /// Network, HTTP or FTP failure, including unreadable response bodies
    #[error("Transport error for {target}: {message}")]
    Transport {
        target: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A record lacks a field a filter or sort needs
    #[error("Malformed record '{record}': missing field '{field}'")]
    MalformedRecord { record: String, field: &'static str },

    /// Filter name not in the dispatch table
    #[error("Unknown filter '{0}'")]
    UnknownFilter(String),

    /// Filter argument could not be parsed for its kind
    #[error("Invalid argument for filter '{kind}': {reason}")]
    InvalidFilterArgument { kind: String, reason: String },

    /// Filename has no level bucket
    #[error("Cannot resolve an archive path for '{0}'")]
    InvalidFilename(String),

    /// Game identifier not known to the archive layout
    #[error("Unknown game '{0}'")]
    UnknownGame(String),

    /// Mirror not in the known set
    #[error("Unsupported mirror '{0}'")]
    UnsupportedMirror(String),

    /// Destination folder is missing and was not to be created
    #[error("Destination folder '{}' does not exist", .path.display())]
    DestinationNotFound { path: PathBuf },

    /// A directory listing did not contain the requested file
    #[error("'{filename}' is not listed under '{dir}'")]
    FileNotListed { filename: String, dir: String },

    /// The API answered with an error or warning marker
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local file system errors
    #[error("File system error for '{path}': {message}")]
    FileSystem {
        path: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Which marker the API put in the response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Error,
    Warning,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Error => write!(f, "error"),
            ApiErrorKind::Warning => write!(f, "warning"),
        }
    }
}

/// An `error` or `warning` returned by the archive API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API {kind}: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// The `type` field of the marker, when the API sends one
    pub category: Option<String>,
    pub message: String,
}

impl ApiError {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Error,
            category: None,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Warning,
            category: None,
            message: message.into(),
        }
    }
}

impl WadboostError {
    /// Create a transport error without an underlying cause
    pub fn transport(target: impl Into<String>, message: impl Into<String>) -> Self {
        WadboostError::Transport {
            target: target.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error wrapping its cause
    pub fn transport_with<E: std::error::Error + Send + Sync + 'static>(
        target: impl Into<String>,
        source: E,
    ) -> Self {
        WadboostError::Transport {
            target: target.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a filesystem error
    pub fn filesystem(path: impl Into<String>, message: impl Into<String>, source: std::io::Error) -> Self {
        WadboostError::FileSystem {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn malformed(record: impl Into<String>, field: &'static str) -> Self {
        WadboostError::MalformedRecord {
            record: record.into(),
            field,
        }
    }

    /// True for failures reported by the remote service itself. Batches
    /// collect these and keep going; everything else aborts.
    pub fn is_remote_marker(&self) -> bool {
        matches!(self, WadboostError::Api(_))
    }
}

impl From<reqwest::Error> for WadboostError {
    fn from(err: reqwest::Error) -> Self {
        let target = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "request".to_string());
        WadboostError::transport_with(target, err)
    }
}

impl From<suppaftp::FtpError> for WadboostError {
    fn from(err: suppaftp::FtpError) -> Self {
        WadboostError::transport_with("ftp", err)
    }
}

impl From<serde_json::Error> for WadboostError {
    fn from(err: serde_json::Error) -> Self {
        WadboostError::transport_with("response body", err)
    }
}

/// Result type alias for wadboost operations
pub type WadboostResult<T> = std::result::Result<T, WadboostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WadboostError::UnknownFilter("colour".to_string());
        assert_eq!(format!("{}", err), "Unknown filter 'colour'");

        let err = WadboostError::malformed("scythe.zip", "rating");
        assert_eq!(
            format!("{}", err),
            "Malformed record 'scythe.zip': missing field 'rating'"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err: WadboostError = ApiError::warning("No files returned").into();
        assert_eq!(format!("{}", err), "API warning: No files returned");
        assert!(err.is_remote_marker());
    }

    #[test]
    fn test_transport_is_not_remote_marker() {
        let err = WadboostError::transport("http://www.gamers.org/pub/", "connection reset");
        assert!(!err.is_remote_marker());
        assert!(format!("{}", err).contains("connection reset"));
    }

    #[test]
    fn test_destination_display() {
        let err = WadboostError::DestinationNotFound {
            path: PathBuf::from("/tmp/nowhere"),
        };
        assert_eq!(format!("{}", err), "Destination folder '/tmp/nowhere' does not exist");
    }
}
