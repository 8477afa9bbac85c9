/*
 * wadboost - Doomworld /idgames archive client and mirror downloader.
 * Copyright (C) 2025  compiledkernel-idk and wadboost contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 */

//! Mirror-aware download manager: single transfers over HTTP or anonymous
//! FTP, and paced sequential batches.

mod engine;
mod mirror;
mod transport;

pub use engine::DownloadEngine;
pub use mirror::{Mirror, MirrorKind};
pub use transport::{fetch_http, http_url, prepare_destination, MirrorTransport, Transport};

use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::error::{ApiError, WadboostResult};
use crate::record::Record;

/// Default pause between batch items. Don't set it much lower, the
/// mirrors are run by volunteers.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Write buffer size for HTTP bodies
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Per-call download settings
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Folder files are written into
    pub dest: PathBuf,
    pub mirror: Mirror,
    /// Create `dest` when missing instead of failing
    pub make_subfolder: bool,
    /// Minimum pause between consecutive batch items
    pub delay: Duration,
    /// Draw a progress bar for HTTP transfers
    pub show_progress: bool,
    /// HTTP request timeout
    pub timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dest: PathBuf::from("."),
            mirror: Mirror::default(),
            make_subfolder: true,
            delay: DEFAULT_DELAY,
            show_progress: false,
            timeout: Duration::from_secs(300),
        }
    }
}

impl DownloadConfig {
    pub fn from_config(config: &Config) -> WadboostResult<Self> {
        Ok(Self {
            dest: config.download.dir.clone(),
            mirror: config.download.mirror.parse()?,
            make_subfolder: config.download.make_subfolder,
            delay: Duration::from_secs(config.download.delay_secs),
            show_progress: config.download.progress,
            timeout: Duration::from_secs(config.download.timeout_secs),
        })
    }
}

/// One file to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadTarget {
    pub filename: String,
    /// Archive directory, with trailing slash
    pub dir: String,
    pub dest: PathBuf,
    pub mirror: Mirror,
    pub make_subfolder: bool,
}

impl DownloadTarget {
    pub fn new(filename: impl Into<String>, dir: impl Into<String>, config: &DownloadConfig) -> Self {
        Self {
            filename: filename.into(),
            dir: dir.into(),
            dest: config.dest.clone(),
            mirror: config.mirror,
            make_subfolder: config.make_subfolder,
        }
    }

    /// Target for a record's `dir` and `filename`
    pub fn from_record(record: &Record, config: &DownloadConfig) -> WadboostResult<Self> {
        Ok(Self::new(
            record.require_filename()?,
            record.require_dir()?,
            config,
        ))
    }

    pub fn with_mirror(mut self, mirror: Mirror) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest = dest.into();
        self
    }

    /// Archive path, the same string `get&file=` takes
    pub fn remote_path(&self) -> String {
        format!("{}{}", self.dir, self.filename)
    }

    /// Where the file lands. Always flat inside `dest`.
    pub fn local_path(&self) -> PathBuf {
        self.dest.join(&self.filename)
    }
}

/// A finished transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub filename: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub mirror: Mirror,
}

/// Result of a batch: what arrived, and the API markers collected on the way
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub downloaded: Vec<TransferOutcome>,
    pub errors: Vec<ApiError>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.downloaded.iter().map(|o| o.bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Action;

    #[test]
    fn test_target_from_record_round_trip() {
        let record = Record {
            id: Some(15156),
            dir: Some("levels/doom2/Ports/megawads/".to_string()),
            filename: Some("av.zip".to_string()),
            ..Default::default()
        };
        let target = DownloadTarget::from_record(&record, &DownloadConfig::default()).unwrap();
        assert_eq!(target.remote_path(), record.remote_path().unwrap());
        assert_eq!(
            Action::GetFile(target.remote_path()).query(),
            Action::GetFile(record.remote_path().unwrap()).query()
        );
    }

    #[test]
    fn test_target_requires_dir() {
        let record = Record {
            filename: Some("av.zip".to_string()),
            ..Default::default()
        };
        assert!(DownloadTarget::from_record(&record, &DownloadConfig::default()).is_err());
    }

    #[test]
    fn test_local_path_is_flat() {
        let target = DownloadTarget::new("scythe.zip", "levels/doom2/s-u/", &DownloadConfig::default())
            .with_dest("/tmp/wads");
        assert_eq!(target.local_path(), PathBuf::from("/tmp/wads/scythe.zip"));
    }

    #[test]
    fn test_default_config() {
        let config = DownloadConfig::default();
        assert_eq!(config.delay, Duration::from_secs(5));
        assert_eq!(config.mirror, Mirror::FtpGermany);
        assert!(config.make_subfolder);
    }
}
