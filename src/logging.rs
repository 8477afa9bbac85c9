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

//! Tracing subscriber setup and span helpers.

use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Build the filter: `RUST_LOG` wins over the configured level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize console logging at a level. Logs go to stderr so they
/// never mix with tables on stdout.
pub fn init_with_level(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

/// Initialize logging with optional file output
pub fn init_with_file(level: &str, log_file: Option<&Path>) {
    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true);

            let _ = tracing_subscriber::registry()
                .with(env_filter(level))
                .with(fmt::layer().with_writer(std::io::stderr).compact())
                .with(file_layer)
                .try_init();

            return;
        }
    }

    init_with_level(level);
}

/// Initialize from the `[logging]` config section
pub fn init(config: &LoggingConfig) {
    init_with_file(&config.level, config.file.as_deref());
}

/// Span for a top-level operation such as a batch
#[macro_export]
macro_rules! span_operation {
    ($name:expr) => {
        tracing::info_span!("operation", name = $name)
    };
}

/// Span for one file transfer
#[macro_export]
macro_rules! span_download {
    ($url:expr) => {
        tracing::info_span!("download", url = $url)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_with_file_writes_events() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("logs").join("wadboost.log");

        init_with_file("info", Some(&log));
        tracing::info!("logging ready");

        // Only the first init in the process wins, but the file is opened regardless
        assert!(log.exists());
    }

    #[test]
    fn test_repeated_init_does_not_panic() {
        init_with_level("debug");
        init_with_level("warn");
    }
}
