/*
 * wadboost - Doomworld /idgames archive client and mirror downloader.
 * Copyright (C) 2025  compiledkernel-idk and wadboost contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 */

//! Single-file transfers from a mirror to the local disk.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::timeout;
use tracing::{debug, info, Instrument};

use super::{DownloadTarget, MirrorKind, TransferOutcome, CHUNK_SIZE};
use crate::error::{WadboostError, WadboostResult};
use crate::paths::IDGAMES_ROOT;

/// A body that stops producing bytes for this long is abandoned
const STALL_TIMEOUT: Duration = Duration::from_secs(60);

const FTP_PORT: u16 = 21;
const FTP_USER: &str = "anonymous";
const FTP_PASSWORD: &str = "anonymous@";

/// Moves one file from a mirror to disk
#[async_trait]
pub trait Transport: Send + Sync {
    async fn transfer(&self, target: &DownloadTarget) -> WadboostResult<TransferOutcome>;
}

/// Transport speaking plain HTTP or anonymous FTP, depending on the mirror
pub struct MirrorTransport {
    client: reqwest::Client,
    show_progress: bool,
}

impl MirrorTransport {
    pub fn new(request_timeout: Duration) -> WadboostResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("wadboost/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn progress_bar(&self, filename: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("   {spinner:.blue} {msg} [{bar:25.blue/cyan}] {bytes}/{total_bytes} {bytes_per_sec}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(filename.to_string());
        pb
    }
}

#[async_trait]
impl Transport for MirrorTransport {
    async fn transfer(&self, target: &DownloadTarget) -> WadboostResult<TransferOutcome> {
        let path = prepare_destination(target).await?;
        let start = Instant::now();

        let bytes = match target.mirror.kind() {
            MirrorKind::Http { origin } => {
                let url = http_url(origin, &target.dir, &target.filename);
                let pb = self.progress_bar(&target.filename);
                let result = fetch_http(&self.client, &url, &path, &pb)
                    .instrument(crate::span_download!(url.as_str()))
                    .await;
                pb.finish_and_clear();
                result?
            }
            MirrorKind::Ftp { host, base_path } => {
                let remote_dir = format!("{}{}", base_path, target.dir);
                let label = format!("ftp://{}/{}{}", host, remote_dir, target.filename);
                fetch_ftp(host, &remote_dir, &target.filename, &path)
                    .instrument(crate::span_download!(label.as_str()))
                    .await?
            }
        };

        info!(
            file = %target.filename,
            mirror = %target.mirror,
            bytes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "download complete"
        );

        Ok(TransferOutcome {
            filename: target.filename.clone(),
            path,
            bytes,
            mirror: target.mirror,
        })
    }
}

/// Full file URL on an HTTP mirror
pub fn http_url(origin: &str, dir: &str, filename: &str) -> String {
    format!("{}{}{}{}", origin, IDGAMES_ROOT, dir, filename)
}

/// Make sure the destination folder exists and return the output path.
///
/// With `make_subfolder` the folder is created when missing; without it a
/// missing folder is an error. The file always lands directly inside it,
/// replacing any file of the same name. Writes are not atomic: a failed
/// transfer leaves a partial file behind.
pub async fn prepare_destination(target: &DownloadTarget) -> WadboostResult<PathBuf> {
    let dest = &target.dest;

    if target.make_subfolder {
        fs::create_dir_all(dest).await.map_err(|e| {
            WadboostError::filesystem(dest.display().to_string(), "cannot create folder", e)
        })?;
    } else if !fs::metadata(dest).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Err(WadboostError::DestinationNotFound { path: dest.clone() });
    }

    Ok(target.local_path())
}

/// Stream an HTTP body into `path`, returning the number of bytes written
pub async fn fetch_http(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> WadboostResult<u64> {
    debug!(%url, "http get");
    let response = client.get(url).send().await?.error_for_status()?;

    if let Some(len) = response.content_length() {
        pb.set_length(len);
    }

    let write_err =
        |e: io::Error| WadboostError::filesystem(path.display().to_string(), "write failed", e);

    let file = File::create(path).await.map_err(write_err)?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    loop {
        match timeout(STALL_TIMEOUT, stream.next()).await {
            Ok(Some(Ok(chunk))) => {
                writer.write_all(&chunk).await.map_err(write_err)?;
                let len = chunk.len() as u64;
                written += len;
                pb.inc(len);
            }
            Ok(Some(Err(e))) => return Err(e.into()),
            Ok(None) => break,
            Err(_) => return Err(WadboostError::transport(url, "download stalled")),
        }
    }

    writer.flush().await.map_err(write_err)?;
    Ok(written)
}

/// Fetch `filename` from `remote_dir` on an anonymous FTP host. The
/// session is blocking, so it runs off the async workers.
async fn fetch_ftp(host: &str, remote_dir: &str, filename: &str, path: &Path) -> WadboostResult<u64> {
    let addr = format!("{}:{}", host, FTP_PORT);
    let remote_dir = remote_dir.to_string();
    let filename = filename.to_string();
    let path = path.to_path_buf();
    let label = format!("ftp://{}/{}{}", host, remote_dir, filename);

    tokio::task::spawn_blocking(move || retrieve_ftp(&addr, &remote_dir, &filename, &path))
        .await
        .map_err(|e| WadboostError::transport(label, format!("ftp worker failed: {}", e)))?
}

/// One anonymous FTP session against `addr` (`host:port`).
///
/// The local file is only created once the server starts sending data, so
/// a failed connect, login, `CWD` or `RETR` leaves an existing copy alone.
fn retrieve_ftp(addr: &str, remote_dir: &str, filename: &str, path: &Path) -> WadboostResult<u64> {
    debug!(addr, remote_dir, filename, "ftp connect");
    let mut ftp = FtpStream::connect(addr)?;
    let mut create_err: Option<io::Error> = None;

    let result = (|| -> suppaftp::FtpResult<u64> {
        ftp.login(FTP_USER, FTP_PASSWORD)?;
        ftp.cwd(remote_dir)?;
        ftp.transfer_type(FileType::Binary)?;
        ftp.retr(filename, |reader: &mut dyn Read| {
            match std::fs::File::create(path) {
                Ok(mut file) => io::copy(reader, &mut file).map_err(FtpError::ConnectionError),
                Err(e) => {
                    let mirrored = io::Error::new(e.kind(), e.to_string());
                    create_err = Some(e);
                    Err(FtpError::ConnectionError(mirrored))
                }
            }
        })
    })();

    // Leave the session even when the transfer failed
    if let Err(e) = ftp.quit() {
        debug!(addr, "ftp quit failed: {}", e);
    }

    if let Some(e) = create_err {
        return Err(WadboostError::filesystem(
            path.display().to_string(),
            "cannot create file",
            e,
        ));
    }
    Ok(result?)
}
