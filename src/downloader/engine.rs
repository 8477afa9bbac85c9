/*
 * wadboost - Doomworld /idgames archive client and mirror downloader.
 * Copyright (C) 2025  compiledkernel-idk and wadboost contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 */

//! Download engine: record lookup, single transfers and paced batches.
//!
//! Batches run strictly one file at a time and wait `delay` between
//! consecutive items. API markers (`error`/`warning` envelopes) are
//! collected into the report; anything else stops the batch.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn, Instrument};

use super::{BatchReport, DownloadConfig, DownloadTarget, MirrorTransport, TransferOutcome, Transport};
use crate::api::{ApiClient, RecordSource};
use crate::error::{WadboostError, WadboostResult};
use crate::filter::{Arg, Filter};
use crate::paths::{self, Game};
use crate::record::Record;

pub struct DownloadEngine {
    config: DownloadConfig,
    source: Arc<dyn RecordSource>,
    transport: Arc<dyn Transport>,
}

impl DownloadEngine {
    /// Engine backed by the API client and the real mirrors
    pub fn new(config: DownloadConfig, api: ApiClient) -> WadboostResult<Self> {
        let transport = MirrorTransport::new(config.timeout)?.with_progress(config.show_progress);
        Ok(Self::with_parts(config, Arc::new(api), Arc::new(transport)))
    }

    pub fn with_parts(
        config: DownloadConfig,
        source: Arc<dyn RecordSource>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            source,
            transport,
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Target for an archive file using this engine's settings
    pub fn target(&self, filename: &str, dir: &str) -> DownloadTarget {
        DownloadTarget::new(filename, dir, &self.config)
    }

    pub async fn download(&self, target: &DownloadTarget) -> WadboostResult<TransferOutcome> {
        debug!(path = %target.remote_path(), mirror = %target.mirror, "transfer");
        self.transport.transfer(target).await
    }

    pub async fn download_record(&self, record: &Record) -> WadboostResult<TransferOutcome> {
        let target = DownloadTarget::from_record(record, &self.config)?;
        self.download(&target).await
    }

    /// Look a file up by id and download it
    pub async fn download_id(&self, id: u64) -> WadboostResult<TransferOutcome> {
        let record = self.source.record_by_id(id).await?;
        self.download_record(&record).await
    }

    /// Download a file knowing only its name and game.
    ///
    /// The bucket directory is derived from the name, listed, and the
    /// first listed file whose name contains `filename` wins.
    pub async fn download_filename(&self, filename: &str, game: Game) -> WadboostResult<TransferOutcome> {
        let dir = paths::resolve(filename, game)?;
        let listing = self.source.list_files(&dir).await?;

        let mut listed = false;
        for record in &listing {
            if record.require_filename()?.contains(filename) {
                listed = true;
                break;
            }
        }
        if !listed {
            return Err(WadboostError::FileNotListed {
                filename: filename.to_string(),
                dir,
            });
        }

        self.download(&self.target(filename, &dir)).await
    }

    /// Download several files by id, pausing between each
    pub async fn download_ids(&self, ids: &[u64]) -> WadboostResult<BatchReport> {
        let span = crate::span_operation!("download_ids");
        self.paced(ids.to_vec(), |id| self.download_id(id))
            .instrument(span)
            .await
    }

    /// Download every file in `dir` whose date falls in `year`
    pub async fn download_year(&self, year: i32, dir: &str) -> WadboostResult<BatchReport> {
        let span = crate::span_operation!("download_year");
        async {
            let listing = self.source.list_files(dir).await?;
            let records = Filter::Year(Arg::Exact(year)).apply(listing)?;
            info!(year, dir, files = records.len(), "downloading year");

            let targets = records
                .iter()
                .map(|r| DownloadTarget::from_record(r, &self.config))
                .collect::<WadboostResult<Vec<_>>>()?;

            self.paced(targets, |target| async move { self.download(&target).await })
                .await
        }
        .instrument(span)
        .await
    }

    /// Run `step` over `items` in order, waiting the configured delay
    /// between consecutive items but not after the last one.
    async fn paced<T, F, Fut>(&self, items: Vec<T>, mut step: F) -> WadboostResult<BatchReport>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = WadboostResult<TransferOutcome>>,
    {
        let mut report = BatchReport::default();

        for (i, item) in items.into_iter().enumerate() {
            if i > 0 && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }

            match step(item).await {
                Ok(outcome) => report.downloaded.push(outcome),
                Err(WadboostError::Api(e)) => {
                    warn!("skipping: {}", e);
                    report.errors.push(e);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            downloaded = report.downloaded.len(),
            errors = report.errors.len(),
            "batch finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Default)]
    struct FakeSource {
        records: HashMap<u64, Record>,
        listings: HashMap<String, Vec<Record>>,
    }

    #[async_trait]
    impl RecordSource for FakeSource {
        async fn record_by_id(&self, id: u64) -> WadboostResult<Record> {
            self.records
                .get(&id)
                .cloned()
                .ok_or_else(|| ApiError::error(format!("File id {} not found", id)).into())
        }

        async fn list_files(&self, dir: &str) -> WadboostResult<Vec<Record>> {
            Ok(self.listings.get(dir).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        attempts: Mutex<Vec<(String, Instant)>>,
        fail_on: Option<String>,
    }

    impl FakeTransport {
        fn attempts(&self) -> Vec<(String, Instant)> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn transfer(&self, target: &DownloadTarget) -> WadboostResult<TransferOutcome> {
            self.attempts
                .lock()
                .unwrap()
                .push((target.remote_path(), Instant::now()));

            if self.fail_on.as_deref() == Some(target.filename.as_str()) {
                return Err(WadboostError::transport(target.remote_path(), "connection reset"));
            }

            Ok(TransferOutcome {
                filename: target.filename.clone(),
                path: target.local_path(),
                bytes: 1024,
                mirror: target.mirror,
            })
        }
    }

    fn record(id: u64, dir: &str, filename: &str, date: &str) -> Record {
        Record {
            id: Some(id),
            dir: Some(dir.to_string()),
            filename: Some(filename.to_string()),
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn config(delay_secs: u64) -> DownloadConfig {
        DownloadConfig {
            dest: PathBuf::from("/tmp/wadboost-test"),
            delay: Duration::from_secs(delay_secs),
            ..Default::default()
        }
    }

    fn engine(source: FakeSource, transport: Arc<FakeTransport>, delay_secs: u64) -> DownloadEngine {
        DownloadEngine::with_parts(config(delay_secs), Arc::new(source), transport)
    }

    fn three_records() -> FakeSource {
        let mut source = FakeSource::default();
        for (id, name) in [(1, "a.zip"), (2, "b.zip"), (3, "c.zip")] {
            source
                .records
                .insert(id, record(id, "levels/doom2/a-c/", name, "1995-01-01"));
        }
        source
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_waits_between_items_only() {
        let transport = Arc::new(FakeTransport::default());
        let engine = engine(three_records(), transport.clone(), 5);

        let start = Instant::now();
        let report = engine.download_ids(&[1, 2, 3]).await.unwrap();

        assert_eq!(report.downloaded.len(), 3);
        assert!(report.is_clean());
        assert_eq!(start.elapsed(), Duration::from_secs(10));

        let attempts = transport.attempts();
        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts[1].1 - attempts[0].1, Duration::from_secs(5));
        assert_eq!(attempts[2].1 - attempts[1].1, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_item_has_no_delay() {
        let transport = Arc::new(FakeTransport::default());
        let engine = engine(three_records(), transport.clone(), 5);

        let start = Instant::now();
        engine.download_ids(&[2]).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_api_error_is_collected() {
        let transport = Arc::new(FakeTransport::default());
        let engine = engine(three_records(), transport.clone(), 5);

        let start = Instant::now();
        let report = engine.download_ids(&[1, 42, 3]).await.unwrap();

        assert_eq!(report.downloaded.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("42"));
        assert_eq!(transport.attempts().len(), 2);
        // The pause still separates every pair of items
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_aborts_batch() {
        let transport = Arc::new(FakeTransport {
            fail_on: Some("b.zip".to_string()),
            ..Default::default()
        });
        let engine = engine(three_records(), transport.clone(), 5);

        let err = engine.download_ids(&[1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, WadboostError::Transport { .. }));
        assert_eq!(transport.attempts().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_year_filters_listing() {
        let dir = "levels/doom/a-c/";
        let mut source = FakeSource::default();
        source.listings.insert(
            dir.to_string(),
            vec![
                record(1, dir, "a1.zip", "1994-03-01"),
                record(2, dir, "a2.zip", "1995-07-12"),
                record(3, dir, "b1.zip", "1994-12-31"),
                record(4, dir, "c1.zip", "2003-05-05"),
            ],
        );
        let transport = Arc::new(FakeTransport::default());
        let engine = engine(source, transport.clone(), 5);

        let start = Instant::now();
        let report = engine.download_year(1994, dir).await.unwrap();

        let fetched: Vec<String> = transport.attempts().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            fetched,
            vec![
                "levels/doom/a-c/a1.zip".to_string(),
                "levels/doom/a-c/b1.zip".to_string()
            ]
        );
        assert_eq!(report.downloaded.len(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_download_year_rejects_undated_record() {
        let dir = "levels/doom/a-c/";
        let mut source = FakeSource::default();
        let mut undated = record(1, dir, "a1.zip", "");
        undated.date = None;
        source.listings.insert(dir.to_string(), vec![undated]);
        let transport = Arc::new(FakeTransport::default());
        let engine = engine(source, transport.clone(), 0);

        let err = engine.download_year(1994, dir).await.unwrap_err();
        assert!(matches!(err, WadboostError::MalformedRecord { field: "date", .. }));
        assert!(transport.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_download_filename_uses_bucket() {
        let dir = "levels/doom2/s-u/";
        let mut source = FakeSource::default();
        source.listings.insert(
            dir.to_string(),
            vec![
                record(1, dir, "sunder.zip", "2008-01-01"),
                record(2, dir, "scythe.zip", "2003-01-01"),
            ],
        );
        let transport = Arc::new(FakeTransport::default());
        let engine = engine(source, transport.clone(), 0);

        let outcome = engine.download_filename("scythe.zip", Game::Doom2).await.unwrap();
        assert_eq!(outcome.filename, "scythe.zip");
        assert_eq!(transport.attempts()[0].0, "levels/doom2/s-u/scythe.zip");
    }

    #[tokio::test]
    async fn test_download_filename_not_listed() {
        let transport = Arc::new(FakeTransport::default());
        let engine = engine(FakeSource::default(), transport.clone(), 0);

        match engine.download_filename("scythe.zip", Game::Doom2).await {
            Err(WadboostError::FileNotListed { filename, dir }) => {
                assert_eq!(filename, "scythe.zip");
                assert_eq!(dir, "levels/doom2/s-u/");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(transport.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_download_filename_invalid_name() {
        let engine = engine(FakeSource::default(), Arc::new(FakeTransport::default()), 0);
        let err = engine.download_filename("", Game::Doom).await.unwrap_err();
        assert!(matches!(err, WadboostError::InvalidFilename(_)));
    }
}
