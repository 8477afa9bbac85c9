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

//! /idgames API client. One HTTP round trip per call, no caching.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{
    About, Action, ApiResponse, DirContents, DirList, Directory, FileList, RecordSource,
    SearchParams, Status, Vote, VoteList, API_URL,
};
use crate::config::Config;
use crate::error::{WadboostError, WadboostResult};
use crate::filter;
use crate::paths::{self, Game};
use crate::record::Record;
use crate::search::SearchField;

/// Client for the Doomworld /idgames API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client against the public API
    pub fn new() -> WadboostResult<Self> {
        Self::with_config(API_URL.to_string(), Duration::from_secs(30))
    }

    /// Create a client with a custom endpoint and request timeout
    pub fn with_config(base_url: String, timeout: Duration) -> WadboostResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("wadboost/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> WadboostResult<Self> {
        Self::with_config(
            config.api_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request URL for an action
    pub fn url_for(&self, action: &Action) -> String {
        action.url(&self.base_url)
    }

    /// Issue one request and return the envelope exactly as received.
    pub async fn call(&self, action: &Action) -> WadboostResult<serde_json::Value> {
        let url = self.url_for(action);
        debug!(%url, "api call");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let value = response.json::<serde_json::Value>().await?;
        Ok(value)
    }

    /// Call and unwrap `content`, turning `error`/`warning` into `Api` errors
    async fn content<T: DeserializeOwned>(&self, action: &Action) -> WadboostResult<T> {
        let envelope: ApiResponse = serde_json::from_value(self.call(action).await?)?;
        let content = envelope.into_content()?;
        Ok(serde_json::from_value(content)?)
    }

    pub async fn about(&self) -> WadboostResult<About> {
        self.content(&Action::About).await
    }

    pub async fn ping(&self) -> WadboostResult<Status> {
        self.content(&Action::Ping).await
    }

    pub async fn dbping(&self) -> WadboostResult<Status> {
        self.content(&Action::DbPing).await
    }

    /// Record for a file id
    pub async fn get_id(&self, id: u64) -> WadboostResult<Record> {
        self.content(&Action::GetId(id)).await
    }

    /// Record for a full archive path, e.g. `levels/doom/a-c/av.zip`
    pub async fn get_file(&self, path: &str) -> WadboostResult<Record> {
        self.content(&Action::GetFile(path.to_string())).await
    }

    /// Record for a bare level filename, locating its bucket first
    pub async fn get_file_by_name(&self, filename: &str, game: Game) -> WadboostResult<Record> {
        let dir = paths::resolve(filename, game)?;
        self.get_file(&format!("{}{}", dir, filename)).await
    }

    /// Files directly under an archive directory
    pub async fn get_files(&self, dir: &str) -> WadboostResult<Vec<Record>> {
        let list: FileList = self.content(&Action::GetFilesName(dir.to_string())).await?;
        Ok(list.into_records())
    }

    pub async fn get_files_id(&self, dir_id: u64) -> WadboostResult<Vec<Record>> {
        let list: FileList = self.content(&Action::GetFilesId(dir_id)).await?;
        Ok(list.into_records())
    }

    /// Subdirectories of an archive directory
    pub async fn get_dirs(&self, dir: &str) -> WadboostResult<Vec<Directory>> {
        let list: DirList = self.content(&Action::GetDirsName(dir.to_string())).await?;
        Ok(list.into_dirs())
    }

    pub async fn get_dirs_id(&self, dir_id: u64) -> WadboostResult<Vec<Directory>> {
        let list: DirList = self.content(&Action::GetDirsId(dir_id)).await?;
        Ok(list.into_dirs())
    }

    pub async fn get_contents(&self, dir: &str) -> WadboostResult<DirContents> {
        self.content(&Action::GetContentsName(dir.to_string())).await
    }

    pub async fn get_contents_id(&self, dir_id: u64) -> WadboostResult<DirContents> {
        self.content(&Action::GetContentsId(dir_id)).await
    }

    pub async fn get_parent_dir(&self, dir: &str) -> WadboostResult<Directory> {
        self.content(&Action::ParentDirName(dir.to_string())).await
    }

    pub async fn get_parent_dir_id(&self, dir_id: u64) -> WadboostResult<Directory> {
        self.content(&Action::ParentDirId(dir_id)).await
    }

    pub async fn latest_files(&self, limit: u32) -> WadboostResult<Vec<Record>> {
        let list: FileList = self.content(&Action::LatestFiles(limit)).await?;
        Ok(list.into_records())
    }

    pub async fn latest_votes(&self, limit: u32) -> WadboostResult<Vec<Vote>> {
        let list: VoteList = self.content(&Action::LatestVotes(limit)).await?;
        Ok(list.into_votes())
    }

    /// Search the archive, then run the params' filter chain over the hits.
    pub async fn search(&self, params: SearchParams) -> WadboostResult<Vec<Record>> {
        let filters = params.filters.clone();
        let list: FileList = self.content(&Action::Search(params)).await?;
        filter::chain(list.into_records(), &filters)
    }

    async fn search_in(&self, field: SearchField, query: &str) -> WadboostResult<Vec<Record>> {
        self.search(SearchParams::new(query).field(field)).await
    }

    pub async fn search_author(&self, query: &str) -> WadboostResult<Vec<Record>> {
        self.search_in(SearchField::Author, query).await
    }

    pub async fn search_credits(&self, query: &str) -> WadboostResult<Vec<Record>> {
        self.search_in(SearchField::Credits, query).await
    }

    pub async fn search_description(&self, query: &str) -> WadboostResult<Vec<Record>> {
        self.search_in(SearchField::Description, query).await
    }

    pub async fn search_editors(&self, query: &str) -> WadboostResult<Vec<Record>> {
        self.search_in(SearchField::Editors, query).await
    }

    pub async fn search_email(&self, query: &str) -> WadboostResult<Vec<Record>> {
        self.search_in(SearchField::Email, query).await
    }

    pub async fn search_filename(&self, query: &str) -> WadboostResult<Vec<Record>> {
        self.search_in(SearchField::Filename, query).await
    }

    pub async fn search_textfile(&self, query: &str) -> WadboostResult<Vec<Record>> {
        self.search_in(SearchField::Textfile, query).await
    }

    pub async fn search_title(&self, query: &str) -> WadboostResult<Vec<Record>> {
        self.search_in(SearchField::Title, query).await
    }

    /// A random level from one of the lettered buckets. Without a game,
    /// picks between doom and doom2.
    pub async fn random_record(&self, game: Option<Game>) -> WadboostResult<Record> {
        let dir = {
            let mut rng = rand::thread_rng();
            let game = match game {
                Some(g) => g,
                None => *[Game::Doom, Game::Doom2]
                    .choose(&mut rng)
                    .unwrap_or(&Game::Doom),
            };
            paths::level_dirs(game)
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(|| format!("levels/{}/", game))
        };

        let files = self.get_files(&dir).await?;
        let picked = files.choose(&mut rand::thread_rng()).cloned();
        picked.ok_or_else(|| WadboostError::FileNotListed {
            filename: "*".to_string(),
            dir,
        })
    }
}

#[async_trait]
impl RecordSource for ApiClient {
    async fn record_by_id(&self, id: u64) -> WadboostResult<Record> {
        self.get_id(id).await
    }

    async fn list_files(&self, dir: &str) -> WadboostResult<Vec<Record>> {
        self.get_files(dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use crate::filter::{Arg, Filter};
    use crate::search::SortField;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::with_config(
            format!("{}/api.php?action=", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_id_unwraps_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api.php"))
            .and(query_param("action", "get"))
            .and(query_param("id", "15156"))
            .and(query_param("out", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": {
                    "id": 15156,
                    "filename": "av.zip",
                    "dir": "levels/doom2/Ports/megawads/",
                    "date": "2002-01-06",
                    "rating": 4.6,
                    "votes": 120,
                    "size": 3148276
                },
                "meta": {"version": 3}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let record = client.get_id(15156).await.unwrap();
        assert_eq!(record.filename.as_deref(), Some("av.zip"));
        assert_eq!(record.votes, Some(120));
    }

    #[tokio::test]
    async fn test_error_marker_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"type": "Invalid Request", "message": "File does not exist."}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        match client.get_id(1).await {
            Err(WadboostError::Api(e)) => {
                assert_eq!(e.kind, ApiErrorKind::Error);
                assert_eq!(e.message, "File does not exist.");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_raw_call_keeps_envelope() {
        let server = MockServer::start().await;
        let body = serde_json::json!({"warning": {"type": "Limit", "message": "No files"}});
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let raw = client.call(&Action::GetFilesName("empty/".into())).await.unwrap();
        assert_eq!(raw, body);
    }

    #[tokio::test]
    async fn test_http_failure_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(matches!(
            client.ping().await,
            Err(WadboostError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_json_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(matches!(
            client.get_files("levels/").await,
            Err(WadboostError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_applies_filter_chain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "search"))
            .and(query_param("query", "hell"))
            .and(query_param("type", "title"))
            .and(query_param("sort", "rating"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": {"file": [
                    {"filename": "hr.zip", "dir": "levels/doom2/Ports/megawads/", "date": "1997-04-01", "rating": 4.5},
                    {"filename": "hellgate.zip", "dir": "levels/doom/g-i/", "date": "1995-03-03", "rating": 3.1},
                    {"filename": "hr2.zip", "dir": "levels/doom2/Ports/megawads/", "date": "2002-09-20", "rating": 3.8}
                ]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let params = SearchParams::new("hell")
            .field(SearchField::Title)
            .sort(SortField::Rating)
            .unwrap()
            .filter(Filter::Game(Game::Doom2))
            .filter(Filter::Year(Arg::Range(1990, 1999)));
        let results = client.search(params).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].filename.as_deref(), Some("hr.zip"));
    }

    #[tokio::test]
    async fn test_single_search_hit_is_a_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": {"file": {"filename": "scythe.zip", "title": "Scythe"}}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let results = client.search_title("scythe").await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_get_file_by_name_resolves_bucket() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "get"))
            .and(query_param("file", "levels/doom/d-f/dtwid.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": {"filename": "dtwid.zip", "dir": "levels/doom/d-f/"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let record = client.get_file_by_name("dtwid.zip", Game::Doom).await.unwrap();
        assert_eq!(record.dir.as_deref(), Some("levels/doom/d-f/"));
    }

    #[tokio::test]
    async fn test_latest_votes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "latestvotes"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": {"vote": [
                    {"id": 1, "file": 15156, "title": "Alien Vendetta", "reviewtext": "classic", "vote": 5},
                    {"id": 2, "file": 11463, "title": "Scythe", "reviewtext": "short and sharp", "vote": 4}
                ]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let votes = client.latest_votes(2).await.unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[1].title.as_deref(), Some("Scythe"));
    }

    #[tokio::test]
    async fn test_random_record_picks_from_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "getfiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": {"file": [{"filename": "only.zip", "dir": "levels/doom/m-o/"}]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let record = client.random_record(Some(Game::Doom)).await.unwrap();
        assert_eq!(record.filename.as_deref(), Some("only.zip"));
    }
}
