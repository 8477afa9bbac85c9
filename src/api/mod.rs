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

//! Doomworld /idgames API support module.
//!
//! - URL construction for every API action
//! - response envelope and payload types
//! - the HTTP client itself, in [`client`]

pub mod client;

pub use client::ApiClient;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ApiError, ApiErrorKind, WadboostError, WadboostResult};
use crate::filter::Filter;
use crate::record::Record;
use crate::search::{SearchField, SortDirection, SortField};

/// Default API endpoint; actions are appended to it
pub const API_URL: &str = "http://www.doomworld.com/idgames/api/api.php?action=";

/// Forces JSON output, appended to every action
pub const OUT_JSON: &str = "&out=json";

/// One API request
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    About,
    DbPing,
    Ping,
    GetId(u64),
    /// Full archive path, directory plus filename
    GetFile(String),
    GetContentsId(u64),
    GetContentsName(String),
    GetDirsId(u64),
    GetDirsName(String),
    GetFilesId(u64),
    GetFilesName(String),
    LatestVotes(u32),
    LatestFiles(u32),
    ParentDirId(u64),
    ParentDirName(String),
    Search(SearchParams),
}

impl Action {
    /// The `action=` value, without the JSON suffix.
    ///
    /// Archive paths are substituted verbatim. Only free-text search queries
    /// are percent-encoded.
    pub fn query(&self) -> String {
        match self {
            Action::About => "about".to_string(),
            Action::DbPing => "dbping".to_string(),
            Action::Ping => "ping".to_string(),
            Action::GetId(id) => format!("get&id={}", id),
            Action::GetFile(path) => format!("get&file={}", path),
            Action::GetContentsId(id) => format!("getcontents&id={}", id),
            Action::GetContentsName(path) => format!("getcontents&name={}", path),
            Action::GetDirsId(id) => format!("getdirs&id={}", id),
            Action::GetDirsName(path) => format!("getdirs&name={}", path),
            Action::GetFilesId(id) => format!("getfiles&id={}", id),
            Action::GetFilesName(path) => format!("getfiles&name={}", path),
            Action::LatestVotes(limit) => format!("latestvotes&limit={}", limit),
            Action::LatestFiles(limit) => format!("latestfiles&limit={}", limit),
            Action::ParentDirId(id) => format!("getparentdir&id={}", id),
            Action::ParentDirName(path) => format!("getparentdir&name={}", path),
            Action::Search(params) => params.query_string(),
        }
    }

    /// Complete request URL against `base`
    pub fn url(&self, base: &str) -> String {
        format!("{}{}{}", base, self.query(), OUT_JSON)
    }
}

/// Parameters of a remote search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub query: String,
    pub field: Option<SearchField>,
    pub sort: Option<SortField>,
    pub direction: Option<SortDirection>,
    /// Applied client-side to the returned records
    pub filters: Vec<Filter>,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, field: SearchField) -> Self {
        self.field = Some(field);
        self
    }

    /// Fails for sort fields the API does not know, such as votes
    pub fn sort(mut self, sort: SortField) -> WadboostResult<Self> {
        if !sort.is_remote() {
            return Err(WadboostError::InvalidFilterArgument {
                kind: "sort".to_string(),
                reason: format!("the API cannot sort by {}", sort),
            });
        }
        self.sort = Some(sort);
        Ok(self)
    }

    pub fn direction(mut self, direction: SortDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// `search&query=..` then type, sort and dir, each only when set
    fn query_string(&self) -> String {
        let mut q = format!("search&query={}", urlencoding::encode(&self.query));
        if let Some(field) = self.field {
            q.push_str(&format!("&type={}", field));
        }
        if let Some(sort) = self.sort {
            q.push_str(&format!("&sort={}", sort));
        }
        if let Some(direction) = self.direction {
            q.push_str(&format!("&dir={}", direction));
        }
        q
    }
}

/// `error` / `warning` payloads come either as a bare string or as an
/// object with `type` and `message`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Marker {
    Text(String),
    Detailed {
        #[serde(rename = "type", default)]
        category: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl Marker {
    fn into_api_error(self, kind: ApiErrorKind) -> ApiError {
        match self {
            Marker::Text(message) => ApiError {
                kind,
                category: None,
                message,
            },
            Marker::Detailed { category, message } => ApiError {
                kind,
                message: message
                    .or_else(|| category.clone())
                    .unwrap_or_else(|| kind.to_string()),
                category,
            },
        }
    }
}

/// Top-level response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<Marker>,
    #[serde(default)]
    pub warning: Option<Marker>,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

impl ApiResponse {
    /// The `content` payload, or the marker the API sent instead.
    pub fn into_content(self) -> WadboostResult<serde_json::Value> {
        if let Some(marker) = self.error {
            return Err(marker.into_api_error(ApiErrorKind::Error).into());
        }
        if let Some(marker) = self.warning {
            return Err(marker.into_api_error(ApiErrorKind::Warning).into());
        }
        self.content
            .ok_or_else(|| WadboostError::transport("api", "response has no content"))
    }
}

/// The API returns a bare object instead of a one-element list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

fn flatten<T>(items: Option<OneOrMany<T>>) -> Vec<T> {
    items.map(OneOrMany::into_vec).unwrap_or_default()
}

/// `{ "file": ... }` payload of getfiles, latestfiles and search
#[derive(Debug, Clone, Deserialize)]
pub struct FileList {
    #[serde(default)]
    file: Option<OneOrMany<Record>>,
}

impl FileList {
    pub fn into_records(self) -> Vec<Record> {
        flatten(self.file)
    }
}

/// A directory node
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirList {
    #[serde(default)]
    dir: Option<OneOrMany<Directory>>,
}

impl DirList {
    pub fn into_dirs(self) -> Vec<Directory> {
        flatten(self.dir)
    }
}

/// getcontents payload: files and subdirectories of one directory
#[derive(Debug, Clone, Default)]
pub struct DirContents {
    pub files: Vec<Record>,
    pub dirs: Vec<Directory>,
}

#[derive(Deserialize)]
struct RawContents {
    #[serde(default)]
    file: Option<OneOrMany<Record>>,
    #[serde(default)]
    dir: Option<OneOrMany<Directory>>,
}

impl<'de> Deserialize<'de> for DirContents {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawContents::deserialize(deserializer)?;
        Ok(DirContents {
            files: flatten(raw.file),
            dirs: flatten(raw.dir),
        })
    }
}

/// A recent review
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Vote {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub file: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub reviewtext: Option<String>,
    #[serde(default)]
    pub vote: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteList {
    #[serde(default)]
    vote: Option<OneOrMany<Vote>>,
}

impl VoteList {
    pub fn into_votes(self) -> Vec<Vote> {
        flatten(self.vote)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct About {
    #[serde(default)]
    pub credits: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

/// ping / dbping payload
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl Status {
    pub fn is_up(&self) -> bool {
        match &self.status {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

/// Where downloads look records up. The API client is the real
/// implementation; tests substitute an in-memory one.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn record_by_id(&self, id: u64) -> WadboostResult<Record>;

    async fn list_files(&self, dir: &str) -> WadboostResult<Vec<Record>>;
}
