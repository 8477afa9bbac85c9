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

//! Archive entry metadata as returned by the API.

use serde::{Deserialize, Serialize};

use crate::error::{WadboostError, WadboostResult};

/// One archive entry. Every field is optional on the wire; filters go
/// through the checked accessors below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub age: Option<u64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub credits: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub buildtime: Option<String>,
    #[serde(default)]
    pub editors: Option<String>,
    #[serde(default)]
    pub bugs: Option<String>,
    #[serde(default)]
    pub textfile: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub votes: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub idgamesurl: Option<String>,
}

impl Record {
    /// Human readable identity for error messages
    pub fn label(&self) -> String {
        match (&self.filename, self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("#{}", id),
            (None, None) => "<unnamed>".to_string(),
        }
    }

    fn require<'a, T>(&self, value: &'a Option<T>, field: &'static str) -> WadboostResult<&'a T> {
        value
            .as_ref()
            .ok_or_else(|| WadboostError::malformed(self.label(), field))
    }

    pub fn require_filename(&self) -> WadboostResult<&str> {
        self.require(&self.filename, "filename").map(String::as_str)
    }

    pub fn require_dir(&self) -> WadboostResult<&str> {
        self.require(&self.dir, "dir").map(String::as_str)
    }

    pub fn require_date(&self) -> WadboostResult<&str> {
        self.require(&self.date, "date").map(String::as_str)
    }

    pub fn require_rating(&self) -> WadboostResult<f64> {
        self.require(&self.rating, "rating").copied()
    }

    pub fn require_size(&self) -> WadboostResult<u64> {
        self.require(&self.size, "size").copied()
    }

    pub fn require_votes(&self) -> WadboostResult<u64> {
        self.require(&self.votes, "votes").copied()
    }

    /// Archive path of the file: `dir` followed by `filename`
    pub fn remote_path(&self) -> WadboostResult<String> {
        Ok(format!("{}{}", self.require_dir()?, self.require_filename()?))
    }

    /// Field/value pairs in key order, for display
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(v) = value {
                out.push((key, v));
            }
        };
        push("age", self.age.map(|v| v.to_string()));
        push("author", self.author.clone());
        push("base", self.base.clone());
        push("bugs", self.bugs.clone());
        push("buildtime", self.buildtime.clone());
        push("credits", self.credits.clone());
        push("date", self.date.clone());
        push("description", self.description.clone());
        push("dir", self.dir.clone());
        push("editors", self.editors.clone());
        push("email", self.email.clone());
        push("filename", self.filename.clone());
        push("id", self.id.map(|v| v.to_string()));
        push("idgamesurl", self.idgamesurl.clone());
        push("rating", self.rating.map(|v| v.to_string()));
        push("size", self.size.map(|v| v.to_string()));
        push("title", self.title.clone());
        push("url", self.url.clone());
        push("votes", self.votes.map(|v| v.to_string()));
        out
    }
}
