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

//! Client for the Doomworld /idgames archive API and downloader for its
//! HTTP and FTP mirrors.

pub mod api;
pub mod config;
pub mod display;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod logging;
pub mod paths;
pub mod record;
pub mod search;

pub use api::{ApiClient, RecordSource};
pub use config::Config;
pub use downloader::{BatchReport, DownloadConfig, DownloadEngine, DownloadTarget, Mirror};
pub use error::{ApiError, WadboostError, WadboostResult};
pub use filter::Filter;
pub use paths::Game;
pub use record::Record;
