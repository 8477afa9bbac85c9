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

//! Client-side result filters.
//!
//! Each filter is a predicate over [`Record`]s. A chain applies filters in
//! order, each one narrowing the output of the previous one. Range bounds
//! differ per kind:
//! - year: inclusive at both ends
//! - rating, size, votes: exclusive at the high end

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{WadboostError, WadboostResult};
use crate::paths::Game;
use crate::record::Record;

/// A single value or a low/high range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<T> {
    Exact(T),
    Range(T, T),
}

impl<T: FromStr> Arg<T> {
    /// Parse `value` or `lo..hi`
    fn parse(kind: FilterKind, s: &str) -> WadboostResult<Self> {
        let bad = |reason: String| WadboostError::InvalidFilterArgument {
            kind: kind.as_str().to_string(),
            reason,
        };
        let parse_one = |part: &str| {
            part.trim()
                .parse::<T>()
                .map_err(|_| bad(format!("cannot parse '{}'", part.trim())))
        };
        match s.split_once("..") {
            Some((lo, hi)) => Ok(Arg::Range(parse_one(lo)?, parse_one(hi)?)),
            None => Ok(Arg::Exact(parse_one(s)?)),
        }
    }
}

/// Filter names, as accepted in chains and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Date,
    Game,
    Rating,
    Size,
    Votes,
    Year,
    Gyr,
}

/// Name to kind dispatch table
const FILTER_TABLE: [(&str, FilterKind); 7] = [
    ("date", FilterKind::Date),
    ("game", FilterKind::Game),
    ("rating", FilterKind::Rating),
    ("size", FilterKind::Size),
    ("votes", FilterKind::Votes),
    ("year", FilterKind::Year),
    ("gyr", FilterKind::Gyr),
];

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        FILTER_TABLE
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = WadboostError;

    /// Accepts bare names and the `filter:` prefixed form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix("filter:").unwrap_or(name);
        FILTER_TABLE
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| WadboostError::UnknownFilter(s.to_string()))
    }
}

/// One filter specification
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact `YYYY-MM-DD` string match
    Date(String),
    /// `"<game>/"` appears somewhere in `dir`
    Game(Game),
    Year(Arg<i32>),
    Rating(Arg<f64>),
    /// Kilobytes, `size / 1000`
    Size(Arg<u64>),
    Votes(Arg<u64>),
    /// Game, then year, then rating
    Gyr {
        game: Game,
        year: Arg<i32>,
        rating: Arg<f64>,
    },
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Date(_) => FilterKind::Date,
            Filter::Game(_) => FilterKind::Game,
            Filter::Year(_) => FilterKind::Year,
            Filter::Rating(_) => FilterKind::Rating,
            Filter::Size(_) => FilterKind::Size,
            Filter::Votes(_) => FilterKind::Votes,
            Filter::Gyr { .. } => FilterKind::Gyr,
        }
    }

    /// Build a filter from a kind name and an argument string.
    ///
    /// Ranges are written `lo..hi`. `gyr` takes `game,year,rating`, where
    /// year and rating may themselves be ranges.
    pub fn parse(kind: &str, arg: &str) -> WadboostResult<Self> {
        let kind: FilterKind = kind.parse()?;
        let filter = match kind {
            FilterKind::Date => Filter::Date(arg.trim().to_string()),
            FilterKind::Game => Filter::Game(arg.parse()?),
            FilterKind::Year => Filter::Year(Arg::parse(kind, arg)?),
            FilterKind::Rating => Filter::Rating(Arg::parse(kind, arg)?),
            FilterKind::Size => Filter::Size(Arg::parse(kind, arg)?),
            FilterKind::Votes => Filter::Votes(Arg::parse(kind, arg)?),
            FilterKind::Gyr => {
                let parts: Vec<&str> = arg.split(',').collect();
                if parts.len() != 3 {
                    return Err(WadboostError::InvalidFilterArgument {
                        kind: kind.as_str().to_string(),
                        reason: "expected game,year,rating".to_string(),
                    });
                }
                Filter::Gyr {
                    game: parts[0].parse()?,
                    year: Arg::parse(FilterKind::Year, parts[1])?,
                    rating: Arg::parse(FilterKind::Rating, parts[2])?,
                }
            }
        };
        Ok(filter)
    }

    /// Parse `kind=arg`
    pub fn parse_pair(spec: &str) -> WadboostResult<Self> {
        match spec.split_once('=') {
            Some((kind, arg)) => Filter::parse(kind, arg),
            None => Err(WadboostError::InvalidFilterArgument {
                kind: spec.to_string(),
                reason: "expected kind=value".to_string(),
            }),
        }
    }

    /// Keep the records this filter accepts, in input order
    pub fn apply(&self, records: Vec<Record>) -> WadboostResult<Vec<Record>> {
        if let Filter::Gyr { game, year, rating } = self {
            return chain(
                records,
                &[
                    Filter::Game(*game),
                    Filter::Year(*year),
                    Filter::Rating(*rating),
                ],
            );
        }

        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if self.matches(&record)? {
                kept.push(record);
            }
        }
        Ok(kept)
    }

    /// Test one record. Fails if the record lacks the filtered field.
    pub fn matches(&self, record: &Record) -> WadboostResult<bool> {
        match self {
            Filter::Date(date) => Ok(record.require_date()? == date),
            Filter::Game(game) => {
                let needle = format!("{}/", game);
                Ok(record.require_dir()?.contains(&needle))
            }
            Filter::Year(arg) => {
                let date = record.require_date()?;
                // Only a prefix that prints back identically counts as a year
                Ok(date
                    .get(0..4)
                    .and_then(|prefix| {
                        prefix
                            .parse::<i32>()
                            .ok()
                            .filter(|y| y.to_string() == prefix)
                    })
                    .map(|y| match *arg {
                        Arg::Exact(want) => y == want,
                        Arg::Range(lo, hi) => (lo..=hi).contains(&y),
                    })
                    .unwrap_or(false))
            }
            Filter::Rating(arg) => {
                let tenths = truncate_tenths(record.require_rating()?);
                let value = tenths as f64 / 10.0;
                Ok(match *arg {
                    Arg::Exact(want) => value == want,
                    // Steps are lo, lo + 0.1, ... so lo must sit on the tenths grid
                    Arg::Range(lo, hi) => match tenths_grid(lo) {
                        Some(lo_tenths) => tenths >= lo_tenths && value < hi,
                        None => false,
                    },
                })
            }
            Filter::Size(arg) => {
                let kb = record.require_size()? / 1000;
                Ok(in_half_open(kb, arg))
            }
            Filter::Votes(arg) => Ok(in_half_open(record.require_votes()?, arg)),
            Filter::Gyr { game, year, rating } => Ok(Filter::Game(*game).matches(record)?
                && Filter::Year(*year).matches(record)?
                && Filter::Rating(*rating).matches(record)?),
        }
    }
}

/// `value` as whole tenths when it has at most one decimal place
fn tenths_grid(value: f64) -> Option<i64> {
    let tenths = (value * 10.0).round();
    (tenths / 10.0 == value).then_some(tenths as i64)
}

fn in_half_open(value: u64, arg: &Arg<u64>) -> bool {
    match *arg {
        Arg::Exact(want) => value == want,
        Arg::Range(lo, hi) => (lo..hi).contains(&value),
    }
}

/// Apply filters left to right, feeding each output into the next filter.
pub fn chain(records: Vec<Record>, filters: &[Filter]) -> WadboostResult<Vec<Record>> {
    let mut records = records;
    for filter in filters {
        let before = records.len();
        records = filter.apply(records)?;
        debug!(filter = %filter.kind(), before, after = records.len(), "applied filter");
    }
    Ok(records)
}

/// Truncate a rating to one decimal place, as integer tenths.
///
/// Works on the shortest decimal rendering of the float so `4.3` stays
/// `43` instead of drifting to `42`.
pub fn truncate_tenths(rating: f64) -> i64 {
    let text = format!("{}", rating);
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let (whole, frac) = text.split_once('.').unwrap_or((text, ""));
    let whole: i64 = whole.parse().unwrap_or(0);
    let tenth = frac
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0) as i64;
    let tenths = whole * 10 + tenth;
    if negative {
        -tenths
    } else {
        tenths
    }
}

/// Truncated rating as a float, e.g. `4.29 -> 4.2`
pub fn truncate_rating(rating: f64) -> f64 {
    truncate_tenths(rating) as f64 / 10.0
}
