/*
 * wadboost - Doomworld /idgames archive client and mirror downloader.
 * Copyright (C) 2025  compiledkernel-idk and wadboost contributors
 */

//! Search vocabulary shared by remote queries and local searches over
//! already-fetched records.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{WadboostError, WadboostResult};
use crate::filter::Filter;
use crate::record::Record;

/// Text field a search matches against (`type=` on the API)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Author,
    Credits,
    Description,
    Editors,
    Email,
    Filename,
    Textfile,
    Title,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Author => "author",
            SearchField::Credits => "credits",
            SearchField::Description => "description",
            SearchField::Editors => "editors",
            SearchField::Email => "email",
            SearchField::Filename => "filename",
            SearchField::Textfile => "textfile",
            SearchField::Title => "title",
        }
    }

    fn value<'a>(&self, record: &'a Record) -> Option<&'a str> {
        let field = match self {
            SearchField::Author => &record.author,
            SearchField::Credits => &record.credits,
            SearchField::Description => &record.description,
            SearchField::Editors => &record.editors,
            SearchField::Email => &record.email,
            SearchField::Filename => &record.filename,
            SearchField::Textfile => &record.textfile,
            SearchField::Title => &record.title,
        };
        field.as_deref()
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = WadboostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "author" => Ok(SearchField::Author),
            "credits" => Ok(SearchField::Credits),
            "description" => Ok(SearchField::Description),
            "editors" => Ok(SearchField::Editors),
            "email" => Ok(SearchField::Email),
            "filename" => Ok(SearchField::Filename),
            "textfile" => Ok(SearchField::Textfile),
            "title" => Ok(SearchField::Title),
            _ => Err(WadboostError::InvalidFilterArgument {
                kind: "type".to_string(),
                reason: format!("unknown search field '{}'", s),
            }),
        }
    }
}

/// Field to order results by (`sort=` on the API)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Date,
    Filename,
    Rating,
    Size,
    /// Local searches only, the API does not sort by votes
    Votes,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Filename => "filename",
            SortField::Rating => "rating",
            SortField::Size => "size",
            SortField::Votes => "votes",
        }
    }

    /// Whether the API accepts this as `sort=`
    pub fn is_remote(&self) -> bool {
        !matches!(self, SortField::Votes)
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            SortField::Date => a.date.cmp(&b.date),
            SortField::Filename => a.filename.cmp(&b.filename),
            SortField::Rating => a
                .rating
                .partial_cmp(&b.rating)
                .unwrap_or(Ordering::Equal),
            SortField::Size => a.size.cmp(&b.size),
            SortField::Votes => a.votes.cmp(&b.votes),
        }
    }

    fn require(&self, record: &Record) -> WadboostResult<()> {
        match self {
            SortField::Date => record.require_date().map(|_| ()),
            SortField::Filename => record.require_filename().map(|_| ()),
            SortField::Rating => record.require_rating().map(|_| ()),
            SortField::Size => record.require_size().map(|_| ()),
            SortField::Votes => record.require_votes().map(|_| ()),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = WadboostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(SortField::Date),
            "filename" => Ok(SortField::Filename),
            "rating" => Ok(SortField::Rating),
            "size" => Ok(SortField::Size),
            "votes" => Ok(SortField::Votes),
            _ => Err(WadboostError::InvalidFilterArgument {
                kind: "sort".to_string(),
                reason: format!("unknown sort field '{}'", s),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = WadboostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(WadboostError::InvalidFilterArgument {
                kind: "dir".to_string(),
                reason: format!("expected asc or desc, got '{}'", s),
            }),
        }
    }
}

/// Search over records already in memory
#[derive(Debug, Clone)]
pub struct LocalSearch {
    pub query: String,
    pub field: SearchField,
    pub sort: Option<SortField>,
    pub direction: SortDirection,
    pub filters: Vec<Filter>,
}

impl LocalSearch {
    pub fn new(query: impl Into<String>, field: SearchField) -> Self {
        Self {
            query: query.into(),
            field,
            sort: None,
            direction: SortDirection::Asc,
            filters: Vec::new(),
        }
    }

    pub fn sort_by(mut self, sort: SortField, direction: SortDirection) -> Self {
        self.sort = Some(sort);
        self.direction = direction;
        self
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    /// Match, sort, reverse if descending, then apply the filter chain.
    pub fn run(&self, records: &[Record]) -> WadboostResult<Vec<Record>> {
        let needle = self.query.to_lowercase();
        let mut hits = Vec::new();
        for record in records {
            let haystack = self
                .field
                .value(record)
                .ok_or_else(|| WadboostError::malformed(record.label(), self.field.as_str()))?;
            if haystack.to_lowercase().contains(&needle) {
                hits.push(record.clone());
            }
        }

        if let Some(sort) = self.sort {
            for record in &hits {
                sort.require(record)?;
            }
            // stable, ties keep input order
            hits.sort_by(|a, b| sort.compare(a, b));
        }
        if self.direction == SortDirection::Desc {
            hits.reverse();
        }

        crate::filter::chain(hits, &self.filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Arg;

    fn rec(filename: &str, title: &str, date: &str, rating: f64) -> Record {
        Record {
            filename: Some(filename.to_string()),
            title: Some(title.to_string()),
            date: Some(date.to_string()),
            rating: Some(rating),
            ..Default::default()
        }
    }

    fn records() -> Vec<Record> {
        vec![
            rec("hr.zip", "Hell Revealed", "1997-04-01", 4.5),
            rec("av.zip", "Alien Vendetta", "2000-06-24", 4.5),
            rec("mm.zip", "Memento Mori", "1996-05-21", 4.2),
            rec("hr2.zip", "Hell Revealed II", "2002-09-20", 3.8),
            rec("scythe.zip", "Scythe", "2003-10-15", 4.5),
        ]
    }

    fn files(records: &[Record]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r.filename.as_deref().unwrap_or(""))
            .collect()
    }

    #[test]
    fn test_case_insensitive_match() {
        let out = LocalSearch::new("HELL", SearchField::Title)
            .run(&records())
            .unwrap();
        assert_eq!(files(&out), vec!["hr.zip", "hr2.zip"]);
    }

    #[test]
    fn test_stable_sort_keeps_tie_order() {
        let out = LocalSearch::new("", SearchField::Title)
            .sort_by(SortField::Rating, SortDirection::Asc)
            .run(&records())
            .unwrap();
        assert_eq!(
            files(&out),
            vec!["hr2.zip", "mm.zip", "hr.zip", "av.zip", "scythe.zip"]
        );
    }

    #[test]
    fn test_descending_is_full_reversal() {
        let asc = LocalSearch::new("", SearchField::Title)
            .sort_by(SortField::Date, SortDirection::Asc)
            .run(&records())
            .unwrap();
        let desc = LocalSearch::new("", SearchField::Title)
            .sort_by(SortField::Date, SortDirection::Desc)
            .run(&records())
            .unwrap();
        let mut reversed = asc.clone();
        reversed.reverse();
        assert_eq!(desc, reversed);
        assert_eq!(files(&desc)[0], "scythe.zip");
    }

    #[test]
    fn test_filters_run_after_sort() {
        let out = LocalSearch::new("", SearchField::Filename)
            .sort_by(SortField::Filename, SortDirection::Asc)
            .with_filters(vec![Filter::Year(Arg::Range(1996, 2000))])
            .run(&records())
            .unwrap();
        assert_eq!(files(&out), vec!["av.zip", "hr.zip", "mm.zip"]);
    }

    #[test]
    fn test_missing_search_field_is_malformed() {
        let mut input = records();
        input[1].title = None;
        let result = LocalSearch::new("x", SearchField::Title).run(&input);
        assert!(matches!(
            result,
            Err(WadboostError::MalformedRecord { field: "title", .. })
        ));
    }

    #[test]
    fn test_parse_vocabulary() {
        assert_eq!("Author".parse::<SearchField>().unwrap(), SearchField::Author);
        assert_eq!("size".parse::<SortField>().unwrap(), SortField::Size);
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }
}
