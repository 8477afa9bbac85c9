/*
 * wadboost - Doomworld /idgames archive client and mirror downloader.
 * Copyright (C) 2025  compiledkernel-idk and wadboost contributors
 */

//! Terminal rendering of records, listings and download results.

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use console::style;

use crate::api::{Directory, Vote};
use crate::downloader::{BatchReport, Mirror, MirrorKind, TransferOutcome};
use crate::record::Record;

/// Human readable byte count
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KIB * KIB {
        format!("{:.2} MiB", b / KIB / KIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// One row per record
pub fn records_table(records: &[Record]) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(vec!["id", "title", "author", "date", "rating", "size", "file"]);
    for r in records {
        t.add_row(vec![
            or_dash(r.id),
            or_dash(r.title.as_deref()),
            or_dash(r.author.as_deref()),
            or_dash(r.date.as_deref()),
            r.rating.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string()),
            r.size.map(format_size).unwrap_or_else(|| "-".to_string()),
            match (&r.dir, &r.filename) {
                (Some(d), Some(f)) => format!("{}{}", d, f),
                (None, Some(f)) => f.clone(),
                _ => "-".to_string(),
            },
        ]);
    }
    t
}

/// Print every field of a record, key-sorted, with the text file last
pub fn print_record(record: &Record) {
    println!("{}", style(record.label()).bold().cyan());
    let fields = record.fields();
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in fields {
        println!("  {:width$} : {}", key, value, width = width);
    }
    if let Some(text) = &record.textfile {
        println!();
        println!("{}", style("textfile").bold());
        println!("{}", text);
    }
    println!();
}

pub fn dirs_table(dirs: &[Directory]) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(vec!["id", "directory"]);
    for d in dirs {
        t.add_row(vec![or_dash(d.id), or_dash(d.name.as_deref())]);
    }
    t
}

pub fn votes_table(votes: &[Vote]) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(vec!["file", "title", "vote", "review"]);
    for v in votes {
        t.add_row(vec![
            or_dash(v.file),
            or_dash(v.title.as_deref()),
            or_dash(v.vote),
            or_dash(v.reviewtext.as_deref()),
        ]);
    }
    t
}

pub fn mirrors_table() -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(vec!["name", "protocol", "address"]);
    for m in Mirror::ALL {
        let (proto, addr) = match m.kind() {
            MirrorKind::Http { origin } => ("http", origin.to_string()),
            MirrorKind::Ftp { host, base_path } => ("ftp", format!("{}/{}", host, base_path)),
        };
        t.add_row(vec![m.name().to_string(), proto.to_string(), addr]);
    }
    t
}

pub fn print_outcome(outcome: &TransferOutcome) {
    println!(
        "{} {} ({}) -> {}",
        style("::").green().bold(),
        outcome.filename,
        format_size(outcome.bytes),
        outcome.path.display()
    );
}

pub fn print_report(report: &BatchReport) {
    for outcome in &report.downloaded {
        print_outcome(outcome);
    }
    for err in &report.errors {
        eprintln!("{} {}", style("warning:").yellow().bold(), err);
    }
    println!(
        "{} {} file(s), {}",
        style("::").cyan().bold(),
        report.downloaded.len(),
        format_size(report.total_bytes())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MiB");
    }

    #[test]
    fn test_records_table_has_row_per_record() {
        let records = vec![
            Record {
                id: Some(1),
                title: Some("Scythe".to_string()),
                ..Default::default()
            },
            Record::default(),
        ];
        let rendered = records_table(&records).to_string();
        assert!(rendered.contains("Scythe"));
        assert_eq!(records_table(&records).row_iter().count(), 2);
    }

    #[test]
    fn test_mirrors_table_lists_all() {
        let rendered = mirrors_table().to_string();
        for m in Mirror::ALL {
            assert!(rendered.contains(m.name()));
        }
    }
}
