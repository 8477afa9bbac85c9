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

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use wadboost::api::{Action, SearchParams};
use wadboost::display;
use wadboost::downloader::{DownloadConfig, DownloadEngine, Mirror};
use wadboost::filter::FilterKind;
use wadboost::search::{LocalSearch, SearchField, SortDirection, SortField};
use wadboost::{logging, ApiClient, Config, Filter, Game};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\n",
    "Copyright (C) 2025  compiledkernel-idk and wadboost contributors\n",
    "License GPLv3+: GNU GPL version 3 or later <https://gnu.org/licenses/gpl.html>\n\n",
    "This is free software; you are free to change and redistribute it.\n",
    "There is NO WARRANTY, to the extent permitted by law."
);

#[derive(Parser)]
#[command(name = "wadboost")]
#[command(version = VERSION)]
#[command(long_version = LONG_VERSION)]
#[command(about = "Doomworld /idgames archive client and mirror downloader.")]
struct Cli {
    /// Mirror name, origin URL or FTP host (see `wadboost mirrors`)
    #[arg(long, global = true)]
    mirror: Option<String>,
    /// Folder to download into
    #[arg(long, global = true)]
    dest: Option<PathBuf>,
    /// Fail instead of creating a missing destination folder
    #[arg(long, global = true)]
    no_subfolder: bool,
    /// Seconds to wait between files in a batch
    #[arg(long, global = true)]
    delay: Option<u64>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the archive
    Search {
        query: String,
        /// Field to search in
        #[arg(long, default_value = "title")]
        field: SearchField,
        #[arg(long)]
        sort: Option<SortField>,
        #[arg(long)]
        desc: bool,
        /// Client-side filter, `kind=arg` (date, game, year, rating, size, votes, gyr)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },
    /// List the files of an archive directory, optionally narrowed locally
    List {
        dir: String,
        /// Only files whose field contains this text
        #[arg(long = "match")]
        query: Option<String>,
        #[arg(long, default_value = "title")]
        field: SearchField,
        #[arg(long)]
        sort: Option<SortField>,
        #[arg(long)]
        desc: bool,
        #[arg(short, long = "filter")]
        filters: Vec<String>,
        /// Show subdirectories instead of files
        #[arg(long)]
        dirs: bool,
    },
    /// Show file details by id or archive path
    Info {
        ids: Vec<u64>,
        /// Archive path, e.g. levels/doom2/Ports/megawads/av.zip
        #[arg(long)]
        path: Option<String>,
        /// Print the raw API envelope
        #[arg(long)]
        raw: bool,
    },
    /// Latest uploads, or latest reviews with --votes
    Latest {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        votes: bool,
    },
    /// Pick a random level
    Random {
        #[arg(long)]
        game: Option<Game>,
    },
    /// Download files by id
    Get { ids: Vec<u64> },
    /// Download a file by name, looking it up in the game's level folders
    Fetch {
        filename: String,
        #[arg(long, default_value = "doom2")]
        game: Game,
    },
    /// Download every file in a directory released in a given year
    Year { year: i32, dir: String },
    /// List known mirrors
    Mirrors,
    /// Check the API and its database
    Ping,
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Parse `kind=arg` filter flags; dates must be real calendar dates
fn parse_filters(specs: &[String]) -> Result<Vec<Filter>> {
    specs
        .iter()
        .map(|spec| -> Result<Filter> {
            let filter = Filter::parse_pair(spec)?;
            if let Filter::Date(date) = &filter {
                NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .with_context(|| format!("invalid {} filter '{}'", FilterKind::Date, date))?;
            }
            Ok(filter)
        })
        .collect()
}

fn direction(desc: bool) -> SortDirection {
    if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    }
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load().context("cannot load configuration")?;
    if let Some(mirror) = &cli.mirror {
        config.download.mirror = mirror.clone();
    }
    if let Some(dest) = &cli.dest {
        config.download.dir = dest.clone();
    }
    if cli.no_subfolder {
        config.download.make_subfolder = false;
    }
    if let Some(delay) = cli.delay {
        config.download.delay_secs = delay;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    logging::init(&config.logging);

    let api = ApiClient::from_config(&config)?;

    match cli.command {
        Command::Search {
            query,
            field,
            sort,
            desc,
            filters,
        } => {
            let mut params = SearchParams::new(query).field(field).direction(direction(desc));
            if let Some(sort) = sort {
                params = params.sort(sort)?;
            }
            for filter in parse_filters(&filters)? {
                params = params.filter(filter);
            }

            let pb = spinner("searching...");
            let results = api.search(params).await;
            pb.finish_and_clear();
            let results = results?;

            if results.is_empty() {
                println!("no matches found.");
            } else {
                println!("{}", display::records_table(&results));
            }
        }
        Command::List {
            dir,
            query,
            field,
            sort,
            desc,
            filters,
            dirs,
        } => {
            if dirs {
                println!("{}", display::dirs_table(&api.get_dirs(&dir).await?));
                return Ok(());
            }

            let files = api.get_files(&dir).await?;
            let mut local = LocalSearch::new(query.unwrap_or_default(), field)
                .with_filters(parse_filters(&filters)?);
            if let Some(sort) = sort {
                local = local.sort_by(sort, direction(desc));
            }
            let results = local.run(&files)?;
            println!("{}", display::records_table(&results));
        }
        Command::Info { ids, path, raw } => {
            if ids.is_empty() && path.is_none() {
                return Err(anyhow!("no file id or --path given"));
            }
            let mut actions: Vec<Action> = ids.into_iter().map(Action::GetId).collect();
            if let Some(path) = path {
                actions.push(Action::GetFile(path));
            }

            for action in actions {
                if raw {
                    println!("{}", serde_json::to_string_pretty(&api.call(&action).await?)?);
                    continue;
                }
                let record = match action {
                    Action::GetId(id) => api.get_id(id).await,
                    Action::GetFile(ref path) => api.get_file(path).await,
                    _ => continue,
                };
                match record {
                    Ok(r) => display::print_record(&r),
                    Err(e) => eprintln!("{} {}", style("error:").red().bold(), e),
                }
            }
        }
        Command::Latest { limit, votes } => {
            if votes {
                println!("{}", display::votes_table(&api.latest_votes(limit).await?));
            } else {
                println!("{}", display::records_table(&api.latest_files(limit).await?));
            }
        }
        Command::Random { game } => {
            let pb = spinner("rolling...");
            let record = api.random_record(game).await;
            pb.finish_and_clear();
            display::print_record(&record?);
        }
        Command::Get { ids } => {
            if ids.is_empty() {
                return Err(anyhow!("no file ids given"));
            }
            let engine = DownloadEngine::new(DownloadConfig::from_config(&config)?, api)?;
            let report = engine.download_ids(&ids).await?;
            display::print_report(&report);
        }
        Command::Fetch { filename, game } => {
            let engine = DownloadEngine::new(DownloadConfig::from_config(&config)?, api)?;
            let outcome = engine.download_filename(&filename, game).await?;
            display::print_outcome(&outcome);
        }
        Command::Year { year, dir } => {
            let engine = DownloadEngine::new(DownloadConfig::from_config(&config)?, api)?;
            let report = engine.download_year(year, &dir).await?;
            display::print_report(&report);
        }
        Command::Mirrors => {
            println!("{}", display::mirrors_table());
            let current: Mirror = config.download.mirror.parse()?;
            println!("{} using {}", style("::").cyan().bold(), style(current).bold());
        }
        Command::Ping => {
            let up = api.ping().await?.is_up();
            let db = api.dbping().await?.is_up();
            let mark = |ok: bool| {
                if ok {
                    style("up").green().bold()
                } else {
                    style("down").red().bold()
                }
            };
            println!("api      : {}", mark(up));
            println!("database : {}", mark(db));
            if let Ok(about) = api.about().await {
                if let Some(info) = about.info {
                    println!("{}", info);
                }
            }
        }
    }

    Ok(())
}
