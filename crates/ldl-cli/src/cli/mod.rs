//! CLI for the ldl batch downloader.

mod fmt;
mod view;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use ldl_core::config;
use ldl_core::list::{self, ListFile};
use ldl_core::scheduler::{PacingBounds, SchedulerOptions, SourceMutator, TransferScheduler};
use ldl_core::transfer::AuthRewrite;

use view::ConsoleView;

/// Download every link in a list file, resuming partial files across runs.
#[derive(Debug, Parser)]
#[command(name = "ldl")]
#[command(about = "ldl: resumable batch downloader for link lists", long_about = None)]
pub struct Cli {
    /// Path to the link list (.txt with optional caption lines, or .m3u/.m3u8).
    pub list_file: PathBuf,

    /// Destination directory. Defaults to a folder named after the list file,
    /// next to it.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Run up to N transfers concurrently.
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Scheduler poll interval in milliseconds.
    #[arg(long, value_name = "MS")]
    pub poll_ms: Option<u64>,

    /// Prefix downloaded filenames with their position in the list.
    #[arg(long)]
    pub num: bool,

    /// Lower bound of the pause after each finished transfer, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub min_pause_ms: Option<u64>,

    /// Upper bound of the pause after each finished transfer, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub max_pause_ms: Option<u64>,

    /// Extra request header, as "Name: value". Repeatable.
    #[arg(long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// What to do with credentials embedded in URLs.
    #[arg(long, value_enum, default_value = "keep")]
    pub auth: AuthMode,

    /// Remove each link from the list file once its download succeeds.
    #[arg(long)]
    pub prune_list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthMode {
    /// Leave credentials in the URL.
    Keep,
    /// Send credentials as a Basic header and strip them from the URL.
    Move,
    /// Send credentials as a Basic header and keep them in the URL too.
    Copy,
}

impl From<AuthMode> for AuthRewrite {
    fn from(mode: AuthMode) -> Self {
        match mode {
            AuthMode::Keep => AuthRewrite::None,
            AuthMode::Move => AuthRewrite::MoveToHeader,
            AuthMode::Copy => AuthRewrite::CopyToHeader,
        }
    }
}

pub async fn run_from_args() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = config::load_or_init().context("failed to load configuration")?;

    let entries = list::parse_list_file(&cli.list_file)?;
    if entries.is_empty() {
        bail!("no links found in {}", cli.list_file.display());
    }
    tracing::info!(
        list = %cli.list_file.display(),
        entries = entries.len(),
        "list parsed"
    );
    println!("Links found: {}", entries.len());

    let dest_dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => default_dest_dir(&cli.list_file),
    };
    fs::create_dir_all(&dest_dir)
        .with_context(|| format!("failed to create {}", dest_dir.display()))?;

    let opts = SchedulerOptions {
        dest_dir,
        max_concurrent: cli.jobs.unwrap_or(cfg.max_parallel),
        poll_interval: Duration::from_millis(cli.poll_ms.unwrap_or(cfg.poll_interval_ms)),
        numerate_files: cli.num || cfg.numerate_files,
        pacing: PacingBounds::new(
            cli.min_pause_ms.or(cfg.min_pause_ms),
            cli.max_pause_ms.or(cfg.max_pause_ms),
        ),
        headers: parse_headers(&cli.headers)?,
        auth_mode: cli.auth.into(),
    };
    tracing::info!(
        dir = %opts.dest_dir.display(),
        jobs = opts.max_concurrent,
        prune_list = cli.prune_list,
        "starting downloads"
    );

    let mut list_file = ListFile::new(&cli.list_file);
    let mutator: Option<&mut dyn SourceMutator> = if cli.prune_list {
        Some(&mut list_file)
    } else {
        None
    };

    let total = entries.len();
    let mut scheduler = TransferScheduler::new(opts);
    scheduler.add(entries);

    let mut view = ConsoleView::new(total);
    let summary = scheduler.run(&mut view, mutator).await;
    view.finish();

    println!("Downloaded: {}, Error: {}", summary.ok, summary.failed);
    Ok(())
}

/// Sibling folder named after the list file's stem, e.g. `links.txt` -> `links/`.
fn default_dest_dir(list_file: &Path) -> PathBuf {
    let stem = list_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "downloads".to_string());
    match list_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(stem),
        _ => PathBuf::from(stem),
    }
}

fn parse_headers(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    for item in raw {
        let (name, value) = item
            .split_once(':')
            .with_context(|| format!("invalid header {item:?}, expected \"Name: value\""))?;
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            bail!("invalid header {item:?}, empty name");
        }
        headers.insert(name.to_string(), value.to_string());
    }
    Ok(headers)
}
