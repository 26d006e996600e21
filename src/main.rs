//! CLI entry point for spacefetch.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use spacefetch_core::endpoint::ImageSource;
use spacefetch_core::endpoint::apod::{ApodEndpoint, ApodRequest};
use spacefetch_core::endpoint::epic::{EpicEndpoint, EpicRequest};
use spacefetch_core::endpoint::mars::{MarsEndpoint, MarsRequest, PhotoDay};
use spacefetch_core::endpoint::neo::{NeoEndpoint, NeoRequest};
use spacefetch_core::endpoint::search::{SearchEndpoint, SearchRequest};
use spacefetch_core::fetch::{
    ApiClient, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, configure_http_timeouts,
};
use spacefetch_core::output::render;
use spacefetch_core::persist::ImageStore;
use spacefetch_core::record::RecordSet;
use tracing::{debug, info};

mod cli;
mod config;

use cli::{Args, Command};
use config::FileConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(command = ?args.command, "CLI arguments parsed");

    let file_config = config::load_default_file_config()?;
    configure_http_timeouts(
        file_config.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
        file_config.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
    );
    let api_key = config::resolve_api_key(args.api_key.as_deref(), &file_config);
    let client = ApiClient::new()?;

    let records = run_command(&args, &file_config, &client, &api_key).await?;

    let rendered = render(&records, args.format)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    if !rendered.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}

async fn run_command(
    args: &Args,
    file_config: &FileConfig,
    client: &ApiClient,
    api_key: &str,
) -> Result<RecordSet> {
    let output_root = args
        .output_dir
        .clone()
        .or_else(|| file_config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    match &args.command {
        Command::Apod {
            start,
            end,
            count,
            save,
        } => {
            let request = match (start, count) {
                (Some(start), _) => ApodRequest::Range {
                    start: *start,
                    end: *end,
                },
                (None, Some(count)) => ApodRequest::Random { count: *count },
                (None, None) => anyhow::bail!("either --start or --count is required"),
            };
            let records = ApodEndpoint::new().fetch(client, api_key, &request).await?;
            save_images(client, &output_root, save.as_deref(), &records, &request, args.quiet)
                .await?;
            Ok(records)
        }
        Command::Mars {
            rover,
            earth_date,
            sol,
            camera,
            save,
        } => {
            let day = match (earth_date, sol) {
                (Some(date), _) => PhotoDay::EarthDate(*date),
                (None, Some(sol)) => PhotoDay::Sol(*sol),
                (None, None) => anyhow::bail!("either --earth-date or --sol is required"),
            };
            let mut request = MarsRequest::new(rover.as_str(), day);
            if let Some(camera) = camera {
                request = request.with_camera(camera.as_str());
            }
            let records = MarsEndpoint::new().fetch(client, api_key, &request).await?;
            save_images(client, &output_root, save.as_deref(), &records, &request, args.quiet)
                .await?;
            Ok(records)
        }
        Command::Epic {
            date,
            collection,
            save,
        } => {
            let request = EpicRequest::new(*date).with_collection(*collection);
            let records = EpicEndpoint::new().fetch(client, api_key, &request).await?;
            save_images(client, &output_root, save.as_deref(), &records, &request, args.quiet)
                .await?;
            Ok(records)
        }
        Command::Neo { start, end } => {
            let request = NeoRequest::new(*start, *end);
            Ok(NeoEndpoint::new().fetch(client, api_key, &request).await?)
        }
        Command::Search {
            keyword,
            count,
            start,
            end,
        } => {
            let request = SearchRequest {
                keyword: keyword.clone(),
                n_results: *count,
                start_date: *start,
                end_date: *end,
            };
            Ok(SearchEndpoint::new().search(client, api_key, &request).await?)
        }
    }
}

async fn save_images<S: ImageSource>(
    client: &ApiClient,
    output_root: &Path,
    folder: Option<&Path>,
    records: &RecordSet,
    source: &S,
    quiet: bool,
) -> Result<()> {
    let Some(folder) = folder else {
        return Ok(());
    };
    let store = ImageStore::new(output_root, folder);
    let progress = save_progress(
        ImageStore::count_saveable(records, source.url_column()),
        quiet,
    );
    let saved = store
        .save_all_with(
            client,
            records,
            source.url_column(),
            source.name_column(),
            |path| {
                progress.set_message(path.display().to_string());
                progress.inc(1);
            },
        )
        .await
        .with_context(|| format!("Failed to save {} images", source.endpoint_name()))?;
    progress.finish_and_clear();
    info!(saved = saved.len(), dir = %store.dir().display(), "Images saved");
    Ok(())
}

fn save_progress(total: usize, quiet: bool) -> ProgressBar {
    if quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar
}
