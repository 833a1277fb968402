use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod columns;
mod controller;
mod domain;
mod inputter;
mod model;
mod post;
mod source;
mod table;
mod ui;

use controller::Controller;
use domain::{DEFAULT_PAGE_SIZE, DEFAULT_URL, PAGE_SIZES, TVConfig, TVError};
use model::{Model, Status};
use source::{FileSource, HttpSource, PostSource};
use ui::TableUI;

/// Paginated, sortable terminal view of posts fetched from a JSON endpoint.
#[derive(Parser, Debug)]
#[command(name = "ptv", version, about, long_about = None)]
struct Cli {
    /// Endpoint returning a JSON array of posts
    #[arg(long, env = "PTV_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Read posts from a local JSON file instead of the endpoint
    #[arg(long, short = 'f', conflicts_with = "url")]
    file: Option<String>,

    /// Rows per page
    #[arg(long, short = 's', default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_page_size)]
    page_size: usize,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Terminal event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll: u64,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    let size: usize = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if PAGE_SIZES.contains(&size) {
        Ok(size)
    } else {
        Err(format!("page size must be one of {PAGE_SIZES:?}"))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = run(cli);
    ratatui::restore();
    match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_tracing(cli: &Cli) -> Result<(), TVError> {
    // The terminal belongs to the ui, only log into a file
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn build_source(cli: &Cli, cfg: &TVConfig) -> Result<Arc<dyn PostSource>, TVError> {
    let source: Arc<dyn PostSource> = match &cli.file {
        Some(path) => Arc::new(FileSource::new(path)?),
        None => Arc::new(HttpSource::new(cfg.url.clone(), cfg.request_timeout)?),
    };
    Ok(source)
}

fn run(cli: Cli) -> Result<(), TVError> {
    init_tracing(&cli)?;

    let cfg = TVConfig::default()
        .with_url(cli.url.clone())
        .with_page_size(cli.page_size)
        .with_request_timeout(Duration::from_secs(cli.timeout))
        .with_event_poll_time(cli.poll);
    info!("Starting ptv with {cfg:?}");

    let source = build_source(&cli, &cfg)?;
    let mut model = Model::init(&cfg, source)?;
    let mut ui = TableUI::new();
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    info!("Quitting ptv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_must_be_selectable() {
        assert_eq!(parse_page_size("50"), Ok(50));
        assert!(parse_page_size("20").is_err());
        assert!(parse_page_size("ten").is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["ptv"]).unwrap();
        assert_eq!(cli.page_size, 30);
        assert_eq!(cli.timeout, 10);
        assert!(cli.file.is_none());
    }

    #[test]
    fn cli_reads_file_and_page_size() {
        let cli = Cli::try_parse_from(["ptv", "--file", "~/posts.json", "-s", "100"]).unwrap();
        assert_eq!(cli.file.as_deref(), Some("~/posts.json"));
        assert_eq!(cli.page_size, 100);
        assert!(Cli::try_parse_from(["ptv", "-s", "7"]).is_err());
    }

    #[test]
    fn file_source_is_preferred_when_given() {
        let cli = Cli::try_parse_from(["ptv", "--file", "tests/fixtures/posts.json"]).unwrap();
        let source = build_source(&cli, &TVConfig::default()).unwrap();
        assert_eq!(source.describe(), "tests/fixtures/posts.json");
    }
}
