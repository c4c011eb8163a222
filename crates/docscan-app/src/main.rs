// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan — command-line host for the document scanner plugin.
//
// Entry point. Initialises logging, resolves configuration, and runs one
// plugin call against a folder of page images standing in for the camera.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use docscan_core::config::ScannerConfig;
use docscan_plugin::PLUGIN_VERSION;

use services::cache_dir;
use services::scan_service::ScanService;

#[derive(Parser, Debug)]
#[command(
    name = "docscan",
    version,
    about = "Scan document pages from a folder and return them inline or as cached files"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one scan over the images in a folder.
    Scan(ScanArgs),
    /// Print the plugin version as JSON.
    Version,
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Folder whose images are treated as the scanned pages, in name order.
    #[arg(long, env = "DOCSCAN_PAGES")]
    pages: PathBuf,

    /// How pages are returned.
    #[arg(long, value_enum, default_value = "file-path")]
    format: FormatArg,

    /// JPEG quality 0-100; 100 returns the engine's bytes unchanged.
    #[arg(short, long)]
    quality: Option<i64>,

    /// Maximum number of pages (1-24).
    #[arg(long)]
    max_pages: Option<i64>,

    /// Disable manual crop adjustment.
    #[arg(long)]
    no_crop: bool,

    /// Cache directory for file-path output.
    #[arg(long, env = "DOCSCAN_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Settings file (JSON).
    #[arg(long, env = "DOCSCAN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Inline,
    FilePath,
}

impl ScanArgs {
    /// Bridge options object, as an application shell would send it.
    fn options(&self) -> Value {
        let mut options = Map::new();
        let format = match self.format {
            FormatArg::Inline => "inline",
            FormatArg::FilePath => "filePath",
        };
        options.insert("responseFormat".into(), json!(format));
        if let Some(quality) = self.quality {
            options.insert("quality".into(), json!(quality));
        }
        if let Some(max_pages) = self.max_pages {
            options.insert("pageLimit".into(), json!(max_pages));
        }
        options.insert("allowManualCrop".into(), json!(!self.no_crop));
        Value::Object(options)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Version => {
            println!("{}", version_json());
            ExitCode::SUCCESS
        }
        Command::Scan(args) => run_scan(args),
    }
}

fn version_json() -> Value {
    json!({ "version": PLUGIN_VERSION })
}

fn run_scan(args: ScanArgs) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let cache = cache_dir::cache_dir(args.cache_dir.as_deref());
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| cache_dir::default_config_path(&cache));
    let config = ScannerConfig::load(&config_path);

    tracing::info!(version = PLUGIN_VERSION, "docscan starting");

    let outcome = runtime.block_on(async {
        let service = ScanService::start(&args.pages, cache, config);
        tracing::debug!(cache = %service.cache_dir().display(), "scan service ready");
        service.scan(&args.options()).await
    });

    match outcome {
        Ok(result) => {
            println!("{result}");
            ExitCode::SUCCESS
        }
        Err(rejection) => {
            match serde_json::to_string(&rejection) {
                Ok(body) => eprintln!("{body}"),
                Err(_) => eprintln!("{rejection}"),
            }
            ExitCode::FAILURE
        }
    }
}
