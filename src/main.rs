use anyhow::Result;
use clap::Parser;
use proxy_sweep::{
    logging,
    tui::TerminalProgress,
    Config, Paths, Pipeline, ProgressObserver, SilentProgress,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Scrape public proxy lists and keep the proxies that actually work
#[derive(Parser)]
#[command(name = "proxy-sweep")]
#[command(about = "Scrapes public proxy lists and verifies HTTP and SOCKS5 proxies concurrently")]
struct Cli {
    /// Configuration file; missing means defaults
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Geolocation and anonymity checks with a latency threshold
    #[arg(long)]
    strict: bool,

    /// Write pipe-delimited records (requires strict mode)
    #[arg(long)]
    detailed: bool,

    /// Directory holding http.txt and socks5.txt source lists
    #[arg(long, default_value = "sources")]
    sources_dir: PathBuf,

    /// Directory the working proxies are written to
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Log file, appended to
    #[arg(long, default_value = "proxy_checker.log")]
    log_file: PathBuf,

    /// Do not print progress
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = logging::init(&cli.log_file)?;

    let mut config = Config::load(&cli.config).map_err(|e| {
        error!("Error loading config: {:#}", e);
        e
    })?;
    if cli.strict {
        config.checker.strict_check = true;
    }
    if cli.detailed {
        config.checker.detailed_output = true;
    }
    config.checker.detailed_output &= config.checker.strict_check;

    if !cli.quiet {
        println!("🚀 Proxy Scraper and Checker Started");
        if config.checker.strict_check {
            println!("Active parameters:");
            println!("  • Strict checking mode enabled");
            if config.checker.detailed_output {
                println!("  • Detailed output mode enabled");
            }
            println!();
        }
    }

    let observer: Arc<dyn ProgressObserver> = if cli.quiet {
        Arc::new(SilentProgress)
    } else {
        Arc::new(TerminalProgress::new())
    };

    let paths = Paths {
        sources_dir: cli.sources_dir,
        output_dir: cli.output_dir,
    };

    let summary = Pipeline::new(config, paths)
        .with_observer(observer)
        .run()
        .await
        .map_err(|e| {
            error!("Run aborted: {:#}", e);
            e
        })?;

    info!(
        "Run complete: {}/{} HTTP and {}/{} SOCKS5 proxies working",
        summary.http.working, summary.http.total, summary.socks5.working, summary.socks5.total
    );
    if !cli.quiet {
        println!("\n✨ Proxy scraping and checking completed");
    }

    Ok(())
}
