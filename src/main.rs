//! Quantum Ballot - terminal client for the superdense-coding voting demo
//!
//! Walks a voter through the entangled-key and voting steps, then simulates
//! transmission over a secure and an intercepted channel by calling the
//! analysis service.

mod analysis;
mod ballot;
mod config;
mod navigation;
mod runtime;
mod ui;
mod view;

use analysis::{AnalysisRequest, AnalysisResult, AnalysisService, HttpAnalysisService, LoggingService};
use ballot::{vote_option, vote_option_for, InvalidBits, TwoBits};
use clap::Parser;
use config::{AppConfig, Cli, Command};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = AppConfig::from_args(&cli.common)?;

    match cli.command {
        Some(Command::Analyze {
            message,
            eve,
            export,
        }) => {
            init_stderr_logging();
            if let Err(e) = analyze_once(&config, &message, eve, export).await {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        None => {
            init_file_logging(&config.log_file)?;
            tracing::info!(
                service_url = %config.service_url,
                timeout_secs = config.timeout.map(|t| t.as_secs()),
                route = %cli.route,
                "Quantum Ballot starting"
            );
            let service = Arc::new(build_service(&config)?);
            ui::run(service, &cli.route, config.export_dir).await?;
        }
    }

    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// The wizard owns the terminal, so logs go to a file
fn init_file_logging(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quantum_ballot=info".into())
}

fn build_service(
    config: &AppConfig,
) -> Result<LoggingService<HttpAnalysisService>, analysis::AnalysisError> {
    let service = HttpAnalysisService::new(&config.service_url, config.timeout)?;
    tracing::info!(endpoint = %service.endpoint(), "Analysis service configured");
    Ok(LoggingService::new(service))
}

/// Accepts the bits themselves or a vote id such as `approve`
fn parse_message(input: &str) -> Result<TwoBits, InvalidBits> {
    let input = input.trim();
    match vote_option(&input.to_ascii_lowercase()) {
        Some(option) => Ok(option.sends),
        None => input.parse(),
    }
}

async fn analyze_once(
    config: &AppConfig,
    message: &str,
    include_eve: bool,
    export: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = AnalysisRequest::new(parse_message(message)?, include_eve);
    let service = build_service(config)?;
    let result = service.analyze(&request).await?;

    print!("{}", summary(&result));

    if export {
        let prefix = format!("analyze-{}", result.message);
        let paths = result.export(&config.export_dir, &prefix)?;
        for path in paths {
            println!("exported      {}", path.display());
        }
    }
    Ok(())
}

fn summary(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let title = vote_option_for(result.message).map_or("", |option| option.title);
    out.push_str(&format!("message       {} {title}\n", result.message));
    out.push_str(&format!("include_eve   {}\n", result.include_eve));
    out.push_str(&format!(
        "bloch sphere  {}\n",
        result.bloch_sphere_img.describe()
    ));

    let mut channels = vec![("secure", &result.secure)];
    if let Some(eve) = &result.eve {
        channels.push(("eve", eve));
    }
    for (name, channel) in channels {
        out.push_str(&format!(
            "{name:<14}decoded {} - {}\n",
            channel.counts.decoded(),
            channel.verdict(result.message).label()
        ));
        for (bits, shots) in channel.counts.shots() {
            out.push_str(&format!("  {bits}          {shots} shots\n"));
        }
        out.push_str(&format!(
            "  circuit     {}\n",
            channel.circuit_img.describe()
        ));
        out.push_str(&format!(
            "  histogram   {}\n",
            channel.histogram_img.describe()
        ));
    }
    out
}
