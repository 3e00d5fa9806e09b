mod client;
mod config;
mod dashboard;
mod display;
mod error;
mod models;
#[cfg(test)]
mod testing;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::client::parsers::parse_sanitized;
use crate::client::{AnalysisSource, ApiClient};
use crate::config::AppConfig;
use crate::dashboard::{ChartSeries, ChatSession, Dashboard, UploadOutcome, submit_search};
use crate::error::ApiError;
use crate::models::{DocumentUpload, TechnicalQuery};

#[derive(Parser)]
#[command(name = "stock-overflow", about = "Stock analysis dashboard client", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Analysis API base URL, e.g. http://127.0.0.1:5000/api
    #[arg(long, global = true, env = "STOCK_OVERFLOW_API_URL")]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Load every dataset for a company, as the dashboard page does
    Dashboard {
        company: String,
        /// Also fetch news sentiment for this ticker
        #[arg(long)]
        sentiment: Option<String>,
        /// Company name sent with the sentiment request (defaults to <company>)
        #[arg(long)]
        name: Option<String>,
    },

    /// Price history with RSI / MACD
    Technical {
        company: String,
        /// Lookback, e.g. 1y, 5y
        #[arg(long)]
        period: Option<String>,
        /// Bar size, e.g. 1d, 1wk, 1mo
        #[arg(long)]
        interval: Option<String>,
        /// Rows to print (text mode)
        #[arg(long, default_value_t = display::TECHNICAL_TAIL)]
        rows: usize,
    },

    /// Growth, profitability and efficiency metrics
    Fundamental { company: String },

    /// Company profile plus financial statements
    Comprehensive { company: String },

    /// News and financial sentiment for a ticker
    Sentiment {
        ticker: String,
        #[arg(long)]
        name: String,
    },

    /// Chat about a company (reads prompts from stdin)
    Chat { company: String },

    /// Upload a PDF report and print its summary
    Summarize {
        file: PathBuf,
        #[arg(long)]
        company: Option<String>,
    },

    /// Search box: validate a term, optionally upload a PDF for it
    Search {
        term: String,
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Replace NaN / Infinity in a JSON file with null and print it
    Sanitize { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "stock_overflow=info,warn",
        1 => "stock_overflow=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    // Offline; needs no API configuration.
    if let Command::Sanitize { file } = &cli.command {
        let raw = std::fs::read_to_string(file).with_context(|| format!("reading {:?}", file))?;
        let value = parse_sanitized(&file.display().to_string(), &raw)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let config = AppConfig::load(cli.base_url.clone())?;
    info!("Using API at {}", config.api.base_url);
    let api = Arc::new(ApiClient::new(&config.api).context("building HTTP client")?);
    let json = cli.json;
    let base_url = config.api.base_url.clone();

    match cli.command {
        Command::Dashboard {
            company,
            sentiment,
            name,
        } => {
            let _t = utils::Timer::start(format!("Dashboard for {}", company));
            let dash = Dashboard::new(api).with_fetch_timeout(config.dashboard.fetch_timeout());
            dash.open(&company).await.wait().await;

            if let Some(ticker) = sentiment {
                let name = name.unwrap_or_else(|| company.clone());
                // The outcome is already recorded in the sentiment slot.
                let _ = dash.request_sentiment(&ticker, &name).await.await;
            }

            let state = dash.snapshot().await;
            if json {
                print_json(&state)?;
            } else {
                print!("{}", display::dashboard(&state));
            }
        }

        Command::Technical {
            company,
            period,
            interval,
            rows,
        } => {
            let query = TechnicalQuery { period, interval };
            let series = api
                .fetch_technical_analysis_with(&company, &query)
                .await
                .map_err(|e| explain(e, &base_url))?;
            let chart = ChartSeries::from_records(series.records);
            if json {
                print_json(&chart)?;
            } else {
                print!("{}", display::technical(&company, &chart, rows));
            }
        }

        Command::Fundamental { company } => {
            let report = api
                .fetch_fundamental_analysis(&company)
                .await
                .map_err(|e| explain(e, &base_url))?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", display::fundamental(&report));
            }
        }

        Command::Comprehensive { company } => {
            let report = api
                .fetch_comprehensive_analysis(&company)
                .await
                .map_err(|e| explain(e, &base_url))?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", display::comprehensive(&report));
            }
        }

        Command::Sentiment { ticker, name } => {
            let report = api
                .fetch_sentiment_analysis(&ticker, &name)
                .await
                .map_err(|e| explain(e, &base_url))?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", display::sentiment(&report));
            }
        }

        Command::Chat { company } => {
            let mut session = ChatSession::new(company.as_str());
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            eprintln!("Chatting about {} (Ctrl-D to quit)", company);

            while let Some(line) = lines.next_line().await? {
                if let Some(reply) = session.send(api.as_ref(), &line).await {
                    if json {
                        println!("{}", serde_json::to_string(reply)?);
                    } else {
                        println!("{}", display::chat_line(reply));
                    }
                }
            }
        }

        Command::Summarize { file, company } => {
            let mut document = read_document(&file)?;
            if let Some(company) = company {
                document = document.for_company(company);
            }
            let summary = api
                .upload_document_for_summary(document)
                .await
                .map_err(|e| explain(e, &base_url))?;
            if json {
                print_json(&summary)?;
            } else {
                print!("{}", display::upload_summary(&summary));
            }
        }

        Command::Search { term, pdf } => {
            let document = pdf.as_deref().map(read_document).transpose()?;
            let outcome = submit_search(api.as_ref(), &term, document).await?;
            if json {
                print_json(&outcome)?;
            } else {
                match &outcome.upload {
                    Some(UploadOutcome::Uploaded { summary }) => {
                        print!("{}", display::upload_summary(summary))
                    }
                    Some(UploadOutcome::Failed { error }) => eprintln!("Upload failed: {}", error),
                    None => {}
                }
                println!("Open dashboard for: {}", outcome.company);
            }
        }

        Command::Sanitize { .. } => unreachable!("handled before configuration is loaded"),
    }

    Ok(())
}

/// Point at the configured endpoint when the API could not be reached.
fn explain(err: ApiError, base_url: &str) -> anyhow::Error {
    if err.is_network() {
        anyhow::Error::new(err).context(format!("analysis API at {} is unavailable", base_url))
    } else {
        err.into()
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_document(path: &Path) -> Result<DocumentUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {:?}", path))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    DocumentUpload::new(filename, bytes).map_err(anyhow::Error::msg)
}
