//! Page orchestrator: one company on screen, four independently loaded
//! datasets.
//!
//! ## Lifecycle
//!
//! `open(company)` resets technical / fundamental / comprehensive to
//!   `Loading` and fetches all three concurrently. Each fetch writes only its
//!   own slot, so one failure never blocks or cancels the others.
//!
//! `request_sentiment(ticker, name)` is user-triggered. Each call starts a
//!   fresh `Loading` transition and supersedes any request still in flight.
//!
//! Every write is tagged with the generation it was issued under. A response
//! that arrives after the page (or the sentiment request) moved on is dropped.

pub mod chart;
pub mod chat;
pub mod search;
pub mod slot;

use crate::client::AnalysisSource;
use crate::error::ApiError;
use crate::models::{ComprehensiveReport, FundamentalReport, SentimentReport};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub use self::chart::ChartSeries;
pub use self::chat::ChatSession;
pub use self::search::{UploadOutcome, submit_search};
pub use self::slot::Slot;
use self::slot::Dataset;

/// Everything the page renders from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub company: Option<String>,
    pub technical: Slot<ChartSeries>,
    pub fundamental: Slot<FundamentalReport>,
    pub comprehensive: Slot<ComprehensiveReport>,
    pub sentiment: Slot<SentimentReport>,
    #[serde(skip)]
    pub(crate) page_generation: u64,
    #[serde(skip)]
    pub(crate) sentiment_generation: u64,
}

type SlotOf<T> = fn(&mut DashboardState) -> &mut Slot<T>;
type GenerationOf = fn(&DashboardState) -> u64;

fn technical_slot(s: &mut DashboardState) -> &mut Slot<ChartSeries> {
    &mut s.technical
}
fn fundamental_slot(s: &mut DashboardState) -> &mut Slot<FundamentalReport> {
    &mut s.fundamental
}
fn comprehensive_slot(s: &mut DashboardState) -> &mut Slot<ComprehensiveReport> {
    &mut s.comprehensive
}
fn sentiment_slot(s: &mut DashboardState) -> &mut Slot<SentimentReport> {
    &mut s.sentiment
}
fn page_generation(s: &DashboardState) -> u64 {
    s.page_generation
}
fn sentiment_generation(s: &DashboardState) -> u64 {
    s.sentiment_generation
}

/// How a single fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Ready,
    Failed,
    /// Superseded before it resolved; nothing was written.
    Stale,
}

pub struct Dashboard {
    source: Arc<dyn AnalysisSource>,
    state: Arc<RwLock<DashboardState>>,
    fetch_timeout: Option<Duration>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn AnalysisSource>) -> Self {
        Self {
            source,
            state: Arc::new(RwLock::new(DashboardState::default())),
            fetch_timeout: None,
        }
    }

    /// Fail any fetch that has not resolved within `timeout`.
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Show `company`: reset every slot and start the three base fetches.
    pub async fn open(&self, company: &str) -> PageLoad {
        let generation = {
            let mut state = self.state.write().await;
            state.page_generation += 1;
            state.sentiment_generation += 1;
            state.company = Some(company.to_string());
            state.technical = Slot::Loading;
            state.fundamental = Slot::Loading;
            state.comprehensive = Slot::Loading;
            state.sentiment = Slot::Idle;
            state.page_generation
        };
        info!("Opening dashboard for {} (generation {})", company, generation);

        let technical = {
            let source = Arc::clone(&self.source);
            let company = company.to_string();
            self.spawn_fetch(
                Dataset::Technical,
                generation,
                page_generation,
                technical_slot,
                async move {
                    let series = source.fetch_technical_analysis(&company).await?;
                    Ok::<_, ApiError>(ChartSeries::from_records(series.records))
                },
            )
        };
        let fundamental = {
            let source = Arc::clone(&self.source);
            let company = company.to_string();
            self.spawn_fetch(
                Dataset::Fundamental,
                generation,
                page_generation,
                fundamental_slot,
                async move { source.fetch_fundamental_analysis(&company).await },
            )
        };
        let comprehensive = {
            let source = Arc::clone(&self.source);
            let company = company.to_string();
            self.spawn_fetch(
                Dataset::Comprehensive,
                generation,
                page_generation,
                comprehensive_slot,
                async move { source.fetch_comprehensive_analysis(&company).await },
            )
        };

        PageLoad {
            company: company.to_string(),
            handles: vec![
                (Dataset::Technical, technical),
                (Dataset::Fundamental, fundamental),
                (Dataset::Comprehensive, comprehensive),
            ],
        }
    }

    /// User-triggered sentiment fetch. Supersedes any earlier request.
    pub async fn request_sentiment(&self, ticker: &str, company_name: &str) -> JoinHandle<FetchOutcome> {
        let generation = {
            let mut state = self.state.write().await;
            state.sentiment_generation += 1;
            state.sentiment = Slot::Loading;
            state.sentiment_generation
        };
        debug!("Sentiment request for {} (generation {})", ticker, generation);

        let source = Arc::clone(&self.source);
        let ticker = ticker.to_string();
        let company_name = company_name.to_string();
        self.spawn_fetch(
            Dataset::Sentiment,
            generation,
            sentiment_generation,
            sentiment_slot,
            async move { source.fetch_sentiment_analysis(&ticker, &company_name).await },
        )
    }

    fn spawn_fetch<T, F>(
        &self,
        dataset: Dataset,
        generation: u64,
        current: GenerationOf,
        slot: SlotOf<T>,
        fetch: F,
    ) -> JoinHandle<FetchOutcome>
    where
        T: Send + Sync + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let timeout = self.fetch_timeout;

        tokio::spawn(async move {
            let result = with_timeout(timeout, fetch).await;

            let mut state = state.write().await;
            if current(&state) != generation {
                debug!("Dropping stale {} response (generation {})", dataset, generation);
                return FetchOutcome::Stale;
            }

            match result {
                Ok(data) => {
                    info!("{} ready", dataset);
                    *slot(&mut state) = Slot::Ready { data };
                    FetchOutcome::Ready
                }
                Err(e) => {
                    warn!("{} failed: {}", dataset, e);
                    *slot(&mut state) = Slot::Failed {
                        error: dataset.failure_message(&e),
                    };
                    FetchOutcome::Failed
                }
            }
        })
    }
}

async fn with_timeout<T, F>(limit: Option<Duration>, fetch: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .map_err(|_| ApiError::Timeout(limit))?,
        None => fetch.await,
    }
}

// ── Page load handle ──────────────────────────────────────────────────────────

/// The three base fetches of one `open` call. Dropping it does not cancel
/// them; the slots still fill in.
pub struct PageLoad {
    company: String,
    handles: Vec<(Dataset, JoinHandle<FetchOutcome>)>,
}

impl PageLoad {
    /// Wait for every base fetch to settle.
    pub async fn wait(self) -> LoadStats {
        let mut stats = LoadStats::default();

        for (dataset, handle) in self.handles {
            match handle.await {
                Ok(FetchOutcome::Ready) => stats.ready += 1,
                Ok(FetchOutcome::Failed) => stats.failed += 1,
                Ok(FetchOutcome::Stale) => stats.stale += 1,
                Err(e) => {
                    error!("Task panic for {} {}: {}", self.company, dataset, e);
                    stats.failed += 1;
                }
            }
        }

        info!(
            "{}: {} ready, {} failed, {} stale",
            self.company, stats.ready, stats.failed, stats.stale
        );
        stats
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub ready: usize,
    pub failed: usize,
    pub stale: usize,
}
