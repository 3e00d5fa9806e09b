//! Wire contracts for the analysis API.
//!
//! Every numeric field that upstream may leave undefined is `Option<f64>` and
//! goes through [`deserialize_finite`](crate::client::sanitizer::deserialize_finite),
//! so a NaN never reaches a caller.

pub mod chat;
pub mod comprehensive;
pub mod fundamental;
pub mod sentiment;
pub mod summary;
pub mod technical;

use serde::{Deserialize, Serialize};

pub use chat::{ChatMessage, ChatReply, ChatRequest, Sender};
pub use comprehensive::ComprehensiveReport;
pub use fundamental::{FundamentalReport, MarketMetrics};
pub use sentiment::{SentimentEnvelope, SentimentReport, SentimentRequest, Tone};
pub use summary::{DocumentUpload, UploadSummary};
pub use technical::{TechnicalQuery, TechnicalRecord, TechnicalSeries};

// ── Envelope ──────────────────────────────────────────────────────────────────

/// `{company, analysis}` wrapper used by the fundamental and comprehensive
/// endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyEnvelope<T> {
    pub company: String,
    pub analysis: T,
}
