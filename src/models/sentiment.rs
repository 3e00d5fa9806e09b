use crate::client::sanitizer::deserialize_finite;
use crate::models::fundamental::MarketSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// `POST /sentiment_analysis` body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SentimentRequest {
    pub ticker: String,
    pub company_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentEnvelope {
    pub data: SentimentReport,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentReport {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub news_sources: NewsSourceCounts,
    #[serde(default)]
    pub market_metrics: MarketSnapshot,
    pub sentiment_analysis: SentimentAnalysis,
    #[serde(default)]
    pub recent_articles: Vec<SourceArticle>,
}

impl SentimentReport {
    pub fn recommendation(&self) -> TradeSignal {
        TradeSignal::classify(
            self.sentiment_analysis
                .combined_analysis
                .overall_recommendation
                .as_deref(),
        )
    }

    pub fn confidence(&self) -> Option<f64> {
        self.sentiment_analysis.combined_analysis.confidence
    }
}

/// Articles pulled per news source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewsSourceCounts {
    #[serde(default)]
    pub yahoo_finance: u32,
    #[serde(default)]
    pub newsapi: u32,
    #[serde(default)]
    pub gnews: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SentimentAnalysis {
    #[serde(default)]
    pub financial_sentiment: FinancialSentiment,
    #[serde(default)]
    pub news_sentiment: NewsSentiment,
    #[serde(default)]
    pub combined_analysis: CombinedAnalysis,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FinancialSentiment {
    #[serde(default)]
    pub overall: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewsSentiment {
    #[serde(default)]
    pub overall: Option<String>,
    #[serde(default)]
    pub source_analysis: SourceSentiment,
    #[serde(default)]
    pub market_perception: Option<String>,
    #[serde(default)]
    pub notable_events: Vec<String>,
    #[serde(default)]
    pub key_topics: Vec<String>,
}

/// Tone label per news source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceSentiment {
    #[serde(default)]
    pub yahoo_finance: Option<String>,
    #[serde(default)]
    pub newsapi: Option<String>,
    #[serde(default)]
    pub gnews: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CombinedAnalysis {
    #[serde(default)]
    pub overall_recommendation: Option<String>,
    /// 0..=100
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub risk_assessment: RiskAssessment,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub key_risks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceArticle {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
}

// ── Labels ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

impl Tone {
    pub fn classify(label: Option<&str>) -> Self {
        match label.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("POSITIVE") => Tone::Positive,
            Some("NEGATIVE") => Tone::Negative,
            Some("NEUTRAL") => Tone::Neutral,
            _ => Tone::Unknown,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Positive => write!(f, "Positive"),
            Tone::Negative => write!(f, "Negative"),
            Tone::Neutral => write!(f, "Neutral"),
            Tone::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Anything that is not BUY or SELL reads as HOLD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
}

impl TradeSignal {
    pub fn classify(label: Option<&str>) -> Self {
        match label.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("BUY") => TradeSignal::Buy,
            Some("SELL") => TradeSignal::Sell,
            _ => TradeSignal::Hold,
        }
    }
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSignal::Buy => write!(f, "BUY"),
            TradeSignal::Sell => write!(f, "SELL"),
            TradeSignal::Hold => write!(f, "HOLD"),
        }
    }
}
