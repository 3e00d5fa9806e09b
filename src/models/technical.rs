use crate::client::sanitizer::deserialize_finite;
use serde::{Deserialize, Serialize};

// ── Query ─────────────────────────────────────────────────────────────────────

/// Optional knobs of the technical endpoint. Server defaults: `5y` / `1mo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechnicalQuery {
    pub period: Option<String>,
    pub interval: Option<String>,
}

impl TechnicalQuery {
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::new();
        if let Some(period) = self.period.as_deref() {
            params.push(("period", period));
        }
        if let Some(interval) = self.interval.as_deref() {
            params.push(("interval", interval));
        }
        params
    }
}

// ── Series ────────────────────────────────────────────────────────────────────

/// `GET /technical_analysis` body. Records are not guaranteed sorted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnicalSeries {
    pub company: String,
    #[serde(rename = "technical_analysis")]
    pub records: Vec<TechnicalRecord>,
}

/// One daily row. Indicator warm-up rows carry no RSI/MACD.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnicalRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Close", default, deserialize_with = "deserialize_finite")]
    pub close: Option<f64>,
    #[serde(rename = "Volume", default, deserialize_with = "deserialize_finite")]
    pub volume: Option<f64>,
    #[serde(rename = "RSI", default, deserialize_with = "deserialize_finite")]
    pub rsi: Option<f64>,
    #[serde(rename = "MACD", default, deserialize_with = "deserialize_finite")]
    pub macd: Option<f64>,
    #[serde(rename = "MACD_hist", default, deserialize_with = "deserialize_finite")]
    pub macd_histogram: Option<f64>,
}
