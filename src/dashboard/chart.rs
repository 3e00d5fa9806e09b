//! Technical series → parallel chart arrays.

use crate::models::TechnicalRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Column-oriented technical series, ascending by date. Every array has the
/// same length and index `i` of each comes from the same source record.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ChartSeries {
    pub dates: Vec<String>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_histogram: Vec<Option<f64>>,
}

impl ChartSeries {
    /// Sort by date (upstream order is not guaranteed), then project.
    pub fn from_records(mut records: Vec<TechnicalRecord>) -> Self {
        records.sort_by_cached_key(|r| sort_key(&r.date));

        let mut series = ChartSeries {
            dates: Vec::with_capacity(records.len()),
            close: Vec::with_capacity(records.len()),
            volume: Vec::with_capacity(records.len()),
            rsi: Vec::with_capacity(records.len()),
            macd: Vec::with_capacity(records.len()),
            macd_histogram: Vec::with_capacity(records.len()),
        };
        for r in records {
            series.dates.push(r.date);
            series.close.push(r.close);
            series.volume.push(r.volume);
            series.rsi.push(r.rsi);
            series.macd.push(r.macd);
            series.macd_histogram.push(r.macd_histogram);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Most recent close, if any.
    pub fn last_close(&self) -> Option<f64> {
        self.close.iter().rev().find_map(|c| *c)
    }
}

/// Parsed dates first in time order; unparseable dates last, by text.
fn sort_key(raw: &str) -> (bool, Option<NaiveDateTime>, String) {
    let parsed = parse_timestamp(raw);
    (parsed.is_none(), parsed, raw.to_string())
}

/// ISO date, ISO date-time, RFC 3339 or RFC 2822 (`Fri, 01 Mar 2024 00:00:00 GMT`).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }
    None
}
