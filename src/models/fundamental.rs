use crate::client::sanitizer::deserialize_finite;
use crate::utils::strip_time_component;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `analysis` part of `GET /fundamental_analysis`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundamentalReport {
    #[serde(default)]
    pub company_info: CompanyProfile,
    #[serde(default)]
    pub analysis_date: Option<String>,
    #[serde(default)]
    pub market_metrics: MarketSnapshot,
    pub growth_metrics: MetricCategory,
    pub profitability_metrics: MetricCategory,
    pub efficiency_metrics: MetricCategory,
}

impl FundamentalReport {
    /// Categories in display order.
    pub fn categories(&self) -> [(&'static str, &MetricCategory); 3] {
        [
            ("Growth", &self.growth_metrics),
            ("Profitability", &self.profitability_metrics),
            ("Efficiency", &self.efficiency_metrics),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompanyProfile {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub employees: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketSnapshot {
    #[serde(default)]
    pub current: MarketMetrics,
}

/// Valuation snapshot. Shared with the sentiment report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketMetrics {
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub pe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub forward_pe: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub price_to_book: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub price_to_sales: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub dividend_yield: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub peg_ratio: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub beta: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub avg_volume: Option<f64>,
}

/// One of growth / profitability / efficiency.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricCategory {
    #[serde(default)]
    pub time_series: Vec<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, Vec<MetricPoint>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricPoint {
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub value: Option<f64>,
    #[serde(default)]
    pub period: String,
}

impl MetricPoint {
    /// Period without the trailing ` 00:00:00`.
    pub fn period_label(&self) -> &str {
        strip_time_component(&self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_metric_value_is_none() {
        let cat: MetricCategory = serde_json::from_str(
            r#"{"time_series": ["2023-09-30 00:00:00"],
                "metrics": {"revenue_growth": [
                    {"value": null, "period": "2023-09-30 00:00:00"},
                    {"value": "NaN", "period": "2022-09-30 00:00:00"},
                    {"value": 7.8, "period": "2021-09-30"}
                ]}}"#,
        )
        .unwrap();
        let points = &cat.metrics["revenue_growth"];
        assert_eq!(points[0].value, None);
        assert_eq!(points[1].value, None);
        assert_eq!(points[2].value, Some(7.8));
        assert_eq!(points[0].period_label(), "2023-09-30");
        assert_eq!(points[2].period_label(), "2021-09-30");
    }
}
