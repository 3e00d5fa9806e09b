use crate::client::sanitizer::{deserialize_finite, finite};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `analysis` part of `GET /analysis`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComprehensiveReport {
    pub info: CompanyInfo,
    #[serde(deserialize_with = "deserialize_table")]
    pub financials: Vec<LineItemRow>,
    #[serde(deserialize_with = "deserialize_table")]
    pub balance_sheet: Vec<LineItemRow>,
    #[serde(deserialize_with = "deserialize_table")]
    pub cashflow: Vec<LineItemRow>,
    #[serde(default, deserialize_with = "deserialize_table")]
    pub recommendations: Vec<LineItemRow>,
    #[serde(default, deserialize_with = "deserialize_table")]
    pub earnings: Vec<LineItemRow>,
    #[serde(default, deserialize_with = "deserialize_table")]
    pub dividends: Vec<LineItemRow>,
    #[serde(default, deserialize_with = "deserialize_table")]
    pub calendar: Vec<LineItemRow>,
    #[serde(default)]
    pub options: Vec<String>,
}

impl ComprehensiveReport {
    /// The line-item tables in display order.
    pub fn tables(&self) -> [(&'static str, &[LineItemRow]); 3] {
        [
            ("Financials", &self.financials),
            ("Balance Sheet", &self.balance_sheet),
            ("Cash Flow", &self.cashflow),
        ]
    }

    pub fn recommendation_trend(&self) -> Vec<Recommendation> {
        self.recommendations
            .iter()
            .filter_map(LineItemRow::recommendation)
            .collect()
    }
}

// ── Company profile ───────────────────────────────────────────────────────────

/// Company profile as delivered by the quote provider. Unlisted keys are kept
/// in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub long_business_summary: Option<String>,
    #[serde(default)]
    pub recommendation_key: Option<String>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub full_time_employees: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub enterprise_value: Option<f64>,
    #[serde(default, rename = "trailingPE", deserialize_with = "deserialize_finite")]
    pub trailing_pe: Option<f64>,
    #[serde(default, rename = "forwardPE", deserialize_with = "deserialize_finite")]
    pub forward_pe: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub price_to_book: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub price_to_sales_trailing12_months: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub peg_ratio: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub beta: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub dividend_yield: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub payout_ratio: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub gross_margins: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub operating_margins: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub profit_margins: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub return_on_assets: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub return_on_equity: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub total_revenue: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub revenue_growth: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub earnings_growth: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub total_cash: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub total_debt: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub debt_to_equity: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub current_ratio: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub free_cashflow: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub operating_cashflow: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub target_mean_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_finite")]
    pub fifty_two_week_low: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompanyInfo {
    pub fn display_name(&self) -> Option<&str> {
        self.long_name.as_deref().or(self.short_name.as_deref())
    }

    /// `(label, value)` pairs for the valuation block, in display order.
    pub fn key_figures(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("Market Cap", self.market_cap),
            ("Enterprise Value", self.enterprise_value),
            ("Trailing P/E", self.trailing_pe),
            ("Forward P/E", self.forward_pe),
            ("Price/Book", self.price_to_book),
            ("Price/Sales", self.price_to_sales_trailing12_months),
            ("PEG Ratio", self.peg_ratio),
            ("Beta", self.beta),
            ("Dividend Yield", self.dividend_yield),
            ("Payout Ratio", self.payout_ratio),
            ("Gross Margin", self.gross_margins),
            ("Operating Margin", self.operating_margins),
            ("Profit Margin", self.profit_margins),
            ("ROA", self.return_on_assets),
            ("ROE", self.return_on_equity),
            ("Revenue", self.total_revenue),
            ("Revenue Growth", self.revenue_growth),
            ("Earnings Growth", self.earnings_growth),
            ("Total Cash", self.total_cash),
            ("Total Debt", self.total_debt),
            ("Debt/Equity", self.debt_to_equity),
            ("Current Ratio", self.current_ratio),
            ("Free Cash Flow", self.free_cashflow),
            ("Operating Cash Flow", self.operating_cashflow),
            ("Price", self.current_price),
            ("Target Price", self.target_mean_price),
            ("52w High", self.fifty_two_week_high),
            ("52w Low", self.fifty_two_week_low),
            ("Employees", self.full_time_employees),
        ]
    }
}

// ── Line-item tables ──────────────────────────────────────────────────────────

/// One metric (`index`) with a column per reporting period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemRow {
    #[serde(default)]
    pub index: Option<String>,
    #[serde(flatten)]
    pub cells: Map<String, Value>,
}

impl LineItemRow {
    pub fn label(&self) -> &str {
        self.index.as_deref().unwrap_or("")
    }

    /// Column names in upstream order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Finite numeric cell, `None` for null, text or NaN.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.cells.get(column).and_then(Value::as_f64).and_then(finite)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.cells.get(column).and_then(Value::as_str)
    }

    /// Analyst counts, if this row is shaped like a recommendation row.
    pub fn recommendation(&self) -> Option<Recommendation> {
        let period = self
            .text("period")
            .or(self.index.as_deref())?
            .to_string();
        Some(Recommendation {
            period,
            strong_buy: self.number("strongBuy")?,
            buy: self.number("buy")?,
            hold: self.number("hold")?,
            sell: self.number("sell")?,
            strong_sell: self.number("strongSell")?,
        })
    }
}

/// Columns of a table, taken from its first row.
pub fn table_columns(rows: &[LineItemRow]) -> Vec<&str> {
    rows.first().map(|r| r.columns().collect()).unwrap_or_default()
}

/// Analyst recommendation counts for one period (`0m`, `-1m`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub period: String,
    pub strong_buy: f64,
    pub buy: f64,
    pub hold: f64,
    pub sell: f64,
    pub strong_sell: f64,
}

impl Recommendation {
    pub fn total(&self) -> f64 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }
}

/// Upstream writes an empty frame as `{}` rather than `[]`.
fn deserialize_table<'de, D>(deserializer: D) -> Result<Vec<LineItemRow>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(rows) => rows
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(D::Error::custom))
            .collect(),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        Value::Null => Ok(Vec::new()),
        other => Err(D::Error::custom(format!(
            "expected a list of rows, found {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(recommendations: Value) -> ComprehensiveReport {
        serde_json::from_value(json!({
            "info": {"longName": "Apple Inc.", "sector": "Technology", "marketCap": 2.9e12,
                     "trailingPE": null, "forwardPE": 28.1, "zip": "95014"},
            "financials": [
                {"index": "Total Revenue", "2023-09-30 00:00:00": 383285000000.0, "2022-09-30 00:00:00": null}
            ],
            "balance_sheet": {},
            "cashflow": [],
            "recommendations": recommendations,
            "options": ["2024-06-21"]
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_object_tables_and_extras() {
        let r = report(json!([]));
        assert!(r.balance_sheet.is_empty());
        assert!(r.earnings.is_empty());
        assert_eq!(r.info.display_name(), Some("Apple Inc."));
        assert_eq!(r.info.trailing_pe, None);
        assert_eq!(r.info.forward_pe, Some(28.1));
        assert_eq!(r.info.extra.get("zip"), Some(&json!("95014")));
        assert_eq!(r.options, vec!["2024-06-21"]);
    }

    #[test]
    fn test_line_item_cells_keep_order_and_null() {
        let r = report(json!([]));
        let row = &r.financials[0];
        assert_eq!(row.label(), "Total Revenue");
        assert_eq!(
            table_columns(&r.financials),
            vec!["2023-09-30 00:00:00", "2022-09-30 00:00:00"]
        );
        assert_eq!(row.number("2023-09-30 00:00:00"), Some(383285000000.0));
        assert_eq!(row.number("2022-09-30 00:00:00"), None);
    }

    #[test]
    fn test_recommendation_trend() {
        let r = report(json!([
            {"period": "0m", "strongBuy": 11, "buy": 21, "hold": 6, "sell": 0, "strongSell": 0},
            {"period": "-1m", "strongBuy": 10, "buy": null, "hold": 6, "sell": 0, "strongSell": 0}
        ]));
        let trend = r.recommendation_trend();
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].period, "0m");
        assert_eq!(trend[0].total(), 38.0);
    }

    #[test]
    fn test_non_list_table_rejected() {
        let err = serde_json::from_value::<ComprehensiveReport>(json!({
            "info": {}, "financials": "oops", "balance_sheet": [], "cashflow": []
        }))
        .unwrap_err();
        assert!(err.to_string().contains("expected a list of rows"));
    }
}
