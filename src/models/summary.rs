use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Shown when the server gives no reason.
pub const GENERIC_UPLOAD_ERROR: &str = "Error uploading PDF";
pub const INVALID_DOCUMENT: &str = "Please upload a valid PDF file";

// ── Request ───────────────────────────────────────────────────────────────────

/// A PDF about to be submitted for summarisation.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub company: Option<String>,
}

impl DocumentUpload {
    /// Accepts only non-empty `.pdf` files.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self, &'static str> {
        let filename = filename.into();
        let is_pdf = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf || bytes.is_empty() {
            return Err(INVALID_DOCUMENT);
        }
        Ok(Self {
            filename,
            bytes,
            company: None,
        })
    }

    pub fn for_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SummaryResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<SummaryData>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SummaryData {
    pub filename: String,
    pub analysis_timestamp: String,
    pub summary: SummarySections,
    #[serde(default)]
    pub metadata: Option<SummaryMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SummarySections {
    #[serde(default)]
    pub executive_summary: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub key_metrics: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub performance_highlights: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub strategic_initiatives: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub risks: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub market_position: Vec<String>,
    #[serde(default)]
    pub future_outlook: String,
    #[serde(default)]
    pub analysis_timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SummaryMetadata {
    pub chunks_processed: u64,
    pub text_length: u64,
}

/// Flattened summary handed to callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UploadSummary {
    pub filename: String,
    /// When the server received and analysed the document.
    pub analyzed_at: String,
    /// When the final structured summary was produced, if reported.
    pub summarized_at: Option<String>,
    pub executive_summary: String,
    pub key_metrics: Vec<String>,
    pub performance_highlights: Vec<String>,
    pub strategic_initiatives: Vec<String>,
    pub risks: Vec<String>,
    pub market_position: Vec<String>,
    pub future_outlook: String,
    pub metadata: Option<SummaryMetadata>,
}

impl From<SummaryData> for UploadSummary {
    fn from(data: SummaryData) -> Self {
        let s = data.summary;
        Self {
            filename: data.filename,
            analyzed_at: data.analysis_timestamp,
            summarized_at: s.analysis_timestamp,
            executive_summary: s.executive_summary,
            key_metrics: s.key_metrics,
            performance_highlights: s.performance_highlights,
            strategic_initiatives: s.strategic_initiatives,
            risks: s.risks,
            market_position: s.market_position,
            future_outlook: s.future_outlook,
            metadata: data.metadata,
        }
    }
}

/// The summariser sometimes answers a section with one sentence instead of a
/// list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}
