//! Search box flow: validate the term, optionally upload a report, then
//! hand back where to navigate.

use crate::client::AnalysisSource;
use crate::models::{DocumentUpload, UploadSummary};
use crate::utils::company_slug;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Please enter a valid company name.")]
    EmptyTerm,
}

/// Where to go next, plus how the optional upload went.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchOutcome {
    /// Trimmed term, used as-is for the dashboard route.
    pub company: String,
    /// Slug the document was filed under.
    pub slug: String,
    pub upload: Option<UploadOutcome>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcome {
    Uploaded { summary: UploadSummary },
    Failed { error: String },
}

/// A failed upload is reported but never blocks navigation.
pub async fn submit_search(
    source: &dyn AnalysisSource,
    term: &str,
    document: Option<DocumentUpload>,
) -> Result<SearchOutcome, SearchError> {
    let company = term.trim();
    if company.is_empty() {
        return Err(SearchError::EmptyTerm);
    }
    let slug = company_slug(company);

    let upload = match document {
        Some(doc) => {
            let doc = doc.for_company(slug.clone());
            Some(match source.upload_document_for_summary(doc).await {
                Ok(summary) => {
                    info!("{}: uploaded {}", slug, summary.filename);
                    UploadOutcome::Uploaded { summary }
                }
                Err(e) => {
                    warn!("{}: upload failed, continuing to dashboard: {}", slug, e);
                    UploadOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            })
        }
        None => None,
    };

    Ok(SearchOutcome {
        company: company.to_string(),
        slug,
        upload,
    })
}
