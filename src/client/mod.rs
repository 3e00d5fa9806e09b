pub mod http_client;
pub mod parsers;
pub mod sanitizer;

use crate::config::{ApiConfig, SummaryEndpoint};
use crate::error::ApiError;
use crate::models::summary::{GENERIC_UPLOAD_ERROR, SummaryResponse};
use crate::models::{
    ChatMessage, ChatReply, ChatRequest, CompanyEnvelope, ComprehensiveReport, DocumentUpload,
    FundamentalReport, SentimentEnvelope, SentimentReport, SentimentRequest, TechnicalQuery,
    TechnicalSeries, UploadSummary,
};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};

use self::http_client::HttpClient;
use self::parsers::decode;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable analysis backend. One stateless call per endpoint; no caching,
/// no retries.
#[async_trait]
pub trait AnalysisSource: Send + Sync {
    async fn fetch_technical_analysis(&self, company: &str) -> Result<TechnicalSeries, ApiError>;
    async fn fetch_fundamental_analysis(&self, company: &str) -> Result<FundamentalReport, ApiError>;
    async fn fetch_comprehensive_analysis(&self, company: &str) -> Result<ComprehensiveReport, ApiError>;
    async fn fetch_sentiment_analysis(
        &self,
        ticker: &str,
        company_name: &str,
    ) -> Result<SentimentReport, ApiError>;
    async fn send_chat_message(&self, prompt: &str, company: &str) -> Result<ChatMessage, ApiError>;
    async fn upload_document_for_summary(&self, document: DocumentUpload) -> Result<UploadSummary, ApiError>;
}

// ── HTTP implementation ───────────────────────────────────────────────────────

pub struct ApiClient {
    client: HttpClient,
    summary_endpoint: SummaryEndpoint,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            summary_endpoint: config.summary_endpoint,
        })
    }

    /// Technical series with explicit `period` / `interval`.
    pub async fn fetch_technical_analysis_with(
        &self,
        company: &str,
        query: &TechnicalQuery,
    ) -> Result<TechnicalSeries, ApiError> {
        let mut params = vec![("company", company)];
        params.extend(query.params());
        let url = self.client.endpoint("technical_analysis", &params)?;
        let body = self.client.get_text(url.clone()).await?;
        let series: TechnicalSeries = decode(url.as_str(), &body)?;
        debug!("{}: {} technical rows", company, series.records.len());
        Ok(series)
    }

    async fn fetch_company_analysis<T>(&self, path: &str, company: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.client.endpoint(path, &[("company", company)])?;
        let body = self.client.get_text(url.clone()).await?;
        let envelope: CompanyEnvelope<T> = decode(url.as_str(), &body)?;
        Ok(envelope.analysis)
    }
}

#[async_trait]
impl AnalysisSource for ApiClient {
    async fn fetch_technical_analysis(&self, company: &str) -> Result<TechnicalSeries, ApiError> {
        self.fetch_technical_analysis_with(company, &TechnicalQuery::default())
            .await
    }

    async fn fetch_fundamental_analysis(&self, company: &str) -> Result<FundamentalReport, ApiError> {
        self.fetch_company_analysis("fundamental_analysis", company).await
    }

    async fn fetch_comprehensive_analysis(&self, company: &str) -> Result<ComprehensiveReport, ApiError> {
        self.fetch_company_analysis("analysis", company).await
    }

    async fn fetch_sentiment_analysis(
        &self,
        ticker: &str,
        company_name: &str,
    ) -> Result<SentimentReport, ApiError> {
        let url = self.client.endpoint("sentiment_analysis", &[])?;
        let request = SentimentRequest {
            ticker: ticker.to_string(),
            company_name: company_name.to_string(),
        };
        let body = self.client.post_json(url.clone(), &request).await?;
        let envelope: SentimentEnvelope = decode(url.as_str(), &body)?;

        if let Some(confidence) = envelope.data.confidence() {
            if !(0.0..=100.0).contains(&confidence) {
                return Err(ApiError::validation(
                    url.as_str(),
                    format!("confidence {} outside 0..=100", confidence),
                ));
            }
        }

        info!(
            "{}: sentiment {} ({} articles)",
            ticker,
            envelope.data.recommendation(),
            envelope.data.recent_articles.len()
        );
        Ok(envelope.data)
    }

    async fn send_chat_message(&self, prompt: &str, company: &str) -> Result<ChatMessage, ApiError> {
        let url = self.client.endpoint("chat", &[])?;
        let request = ChatRequest {
            prompt: prompt.to_string(),
            company: company.to_string(),
        };
        let body = self.client.post_json(url.clone(), &request).await?;
        let reply: ChatReply = decode(url.as_str(), &body)?;

        if reply.is_error() {
            let reason = reply.message.unwrap_or_else(|| "chat service error".to_string());
            return Err(ApiError::validation(url.as_str(), reason));
        }
        match reply.response {
            Some(text) => Ok(ChatMessage::bot(text)),
            None => Err(ApiError::validation(url.as_str(), "missing field `response`")),
        }
    }

    async fn upload_document_for_summary(&self, document: DocumentUpload) -> Result<UploadSummary, ApiError> {
        let url = self.client.endpoint(self.summary_endpoint.path(), &[])?;
        let filename = document.filename.clone();
        info!("Uploading {} ({} bytes) to {}", filename, document.bytes.len(), url);

        let part = Part::bytes(document.bytes)
            .file_name(document.filename)
            .mime_str("application/pdf")
            .map_err(|e| upload_failure(ApiError::Upload(e.to_string())))?;
        let mut form = Form::new().part("file", part);
        if let Some(company) = document.company {
            form = form.text("company", company);
        }

        let body = self
            .client
            .post_multipart(url.clone(), form)
            .await
            .map_err(upload_failure)?;
        let response: SummaryResponse = decode(url.as_str(), &body).map_err(upload_failure)?;

        if response.status.as_deref() == Some("error") {
            let reason = response
                .message
                .unwrap_or_else(|| GENERIC_UPLOAD_ERROR.to_string());
            return Err(upload_failure(ApiError::Upload(reason)));
        }
        let data = response
            .data
            .ok_or_else(|| upload_failure(ApiError::validation(url.as_str(), "missing field `data`")))?;

        info!("{}: summary ready", filename);
        Ok(UploadSummary::from(data))
    }
}

/// Any upload failure becomes `Upload`, carrying the server's reason when it
/// gave one.
fn upload_failure(err: ApiError) -> ApiError {
    warn!("Document upload failed: {}", err);
    match err {
        ApiError::Status {
            reason: Some(reason),
            ..
        } => ApiError::Upload(reason),
        ApiError::Upload(reason) => ApiError::Upload(reason),
        _ => ApiError::Upload(GENERIC_UPLOAD_ERROR.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Responder, serve_once};
    use tokio_test::{assert_err, assert_ok};

    fn client_for(base_url: &str) -> ApiClient {
        ApiClient::new(&ApiConfig::new(base_url)).unwrap()
    }

    #[tokio::test]
    async fn test_technical_request_shape() {
        let server = serve_once(Responder::json(
            200,
            r#"{"company": "BCE", "technical_analysis": [{"Date": "2024-03-01", "Close": 50.0, "Volume": 1, "RSI": NaN, "MACD": 0.1, "MACD_hist": 0.0}]}"#,
        ))
        .await;
        let client = client_for(&server.base_url);
        let query = TechnicalQuery {
            period: Some("1y".into()),
            interval: Some("1d".into()),
        };
        let series = assert_ok!(client.fetch_technical_analysis_with("BCE", &query).await);
        assert_eq!(series.records.len(), 1);
        assert_eq!(series.records[0].rsi, None);

        let request = server.request().await;
        assert!(request.head.starts_with(
            "GET /api/technical_analysis?company=BCE&period=1y&interval=1d HTTP/1.1"
        ));
    }

    #[tokio::test]
    async fn test_comprehensive_nan_body() {
        let server = serve_once(Responder::json(
            200,
            r#"{"company": "AAPL", "analysis": {"info": {"longName": "Apple Inc.", "beta": NaN, "note": "NaN"},
                "financials": [{"index": "Net Income", "2023": NaN, "2022": 99.8}],
                "balance_sheet": {}, "cashflow": [], "recommendations": []}}"#,
        ))
        .await;
        let report = assert_ok!(client_for(&server.base_url).fetch_comprehensive_analysis("AAPL").await);
        assert_eq!(report.info.beta, None);
        assert_eq!(report.info.extra["note"], "NaN");
        assert_eq!(report.financials[0].cells["2023"], serde_json::Value::Null);
        assert_eq!(report.financials[0].number("2022"), Some(99.8));
        assert!(server.request().await.head.starts_with("GET /api/analysis?company=AAPL "));
    }

    #[tokio::test]
    async fn test_error_status_carries_server_message() {
        let server = serve_once(Responder::json(400, r#"{"message": "Symbole invalide"}"#)).await;
        let err = assert_err!(client_for(&server.base_url).fetch_fundamental_analysis("XX").await);
        assert!(err.is_network());
        match err {
            ApiError::Status { status, reason, .. } => {
                assert_eq!(status, 400);
                assert_eq!(reason.as_deref(), Some("Symbole invalide"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let err = assert_err!(
            client_for("http://127.0.0.1:1/api")
                .fetch_technical_analysis("BCE")
                .await
        );
        assert!(matches!(err, ApiError::Network { .. }));
    }

    #[tokio::test]
    async fn test_sentiment_posts_json_body() {
        let server = serve_once(Responder::json(
            200,
            r#"{"data": {"sentiment_analysis": {"combined_analysis": {"overall_recommendation": "BUY", "confidence": 81}}}}"#,
        ))
        .await;
        let report = assert_ok!(
            client_for(&server.base_url)
                .fetch_sentiment_analysis("BCE", "Bell Canada")
                .await
        );
        assert_eq!(report.confidence(), Some(81.0));

        let request = server.request().await;
        assert!(request.head.starts_with("POST /api/sentiment_analysis HTTP/1.1"));
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body, serde_json::json!({"ticker": "BCE", "company_name": "Bell Canada"}));
    }

    #[tokio::test]
    async fn test_sentiment_confidence_out_of_range() {
        let server = serve_once(Responder::json(
            200,
            r#"{"data": {"sentiment_analysis": {"combined_analysis": {"confidence": 140}}}}"#,
        ))
        .await;
        let err = assert_err!(
            client_for(&server.base_url)
                .fetch_sentiment_analysis("BCE", "Bell Canada")
                .await
        );
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_chat_reply() {
        let server = serve_once(Responder::json(200, r#"{"status": "success", "response": "Revenue rose 2.1%."}"#)).await;
        let msg = assert_ok!(
            client_for(&server.base_url)
                .send_chat_message("How did revenue do?", "bce")
                .await
        );
        assert_eq!(msg.text, "Revenue rose 2.1%.");
        assert_eq!(msg.sender, crate::models::Sender::Bot);

        let request = server.request().await;
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["prompt"], "How did revenue do?");
        assert_eq!(body["company"], "bce");
    }

    #[tokio::test]
    async fn test_upload_error_uses_server_message() {
        let server = serve_once(Responder::json(
            400,
            r#"{"status": "error", "message": "Invalid file type. Only PDF files are allowed."}"#,
        ))
        .await;
        let doc = DocumentUpload::new("q3.pdf", b"%PDF-1.4".to_vec()).unwrap();
        let err = assert_err!(client_for(&server.base_url).upload_document_for_summary(doc).await);
        assert_eq!(err.to_string(), "Invalid file type. Only PDF files are allowed.");
    }

    #[tokio::test]
    async fn test_upload_generic_error_without_payload() {
        let server = serve_once(Responder::text(502, "Bad Gateway")).await;
        let doc = DocumentUpload::new("q3.pdf", b"%PDF-1.4".to_vec()).unwrap();
        let err = assert_err!(client_for(&server.base_url).upload_document_for_summary(doc).await);
        assert!(matches!(&err, ApiError::Upload(m) if m == GENERIC_UPLOAD_ERROR));
    }

    #[tokio::test]
    async fn test_upload_success_sends_multipart() {
        let server = serve_once(Responder::json(
            200,
            r#"{"status": "success", "data": {"filename": "q3.pdf", "analysis_timestamp": "2024-11-02T10:00:00",
                "summary": {"executive_summary": "Solid quarter.", "key_metrics": ["EPS 0.75"], "future_outlook": "Stable."},
                "metadata": {"chunks_processed": 2, "text_length": 12000}}}"#,
        ))
        .await;
        let doc = DocumentUpload::new("q3.pdf", b"%PDF-1.4".to_vec())
            .unwrap()
            .for_company("bell-canada");
        let summary = assert_ok!(client_for(&server.base_url).upload_document_for_summary(doc).await);
        assert_eq!(summary.executive_summary, "Solid quarter.");
        assert_eq!(summary.key_metrics, vec!["EPS 0.75"]);

        let request = server.request().await;
        assert!(request.head.starts_with("POST /api/report_summary HTTP/1.1"));
        assert!(request.head.to_ascii_lowercase().contains("content-type: multipart/form-data"));
        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains(r#"name="file"; filename="q3.pdf""#));
        assert!(body.contains(r#"name="company""#));
        assert!(body.contains("bell-canada"));
    }
}
