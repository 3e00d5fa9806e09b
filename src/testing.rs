//! Test doubles: a one-shot loopback HTTP responder and an in-memory
//! analysis source.

use crate::client::AnalysisSource;
use crate::error::ApiError;
use crate::models::{
    ChatMessage, ComprehensiveReport, DocumentUpload, FundamentalReport, SentimentReport,
    TechnicalSeries, UploadSummary,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{Notify, oneshot};

// ── Loopback HTTP ─────────────────────────────────────────────────────────────

pub struct Responder {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Responder {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct CapturedRequest {
    /// Request line and headers.
    pub head: String,
    pub body: Vec<u8>,
}

pub struct TestServer {
    pub base_url: String,
    captured: oneshot::Receiver<CapturedRequest>,
}

impl TestServer {
    pub async fn request(self) -> CapturedRequest {
        self.captured.await.expect("server saw no request")
    }
}

/// Accept one connection, capture the request, answer with `responder`.
pub async fn serve_once(responder: Responder) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            responder.status,
            responder.content_type,
            responder.body.len(),
            responder.body
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.shutdown().await.ok();
        tx.send(request).ok();
    });

    TestServer {
        base_url: format!("http://{}/api", addr),
        captured: rx,
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.expect("read");
        if n == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let lower = head.to_ascii_lowercase();
    let mut body = buf[(head_end + 4).min(buf.len())..].to_vec();

    if let Some(len) = header_value(&lower, "content-length").and_then(|v| v.parse::<usize>().ok()) {
        while body.len() < len {
            let n = socket.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    } else if header_value(&lower, "transfer-encoding").is_some_and(|v| v.contains("chunked")) {
        while find(&body, b"0\r\n\r\n").is_none() {
            let n = socket.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    }

    CapturedRequest { head, body }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == name).then(|| value.trim())
    })
}

// ── In-memory source ──────────────────────────────────────────────────────────

pub fn technical_fixture(company: &str) -> TechnicalSeries {
    serde_json::from_value(json!({
        "company": company,
        "technical_analysis": [
            {"Date": "2024-03-02", "Close": 51.0, "Volume": 200.0, "RSI": 55.0, "MACD": 0.2, "MACD_hist": 0.05},
            {"Date": "2024-03-01", "Close": 50.0, "Volume": 100.0, "RSI": null, "MACD": 0.1, "MACD_hist": null}
        ]
    }))
    .expect("technical fixture")
}

pub fn fundamental_fixture() -> FundamentalReport {
    serde_json::from_value(json!({
        "company_info": {"symbol": "BCE", "name": "BCE Inc."},
        "growth_metrics": {"time_series": ["2023-12-31 00:00:00"],
            "metrics": {"revenue_growth": [{"value": 2.1, "period": "2023-12-31 00:00:00"}]}},
        "profitability_metrics": {"time_series": [], "metrics": {}},
        "efficiency_metrics": {"time_series": [], "metrics": {}}
    }))
    .expect("fundamental fixture")
}

pub fn comprehensive_fixture() -> ComprehensiveReport {
    serde_json::from_value(json!({
        "info": {"longName": "BCE Inc.", "sector": "Communication Services"},
        "financials": [{"index": "Total Revenue", "2023-12-31": 24673000000.0}],
        "balance_sheet": [],
        "cashflow": [],
        "recommendations": []
    }))
    .expect("comprehensive fixture")
}

pub fn sentiment_fixture(ticker: &str) -> SentimentReport {
    serde_json::from_value(json!({
        "ticker": ticker,
        "sentiment_analysis": {"combined_analysis": {"overall_recommendation": "HOLD", "confidence": 60}}
    }))
    .expect("sentiment fixture")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Technical,
    Fundamental,
    Comprehensive,
    Chat,
    Upload,
}

/// Serves fixtures, fails the endpoints listed in `failing`, and parks any
/// technical request for company `"SLOW"` or sentiment request for ticker
/// `"SLOW"` until `release` is notified.
#[derive(Default)]
pub struct FakeSource {
    pub failing: HashSet<Endpoint>,
    pub release: Arc<Notify>,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn failing(endpoints: &[Endpoint]) -> Self {
        Self {
            failing: endpoints.iter().copied().collect(),
            ..Self::default()
        }
    }

    fn check(&self, endpoint: Endpoint) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&endpoint) {
            return Err(ApiError::Status {
                url: format!("fake://{:?}", endpoint),
                status: 500,
                reason: Some("backend unavailable".into()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AnalysisSource for FakeSource {
    async fn fetch_technical_analysis(&self, company: &str) -> Result<TechnicalSeries, ApiError> {
        self.check(Endpoint::Technical)?;
        if company == "SLOW" {
            self.release.notified().await;
        }
        Ok(technical_fixture(company))
    }

    async fn fetch_fundamental_analysis(&self, _company: &str) -> Result<FundamentalReport, ApiError> {
        self.check(Endpoint::Fundamental)?;
        Ok(fundamental_fixture())
    }

    async fn fetch_comprehensive_analysis(&self, _company: &str) -> Result<ComprehensiveReport, ApiError> {
        self.check(Endpoint::Comprehensive)?;
        Ok(comprehensive_fixture())
    }

    async fn fetch_sentiment_analysis(
        &self,
        ticker: &str,
        _company_name: &str,
    ) -> Result<SentimentReport, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if ticker == "SLOW" {
            self.release.notified().await;
        }
        if ticker == "FAIL" {
            return Err(ApiError::validation("fake://sentiment", "missing field `data`"));
        }
        Ok(sentiment_fixture(ticker))
    }

    async fn send_chat_message(&self, prompt: &str, _company: &str) -> Result<ChatMessage, ApiError> {
        self.check(Endpoint::Chat)?;
        Ok(ChatMessage::bot(format!("echo: {}", prompt)))
    }

    async fn upload_document_for_summary(&self, document: DocumentUpload) -> Result<UploadSummary, ApiError> {
        self.check(Endpoint::Upload)
            .map_err(|_| ApiError::Upload("Error processing file: empty document".into()))?;
        Ok(UploadSummary {
            filename: document.filename,
            analyzed_at: "2024-11-02T10:00:00".into(),
            summarized_at: None,
            executive_summary: format!("Summary for {}", document.company.unwrap_or_default()),
            key_metrics: Vec::new(),
            performance_highlights: Vec::new(),
            strategic_initiatives: Vec::new(),
            risks: Vec::new(),
            market_position: Vec::new(),
            future_outlook: String::new(),
            metadata: None,
        })
    }
}
