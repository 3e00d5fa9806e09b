//! Plain-text renderings of the dashboard sections for the terminal.

use crate::dashboard::{ChartSeries, DashboardState, Slot};
use crate::models::comprehensive::table_columns;
use crate::models::{
    ChatMessage, ComprehensiveReport, FundamentalReport, MarketMetrics, Sender, SentimentReport,
    Tone, UploadSummary,
};
use crate::utils::{
    NOT_AVAILABLE, fmt_number, format_abbreviated, format_currency, format_fixed,
    recommendation_period_label, strip_time_component,
};
use std::fmt::{self, Write};

const RULE: &str = "─────────────────────────────────────────────";

/// Rows of the technical table shown by default.
pub const TECHNICAL_TAIL: usize = 10;

fn render(f: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    f(&mut out).map(|()| out).unwrap_or_default()
}

fn header(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "  {}", title)?;
    writeln!(out, "{}", RULE)
}

fn text_or_na(value: Option<&str>) -> &str {
    value.filter(|s| !s.trim().is_empty()).unwrap_or(NOT_AVAILABLE)
}

// ── Technical ────────────────────────────────────────────────────────────────

/// Most recent `tail` rows, oldest first.
pub fn technical(company: &str, series: &ChartSeries, tail: usize) -> String {
    render(|out| {
        header(out, &format!("{} — Technical Analysis", company))?;
        if series.is_empty() {
            return writeln!(out, "  No price history.");
        }
        writeln!(
            out,
            "  {:<12} {:>10} {:>10} {:>8} {:>8} {:>8}",
            "Date", "Close", "Volume", "RSI", "MACD", "Hist"
        )?;
        let start = series.len().saturating_sub(tail);
        for i in start..series.len() {
            writeln!(
                out,
                "  {:<12} {:>10} {:>10} {:>8} {:>8} {:>8}",
                strip_time_component(&series.dates[i]),
                format_fixed(series.close[i]),
                format_abbreviated(series.volume[i]),
                format_fixed(series.rsi[i]),
                format_fixed(series.macd[i]),
                format_fixed(series.macd_histogram[i]),
            )?;
        }
        writeln!(out, "  {} points, last close {}", series.len(), format_fixed(series.last_close()))
    })
}

// ── Fundamental ──────────────────────────────────────────────────────────────

fn market_metrics(out: &mut String, m: &MarketMetrics) -> fmt::Result {
    let rows = [
        ("Market Cap", format_currency(m.market_cap)),
        ("Price", format_fixed(m.current_price)),
        ("P/E", format_fixed(m.pe_ratio)),
        ("Forward P/E", format_fixed(m.forward_pe)),
        ("Price/Book", format_fixed(m.price_to_book)),
        ("Price/Sales", format_fixed(m.price_to_sales)),
        ("PEG", format_fixed(m.peg_ratio)),
        ("Beta", format_fixed(m.beta)),
        ("Dividend Yield", format_fixed(m.dividend_yield)),
        ("52w High", format_fixed(m.fifty_two_week_high)),
        ("52w Low", format_fixed(m.fifty_two_week_low)),
        ("Volume", format_abbreviated(m.volume)),
        ("Avg Volume", format_abbreviated(m.avg_volume)),
    ];
    for (label, value) in rows {
        writeln!(out, "  {:<16}: {}", label, value)?;
    }
    Ok(())
}

pub fn fundamental(report: &FundamentalReport) -> String {
    render(|out| {
        let info = &report.company_info;
        let title = format!(
            "{} ({}) — Fundamental Analysis",
            text_or_na(info.name.as_deref()),
            text_or_na(info.symbol.as_deref())
        );
        header(out, &title)?;
        writeln!(out, "  Sector   : {}", text_or_na(info.sector.as_deref()))?;
        writeln!(out, "  Industry : {}", text_or_na(info.industry.as_deref()))?;
        if let Some(date) = &report.analysis_date {
            writeln!(out, "  As of    : {}", date)?;
        }
        writeln!(out)?;
        market_metrics(out, &report.market_metrics.current)?;

        for (name, category) in report.categories() {
            writeln!(out)?;
            writeln!(out, "  {} metrics", name)?;
            if category.metrics.is_empty() {
                writeln!(out, "    (none)")?;
                continue;
            }
            for (metric, points) in &category.metrics {
                let cells: Vec<String> = points
                    .iter()
                    .map(|p| format!("{} {}", p.period_label(), format_fixed(p.value)))
                    .collect();
                writeln!(out, "    {:<24} {}", metric, cells.join(" | "))?;
            }
        }
        Ok(())
    })
}

// ── Comprehensive ────────────────────────────────────────────────────────────

pub fn comprehensive(report: &ComprehensiveReport) -> String {
    render(|out| {
        let name = text_or_na(report.info.display_name());
        header(out, &format!("{} — Comprehensive Analysis", name))?;
        writeln!(out, "  Sector : {}", text_or_na(report.info.sector.as_deref()))?;
        for (label, value) in report.info.key_figures() {
            if value.is_some() {
                writeln!(out, "  {:<20}: {}", label, format_abbreviated(value))?;
            }
        }

        for (title, rows) in report.tables() {
            writeln!(out)?;
            writeln!(out, "  {}", title)?;
            if rows.is_empty() {
                writeln!(out, "    No data available")?;
                continue;
            }
            let columns: Vec<&str> = table_columns(rows);
            writeln!(out, "    {:<36} {}", "", columns.join("  "))?;
            for row in rows {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| format_abbreviated(row.number(c)))
                    .collect();
                writeln!(out, "    {:<36} {}", row.label(), cells.join("  "))?;
            }
        }

        let trend = report.recommendation_trend();
        if !trend.is_empty() {
            writeln!(out)?;
            writeln!(out, "  Analyst recommendations")?;
            for r in &trend {
                writeln!(
                    out,
                    "    {:<18} strong buy {:>3}  buy {:>3}  hold {:>3}  sell {:>3}  strong sell {:>3}  ({} total)",
                    recommendation_period_label(&r.period),
                    r.strong_buy,
                    r.buy,
                    r.hold,
                    r.sell,
                    r.strong_sell,
                    r.total()
                )?;
            }
        }

        if !report.options.is_empty() {
            writeln!(out)?;
            writeln!(out, "  Option expiries: {}", report.options.join(", "))?;
        }
        Ok(())
    })
}

// ── Sentiment ────────────────────────────────────────────────────────────────

pub fn sentiment(report: &SentimentReport) -> String {
    render(|out| {
        let analysis = &report.sentiment_analysis;
        let combined = &analysis.combined_analysis;
        let title = format!(
            "{} ({}) — Sentiment",
            text_or_na(report.company_name.as_deref()),
            text_or_na(report.ticker.as_deref())
        );
        header(out, &title)?;
        writeln!(out, "  Recommendation : {}", report.recommendation())?;
        writeln!(
            out,
            "  Confidence     : {}",
            report
                .confidence()
                .map(|c| format!("{:.0}%", c))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        )?;
        writeln!(
            out,
            "  Financial      : {}",
            text_or_na(analysis.financial_sentiment.overall.as_deref())
        )?;
        writeln!(
            out,
            "  News           : {}",
            text_or_na(analysis.news_sentiment.overall.as_deref())
        )?;
        writeln!(
            out,
            "  Risk level     : {}",
            text_or_na(combined.risk_assessment.risk_level.as_deref())
        )?;
        let sources = &report.news_sources;
        writeln!(
            out,
            "  Articles       : Yahoo {} | NewsAPI {} | GNews {}",
            sources.yahoo_finance, sources.newsapi, sources.gnews
        )?;
        let tone = &analysis.news_sentiment.source_analysis;
        writeln!(
            out,
            "  Source tone    : Yahoo {} | NewsAPI {} | GNews {}",
            Tone::classify(tone.yahoo_finance.as_deref()),
            Tone::classify(tone.newsapi.as_deref()),
            Tone::classify(tone.gnews.as_deref())
        )?;

        if let Some(summary) = combined.summary.as_deref() {
            writeln!(out)?;
            writeln!(out, "  {}", summary)?;
        }
        bullets(out, "Key risks", &combined.risk_assessment.key_risks)?;
        bullets(out, "Notable events", &analysis.news_sentiment.notable_events)?;

        if !report.recent_articles.is_empty() {
            writeln!(out)?;
            writeln!(out, "  Recent articles")?;
            for a in &report.recent_articles {
                writeln!(
                    out,
                    "    - {} [{}]",
                    a.title,
                    text_or_na(a.source.as_deref())
                )?;
            }
        }
        Ok(())
    })
}

fn bullets(out: &mut String, title: &str, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "  {}", title)?;
    for item in items {
        writeln!(out, "    - {}", item)?;
    }
    Ok(())
}

// ── Summary / chat ───────────────────────────────────────────────────────────

pub fn upload_summary(summary: &UploadSummary) -> String {
    render(|out| {
        header(out, &format!("{} — Document Summary", summary.filename))?;
        writeln!(out, "  Analyzed : {}", summary.analyzed_at)?;
        if let Some(meta) = &summary.metadata {
            writeln!(
                out,
                "  Chunks   : {} ({} chars)",
                meta.chunks_processed,
                fmt_number(i64::try_from(meta.text_length).unwrap_or(i64::MAX))
            )?;
        }
        writeln!(out)?;
        writeln!(out, "  {}", summary.executive_summary)?;
        bullets(out, "Key metrics", &summary.key_metrics)?;
        bullets(out, "Performance highlights", &summary.performance_highlights)?;
        bullets(out, "Strategic initiatives", &summary.strategic_initiatives)?;
        bullets(out, "Risks", &summary.risks)?;
        bullets(out, "Market position", &summary.market_position)?;
        if !summary.future_outlook.is_empty() {
            writeln!(out)?;
            writeln!(out, "  Outlook: {}", summary.future_outlook)?;
        }
        Ok(())
    })
}

pub fn chat_line(message: &ChatMessage) -> String {
    let who = match message.sender {
        Sender::User => "you",
        Sender::Bot => "bot",
    };
    format!("[{}] {}: {}", message.timestamp.format("%H:%M:%S"), who, message.text)
}

// ── Whole page ───────────────────────────────────────────────────────────────

fn section<T>(out: &mut String, slot: &Slot<T>, draw: impl FnOnce(&T) -> String) -> fmt::Result {
    match slot {
        Slot::Idle => Ok(()),
        Slot::Loading => writeln!(out, "  Loading..."),
        Slot::Failed { error } => writeln!(out, "  {}", error),
        Slot::Ready { data } => write!(out, "{}", draw(data)),
    }
}

pub fn dashboard(state: &DashboardState) -> String {
    render(|out| {
        let company = state.company.as_deref().unwrap_or(NOT_AVAILABLE);
        section(out, &state.technical, |s| technical(company, s, TECHNICAL_TAIL))?;
        section(out, &state.fundamental, fundamental)?;
        section(out, &state.comprehensive, comprehensive)?;
        section(out, &state.sentiment, sentiment)
    })
}
