use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::calendar::{date_from_unix, unix_midnight};
use crate::history_source::{HistoryRequest, PriceHistorySource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT};
use crate::{PricePoint, PriceSeries};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Daily closes from Yahoo Finance's chart endpoint.
#[derive(Clone)]
pub struct YahooHistorySource {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl Default for YahooHistorySource {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooHistorySource {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn chart_url(&self, request: &HistoryRequest) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            urlencoding::encode(request.symbol.as_str()),
            unix_midnight(request.start),
            unix_midnight(request.end),
        )
    }

    async fn fetch_chart(&self, request: HistoryRequest) -> Result<PriceSeries, SourceError> {
        let url = self.chart_url(&request);
        debug!(symbol = %request.symbol, %url, "requesting yahoo chart");

        let http_request = HttpRequest::get(url)
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout(self.timeout);

        let response = self.http_client.execute(http_request).await.map_err(|e| {
            warn!(symbol = %request.symbol, error = %e, timed_out = e.timed_out(), "yahoo transport error");
            if e.timed_out() {
                SourceError::unavailable(format!(
                    "yahoo request timed out after {} ms",
                    self.timeout.as_millis()
                ))
            } else {
                SourceError::unavailable(format!("yahoo transport error: {}", e.message()))
            }
        })?;

        // Unknown tickers come back as 404 with a chart error payload.
        if response.status == 404 {
            return Ok(PriceSeries::empty(request.symbol));
        }
        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {}",
                response.status
            )));
        }

        parse_chart(&response.body, request)
    }
}

impl PriceHistorySource for YahooHistorySource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn fetch<'a>(
        &'a self,
        request: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
        Box::pin(self.fetch_chart(request))
    }
}

fn parse_chart(body: &str, request: HistoryRequest) -> Result<PriceSeries, SourceError> {
    let chart: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = chart.chart.error {
        if error.code.eq_ignore_ascii_case("not found") {
            return Ok(PriceSeries::empty(request.symbol));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo chart error {}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let Some(result) = chart.chart.result.and_then(|results| results.into_iter().next()) else {
        return Ok(PriceSeries::empty(request.symbol));
    };
    let Some(timestamps) = result.timestamp else {
        return Ok(PriceSeries::empty(request.symbol));
    };
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .ok_or_else(|| SourceError::malformed("yahoo chart has no quote indicators"))?;

    // Yahoo occasionally repeats the live bar; keying by date keeps one close per day.
    let mut by_date = BTreeMap::new();
    for (ts, close) in timestamps.iter().zip(closes) {
        let (Some(date), Some(close)) = (date_from_unix(*ts), close) else {
            continue;
        };
        if date >= request.start && date < request.end {
            by_date.insert(date, close);
        }
    }

    let points = by_date
        .into_iter()
        .filter_map(|(date, close)| PricePoint::new(date, close).ok())
        .collect();

    PriceSeries::new(request.symbol, points)
        .map_err(|e| SourceError::malformed(format!("yahoo chart is not a valid series: {e}")))
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::parse_date;
    use crate::history_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::Symbol;
    use std::sync::Mutex;

    struct CannedHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl CannedHttpClient {
        fn new(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    impl HttpClient for CannedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request log should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn request() -> HistoryRequest {
        HistoryRequest::new(
            Symbol::parse("AAPL").expect("symbol"),
            parse_date("2024-01-01").expect("date"),
            parse_date("2024-01-06").expect("date"),
        )
        .expect("request")
    }

    // 2024-01-02, 01-03 (null close), 01-04, 01-04 again (live bar repeat)
    const CHART: &str = r#"{"chart":{"result":[{
        "timestamp":[1704205800,1704292200,1704378600,1704385000],
        "indicators":{"quote":[{"close":[185.64,null,181.91,182.10]}]}
    }],"error":null}}"#;

    #[tokio::test]
    async fn parses_closes_skipping_nulls_and_duplicate_days() {
        let client = CannedHttpClient::new(Ok(HttpResponse::new(200, CHART)));
        let source = YahooHistorySource::with_http_client(client.clone())
            .with_timeout(Duration::from_secs(3));

        let series = source.fetch(request()).await.expect("series");

        assert_eq!(series.closes(), vec![185.64, 182.10]);
        let sent = client.requests.lock().expect("log").clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].url.contains("/v8/finance/chart/AAPL?period1=1704067200"));
        assert_eq!(sent[0].timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn unknown_symbol_yields_empty_series() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let client = CannedHttpClient::new(Ok(HttpResponse::new(404, body)));
        let source = YahooHistorySource::with_http_client(client);

        let series = source.fetch(request()).await.expect("empty is not an error");
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_unavailable() {
        let client = CannedHttpClient::new(Err(HttpError::new("connection reset")));
        let source = YahooHistorySource::with_http_client(client);

        let error = source.fetch(request()).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.message().contains("connection reset"), "{}", error.message());
    }

    #[tokio::test]
    async fn timeout_is_reported_as_such() {
        let client = CannedHttpClient::new(Err(HttpError::timeout("request timeout")));
        let source = YahooHistorySource::with_http_client(client);

        let error = source.fetch(request()).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.message().contains("timed out"), "{}", error.message());
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let client = CannedHttpClient::new(Ok(HttpResponse::new(200, "<html>")));
        let source = YahooHistorySource::with_http_client(client);

        let error = source.fetch(request()).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Malformed);
    }
}
