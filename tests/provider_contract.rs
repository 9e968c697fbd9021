use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use predictr_core::domain::calendar::parse_date;
use predictr_core::{
    HistoryRequest, HttpClient, HttpError, HttpRequest, HttpResponse, InMemoryHistorySource,
    PriceHistorySource, PricePoint, PriceSeries, SourceError, SourceErrorKind, Symbol,
    YahooHistorySource,
};

struct FixedResponseClient {
    status: u16,
    body: &'static str,
}

impl HttpClient for FixedResponseClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = HttpResponse::new(self.status, self.body);
        Box::pin(async move { Ok(response) })
    }
}

fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

fn request(raw: &str, start: &str, end: &str) -> HistoryRequest {
    HistoryRequest::new(
        symbol(raw),
        parse_date(start).expect("start"),
        parse_date(end).expect("end"),
    )
    .expect("valid range")
}

fn week_of_closes(raw: &str) -> PriceSeries {
    let points = [
        ("2024-03-04", 170.12),
        ("2024-03-05", 169.12),
        ("2024-03-06", 169.00),
        ("2024-03-07", 169.15),
        ("2024-03-08", 170.73),
    ]
    .into_iter()
    .map(|(date, close)| PricePoint::new(parse_date(date).expect("date"), close).expect("point"))
    .collect();
    PriceSeries::new(symbol(raw), points).expect("series")
}

fn sources() -> Vec<Arc<dyn PriceHistorySource>> {
    vec![
        Arc::new(InMemoryHistorySource::new()),
        Arc::new(YahooHistorySource::with_http_client(Arc::new(
            FixedResponseClient {
                status: 404,
                body: r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
            },
        ))),
    ]
}

#[tokio::test]
async fn when_symbol_is_unknown_every_source_answers_with_an_empty_series() {
    for source in sources() {
        // Given a source that has never heard of the symbol
        let request = request("ZZZZQ", "2024-01-01", "2024-02-01");

        // When history is fetched
        let series = source
            .fetch(request)
            .await
            .unwrap_or_else(|e| panic!("{} should not fail: {e}", source.name()));

        // Then the result is empty rather than an error
        assert!(series.is_empty(), "{} returned data", source.name());
        assert_eq!(series.symbol, symbol("ZZZZQ"));
    }
}

#[tokio::test]
async fn when_range_is_half_open_the_end_date_is_excluded() {
    // Given a week of closes
    let source = InMemoryHistorySource::new().with_series(week_of_closes("MSFT"));

    // When fetching Monday up to Friday
    let series = source
        .fetch(request("MSFT", "2024-03-04", "2024-03-08"))
        .await
        .expect("series");

    // Then Friday is not included
    assert_eq!(series.len(), 4);
    assert_eq!(series.last_date(), Some(parse_date("2024-03-07").expect("date")));
}

#[tokio::test]
async fn when_source_fails_the_error_carries_a_stable_code() {
    // Given a source whose upstream is down
    let source = InMemoryHistorySource::new().with_series(week_of_closes("MSFT"));
    source.fail_with(SourceError::unavailable("upstream timed out"));

    // When fetching
    let error = source
        .fetch(request("MSFT", "2024-03-04", "2024-03-09"))
        .await
        .expect_err("fetch should fail");

    // Then the failure is classified
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert_eq!(error.code(), "source.unavailable");
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn when_yahoo_answers_with_a_server_error_it_is_unavailable() {
    let source = YahooHistorySource::with_http_client(Arc::new(FixedResponseClient {
        status: 503,
        body: "",
    }));

    let error = source
        .fetch(request("AAPL", "2024-01-01", "2024-02-01"))
        .await
        .expect_err("fetch should fail");

    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
}

#[test]
fn when_request_range_is_inverted_it_is_rejected() {
    let error = HistoryRequest::new(
        symbol("AAPL"),
        parse_date("2024-02-01").expect("date"),
        parse_date("2024-01-01").expect("date"),
    )
    .expect_err("inverted range");

    assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
}
