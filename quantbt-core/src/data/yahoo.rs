//! Yahoo Finance provider.
//!
//! Fetches OHLCV rows from Yahoo's v8 chart API over blocking HTTP, retrying
//! failed attempts with a linearly growing backoff. Yahoo has no official
//! API; the local CSV provider is the offline fallback in the default chain.

use super::provider::{DataError, DataProvider, DataRequest, PriceRow};
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "yahoo";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    retries: u32,
    backoff: Duration,
}

impl YahooProvider {
    pub fn new(retries: u32, backoff: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::provider(PROVIDER, format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            retries: retries.max(1),
            backoff,
        })
    }

    fn chart_url(request: &DataRequest) -> String {
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{}\
             ?period1={}&period2={}&interval={}&includeAdjustedClose=true",
            request.symbol.to_uppercase(),
            request.start.timestamp(),
            request.end.timestamp(),
            request.interval,
        )
    }

    /// Map a chart payload to rows. With `adjusted`, OHLC are scaled by
    /// `adjclose / close` when adjusted closes are present.
    fn parse_response(body: &str, adjusted: bool) -> Result<Vec<PriceRow>, DataError> {
        let resp: ChartResponse = serde_json::from_str(body)
            .map_err(|e| DataError::provider(PROVIDER, format!("response format changed: {e}")))?;

        let results = match (resp.chart.result, resp.chart.error) {
            (Some(results), _) => results,
            (None, Some(err)) => {
                return Err(DataError::provider(
                    PROVIDER,
                    format!("{}: {}", err.code, err.description),
                ))
            }
            (None, None) => {
                return Err(DataError::provider(PROVIDER, "empty result with no error"))
            }
        };
        let data = results
            .into_iter()
            .next()
            .ok_or_else(|| DataError::provider(PROVIDER, "result array is empty"))?;
        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::provider(PROVIDER, "no timestamps"))?;
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::provider(PROVIDER, "no quote data"))?;
        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut rows = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = chrono::DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| DataError::provider(PROVIDER, format!("invalid timestamp: {ts}")))?;
            let pick = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
            let (open, high, low, close, volume) = (
                pick(&quote.open),
                pick(&quote.high),
                pick(&quote.low),
                pick(&quote.close),
                pick(&quote.volume),
            );
            // Non-trading days come back as all-null rows.
            if [open, high, low, close, volume].iter().all(Option::is_none) {
                continue;
            }
            let factor = match (adjusted, adj_closes.as_ref().and_then(|v| pick(v)), close) {
                (true, Some(adj), Some(c)) if c != 0.0 => adj / c,
                _ => 1.0,
            };
            let nan = f64::NAN;
            rows.push(PriceRow {
                timestamp,
                open: open.unwrap_or(nan) * factor,
                high: high.unwrap_or(nan) * factor,
                low: low.unwrap_or(nan) * factor,
                close: close.unwrap_or(nan) * factor,
                volume: volume.unwrap_or(0.0),
            });
        }
        if rows.is_empty() {
            return Err(DataError::provider(PROVIDER, "no data returned"));
        }
        Ok(rows)
    }

    fn fetch_once(&self, request: &DataRequest) -> Result<Vec<PriceRow>, DataError> {
        let url = Self::chart_url(request);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::provider(PROVIDER, format!("network error: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::provider(PROVIDER, format!("HTTP {status}")));
        }
        let body = resp
            .text()
            .map_err(|e| DataError::provider(PROVIDER, format!("read body: {e}")))?;
        Self::parse_response(&body, request.adjusted)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn fetch(&self, request: &DataRequest) -> Result<Vec<PriceRow>, DataError> {
        if request.start >= request.end {
            return Err(DataError::provider(
                PROVIDER,
                "start must be earlier than end",
            ));
        }
        let mut last_error = None;
        for attempt in 1..=self.retries {
            match self.fetch_once(request) {
                Ok(rows) => return Ok(rows),
                Err(e) => {
                    tracing::warn!(attempt, symbol = %request.symbol, error = %e, "yahoo request failed");
                    last_error = Some(e);
                    if attempt < self.retries {
                        std::thread::sleep(self.backoff * attempt);
                    }
                }
            }
        }
        Err(DataError::provider(
            PROVIDER,
            format!(
                "Yahoo Finance request failed: {}",
                last_error.map(|e| e.to_string()).unwrap_or_default()
            ),
        ))
    }
}
