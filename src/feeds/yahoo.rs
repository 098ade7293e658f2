use super::{DailyBar, PriceHistorySource};
use crate::errors::{SimError, SimResult};
use reqwest::Client;
use smallvec::SmallVec;

/// Yahoo Finance v8 chart-API client. Fetches daily bars for KRX tickers
/// (e.g. `005930.KS`). All methods return Result, never panic.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .pool_max_idle_per_host(4)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl PriceHistorySource for YahooClient {
    async fn fetch_daily_bars(&self, symbol: &str, window_days: u32) -> SimResult<Vec<DailyBar>> {
        let end = chrono::Utc::now();
        let start = end - chrono::Duration::days(window_days as i64);

        let mut parts: SmallVec<[String; 4]> = SmallVec::new();
        parts.push("interval=1d".to_string());
        parts.push(format!("period1={}", start.timestamp()));
        parts.push(format!("period2={}", end.timestamp()));
        let url = format!(
            "{}/v8/finance/chart/{symbol}?{}",
            self.base_url,
            parts.join("&")
        );

        let resp = self
            .client
            .get(&url)
            .header("User-Agent", "wonsim/0.1")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SimError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let data: ChartResponse = resp
            .json()
            .await
            .map_err(|e| SimError::Parse(format!("chart {symbol}: {e}")))?;

        bars_from_chart(symbol, data)
    }
}

// Yahoo chart response shape (fields we do not read are omitted):
// {
//   "chart": {
//     "result": [{
//       "timestamp": [1716854400, ...],
//       "indicators": { "quote": [{ "open": [...], "high": [...],
//                                   "low": [...], "close": [...],
//                                   "volume": [...] }] }
//     }],
//     "error": null
//   }
// }
// Holiday rows come through as nulls inside the arrays.

#[derive(serde::Deserialize)]
struct ChartResponse {
    chart: Option<Chart>,
}

#[derive(serde::Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(serde::Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(serde::Deserialize)]
struct Indicators {
    quote: Option<Vec<Quote>>,
}

#[derive(serde::Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

fn bars_from_chart(symbol: &str, data: ChartResponse) -> SimResult<Vec<DailyBar>> {
    let chart = data
        .chart
        .ok_or_else(|| SimError::DataUnavailable(format!("{symbol}: empty chart payload")))?;

    if let Some(err) = chart.error {
        if !err.is_null() {
            return Err(SimError::DataUnavailable(format!("{symbol}: {err}")));
        }
    }

    let result = chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| SimError::DataUnavailable(format!("{symbol}: no chart result")))?;

    let timestamps = result
        .timestamp
        .ok_or_else(|| SimError::DataUnavailable(format!("{symbol}: no timestamps")))?;

    let quote = result
        .indicators
        .and_then(|i| i.quote)
        .and_then(|mut q| if q.is_empty() { None } else { Some(q.remove(0)) })
        .ok_or_else(|| SimError::DataUnavailable(format!("{symbol}: no quote series")))?;

    let closes = quote.close.unwrap_or_default();
    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut bars: Vec<DailyBar> = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        // A bar without a usable close is a holiday/suspension row; skip it.
        let close = match closes.get(i).copied().flatten() {
            Some(c) if c.is_finite() && c > 0.0 => c,
            _ => continue,
        };
        let date = match chrono::DateTime::from_timestamp(ts, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };
        // Keep the last row when the provider repeats a date (live session bar).
        if let Some(last) = bars.last() {
            if last.date >= date {
                if last.date == date {
                    bars.pop();
                } else {
                    continue;
                }
            }
        }
        bars.push(DailyBar {
            date,
            open: opens.get(i).copied().flatten().unwrap_or(close),
            high: highs.get(i).copied().flatten().unwrap_or(close),
            low: lows.get(i).copied().flatten().unwrap_or(close),
            close,
            volume: volumes.get(i).copied().flatten().unwrap_or(0),
        });
    }

    if bars.is_empty() {
        return Err(SimError::DataUnavailable(format!(
            "{symbol}: provider returned no usable bars"
        )));
    }

    Ok(bars)
}
