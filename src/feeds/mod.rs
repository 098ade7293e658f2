pub mod cache;
pub mod yahoo;

use crate::errors::SimResult;

/// One daily OHLCV bar. Open/high/low/volume feed the candlestick chart;
/// pricing only reads `close`.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct DailyBar {
    /// Calendar date, YYYY-MM-DD (exchange local time).
    #[serde(with = "date_fmt")]
    pub date: chrono::NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

mod date_fmt {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &chrono::NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&d.format("%Y-%m-%d").to_string())
    }
}

/// Anything that can supply a date-ordered daily bar history for a symbol.
/// The only contract the pricing core has with the outside world.
/// Implementations must return bars strictly ascending by date and
/// `DataUnavailable` (never an empty Ok) when the provider has nothing.
pub trait PriceHistorySource {
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        window_days: u32,
    ) -> impl std::future::Future<Output = SimResult<Vec<DailyBar>>> + Send;
}
