use crate::config::AppConfig;
use crate::feeds::cache::HistoryCache;
use crate::feeds::yahoo::YahooClient;
use crate::models::black_scholes::BlackScholes;
use portable_atomic::AtomicU64;
use std::sync::Arc;

// ── Symbol catalog ──

/// The three supported KRX equities. Fixed catalog; the API rejects
/// anything else.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct EquitySymbol {
    /// Provider ticker, e.g. "005930.KS".
    pub ticker: &'static str,
    pub name: &'static str,
    pub name_kr: &'static str,
}

pub const SYMBOLS: [EquitySymbol; 3] = [
    EquitySymbol {
        ticker: "005930.KS",
        name: "Samsung Electronics",
        name_kr: "삼성전자",
    },
    EquitySymbol {
        ticker: "000660.KS",
        name: "SK hynix",
        name_kr: "SK하이닉스",
    },
    EquitySymbol {
        ticker: "003550.KS",
        name: "LG Corp",
        name_kr: "LG",
    },
];

pub fn lookup_symbol(ticker: &str) -> Option<&'static EquitySymbol> {
    SYMBOLS.iter().find(|s| s.ticker == ticker)
}

// ── Performance counters (lock-free) ──

pub struct PerfCounters {
    pub simulations_served: AtomicU64,
    pub history_requests: AtomicU64,
    pub provider_errors: AtomicU64,
    pub degenerate_prices: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            simulations_served: AtomicU64::new(0),
            history_requests: AtomicU64::new(0),
            provider_errors: AtomicU64::new(0),
            degenerate_prices: AtomicU64::new(0),
        }
    }
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,
    /// TTL cache over the market data provider, keyed (symbol, window).
    pub history: HistoryCache<YahooClient>,
    /// Pricer is stateless; kept here so the normal distribution is built once.
    pub pricer: BlackScholes,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let provider = YahooClient::new(&config.market_api_base_url);
        let ttl = std::time::Duration::from_secs(config.history_cache_ttl_secs);

        Arc::new(Self {
            history: HistoryCache::new(provider, ttl),
            pricer: BlackScholes::new(),
            counters: PerfCounters::new(),
            config,
        })
    }
}
