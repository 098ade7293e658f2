use crate::errors::{SimError, SimResult};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub market_api_base_url: String,
    /// Annualized risk-free rate used for every valuation.
    pub risk_free_rate: f64,
    /// Calendar days of history fetched per symbol.
    pub history_window_days: u32,
    pub history_cache_ttl_secs: u64,
    pub trading_days_per_year: f64,
    /// Shares per option contract (KRX equity options trade in lots of 100).
    pub contract_multiplier: f64,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> SimResult<Self> {
        dotenvy::dotenv().ok();

        let risk_free_rate = env_var_or("RISK_FREE_RATE", "0.035")
            .parse::<f64>()
            .map_err(|e| SimError::Config(format!("RISK_FREE_RATE: {e}")))?;

        let history_window_days = env_var_or("HISTORY_WINDOW_DAYS", "365")
            .parse::<u32>()
            .map_err(|e| SimError::Config(format!("HISTORY_WINDOW_DAYS: {e}")))?;

        let history_cache_ttl_secs = env_var_or("HISTORY_CACHE_TTL_SECS", "600")
            .parse::<u64>()
            .map_err(|e| SimError::Config(format!("HISTORY_CACHE_TTL_SECS: {e}")))?;

        let trading_days_per_year = env_var_or("TRADING_DAYS_PER_YEAR", "252")
            .parse::<f64>()
            .map_err(|e| SimError::Config(format!("TRADING_DAYS_PER_YEAR: {e}")))?;

        let contract_multiplier = env_var_or("CONTRACT_MULTIPLIER", "100")
            .parse::<f64>()
            .map_err(|e| SimError::Config(format!("CONTRACT_MULTIPLIER: {e}")))?;

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| SimError::Config(format!("SERVER_PORT: {e}")))?;

        if history_window_days == 0 {
            return Err(SimError::Config("HISTORY_WINDOW_DAYS must be > 0".into()));
        }
        if trading_days_per_year <= 0.0 {
            return Err(SimError::Config("TRADING_DAYS_PER_YEAR must be > 0".into()));
        }
        if contract_multiplier <= 0.0 {
            return Err(SimError::Config("CONTRACT_MULTIPLIER must be > 0".into()));
        }

        Ok(Self {
            market_api_base_url: env_var_or(
                "MARKET_API_BASE_URL",
                "https://query1.finance.yahoo.com",
            ),
            risk_free_rate,
            history_window_days,
            history_cache_ttl_secs,
            trading_days_per_year,
            contract_multiplier,
            server_port,
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
