use crate::errors::{SimError, SimResult};

/// Annualized volatility from a date-ordered series of daily closes.
///
/// Log returns `ln(p_i / p_{i-1})` over the usable closes, sample standard
/// deviation (N-1 denominator), scaled by `sqrt(trading_days_per_year)`.
/// Non-finite and non-positive closes are treated as absent and dropped
/// before forming returns, matching how a data frame drops NaN rows.
///
/// At least 2 returns (3 usable closes) are required: with a single return
/// the sample standard deviation has a zero denominator. Anything less is
/// `InsufficientData` and the caller must refuse to price rather than run
/// the valuation with sigma = 0.
pub fn estimate_annual_volatility(closes: &[f64], trading_days_per_year: f64) -> SimResult<f64> {
    let mut returns: Vec<f64> = Vec::with_capacity(closes.len().saturating_sub(1));
    let mut prev: Option<f64> = None;

    for &p in closes {
        if !p.is_finite() || p <= 0.0 {
            continue;
        }
        if let Some(prev_p) = prev {
            let r = (p / prev_p).ln();
            if r.is_finite() {
                returns.push(r);
            }
        }
        prev = Some(p);
    }

    if returns.len() < 2 {
        return Err(SimError::InsufficientData(format!(
            "need at least 2 daily returns to estimate volatility, have {}",
            returns.len()
        )));
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / (n - 1.0);

    Ok(var.sqrt() * trading_days_per_year.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_series() {
        let closes = [100.0, 101.0, 100.5, 102.0, 101.2];
        let vol = estimate_annual_volatility(&closes, 252.0).unwrap();
        // Reference value from the same formula computed independently.
        assert!(
            (vol - 0.17618872893893384).abs() < 1e-12,
            "vol={vol}"
        );
    }

    #[test]
    fn test_non_negative_for_positive_series() {
        let closes = [50.0, 55.0, 52.0, 52.0, 60.0, 48.0];
        let vol = estimate_annual_volatility(&closes, 252.0).unwrap();
        assert!(vol >= 0.0);
    }

    #[test]
    fn test_constant_series_has_zero_vol() {
        let closes = [70000.0, 70000.0, 70000.0, 70000.0];
        let vol = estimate_annual_volatility(&closes, 252.0).unwrap();
        assert_eq!(vol, 0.0);
    }

    #[test]
    fn test_too_few_prices() {
        let err = estimate_annual_volatility(&[100.0, 101.0], 252.0).unwrap_err();
        assert!(matches!(err, SimError::InsufficientData(_)), "got {err}");

        let err = estimate_annual_volatility(&[], 252.0).unwrap_err();
        assert!(matches!(err, SimError::InsufficientData(_)));
    }

    #[test]
    fn test_unusable_prices_are_dropped_not_fatal() {
        // Zeroes and NaNs vanish; the four clean closes still give 3 returns.
        let closes = [100.0, 0.0, 101.0, f64::NAN, 100.5, 102.0];
        let vol = estimate_annual_volatility(&closes, 252.0).unwrap();
        assert!(vol > 0.0);
    }

    #[test]
    fn test_cleaning_can_degenerate_to_insufficient() {
        let closes = [100.0, 0.0, 0.0, 101.0, f64::NAN];
        // Only one return survives cleaning.
        let err = estimate_annual_volatility(&closes, 252.0).unwrap_err();
        assert!(matches!(err, SimError::InsufficientData(_)));
    }
}
