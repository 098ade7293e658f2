use crate::models::OptionKind;
use statrs::distribution::{ContinuousCDF, Normal};

/// Black-Scholes European option pricer.
///
/// d1 = (ln(S/K) + (r + sigma^2/2) T) / (sigma sqrt(T))
/// d2 = d1 - sigma sqrt(T)
/// Call = S Phi(d1) - K e^{-rT} Phi(d2)
/// Put  = K e^{-rT} Phi(-d2) - S Phi(-d1)
///
/// At the T <= 0 or sigma <= 0 boundary the pricer returns intrinsic value
/// instead of failing, so the page keeps showing a sane number when the
/// horizon collapses or the history has no variance.
pub struct BlackScholes {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

impl BlackScholes {
    pub fn new() -> Self {
        // Normal::new(0, 1) only fails if std_dev <= 0; this is safe.
        let normal = Normal::new(0.0, 1.0).unwrap_or_else(|_| Normal::standard());
        Self { normal }
    }

    /// Theoretical per-share price. Pure function: identical inputs give
    /// bit-identical outputs. Tiny negative values from floating-point
    /// noise are surfaced as-is, not clamped.
    #[inline]
    pub fn price(
        &self,
        spot: f64,
        strike: f64,
        t_years: f64,
        rate: f64,
        sigma: f64,
        kind: OptionKind,
    ) -> f64 {
        if t_years <= 0.0 || sigma <= 0.0 {
            return kind.intrinsic(spot, strike);
        }

        let sqrt_t = t_years.sqrt();
        let d1 = ((spot / strike).ln() + (rate + 0.5 * sigma * sigma) * t_years)
            / (sigma * sqrt_t);
        let d2 = d1 - sigma * sqrt_t;
        let discount = (-rate * t_years).exp();

        match kind {
            OptionKind::Call => spot * self.normal.cdf(d1) - strike * discount * self.normal.cdf(d2),
            OptionKind::Put => strike * discount * self.normal.cdf(-d2) - spot * self.normal.cdf(-d1),
        }
    }
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel_close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1.0)
    }

    #[test]
    fn test_reference_atm_call() {
        // S=K=70000, T=30/365, r=0.035, sigma=0.30. Reference value from an
        // independent implementation of the same closed form.
        let bs = BlackScholes::new();
        let price = bs.price(
            70000.0,
            70000.0,
            30.0 / 365.0,
            0.035,
            0.30,
            OptionKind::Call,
        );
        assert!(
            rel_close(price, 2499.52882797068, 1e-6),
            "call price={price}"
        );
    }

    #[test]
    fn test_reference_atm_put() {
        let bs = BlackScholes::new();
        let price = bs.price(
            70000.0,
            70000.0,
            30.0 / 365.0,
            0.035,
            0.30,
            OptionKind::Put,
        );
        assert!(
            rel_close(price, 2298.4483290018907, 1e-6),
            "put price={price}"
        );
    }

    #[test]
    fn test_put_call_parity() {
        let bs = BlackScholes::new();
        let (s, k, t, r, sigma) = (68000.0, 72000.0, 90.0 / 365.0, 0.035, 0.25);
        let call = bs.price(s, k, t, r, sigma, OptionKind::Call);
        let put = bs.price(s, k, t, r, sigma, OptionKind::Put);
        let forward = s - k * (-r * t).exp();
        assert!(
            rel_close(call - put, forward, 1e-6),
            "C-P={} vs S-Ke^-rT={}",
            call - put,
            forward
        );
    }

    #[test]
    fn test_zero_ttl_is_intrinsic_exactly() {
        let bs = BlackScholes::new();
        assert_eq!(bs.price(75000.0, 70000.0, 0.0, 0.035, 0.3, OptionKind::Call), 5000.0);
        assert_eq!(bs.price(65000.0, 70000.0, 0.0, 0.035, 0.3, OptionKind::Call), 0.0);
        assert_eq!(bs.price(65000.0, 70000.0, 0.0, 0.035, 0.3, OptionKind::Put), 5000.0);
        assert_eq!(bs.price(75000.0, 70000.0, -1.0, 0.035, 0.3, OptionKind::Put), 0.0);
    }

    #[test]
    fn test_zero_sigma_is_intrinsic_exactly() {
        let bs = BlackScholes::new();
        assert_eq!(bs.price(75000.0, 70000.0, 0.1, 0.035, 0.0, OptionKind::Call), 5000.0);
        assert_eq!(bs.price(75000.0, 70000.0, 0.1, 0.035, 0.0, OptionKind::Put), 0.0);
    }

    #[test]
    fn test_idempotent() {
        let bs = BlackScholes::new();
        let a = bs.price(70000.0, 71000.0, 45.0 / 365.0, 0.035, 0.28, OptionKind::Put);
        let b = bs.price(70000.0, 71000.0, 45.0 / 365.0, 0.035, 0.28, OptionKind::Put);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
