use crate::models::OptionKind;

pub const DEFAULT_GRID_SIZE: usize = 200;

/// One point on the payoff curve.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PayoffPoint {
    /// Hypothetical underlying price at expiry.
    pub price: f64,
    /// Profit or loss in currency at that price.
    pub profit: f64,
}

/// Vertical reference marker at the current spot, spanning the min/max of
/// the computed P/L values. Charting aid only.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SpotMarker {
    pub spot: f64,
    pub profit_min: f64,
    pub profit_max: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PayoffCurve {
    pub points: Vec<PayoffPoint>,
    /// Contracts the investment buys at the theoretical price (fractional).
    pub contracts: f64,
    /// True when the theoretical price was non-positive and the curve is
    /// the flat `-investment` loss line. Callers must not ignore this.
    pub degenerate: bool,
    pub spot_marker: SpotMarker,
}

/// Profit/loss over a grid of hypothetical expiry prices.
///
/// `contracts = investment / (theoretical_price * multiplier)` when the
/// price is positive. A non-positive theoretical price means no purchase is
/// possible: contracts is 0 and every grid point loses the full investment.
/// That degenerate branch is deliberate and load-bearing for the UI.
///
/// The grid is `grid_size` evenly spaced points over
/// `[0.5 * spot, 1.5 * spot]` inclusive. Pure function, no state.
pub fn simulate_payoff(
    theoretical_price: f64,
    investment: f64,
    contract_multiplier: f64,
    spot: f64,
    strike: f64,
    kind: OptionKind,
    grid_size: usize,
) -> PayoffCurve {
    let degenerate = theoretical_price <= 0.0;
    let contracts = if degenerate {
        0.0
    } else {
        investment / (theoretical_price * contract_multiplier)
    };

    let lo = 0.5 * spot;
    let hi = 1.5 * spot;
    let n = grid_size.max(2);
    let step = (hi - lo) / (n - 1) as f64;

    let mut points = Vec::with_capacity(n);
    let mut profit_min = f64::INFINITY;
    let mut profit_max = f64::NEG_INFINITY;

    for i in 0..n {
        // Land exactly on the upper bound despite step rounding.
        let price = if i == n - 1 { hi } else { lo + step * i as f64 };
        let payoff = kind.intrinsic(price, strike) * contracts * contract_multiplier;
        let profit = payoff - investment;
        profit_min = profit_min.min(profit);
        profit_max = profit_max.max(profit);
        points.push(PayoffPoint { price, profit });
    }

    PayoffCurve {
        points,
        contracts,
        degenerate,
        spot_marker: SpotMarker {
            spot,
            profit_min,
            profit_max,
        },
    }
}
