use crate::domain::price_metrics::{PriceMetricWindow, LOOKBACK_DAYS};

/// Fraction of |MACD| by which MACD may trail the signal line and still be
/// treated as noise rather than a crossunder.
pub const CROSSOVER_FACTOR: f64 = 0.1;

/// True when the security is rallying: price has held at or above its
/// moving average across the whole look-back, and MACD is above its signal
/// line (or only marginally below it after having been above within the
/// look-back).
pub fn classify(
    current_price: f64,
    sma: &[f64; LOOKBACK_DAYS],
    macd_line: &[f64; LOOKBACK_DAYS],
    signal_line: &[f64; LOOKBACK_DAYS],
) -> bool {
    if sma.iter().any(|avg| current_price < *avg) {
        return false;
    }

    if macd_line[0] > signal_line[0] {
        return true;
    }

    let threshold = macd_line[0].abs() * CROSSOVER_FACTOR;
    if macd_line[0] > signal_line[0] - threshold {
        return macd_line
            .iter()
            .zip(signal_line)
            .any(|(macd, signal)| macd > signal);
    }

    false
}

pub fn classify_window(window: &PriceMetricWindow) -> bool {
    classify(
        window.current_price,
        &window.sma,
        &window.macd_line,
        &window.signal_line,
    )
}
