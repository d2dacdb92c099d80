//! Look-ahead contamination tests for the streaming indicators.
//!
//! Invariant: no indicator value at bar t may depend on price data from bar
//! t+1 or later.
//!
//! Method: feed a fresh instance the truncated series (bars 0..100) and
//! another the full series (bars 0..200). Bars 0..100 must be identical
//! between both runs.

use barclose_core::domain::Bar;
use barclose_core::indicators::*;
use chrono::{Duration, TimeZone, Utc};

/// N fifteen-minute bars of a deterministic pseudo-random walk.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 1.1000;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.00002;
        price = (price + change).max(0.5);

        let open = price - 0.0002;
        let close = price + 0.0001;
        let high = open.max(close) + 0.0005;
        let low = open.min(close) - 0.0005;

        bars.push(Bar::new(
            start + Duration::minutes(15 * i as i64),
            open,
            high,
            low,
            close,
            1000.0 + i as f64,
        ));
    }

    bars
}

fn feed(mut indicator: Box<dyn Indicator>, bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| indicator.update(b)).collect()
}

fn assert_no_lookahead(make: impl Fn() -> Box<dyn Indicator>, full_bars: &[Bar], truncated_len: usize) {
    let name = make().name().to_string();
    let full = feed(make(), full_bars);
    let truncated = feed(make(), &full_bars[..truncated_len]);

    for i in 0..truncated_len {
        let (t, f) = (truncated[i], full[i]);
        assert!(
            (t.is_nan() && f.is_nan()) || t == f,
            "{name}: look-ahead at bar {i}: truncated={t}, full={f}"
        );
    }
}

type Factory = fn() -> Box<dyn Indicator>;

fn all_indicators() -> Vec<Factory> {
    let factories: [Factory; 9] = [
        || -> Box<dyn Indicator> { Box::new(Sma::new(10)) },
        || -> Box<dyn Indicator> { Box::new(Sma::new(50)) },
        || -> Box<dyn Indicator> { Box::new(Ema::new(10)) },
        || -> Box<dyn Indicator> { Box::new(Rsi::new(14)) },
        || -> Box<dyn Indicator> { Box::new(Atr::new(14)) },
        || -> Box<dyn Indicator> { Box::new(Stochastic::new(8, 3, 3, StochasticLine::K)) },
        || -> Box<dyn Indicator> { Box::new(Stochastic::new(8, 3, 3, StochasticLine::D)) },
        || -> Box<dyn Indicator> { Box::new(HigherTimeframeEma::new(5, Timeframe::Hour)) },
        || -> Box<dyn Indicator> { Box::new(HigherTimeframeEma::new(5, Timeframe::Bar)) },
    ];
    factories.to_vec()
}

#[test]
fn no_indicator_reads_future_bars() {
    let bars = make_test_bars(200);
    for make in all_indicators() {
        assert_no_lookahead(make, &bars, 100);
    }
}

#[test]
fn truncation_inside_a_forming_hour() {
    // 101 quarter-hour bars end one bar into a new hour bucket.
    let bars = make_test_bars(200);
    assert_no_lookahead(
        || -> Box<dyn Indicator> { Box::new(HigherTimeframeEma::new(5, Timeframe::Hour)) },
        &bars,
        101,
    );
}

#[test]
fn every_indicator_becomes_valid() {
    let bars = make_test_bars(200);
    for make in all_indicators() {
        let name = make().name().to_string();
        let values = feed(make(), &bars);
        assert!(values[199].is_finite(), "{name} never produced a value");
    }
}
