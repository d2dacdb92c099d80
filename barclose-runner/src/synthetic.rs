//! Synthetic bars for development runs and tests.
//!
//! A seeded random walk: the same `(n, start_price, seed, interval)` always
//! yields the same bars. Results on synthetic data say nothing about a real
//! market.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use barclose_core::domain::Bar;

/// Open time of the first synthetic bar.
pub fn synthetic_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `n` bars of a random walk starting at `start_price`.
///
/// Per-bar moves are drawn in price units scaled to the start price, with a
/// slowly switching drift so trend-following rules see crossings. The series
/// ends early if the next open time would leave chrono's date range.
pub fn synthetic_bars(n: usize, start_price: f64, seed: u64, interval: Duration) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let scale = start_price * 0.0004;
    let start = synthetic_epoch();

    let mut bars = Vec::with_capacity(n.min(1 << 20));
    let mut price = start_price;
    let mut drift = 0.0;
    let mut open_time = Some(start);

    for i in 0..n {
        let Some(time) = open_time else { break };
        if i % 100 == 0 {
            drift = rng.gen_range(-0.15..0.15) * scale;
        }
        let open = price;
        let close = (open + drift + rng.gen_range(-1.0..1.0) * scale).max(start_price * 0.1);
        let high = open.max(close) + rng.gen_range(0.0..0.5) * scale;
        let low = (open.min(close) - rng.gen_range(0.0..0.5) * scale).max(start_price * 0.05);
        let volume = rng.gen_range(100..10_000u32) as f64;

        bars.push(Bar::new(time, open, high, low, close, volume));
        price = close;
        open_time = time.checked_add_signed(interval);
    }

    bars
}
