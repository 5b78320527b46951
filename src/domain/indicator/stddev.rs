//! Rolling population standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / n)
//! Warmup: first (n-1) values are undefined.

use crate::domain::indicator::mean;

pub fn rolling_stddev(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let avg = mean(window);
            let variance = window
                .iter()
                .map(|v| {
                    let diff = v - avg;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            Some(variance.sqrt())
        })
        .collect()
}
