//! Exponential Moving Average.
//!
//! α = 2/(span+1), seeded with the first value, then
//! EMA[i] = EMA[i-1] + α·(C[i] - EMA[i-1]).
//! Defined from the first bar.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_ema(closes: &[f64], span: usize) -> IndicatorSeries {
    IndicatorSeries::new(IndicatorType::Ema(span), ema_values(closes, span))
}

/// Raw recurrence over any input column.
pub(crate) fn ema_values(values: &[f64], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut ema: Option<f64> = None;

    values
        .iter()
        .map(|&value| {
            let next = match ema {
                None => value,
                Some(prev) => prev + alpha * (value - prev),
            };
            ema = Some(next);
            ema
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seeded_by_first_value() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 3);
        assert_eq!(series.first_defined(), Some(0));
        assert!((series.get(0).unwrap() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = calculate_ema(&[10.0, 20.0, 30.0, 40.0], 3);

        let alpha = 2.0 / 4.0;
        let e1 = 10.0 + alpha * (20.0 - 10.0);
        let e2 = e1 + alpha * (30.0 - e1);
        let e3 = e2 + alpha * (40.0 - e2);

        assert!((series.get(1).unwrap() - e1).abs() < 1e-12);
        assert!((series.get(2).unwrap() - e2).abs() < 1e-12);
        assert!((series.get(3).unwrap() - e3).abs() < 1e-12);
    }

    #[test]
    fn ema_span_one_tracks_input() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 1);
        assert!((series.get(1).unwrap() - 20.0).abs() < f64::EPSILON);
        assert!((series.get(2).unwrap() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_equal_prices() {
        let series = calculate_ema(&[100.0; 5], 12);
        for i in 0..5 {
            assert!((series.get(i).unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_smoothing_factor() {
        let span = 26;
        let alpha = 2.0 / (span as f64 + 1.0);
        assert!((alpha - 2.0 / 27.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_empty_and_zero_span() {
        assert!(calculate_ema(&[], 12).is_empty());
        assert_eq!(calculate_ema(&[1.0, 2.0], 0).values, vec![None, None]);
    }

    #[test]
    fn ema_indicator_type() {
        assert_eq!(calculate_ema(&[1.0], 26).indicator_type, IndicatorType::Ema(26));
    }
}
