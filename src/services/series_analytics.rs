use chrono::NaiveDate;
use thiserror::Error;

/// Errors from the series analytics core. These never escalate to HTTP
/// errors on their own; the dashboard controller turns them into
/// "not enough data" notices on the affected chart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("invalid window {window} for series of length {len}")]
    InvalidWindow { window: usize, len: usize },

    #[error("need at least 2 data points to fit a trend line")]
    InsufficientPoints,

    #[error("dates and values differ in length")]
    MismatchedLengths,
}

/// Ordinary-least-squares fit over a dated series.
///
/// `slope` is per day; `intercept` is the fitted value at the first date of
/// the span; `fitted` is aligned 1:1 with the input dates.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub fitted: Vec<f64>,
}

/// Trailing simple moving average.
///
/// Returns a vector aligned with `series`:
/// - `None` until `window` observations exist
/// - `Some(mean)` of the trailing `window` values, current one included
///
/// Pure function of its inputs; the series is never reordered, resampled,
/// or gap-filled. A running sum keeps it linear in the series length.
pub fn compute_moving_average(
    series: &[f64],
    window: usize,
) -> Result<Vec<Option<f64>>, SeriesError> {
    if window < 1 || window > series.len() {
        return Err(SeriesError::InvalidWindow {
            window,
            len: series.len(),
        });
    }

    // Carry the window sum and subtract the value that falls out.
    let averages = series
        .iter()
        .enumerate()
        .scan(0.0_f64, move |sum, (i, &v)| {
            *sum += v;
            if i >= window {
                *sum -= series[i - window];
            }

            let out = if i + 1 >= window {
                Some(*sum / window as f64)
            } else {
                None
            };

            Some(out)
        })
        .collect();

    Ok(averages)
}

/// Least-squares trend line for a dated series.
///
/// Dates must be strictly increasing and parallel to `values`. Each date is
/// encoded as its day count from the first date of the span, so the slope
/// comes out per day and the fitted sequence does not depend on any global
/// epoch. Closed form, no iterative solver.
pub fn fit_trend_line(
    dates: &[NaiveDate],
    values: &[f64],
) -> Result<TrendLine, SeriesError> {
    if dates.len() != values.len() {
        return Err(SeriesError::MismatchedLengths);
    }
    if dates.len() < 2 {
        return Err(SeriesError::InsufficientPoints);
    }

    let origin = dates[0];
    let xs: Vec<f64> = dates
        .iter()
        .map(|d| d.signed_duration_since(origin).num_days() as f64)
        .collect();

    let n = xs.len() as f64;

    let (sum_x, sum_y, sum_xy, sum_x2) = xs
        .iter()
        .zip(values.iter())
        .fold((0.0, 0.0, 0.0, 0.0), |(sx, sy, sxy, sx2), (&x, &y)| {
            (sx + x, sy + y, sxy + x * y, sx2 + x * x)
        });

    // Strictly increasing dates keep the denominator positive.
    let denom = n * sum_x2 - sum_x * sum_x;
    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;

    let fitted = xs.iter().map(|&x| slope * x + intercept).collect();

    Ok(TrendLine {
        slope,
        intercept,
        fitted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    #[test]
    fn moving_average_basic_scenario() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = compute_moving_average(&series, 3).unwrap();
        assert_eq!(
            out,
            vec![None, None, Some(2.0), Some(3.0), Some(4.0)]
        );
    }

    #[test]
    fn moving_average_preserves_length_and_prefix() {
        let series: Vec<f64> = (0..50).map(|i| i as f64 * 1.5).collect();
        for window in [1, 2, 7, 50] {
            let out = compute_moving_average(&series, window).unwrap();
            assert_eq!(out.len(), series.len());
            for i in 0..window - 1 {
                assert!(out[i].is_none(), "expected undefined at {}", i);
            }
            for i in window - 1..series.len() {
                let expected: f64 =
                    series[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
                let got = out[i].unwrap();
                assert!((got - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn moving_average_window_one_is_identity() {
        let series = [3.0, 1.0, 4.0, 1.0, 5.0];
        let out = compute_moving_average(&series, 1).unwrap();
        let expected: Vec<Option<f64>> = series.iter().map(|&v| Some(v)).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn moving_average_rejects_bad_windows() {
        let series = [1.0, 2.0, 3.0];
        assert_eq!(
            compute_moving_average(&series, 0),
            Err(SeriesError::InvalidWindow { window: 0, len: 3 })
        );
        assert_eq!(
            compute_moving_average(&series, 4),
            Err(SeriesError::InvalidWindow { window: 4, len: 3 })
        );
        assert!(compute_moving_average(&[], 1).is_err());
    }

    #[test]
    fn moving_average_is_idempotent() {
        let series = [2.0, 4.0, 8.0, 16.0, 32.0];
        let first = compute_moving_average(&series, 2).unwrap();
        let second = compute_moving_average(&series, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn trend_recovers_linear_series() {
        // values[i] = 2*i + 5 over consecutive days
        let dates: Vec<NaiveDate> = (0..20).map(day).collect();
        let values: Vec<f64> = (0..20).map(|i| 2.0 * i as f64 + 5.0).collect();

        let trend = fit_trend_line(&dates, &values).unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-9);
        assert!((trend.intercept - 5.0).abs() < 1e-9);
        for (fitted, actual) in trend.fitted.iter().zip(values.iter()) {
            assert!((fitted - actual).abs() < 1e-9);
        }
    }

    #[test]
    fn trend_on_constant_series_is_flat() {
        let dates: Vec<NaiveDate> = (0..10).map(day).collect();
        let values = vec![42.5; 10];

        let trend = fit_trend_line(&dates, &values).unwrap();
        assert!(trend.slope.abs() < 1e-9);
        assert!((trend.intercept - 42.5).abs() < 1e-9);
    }

    #[test]
    fn trend_three_point_scenario() {
        let dates = [day(0), day(1), day(2)];
        let values = [10.0, 12.0, 14.0];

        let trend = fit_trend_line(&dates, &values).unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-9);
        assert!((trend.intercept - 10.0).abs() < 1e-9);
        assert_eq!(trend.fitted.len(), 3);
    }

    #[test]
    fn trend_handles_irregular_spacing_per_day() {
        // Same value step over a two-day gap halves the daily slope there;
        // OLS over [0, 1, 3] days with values [0, 2, 6] is still exact.
        let dates = [day(0), day(1), day(3)];
        let values = [0.0, 2.0, 6.0];

        let trend = fit_trend_line(&dates, &values).unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-9);
        assert!(trend.intercept.abs() < 1e-9);
    }

    #[test]
    fn trend_rejects_short_and_mismatched_input() {
        assert_eq!(
            fit_trend_line(&[day(0)], &[1.0]),
            Err(SeriesError::InsufficientPoints)
        );
        assert_eq!(
            fit_trend_line(&[], &[]),
            Err(SeriesError::InsufficientPoints)
        );
        assert_eq!(
            fit_trend_line(&[day(0), day(1)], &[1.0]),
            Err(SeriesError::MismatchedLengths)
        );
    }

    #[test]
    fn trend_is_idempotent() {
        let dates: Vec<NaiveDate> = (0..5).map(day).collect();
        let values = [1.0, 3.0, 2.0, 5.0, 4.0];
        let first = fit_trend_line(&dates, &values).unwrap();
        let second = fit_trend_line(&dates, &values).unwrap();
        assert_eq!(first, second);
    }
}
