use crate::models::{Sample, Series};

/// Finds the newest present sample, skipping at most `max_null_points`
/// trailing samples.
///
/// When nothing present turns up inside the window the last sample is
/// returned as-is, so with `max_null_points == 0` a present last value is
/// still reported present. An empty series resolves to an absent sample at
/// timestamp 0.
pub fn resolve(series: &Series, max_null_points: usize) -> Sample {
    let Some(last) = series.last() else {
        return Sample::absent(0);
    };

    series
        .samples
        .iter()
        .rev()
        .take(max_null_points)
        .find(|sample| !sample.value.is_absent())
        .copied()
        .unwrap_or(*last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use pretty_assertions::assert_eq;

    const T: i64 = 1643964240;

    fn series(values: &[Option<f64>]) -> Series {
        let start = T - 60 * (values.len() as i64 - 1);
        Series::from_step("a", start, 60, values.iter().map(|v| Value::from(*v)))
    }

    #[test]
    fn test_empty_series() {
        for n in [0, 1, 10] {
            let got = resolve(&Series::new("a", vec![]), n);
            assert!(got.value.is_absent());
            assert!(got.value.as_f64().is_nan());
        }
    }

    #[test]
    fn test_last_absent() {
        let got = resolve(&series(&[None]), 1);
        assert_eq!(got, Sample::absent(T));
    }

    #[test]
    fn test_last_present() {
        let got = resolve(&series(&[Some(1.0), Some(10.0)]), 1);
        assert_eq!(got, Sample::present(T, 10.0));
    }

    #[test]
    fn test_zero_window_keeps_last() {
        assert_eq!(resolve(&series(&[Some(1.0), Some(10.0)]), 0), Sample::present(T, 10.0));
        assert_eq!(resolve(&series(&[Some(1.0), None]), 0), Sample::absent(T));
    }

    #[test]
    fn test_skips_trailing_nulls_within_window() {
        let s = series(&[Some(1.0), Some(2.0), None, None]);
        assert_eq!(resolve(&s, 3), Sample::present(T - 120, 2.0));
    }

    #[test]
    fn test_window_too_short() {
        let s = series(&[Some(1.0), Some(2.0), None, None]);
        assert_eq!(resolve(&s, 2), Sample::absent(T));
    }

    #[test]
    fn test_window_longer_than_series() {
        let s = series(&[Some(7.0), None, None]);
        assert_eq!(resolve(&s, 100), Sample::present(T - 120, 7.0));

        let s = series(&[None, None, None]);
        assert_eq!(resolve(&s, 100), Sample::absent(T));
    }
}
