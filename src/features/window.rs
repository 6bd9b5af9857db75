//! Window transforms over a single sensor series
//!
//! Outputs are aligned with the input: positions inside the warm-up
//! period are `None`.

/// Trailing mean over `window` consecutive samples
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut result = vec![None; values.len().min(window - 1)];

    for i in (window - 1)..values.len() {
        let sum: f64 = values[(i + 1 - window)..=i].iter().sum();
        result.push(Some(sum / window as f64));
    }

    result
}

/// Difference between each sample and the one `lag` positions earlier
pub fn diff(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i < lag {
                None
            } else {
                Some(values[i] - values[i - lag])
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rolling_mean() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = rolling_mean(&values, 3);

        assert_eq!(result.len(), 5);
        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert_relative_eq!(result[2].unwrap(), 2.0);
        assert_relative_eq!(result[3].unwrap(), 3.0);
        assert_relative_eq!(result[4].unwrap(), 4.0);
    }

    #[test]
    fn test_rolling_mean_short_series() {
        let result = rolling_mean(&[1.0, 2.0], 3);
        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn test_diff() {
        let values = vec![0.8, 0.9, 0.7, 0.7];
        let result = diff(&values, 1);

        assert!(result[0].is_none());
        assert_relative_eq!(result[1].unwrap(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(result[2].unwrap(), -0.2, epsilon = 1e-12);
        assert_relative_eq!(result[3].unwrap(), 0.0);
    }
}
