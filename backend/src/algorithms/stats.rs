//! Small-sample statistics used by the estimator and the analytics services.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{PredictionError, PredictionResult};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    Some(if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    })
}

/// Sample standard deviation with the n−1 denominator.
///
/// A single value has no spread; it returns 0 instead of NaN.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1) as f64;
    variance.sqrt()
}

/// Two-tailed Student's t critical value for `confidence` and `df` degrees
/// of freedom, i.e. the `(1 + confidence) / 2` quantile.
pub fn t_critical(confidence: f64, df: usize) -> PredictionResult<f64> {
    if df == 0 {
        return Err(PredictionError::InvalidInput(
            "t distribution needs at least one degree of freedom".to_string(),
        ));
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(PredictionError::InvalidInput(format!(
            "confidence level must lie in (0, 1), got {}",
            confidence
        )));
    }
    let dist = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| PredictionError::Statistics(e.to_string()))?;
    Ok(dist.inverse_cdf((1.0 + confidence) / 2.0))
}

/// Half-width of the t confidence interval around a sample mean.
///
/// Samples of size one and zero-spread samples collapse to a zero margin.
pub fn margin_of_error(std_dev: f64, sample_size: usize, confidence: f64) -> PredictionResult<f64> {
    if sample_size < 2 || std_dev == 0.0 || !std_dev.is_finite() {
        return Ok(0.0);
    }
    let t = t_critical(confidence, sample_size - 1)?;
    Ok(t * std_dev / (sample_size as f64).sqrt())
}

/// Descriptive summary of a delay sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelaySummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl DelaySummary {
    pub fn empty() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
        }
    }

    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        Self {
            count: values.len(),
            mean: mean(values).unwrap_or(0.0),
            median: median(values).unwrap_or(0.0),
            std_dev: sample_std(values),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Welch's unequal-variance t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchTest {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Run Welch's t-test; `None` unless both samples hold more than one value
/// and at least one of them has spread.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<WelchTest> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (ma, mb) = (mean(a)?, mean(b)?);
    let (va, vb) = (sample_std(a).powi(2), sample_std(b).powi(2));
    let (sa, sb) = (va / na, vb / nb);
    let se = (sa + sb).sqrt();
    if se == 0.0 {
        return None;
    }
    let t_statistic = (ma - mb) / se;
    let degrees_of_freedom =
        (sa + sb).powi(2) / (sa.powi(2) / (na - 1.0) + sb.powi(2) / (nb - 1.0));
    let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom).ok()?;
    let p_value = (2.0 * (1.0 - dist.cdf(t_statistic.abs()))).clamp(0.0, 1.0);
    Some(WelchTest {
        t_statistic,
        degrees_of_freedom,
        p_value,
    })
}

/// Cohen's d with the pooled deviation `sqrt((s1² + s2²) / 2)`.
pub fn cohens_d(a: &[f64], b: &[f64]) -> Option<f64> {
    let (ma, mb) = (mean(a)?, mean(b)?);
    let pooled = ((sample_std(a).powi(2) + sample_std(b).powi(2)) / 2.0).sqrt();
    if pooled == 0.0 || !pooled.is_finite() {
        return None;
    }
    Some((ma - mb) / pooled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_median() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[10.0, 20.0, 30.0, 40.0, 50.0]), Some(30.0));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_sample_std_uses_n_minus_one() {
        let std = sample_std(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert!((std - 250.0_f64.sqrt()).abs() < 1e-12);
        assert!((std - 15.811).abs() < 1e-3);
    }

    #[test]
    fn test_sample_std_degenerate() {
        assert_eq!(sample_std(&[]), 0.0);
        assert_eq!(sample_std(&[42.0]), 0.0);
        assert_eq!(sample_std(&[7.0, 7.0, 7.0]), 0.0);
    }

    #[test]
    fn test_t_critical_known_values() {
        // Reference values from standard t tables
        assert!((t_critical(0.95, 4).unwrap() - 2.776).abs() < 1e-3);
        assert!((t_critical(0.95, 29).unwrap() - 2.045).abs() < 1e-3);
        assert!((t_critical(0.95, 1).unwrap() - 12.706).abs() < 1e-2);
    }

    #[test]
    fn test_t_critical_rejects_bad_input() {
        assert!(t_critical(0.95, 0).is_err());
        assert!(t_critical(1.5, 10).is_err());
    }

    #[test]
    fn test_margin_of_error_degenerate_cases_are_zero() {
        assert_eq!(margin_of_error(10.0, 1, 0.95).unwrap(), 0.0);
        assert_eq!(margin_of_error(0.0, 10, 0.95).unwrap(), 0.0);
    }

    #[test]
    fn test_margin_of_error_reference() {
        let margin = margin_of_error(250.0_f64.sqrt(), 5, 0.95).unwrap();
        // 2.7764 * 15.8114 / sqrt(5)
        assert!((margin - 19.632).abs() < 1e-2);
    }

    #[test]
    fn test_summary() {
        let s = DelaySummary::from_values(&[5.0, -3.0, 10.0]);
        assert_eq!(s.count, 3);
        assert_eq!(s.min, -3.0);
        assert_eq!(s.max, 10.0);
        assert_eq!(s.median, 5.0);
        assert_eq!(DelaySummary::from_values(&[]), DelaySummary::empty());
    }

    #[test]
    fn test_welch_detects_shift() {
        let a = [100.0, 110.0, 120.0, 105.0, 115.0, 108.0];
        let b = [10.0, 20.0, 15.0, 12.0, 18.0, 11.0];
        let test = welch_t_test(&a, &b).unwrap();
        assert!(test.t_statistic > 0.0);
        assert!(test.p_value < 0.001);
    }

    #[test]
    fn test_welch_needs_two_per_group() {
        assert!(welch_t_test(&[1.0], &[2.0, 3.0]).is_none());
        assert!(welch_t_test(&[1.0, 1.0], &[2.0, 2.0]).is_none());
    }

    #[test]
    fn test_cohens_d() {
        let d = cohens_d(&[2.0, 4.0], &[0.0, 2.0]).unwrap();
        // means 3 and 1, both variances 2
        assert!((d - 2.0 / 2.0_f64.sqrt()).abs() < 1e-12);
        assert!(cohens_d(&[], &[1.0]).is_none());
    }
}
