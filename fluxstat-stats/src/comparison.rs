//! Baseline Comparison Statistics
//!
//! Compares a live accumulator against a frozen baseline using Welch's
//! unequal-variance t-test and Cohen's d with Hedges' small-sample correction.
//! Both work purely on accumulated moments, so no raw samples are needed.

use crate::distribution::{normal_cdf, t_cdf};
use crate::running::RunningStatistics;
use crate::LARGE_SAMPLE_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Outcome of Welch's two-sample t-test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchTest {
    /// Absolute t statistic (0 when the standard error vanishes)
    pub t_statistic: f64,
    /// Welch-Satterthwaite degrees of freedom (0 when undefined)
    pub degrees_of_freedom: f64,
    /// Two-tailed p-value in `[0, 1]`
    pub p_value: f64,
}

/// Interpretation of effect size magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectInterpretation {
    /// |d| < 0.2 - negligible difference
    Negligible,
    /// 0.2 <= |d| < 0.5 - small difference
    Small,
    /// 0.5 <= |d| < 0.8 - medium difference
    Medium,
    /// |d| >= 0.8 - large difference
    Large,
}

impl std::fmt::Display for EffectInterpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectInterpretation::Negligible => write!(f, "negligible"),
            EffectInterpretation::Small => write!(f, "small"),
            EffectInterpretation::Medium => write!(f, "medium"),
            EffectInterpretation::Large => write!(f, "large"),
        }
    }
}

/// Baseline comparison attached to every recorded measurement
///
/// `p_value` and `effect_size` are `None` when no baseline exists or either
/// side has fewer than two observations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
    pub is_significant: bool,
    /// Cohen's convention applied to `effect_size`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_interpretation: Option<EffectInterpretation>,
}

impl BaselineComparison {
    /// Comparison reported when there is nothing to compare against
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Compare live statistics against a baseline
///
/// `significance_level` is the p-value cut-off (0.05 for a 95% engine).
pub fn compare_to_baseline(
    live: &RunningStatistics,
    baseline: &RunningStatistics,
    significance_level: f64,
) -> BaselineComparison {
    if live.count() < 2 || baseline.count() < 2 {
        return BaselineComparison::absent();
    }

    let test = welch_t_test(live, baseline);
    let effect_size = cohens_d(live, baseline);

    BaselineComparison {
        p_value: Some(test.p_value),
        effect_size: Some(effect_size),
        is_significant: test.p_value < significance_level,
        effect_interpretation: Some(interpret_effect_size(effect_size)),
    }
}

/// Welch's t-test for two groups with unequal variances (two-tailed)
pub fn welch_t_test(a: &RunningStatistics, b: &RunningStatistics) -> WelchTest {
    let undefined = |p_value| WelchTest {
        t_statistic: 0.0,
        degrees_of_freedom: 0.0,
        p_value,
    };

    if a.count() < 2 || b.count() < 2 {
        return undefined(1.0);
    }

    let n1 = a.count() as f64;
    let n2 = b.count() as f64;
    let mean_diff = a.mean() - b.mean();

    let s1_sq_n1 = a.variance() / n1;
    let s2_sq_n2 = b.variance() / n2;
    let se = (s1_sq_n1 + s2_sq_n2).sqrt();

    // Both samples constant: identical means are indistinguishable,
    // anything else is a certain difference.
    if se == 0.0 {
        return undefined(if mean_diff == 0.0 { 1.0 } else { 0.0 });
    }

    let t_statistic = (mean_diff / se).abs();

    let df_num = (s1_sq_n1 + s2_sq_n2).powi(2);
    let df_denom = s1_sq_n1.powi(2) / (n1 - 1.0) + s2_sq_n2.powi(2) / (n2 - 1.0);
    if df_denom == 0.0 {
        return WelchTest {
            t_statistic,
            degrees_of_freedom: 0.0,
            p_value: 1.0,
        };
    }
    let degrees_of_freedom = df_num / df_denom;

    let cdf = if degrees_of_freedom >= LARGE_SAMPLE_THRESHOLD as f64 {
        normal_cdf(t_statistic)
    } else {
        t_cdf(t_statistic, degrees_of_freedom)
    };
    let p_value = (2.0 * (1.0 - cdf)).clamp(0.0, 1.0);

    WelchTest {
        t_statistic,
        degrees_of_freedom,
        p_value,
    }
}

/// Cohen's d with Hedges' small-sample correction
///
/// Returns the absolute standardized difference; 0 when the pooled variance
/// vanishes or either side has fewer than two observations.
pub fn cohens_d(a: &RunningStatistics, b: &RunningStatistics) -> f64 {
    if a.count() < 2 || b.count() < 2 {
        return 0.0;
    }

    let n1 = a.count() as f64;
    let n2 = b.count() as f64;
    let pooled_var = ((n1 - 1.0) * a.variance() + (n2 - 1.0) * b.variance()) / (n1 + n2 - 2.0);
    if pooled_var <= 0.0 {
        return 0.0;
    }

    let d = (a.mean() - b.mean()).abs() / pooled_var.sqrt();
    let correction = 1.0 - 3.0 / (4.0 * (n1 + n2 - 2.0) - 1.0);
    d * correction
}

/// Interpret effect size magnitude using Cohen's conventions
pub fn interpret_effect_size(d: f64) -> EffectInterpretation {
    let abs_d = d.abs();
    if abs_d < 0.2 {
        EffectInterpretation::Negligible
    } else if abs_d < 0.5 {
        EffectInterpretation::Small
    } else if abs_d < 0.8 {
        EffectInterpretation::Medium
    } else {
        EffectInterpretation::Large
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(values: &[f64]) -> RunningStatistics {
        RunningStatistics::from_slice(values)
    }

    #[test]
    fn test_identical_samples() {
        let samples = [100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 101.0, 99.0];
        let a = stats(&samples);
        let result = compare_to_baseline(&a, &a, 0.05);

        assert!(result.p_value.unwrap() > 0.99);
        assert_eq!(result.effect_size, Some(0.0));
        assert!(!result.is_significant);
        assert_eq!(
            result.effect_interpretation,
            Some(EffectInterpretation::Negligible)
        );
    }

    #[test]
    fn test_clear_regression() {
        let baseline = stats(&[100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 101.0, 99.0]);
        let candidate = stats(&[200.0, 202.0, 198.0, 201.0, 199.0, 200.0, 201.0, 199.0]);
        let result = compare_to_baseline(&candidate, &baseline, 0.05);

        assert!(result.p_value.unwrap() < 0.001);
        assert!(result.is_significant);
        assert!(result.effect_size.unwrap() > 10.0);
        assert_eq!(result.effect_interpretation, Some(EffectInterpretation::Large));
    }

    #[test]
    fn test_large_samples_use_normal_tail() {
        let a: RunningStatistics = (0..200).map(|i| 10.0 + (i % 10) as f64 * 0.1).collect();
        let b: RunningStatistics = (0..200).map(|i| 10.05 + (i % 10) as f64 * 0.1).collect();
        let test = welch_t_test(&a, &b);
        assert!(test.degrees_of_freedom >= 30.0);
        assert!(test.p_value > 0.0 && test.p_value < 1.0);
    }

    #[test]
    fn test_zero_variance_both_sides() {
        let a = stats(&[100.0; 100]);
        let same = stats(&[100.0, 100.0]);
        let other = stats(&[500.0, 500.0]);

        assert_eq!(welch_t_test(&same, &a).p_value, 1.0);
        assert_eq!(welch_t_test(&other, &a).p_value, 0.0);
        assert_eq!(cohens_d(&other, &a), 0.0);

        let result = compare_to_baseline(&other, &a, 0.05);
        assert!(result.is_significant);
        assert_eq!(result.effect_size, Some(0.0));
    }

    #[test]
    fn test_zero_variance_baseline_only() {
        let baseline = stats(&[100.0; 100]);
        let live = stats(&[500.0, 501.0]);
        let test = welch_t_test(&live, &baseline);

        assert!(test.p_value.is_finite());
        assert!(test.p_value < 0.05);
        assert!(cohens_d(&live, &baseline).is_finite());
    }

    #[test]
    fn test_insufficient_samples() {
        let one = stats(&[1.0]);
        let many = stats(&[1.0, 2.0, 3.0]);
        assert_eq!(compare_to_baseline(&one, &many, 0.05), BaselineComparison::absent());
        assert_eq!(compare_to_baseline(&many, &one, 0.05), BaselineComparison::absent());
        assert_eq!(welch_t_test(&one, &many).p_value, 1.0);
        assert_eq!(cohens_d(&one, &many), 0.0);
    }

    #[test]
    fn test_hedges_correction_shrinks_effect() {
        let a = stats(&[1.0, 2.0, 3.0]);
        let b = stats(&[3.0, 4.0, 5.0]);
        // raw d = 2 / 1 = 2; correction = 1 - 3/(4*4 - 1) = 0.8
        assert!((cohens_d(&a, &b) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_effect_size_interpretation() {
        assert_eq!(interpret_effect_size(0.1), EffectInterpretation::Negligible);
        assert_eq!(interpret_effect_size(0.3), EffectInterpretation::Small);
        assert_eq!(interpret_effect_size(0.6), EffectInterpretation::Medium);
        assert_eq!(interpret_effect_size(1.0), EffectInterpretation::Large);
        assert_eq!(interpret_effect_size(-0.5), EffectInterpretation::Medium);
    }

    #[test]
    fn test_absent_serializes_nulls() {
        let json = serde_json::to_value(BaselineComparison::absent()).unwrap();
        assert!(json["p_value"].is_null());
        assert!(json["effect_size"].is_null());
        assert_eq!(json["is_significant"], false);
        assert!(json.get("effect_interpretation").is_none());
    }
}
