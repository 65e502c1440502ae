//! Distribution Approximations
//!
//! Closed-form approximations of the standard normal and Student t
//! distributions. They are accurate enough for confidence intervals and
//! significance flags and avoid pulling in a statistics library.

use crate::LARGE_SAMPLE_THRESHOLD;

// Acklam's rational approximation coefficients for the normal quantile.
const A: [f64; 6] = [
    -3.969683028665376e+01,
    2.209460984245205e+02,
    -2.759285104469687e+02,
    1.383577518672690e+02,
    -3.066479806614716e+01,
    2.506628277459239e+00,
];
const B: [f64; 5] = [
    -5.447609879822406e+01,
    1.615858368580409e+02,
    -1.556989798598866e+02,
    6.680131188771972e+01,
    -1.328068155288572e+01,
];
const C: [f64; 6] = [
    -7.784894002430293e-03,
    -3.223964580411365e-01,
    -2.400758277161838e+00,
    -2.549732539343734e+00,
    4.374664141464968e+00,
    2.938163982698783e+00,
];
const D: [f64; 4] = [
    7.784695709041462e-03,
    3.224671290700398e-01,
    2.445134137142996e+00,
    3.754408661907416e+00,
];
const P_LOW: f64 = 0.02425;

// Abramowitz and Stegun 7.1.26 coefficients for `erf`, lowest order first.
const ERF_A: [f64; 5] = [
    0.254829592,
    -0.284496736,
    1.421413741,
    -1.453152027,
    1.061405429,
];
const ERF_P: f64 = 0.3275911;

/// Standard normal quantile (inverse CDF)
///
/// Rational approximation with relative error around 1.15e-9 over the open
/// unit interval. Returns `-inf`/`+inf` at the boundaries.
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p == 0.5 {
        return 0.0;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        lower_tail(q)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -lower_tail(q)
    }
}

fn lower_tail(q: f64) -> f64 {
    (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
        / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
}

/// Student t quantile
///
/// Cornish-Fisher expansion around the normal quantile; falls back to the
/// normal quantile once `df` reaches the large-sample threshold.
pub fn t_quantile(p: f64, df: f64) -> f64 {
    let z = normal_quantile(p);
    if df >= LARGE_SAMPLE_THRESHOLD as f64 || !z.is_finite() {
        return z;
    }

    let z3 = z * z * z;
    let z5 = z3 * z * z;
    let z7 = z5 * z * z;

    let c1 = z3 + z;
    let c2 = 5.0 * z5 + 16.0 * z3 + 3.0 * z;
    let c3 = 3.0 * z7 + 19.0 * z5 + 17.0 * z3 - 15.0 * z;

    z + c1 / (4.0 * df) + c2 / (96.0 * df * df) + c3 / (384.0 * df * df * df)
}

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Approximate Student t CDF
///
/// Below the large-sample threshold the argument is stretched by the
/// polynomial `1 + x^2/(4df) - x^4/(96df^2)`. The factor is floored at 1 so a
/// large `|x|` never maps below the uncorrected normal CDF.
pub fn t_cdf(x: f64, df: f64) -> f64 {
    if df >= LARGE_SAMPLE_THRESHOLD as f64 {
        return normal_cdf(x);
    }
    let x2 = x * x;
    let correction = (1.0 + x2 / (4.0 * df) - x2 * x2 / (96.0 * df * df)).max(1.0);
    normal_cdf(x * correction)
}

/// Error function (Abramowitz and Stegun 7.1.26, absolute error below 1.5e-7)
fn erf(x: f64) -> f64 {
    let t = 1.0 / (1.0 + ERF_P * x.abs());
    let poly = ERF_A.iter().rev().fold(0.0, |acc, &a| acc * t + a) * t;
    let y = 1.0 - poly * (-x * x).exp();
    y.copysign(x)
}
