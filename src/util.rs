// Numeric helpers: cell parsing, basic statistics and number formatting.
//
// Statistics here work on finite values only; NaN sentinels coming from
// zero-quantity groups are skipped rather than poisoning a whole column.
use crate::types::Describe;
use num_format::{Locale, ToFormattedString};
use std::cmp::Ordering;

/// Parse a spreadsheet text cell into `f64`.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    s.replace(',', "").parse::<f64>().ok()
}

/// `numerator / denominator`, or NaN when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

pub fn finite_values(v: &[f64]) -> Vec<f64> {
    v.iter().copied().filter(|x| x.is_finite()).collect()
}

pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    Some(v.iter().sum::<f64>() / v.len() as f64)
}

/// Sample (n - 1) standard deviation. `None` below two values.
pub fn sample_std(v: &[f64]) -> Option<f64> {
    if v.len() < 2 {
        return None;
    }
    let m = mean(v)?;
    let ss: f64 = v.iter().map(|x| (x - m) * (x - m)).sum();
    Some((ss / (v.len() - 1) as f64).sqrt())
}

/// Linear-interpolated quantile of an ascending slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn describe(values: &[f64]) -> Describe {
    let mut v = finite_values(values);
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Describe {
        count: v.len(),
        mean: mean(&v).unwrap_or(f64::NAN),
        std: sample_std(&v).unwrap_or(f64::NAN),
        min: v.first().copied().unwrap_or(f64::NAN),
        q25: quantile_sorted(&v, 0.25),
        median: quantile_sorted(&v, 0.5),
        q75: quantile_sorted(&v, 0.75),
        max: v.last().copied().unwrap_or(f64::NAN),
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus `num-format` thousands separators (`1,234,567.89`).
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // `-0` after rounding is printed as `0`.
    if n.is_sign_negative() && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1,234", Some(1234.0))]
    #[case(" 12.5 ", Some(12.5))]
    #[case("-3", Some(-3.0))]
    #[case("", None)]
    #[case("12個", None)]
    #[case("abc", None)]
    fn parses_numeric_text(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_f64_safe(input), expected);
    }

    #[test]
    fn ratio_by_zero_is_nan() {
        assert!(ratio(100.0, 0.0).is_nan());
        assert_eq!(ratio(100.0, 4.0), 25.0);
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = sample_std(&v).unwrap();
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn describe_skips_nan_and_interpolates_quantiles() {
        let d = describe(&[4.0, f64::NAN, 1.0, 3.0, 2.0]);
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, 2.5);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 4.0);
        assert_eq!(d.q25, 1.75);
        assert_eq!(d.median, 2.5);
        assert_eq!(d.q75, 3.25);
    }

    #[test]
    fn describe_of_empty_column_is_all_nan() {
        let d = describe(&[]);
        assert_eq!(d.count, 0);
        assert!(d.mean.is_nan() && d.std.is_nan() && d.median.is_nan());
    }

    #[rstest]
    #[case(1234567.891, 2, "1,234,567.89")]
    #[case(1234567.6, 0, "1,234,568")]
    #[case(-9876.0, 0, "-9,876")]
    #[case(-0.001, 1, "0.0")]
    #[case(f64::NAN, 0, "NaN")]
    fn formats_with_separators(#[case] n: f64, #[case] decimals: usize, #[case] expected: &str) {
        assert_eq!(format_number(n, decimals), expected);
    }
}
