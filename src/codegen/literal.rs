//! Single-precision literal emission.
//!
//! Every parameter is narrowed from f64 to f32 when it is written out. This
//! is the one intended source of numeric drift between a model and its
//! generated procedure; the harness tolerance bands are calibrated for it.

use crate::error::{Error, Result};

/// Narrow a parameter to single precision, rejecting values f32 cannot hold.
pub fn narrow(value: f64) -> Result<f32> {
    let narrowed = value as f32;
    if !narrowed.is_finite() {
        return Err(Error::MalformedParameters(format!(
            "{} is not representable in single precision",
            value
        )));
    }
    Ok(narrowed)
}

/// C `float` literal for a parameter: the shortest decimal that reads back
/// as the narrowed value, with an `f` suffix.
pub fn float_literal(value: f64) -> Result<String> {
    let narrowed = narrow(value)?;
    // Debug keeps a `.0` on integral values and switches to exponent form
    // for very large or small magnitudes; both are valid C.
    Ok(format!("{:?}f", narrowed))
}

/// Narrow a split threshold toward negative infinity.
///
/// Inputs reach a split as single precision, so `x <= t` only depends on the
/// largest float not above `t`. Rounding down keeps every comparison the
/// same as against the double threshold; rounding to nearest would flip
/// inputs that land between the two.
pub fn narrow_threshold(value: f64) -> Result<f32> {
    let narrowed = narrow(value)?;
    if narrowed as f64 <= value {
        return Ok(narrowed);
    }
    let below = next_down(narrowed);
    if !below.is_finite() {
        return Err(Error::MalformedParameters(format!(
            "threshold {} is not representable in single precision",
            value
        )));
    }
    Ok(below)
}

/// C `float` literal for a split threshold.
pub fn threshold_literal(value: f64) -> Result<String> {
    Ok(format!("{:?}f", narrow_threshold(value)?))
}

/// The next float toward negative infinity.
fn next_down(x: f32) -> f32 {
    if x == 0.0 {
        return -f32::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f32::from_bits(bits - 1)
    } else {
        f32::from_bits(bits + 1)
    }
}

/// Comma-separated literal list for a C array initializer.
pub fn float_list(values: &[f64]) -> Result<String> {
    let literals = values
        .iter()
        .map(|&v| float_literal(v))
        .collect::<Result<Vec<_>>>()?;
    Ok(literals.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_values_keep_decimal_point() {
        assert_eq!(float_literal(50000.0).unwrap(), "50000.0f");
        assert_eq!(float_literal(0.0).unwrap(), "0.0f");
        assert_eq!(float_literal(-2.0).unwrap(), "-2.0f");
    }

    #[test]
    fn test_narrowing_drops_double_precision_digits() {
        assert_eq!(float_literal(0.1).unwrap(), "0.1f");
        assert_eq!(float_literal(0.123456789012345).unwrap(), "0.12345679f");
    }

    #[test]
    fn test_extreme_magnitudes_use_exponent_form() {
        assert_eq!(float_literal(1e20).unwrap(), "1e20f");
        assert_eq!(float_literal(1.5e-7).unwrap(), "1.5e-7f");
    }

    #[test]
    fn test_unrepresentable_values_rejected() {
        assert!(matches!(
            float_literal(1e300),
            Err(Error::MalformedParameters(_))
        ));
        assert!(float_literal(f64::NAN).is_err());
        assert!(float_literal(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_thresholds_round_down() {
        // 0.1 is nearest to 0.10000000149f, which lies above it.
        assert_eq!(narrow_threshold(0.1).unwrap(), 0.099999994f32);
        assert!(narrow_threshold(0.1).unwrap() as f64 <= 0.1);
        assert!((0.1f32 as f64) > 0.1);
        assert_eq!(threshold_literal(0.1).unwrap(), "0.099999994f");
        // Values already at or above their nearest float keep it.
        assert_eq!(threshold_literal(2.5).unwrap(), "2.5f");
        assert_eq!(threshold_literal(1.0 / 3.0).unwrap(), "0.3333333f");
        assert_eq!(threshold_literal(-0.5).unwrap(), "-0.5f");
    }

    #[test]
    fn test_threshold_below_negative_zero() {
        let t = narrow_threshold(-1e-60).unwrap();
        assert!(t < 0.0);
        assert_eq!(t, -f32::from_bits(1));
        assert!(narrow_threshold(f64::NAN).is_err());
    }

    #[test]
    fn test_float_list() {
        assert_eq!(
            float_list(&[200.0, 15000.0, 10000.0]).unwrap(),
            "200.0f, 15000.0f, 10000.0f"
        );
        assert_eq!(float_list(&[]).unwrap(), "");
    }
}
