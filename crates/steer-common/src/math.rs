//! Scalar helpers shared by the solver and the walkability caches

/// Epsilon used to guard normalizations and near-parallel line tests
pub const EPSILON: f32 = 1e-5;

/// Tighter epsilon used for cross-product / determinant guards
pub const TIGHT_EPSILON: f32 = 1e-6;

/// Squares a value
#[inline]
pub fn sqr(x: f32) -> f32 {
    x * x
}

/// Fast approximate cube root.
///
/// One Newton step over a bit-trick seed, accurate to well under 1% for
/// positive inputs. The walkability cache only uses it to compare volumes
/// against a ratio threshold, so the approximation error is irrelevant.
#[inline]
pub fn fast_cbrt(x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    let i = x.to_bits() / 3 + 0x2a51_2a3e;
    let y = f32::from_bits(i);
    // Newton iteration for y^3 = x
    (2.0 * y + x / (y * y)) * (1.0 / 3.0)
}

/// Quantizes a world coordinate to a grid cell index
#[inline]
pub fn quantize(v: f32, cell_size: f32) -> i32 {
    (v / cell_size).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_cbrt_accuracy() {
        for &x in &[0.001_f32, 0.5, 1.0, 8.0, 27.0, 1000.0, 123456.0] {
            let approx = fast_cbrt(x);
            let exact = x.cbrt();
            assert!(
                (approx - exact).abs() / exact < 0.01,
                "cbrt({x}) approx {approx} vs {exact}"
            );
        }
    }

    #[test]
    fn test_fast_cbrt_non_positive() {
        assert_eq!(fast_cbrt(0.0), 0.0);
        assert_eq!(fast_cbrt(-8.0), 0.0);
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0.1, 0.25), 0);
        assert_eq!(quantize(0.26, 0.25), 1);
        assert_eq!(quantize(-0.1, 0.25), -1);
    }
}
