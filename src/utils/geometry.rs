use nalgebra::Vector3;

/// calculate_angle returns the angle at vertex `b` formed by the rays `b->a` and `b->c`.
///
/// The result is in degrees and lies in `[0, 180]`. Any NaN coordinate or a
/// zero-length ray yields NaN, which callers must read as "angle unavailable".
///
/// # Arguments
/// * `a` - first end point
/// * `b` - vertex
/// * `c` - second end point
///
/// # Returns
/// * `f64`
pub fn calculate_angle(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    let a = Vector3::from(a);
    let b = Vector3::from(b);
    let c = Vector3::from(c);

    let ab = a - b;
    let cb = c - b;
    // atan2(0, 0) is 0, so a collapsed ray has to be caught before it.
    if ab.norm_squared() == 0.0 || cb.norm_squared() == 0.0 {
        return f64::NAN
    }

    let cross = ab.cross(&cb);
    let dot = ab.dot(&cb);
    cross.norm().atan2(dot).to_degrees()
}

pub fn is_valid_angle(angle: f64) -> bool {
    !angle.is_nan()
}

/// is_valid_point reports whether a projected pixel point can be drawn.
pub fn is_valid_point(point: (f64, f64)) -> bool {
    point.0.is_finite() && point.1.is_finite()
}

#[cfg(test)]
mod tests {
    use crate::utils::geometry::{calculate_angle, is_valid_angle, is_valid_point};

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_right_angle() {
        assert_close(calculate_angle([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]), 90.0);
        assert_close(calculate_angle([0.3, 0.2, 0.0], [0.3, 0.4, 0.0], [0.5, 0.4, 0.0]), 90.0);
        assert_close(calculate_angle([0.0, 0.0, 2.0], [0.0, 0.0, 0.0], [3.0, 0.0, 0.0]), 90.0);
    }

    #[test]
    fn test_straight_and_folded() {
        assert_close(calculate_angle([-1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [2.0, 0.0, 0.0]), 180.0);
        assert_close(calculate_angle([0.1, 0.1, 0.1], [0.2, 0.2, 0.2], [0.4, 0.4, 0.4]), 180.0);
        assert_close(calculate_angle([1.0, 1.0, 0.0], [0.0, 0.0, 0.0], [1.0, 1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_angle_is_symmetric() {
        let points = [
            ([0.1, 0.9, -0.2], [0.4, 0.5, 0.1], [0.8, 0.7, 0.3]),
            ([0.5, 0.2, 0.0], [0.51, 0.49, -0.05], [0.3, 0.8, 0.2]),
            ([-3.0, 4.0, 1.0], [0.0, 0.0, 0.0], [2.0, 2.0, -7.0]),
        ];
        for (a, b, c) in points {
            let forward = calculate_angle(a, b, c);
            let backward = calculate_angle(c, b, a);
            assert_close(forward, backward);
            assert!((0.0..=180.0).contains(&forward));
        }
    }

    #[test]
    fn test_degenerate_input_is_nan() {
        assert!(calculate_angle([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]).is_nan());
        assert!(calculate_angle([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]).is_nan());
        assert!(calculate_angle([f64::NAN, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]).is_nan());
        assert!(calculate_angle([1.0, 0.0, 0.0], [0.0, f64::NAN, 0.0], [0.0, 1.0, 0.0]).is_nan());
        assert!(calculate_angle([f64::NAN; 3], [f64::NAN; 3], [f64::NAN; 3]).is_nan());
    }

    #[test]
    fn test_validity_checks() {
        assert!(is_valid_angle(0.0));
        assert!(!is_valid_angle(f64::NAN));
        assert!(is_valid_point((10.0, 20.0)));
        assert!(!is_valid_point((f64::NAN, 20.0)));
        assert!(!is_valid_point((10.0, f64::INFINITY)));
    }
}
