/// CSS-style cubic Bézier timing function
///
/// Endpoints are fixed at (0, 0) and (1, 1); the two control points shape the
/// curve. `y` may leave [0, 1] for overshooting curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl CubicBezier {
    pub const LINEAR: CubicBezier = CubicBezier { x1: 0.0, y1: 0.0, x2: 1.0, y2: 1.0 };

    /// Control point x values are clamped to [0, 1] so the curve stays a function of time
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.clamp(0.0, 1.0),
            y1,
            x2: x2.clamp(0.0, 1.0),
            y2,
        }
    }

    pub fn from_points((x1, y1, x2, y2): (f64, f64, f64, f64)) -> Self {
        Self::new(x1, y1, x2, y2)
    }

    #[inline]
    fn component(t: f64, p1: f64, p2: f64) -> f64 {
        let u = 1.0 - t;
        3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
    }

    #[inline]
    fn derivative(t: f64, p1: f64, p2: f64) -> f64 {
        let u = 1.0 - t;
        3.0 * u * u * p1 + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
    }

    /// Curve parameter whose x equals `x`
    fn solve_t(&self, x: f64) -> f64 {
        // Newton first, bisection when the slope flattens out
        let mut t = x;
        for _ in 0..8 {
            let error = Self::component(t, self.x1, self.x2) - x;
            if error.abs() < 1e-7 {
                return t;
            }
            let slope = Self::derivative(t, self.x1, self.x2);
            if slope.abs() < 1e-6 {
                break;
            }
            t -= error / slope;
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        for _ in 0..64 {
            let value = Self::component(t, self.x1, self.x2);
            if (value - x).abs() < 1e-7 {
                break;
            }
            if value < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) * 0.5;
        }
        t
    }

    /// Eased progress for linear progress `x` in [0, 1]
    pub fn ease(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        let t = self.solve_t(x);
        Self::component(t, self.y1, self.y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let curve = CubicBezier::new(0.44, -0.205, 0.0, 1.13);
        assert_eq!(curve.ease(0.0), 0.0);
        assert_eq!(curve.ease(1.0), 1.0);
        assert_eq!(curve.ease(-3.0), 0.0);
        assert_eq!(curve.ease(7.0), 1.0);
    }

    #[test]
    fn test_linear_is_identity() {
        for i in 1..10 {
            let x = i as f64 / 10.0;
            assert!((CubicBezier::LINEAR.ease(x) - x).abs() < 1e-4);
        }
    }

    #[test]
    fn test_wheel_curve_winds_back_then_overshoots() {
        let curve = CubicBezier::new(0.44, -0.205, 0.0, 1.13);
        // Negative y1 pulls the wheel backwards at the very start
        assert!(curve.ease(0.05) < 0.0);
        // y2 above 1 overshoots before settling
        let overshoot = (80..100).map(|i| curve.ease(i as f64 / 100.0)).fold(f64::MIN, f64::max);
        assert!(overshoot > 1.0);
    }

    #[test]
    fn test_clamps_control_x() {
        let curve = CubicBezier::new(-1.0, 0.0, 2.0, 1.0);
        assert_eq!(curve, CubicBezier::new(0.0, 0.0, 1.0, 1.0));
    }
}
