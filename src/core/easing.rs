//! Easing curves for scripted camera motion

/// Smoothstep-shaped ease: `3x^2 - 2x^3`
#[must_use]
pub fn ease_in_out_cubic(x: f32) -> f32 {
    x * x * 3.0 - x * x * x * 2.0
}

/// Linear ramp from 0 at `edge0` to 1 at `edge1`, clamped
#[must_use]
pub fn linear_step(x: f32, edge0: f32, edge1: f32) -> f32 {
    let width = edge1 - edge0;
    if width.abs() <= f32::EPSILON {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    ((x - edge0) / width).clamp(0.0, 1.0)
}

/// Piecewise motion that rests for `downtime` then eases by one unit, every
/// `period`.
///
/// Returns completed cycles plus the eased progress of the current one, so
/// the result increases by exactly 1 per period.
#[must_use]
pub fn stop_go_eased(x: f32, downtime: f32, period: f32) -> f32 {
    if period <= 0.0 || !x.is_finite() {
        return 0.0;
    }
    let cycle = (x / period).trunc();
    let tween = x - cycle * period;
    cycle + ease_in_out_cubic(linear_step(tween, downtime, period))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_linear_step() {
        assert_eq!(linear_step(0.0, 1.0, 3.0), 0.0);
        assert_eq!(linear_step(2.0, 1.0, 3.0), 0.5);
        assert_eq!(linear_step(5.0, 1.0, 3.0), 1.0);
        assert_eq!(linear_step(2.0, 2.0, 2.0), 1.0);
    }

    #[test]
    fn test_stop_go_rests_then_moves() {
        // Resting during the downtime
        assert_eq!(stop_go_eased(0.5, 1.0, 4.0), 0.0);
        assert_eq!(stop_go_eased(1.0, 1.0, 4.0), 0.0);
        // Halfway through the move
        assert!((stop_go_eased(2.5, 1.0, 4.0) - 0.5).abs() < 1e-6);
        // One full unit per period
        assert!((stop_go_eased(4.0, 1.0, 4.0) - 1.0).abs() < 1e-6);
        assert!((stop_go_eased(8.5, 1.0, 4.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_stop_go_monotonic() {
        let mut previous = 0.0;
        for step in 0..200 {
            let value = stop_go_eased(step as f32 * 0.1, 1.0, 4.0);
            assert!(value + 1e-6 >= previous);
            previous = value;
        }
    }
}
