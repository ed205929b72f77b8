use std::f64::consts::{PI, TAU};

use super::Point2;

/// Direction of `tip` seen from `tail`, measured counter-clockwise from the
/// +x axis, in `(-π, π]`.
#[must_use]
pub fn direction_angle(tail: &Point2, tip: &Point2) -> f64 {
    (tip.y - tail.y).atan2(tip.x - tail.x)
}

/// Unoriented angle `tip1`–`tail`–`tip2`, in `[0, π]`.
#[must_use]
pub fn angle_between(tip1: &Point2, tail: &Point2, tip2: &Point2) -> f64 {
    let a1 = direction_angle(tail, tip1);
    let a2 = direction_angle(tail, tip2);
    let delta = (a1 - a2).abs();
    if delta > PI {
        TAU - delta
    } else {
        delta
    }
}

/// Bisector of the counter-clockwise sector that starts at `from` and ends at `to`.
///
/// Both angles are in `(-π, π]`; a sector that wraps past `π` is unwrapped
/// before halving.
#[must_use]
pub fn sector_bisector(from: f64, to: f64) -> f64 {
    let from = if from > to { from - TAU } else { from };
    (to - from) / 2.0 + from
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn direction_of_axes() {
        let o = Point2::origin();
        assert_relative_eq!(direction_angle(&o, &Point2::new(1.0, 0.0)), 0.0);
        assert_relative_eq!(direction_angle(&o, &Point2::new(0.0, 2.0)), FRAC_PI_2);
        assert_relative_eq!(direction_angle(&o, &Point2::new(-1.0, 0.0)), PI);
    }

    #[test]
    fn right_angle_between() {
        let a = angle_between(&Point2::new(1.0, 0.0), &Point2::origin(), &Point2::new(0.0, 1.0));
        assert_relative_eq!(a, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn angle_between_across_negative_x_axis() {
        // Directions at 170° and -170° enclose 20°, not 340°.
        let t1 = Point2::new(170f64.to_radians().cos(), 170f64.to_radians().sin());
        let t2 = Point2::new((-170f64).to_radians().cos(), (-170f64).to_radians().sin());
        assert_relative_eq!(angle_between(&t1, &Point2::origin(), &t2), 20f64.to_radians(), epsilon = 1e-9);
    }

    #[test]
    fn bisector_of_plain_sector() {
        assert_relative_eq!(sector_bisector(0.0, FRAC_PI_2), FRAC_PI_2 / 2.0);
    }

    #[test]
    fn bisector_of_wrapping_sector() {
        // From 135° counter-clockwise to -135°: the sector straddles π.
        let b = sector_bisector(3.0 * PI / 4.0, -3.0 * PI / 4.0);
        assert_relative_eq!(b, -PI, epsilon = 1e-12);
    }
}
