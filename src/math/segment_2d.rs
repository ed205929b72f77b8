use super::Point2;

/// Returns the point of segment `a`–`b` closest to `p`.
#[must_use]
pub fn closest_point_on_segment(p: &Point2, a: &Point2, b: &Point2) -> Point2 {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return *a;
    }

    // Project point onto the infinite line, clamp to [0, 1].
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    a + d * t
}

/// Returns the minimum distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn point_to_segment_dist(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    nalgebra::distance(p, &closest_point_on_segment(p, a, b))
}

/// Orientation of `c` relative to the directed line `a`→`b`.
///
/// Positive when `c` is to the left, negative to the right, zero when collinear.
#[must_use]
pub fn orient_2d(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Whether `p`, known to be collinear with `a`–`b`, lies within its bounding box.
fn within_box(p: &Point2, a: &Point2, b: &Point2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether the closed segments `a0`–`a1` and `b0`–`b1` share at least one point.
#[must_use]
pub fn segments_intersect(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> bool {
    let d1 = orient_2d(b0, b1, a0);
    let d2 = orient_2d(b0, b1, a1);
    let d3 = orient_2d(a0, a1, b0);
    let d4 = orient_2d(a0, a1, b1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within_box(a0, b0, b1))
        || (d2 == 0.0 && within_box(a1, b0, b1))
        || (d3 == 0.0 && within_box(b0, a0, a1))
        || (d4 == 0.0 && within_box(b1, a0, a1))
}

/// Minimum distance between the segments `a0`–`a1` and `b0`–`b1` in the XY plane.
///
/// Zero when they intersect, otherwise the smallest endpoint-to-segment distance.
#[must_use]
pub fn segment_segment_dist(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> f64 {
    if segments_intersect(a0, a1, b0, b1) {
        return 0.0;
    }
    point_to_segment_dist(a0, b0, b1)
        .min(point_to_segment_dist(a1, b0, b1))
        .min(point_to_segment_dist(b0, a0, a1))
        .min(point_to_segment_dist(b1, a0, a1))
}

/// Intersection point of the bounded segments `a0`–`a1` and `b0`–`b1`.
///
/// For collinear overlapping segments the first endpoint found inside the
/// other segment is returned.
#[must_use]
pub fn segment_intersection(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> Option<Point2> {
    if !segments_intersect(a0, a1, b0, b1) {
        return None;
    }

    let da = a1 - a0;
    let db = b1 - b0;
    let cross = da.x * db.y - da.y * db.x;

    if cross == 0.0 {
        // Collinear overlap: pick a shared endpoint.
        return [b0, b1, a0, a1]
            .into_iter()
            .find(|p| orient_2d(a0, a1, p) == 0.0 && within_box(p, a0, a1) && within_box(p, b0, b1))
            .copied();
    }

    let dx = b0.x - a0.x;
    let dy = b0.y - a0.y;
    let t = ((dx * db.y - dy * db.x) / cross).clamp(0.0, 1.0);
    Some(a0 + da * t)
}
