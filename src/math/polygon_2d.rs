use super::{Point2, Point3};

/// Ray-casting point-in-polygon test. The ring may be open or closed.
#[must_use]
pub fn point_in_polygon(p: &Point2, ring: &[Point2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (ring[i], ring[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let intersect_x = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < intersect_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Drops the closing vertex of a ring when it repeats the first one.
#[must_use]
pub fn open_ring(ring: &[Point3]) -> &[Point3] {
    match ring {
        [first, .., last] if first.xy() == last.xy() => &ring[..ring.len() - 1],
        _ => ring,
    }
}
