//! Upper convex hull of a 2D profile by Jarvis march (gift wrapping).

use super::segment_2d::orient_2d;
use super::{Point2, EPSILON};

/// Computes the upper convex hull of `points`, returned as indices ordered by
/// increasing x.
///
/// The march starts at the leftmost point (the highest one on ties) and at
/// each step wraps to the point of greatest slope to its right, preferring
/// the farthest point among collinear candidates, until no point lies further
/// right. Consecutive hull vertices therefore have strictly increasing x and
/// no three of them are collinear within [`EPSILON`] (measured as the sine of
/// the turn angle).
#[must_use]
pub fn upper_convex_hull(points: &[Point2]) -> Vec<usize> {
    let Some(start) = leftmost(points) else {
        return Vec::new();
    };

    let mut hull = vec![start];
    let mut current = start;
    while let Some(next) = wrap_step(points, current) {
        hull.push(next);
        current = next;
    }
    hull
}

fn leftmost(points: &[Point2]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, p) in points.iter().enumerate() {
        match best {
            Some(b) if p.x > points[b].x || (p.x == points[b].x && p.y <= points[b].y) => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Picks the hull successor of `current` among the points strictly to its right.
fn wrap_step(points: &[Point2], current: usize) -> Option<usize> {
    let c = &points[current];
    let mut best: Option<usize> = None;

    for (i, p) in points.iter().enumerate() {
        if p.x <= c.x {
            continue;
        }
        let Some(b) = best else {
            best = Some(i);
            continue;
        };
        let q = &points[b];
        let turn = orient_2d(c, q, p);
        let (dist_q, dist_p) = (nalgebra::distance(c, q), nalgebra::distance(c, p));
        let tolerance = EPSILON * dist_q * dist_p;
        // Above the ray c→q, or collinear with it and farther out.
        if turn > tolerance || (turn.abs() <= tolerance && dist_p > dist_q) {
            best = Some(i);
        }
    }
    best
}

/// Sum of the lengths of consecutive hull edges.
#[must_use]
pub fn polyline_length(points: &[Point2], hull: &[usize]) -> f64 {
    hull.windows(2)
        .map(|w| nalgebra::distance(&points[w[0]], &points[w[1]]))
        .sum()
}
