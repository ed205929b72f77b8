//! 2D spatial index used to find candidate triangles for a point.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

use crate::math::{Point2, Point3};

/// An axis-aligned rectangle in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Minimum corner.
    pub min: Point2,
    /// Maximum corner.
    pub max: Point2,
}

impl Envelope {
    /// Degenerate envelope covering a single point.
    #[must_use]
    pub fn from_point(p: &Point2) -> Self {
        Self { min: *p, max: *p }
    }

    /// Smallest envelope covering the XY projection of `points`, or `None`
    /// when there are no points.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut env = Self::from_point(&first.xy());
        for p in iter {
            env.expand_to_include(&p.xy());
        }
        Some(env)
    }

    /// Grows the envelope to cover `p`.
    pub fn expand_to_include(&mut self, p: &Point2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Copy of the envelope grown by `margin` on every side.
    #[must_use]
    pub fn expanded_by(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Whether `p` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether the two envelopes overlap (touching counts).
    #[must_use]
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Spatial index over item envelopes.
///
/// `query` returns the ids of every inserted item whose envelope may overlap
/// the query envelope, in the index's own enumeration order. False positives
/// are allowed; callers run an exact test on each candidate.
pub trait SpatialIndex: Debug + Send + Sync {
    /// Registers `id` as covering `envelope`.
    fn insert(&mut self, envelope: &Envelope, id: usize);

    /// Candidate ids overlapping `envelope`.
    fn query(&self, envelope: &Envelope) -> Vec<usize>;
}

/// Largest number of cells an item is registered in. Items spanning more
/// cells are kept aside and filtered by envelope on every query.
const MAX_CELLS_PER_ITEM: i64 = 64;

/// A uniform hash grid over the XY plane.
///
/// Each item is registered in every cell its envelope touches, unless that
/// would take more than [`MAX_CELLS_PER_ITEM`] cells. Point queries read a
/// single cell plus the oversized items.
#[derive(Debug)]
pub struct GridIndex {
    cell_size: f64,
    grid: HashMap<(i64, i64), Vec<usize>>,
    oversized: Vec<(Envelope, usize)>,
}

impl GridIndex {
    /// Creates an empty grid with square cells of side `cell_size`.
    #[must_use]
    pub fn with_cell_size(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size > 0.0 && cell_size.is_finite() { cell_size } else { 1.0 },
            grid: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    /// Creates an empty grid sized so that `item_count` evenly spread items
    /// over `extent` land a handful per cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn for_extent(extent: &Envelope, item_count: usize) -> Self {
        let area = extent.width() * extent.height();
        let cell_size = if item_count == 0 || area <= 0.0 {
            extent.width().max(extent.height())
        } else {
            (area / item_count as f64).sqrt() * 2.0
        };
        Self::with_cell_size(cell_size)
    }

    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_coords(&self, p: &Point2) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }
}

impl SpatialIndex for GridIndex {
    fn insert(&mut self, envelope: &Envelope, id: usize) {
        let (x0, y0) = self.cell_coords(&envelope.min);
        let (x1, y1) = self.cell_coords(&envelope.max);
        let span = |lo: i64, hi: i64| hi.saturating_sub(lo).saturating_add(1);
        let cells = span(x0, x1).saturating_mul(span(y0, y1));
        if cells > MAX_CELLS_PER_ITEM {
            self.oversized.push((*envelope, id));
            return;
        }
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.grid.entry((cx, cy)).or_default().push(id);
            }
        }
    }

    fn query(&self, envelope: &Envelope) -> Vec<usize> {
        let (x0, y0) = self.cell_coords(&envelope.min);
        let (x1, y1) = self.cell_coords(&envelope.max);

        let mut result = Vec::new();
        if x0 == x1 && y0 == y1 {
            result.extend(self.grid.get(&(x0, y0)).into_iter().flatten().copied());
        } else {
            let mut seen = HashSet::new();
            for cx in x0..=x1 {
                for cy in y0..=y1 {
                    if let Some(ids) = self.grid.get(&(cx, cy)) {
                        result.extend(ids.iter().copied().filter(|id| seen.insert(*id)));
                    }
                }
            }
        }
        result.extend(
            self.oversized
                .iter()
                .filter(|(env, _)| env.intersects(envelope))
                .map(|&(_, id)| id),
        );
        result
    }
}
