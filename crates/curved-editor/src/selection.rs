//! Hierarchical curve selection.
//!
//! A selection is a set of paths: either a whole curve or a single point on
//! a curve (which implies its tangent handles). The presenter works with flat
//! `(curve_index, point_index)` pairs; this module translates both ways.

use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Selected point indices grouped by curve index, sorted ascending.
pub type PointsByCurve = BTreeMap<usize, SmallVec<[usize; 4]>>;

/// One selected entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectionPath {
    /// The curve itself, no particular point.
    WholeCurve(usize),
    /// A control point: `(curve_index, point_index)`.
    Point(usize, usize),
}

impl SelectionPath {
    pub fn curve(&self) -> usize {
        match *self {
            SelectionPath::WholeCurve(c) | SelectionPath::Point(c, _) => c,
        }
    }

    pub fn point(&self) -> Option<usize> {
        match *self {
            SelectionPath::WholeCurve(_) => None,
            SelectionPath::Point(_, p) => Some(p),
        }
    }
}

/// A set of selection paths.
///
/// Traversal order is kept (it pairs selected points with the positions
/// snapshotted at drag start), but equality ignores it.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    paths: Vec<SelectionPath>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from paths, dropping duplicates (first occurrence wins).
    pub fn from_paths(paths: impl IntoIterator<Item = SelectionPath>) -> Self {
        let mut result: Vec<SelectionPath> = Vec::new();
        for path in paths {
            if !result.contains(&path) {
                result.push(path);
            }
        }
        Self { paths: result }
    }

    /// Point paths from `(curve_index, point_index)` pairs.
    pub fn from_pairs(pairs: &[(usize, usize)]) -> Self {
        Self::from_paths(pairs.iter().map(|&(c, p)| SelectionPath::Point(c, p)))
    }

    /// Whole-curve paths.
    pub fn whole_curves(curves: impl IntoIterator<Item = usize>) -> Self {
        Self::from_paths(curves.into_iter().map(SelectionPath::WholeCurve))
    }

    /// Canonical selection from a point map: curves with points yield their
    /// points in ascending order, curves with an empty list yield a
    /// whole-curve path.
    pub fn from_points_by_curve(points: &PointsByCurve) -> Self {
        let mut paths = Vec::new();
        for (&curve, indices) in points {
            if indices.is_empty() {
                paths.push(SelectionPath::WholeCurve(curve));
            } else {
                let mut sorted = indices.clone();
                sorted.sort_unstable();
                paths.extend(sorted.into_iter().map(|p| SelectionPath::Point(curve, p)));
            }
        }
        Self::from_paths(paths)
    }

    pub fn paths(&self) -> &[SelectionPath] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// The curve index shared by every path, or `None` when the selection is
    /// empty or spans several curves.
    pub fn single_curve_index(&self) -> Option<usize> {
        let first = self.paths.first()?.curve();
        self.paths
            .iter()
            .all(|p| p.curve() == first)
            .then_some(first)
    }

    /// `(curve_index, point_index)` when the selection is exactly one point.
    pub fn single_point(&self) -> Option<(usize, usize)> {
        match self.paths.as_slice() {
            [SelectionPath::Point(c, p)] => Some((*c, *p)),
            _ => None,
        }
    }

    /// Selected points grouped by curve. Curves selected only as a whole
    /// appear with an empty list.
    pub fn points_by_curve(&self) -> PointsByCurve {
        let mut map = PointsByCurve::new();
        for path in &self.paths {
            let entry = map.entry(path.curve()).or_default();
            if let Some(p) = path.point() {
                entry.push(p);
            }
        }
        for indices in map.values_mut() {
            indices.sort_unstable();
        }
        map
    }

    /// Every selected point as `(curve_index, point_index)`, in traversal
    /// order.
    pub fn point_list(&self) -> Vec<(usize, usize)> {
        self.paths
            .iter()
            .filter_map(|path| match *path {
                SelectionPath::Point(c, p) => Some((c, p)),
                SelectionPath::WholeCurve(_) => None,
            })
            .collect()
    }

    /// Keep only the paths accepted by `valid`.
    pub fn retain(&self, mut valid: impl FnMut(&SelectionPath) -> bool) -> Self {
        Self {
            paths: self.paths.iter().copied().filter(|p| valid(p)).collect(),
        }
    }

    fn sorted(&self) -> Vec<SelectionPath> {
        let mut paths = self.paths.clone();
        paths.sort_unstable();
        paths
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.paths.len() == other.paths.len() && self.sorted() == other.sorted()
    }
}

impl Eq for Selection {}

impl FromIterator<SelectionPath> for Selection {
    fn from_iter<I: IntoIterator<Item = SelectionPath>>(iter: I) -> Self {
        Self::from_paths(iter)
    }
}
