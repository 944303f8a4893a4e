//! Dense distance matrix.

use crate::error::{Result, RoutingError};
use crate::models::Point;

/// A dense n×n distance matrix stored in row-major order.
///
/// The routing contract requires a square, symmetric, non-negative matrix
/// with a zero diagonal. The triangle inequality is not assumed.
///
/// # Examples
///
/// ```
/// use u_shuttle::models::Point;
/// use u_shuttle::distance::DistanceMatrix;
///
/// let points = vec![
///     Point::new(0.0, 0.0),
///     Point::new(3.0, 4.0),
///     Point::new(6.0, 8.0),
/// ];
/// let dm = DistanceMatrix::from_points(&points);
/// assert!((dm.get(0, 1) - 5.0).abs() < 1e-10);
/// assert_eq!(dm.size(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Creates a distance matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    /// Computes a planar Euclidean matrix from point coordinates.
    ///
    /// Coordinates are not validated; see
    /// [`build_distance_matrix`](super::build_distance_matrix) for the checked path.
    pub fn from_points(points: &[Point]) -> Self {
        Self::from_fn(points.len(), |i, j| points[i].planar_distance(&points[j]))
    }

    /// Fills the upper triangle with `f(i, j)` and mirrors it.
    pub fn from_fn(size: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut dm = Self::new(size);
        for i in 0..size {
            for j in (i + 1)..size {
                let d = f(i, j);
                dm.set(i, j, d);
                dm.set(j, i, d);
            }
        }
        dm
    }

    /// Creates a distance matrix from an explicit n×n grid.
    ///
    /// Fails with [`RoutingError::DimensionMismatch`] if the data length
    /// doesn't match `size * size`.
    pub fn from_data(size: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != size * size {
            return Err(RoutingError::DimensionMismatch {
                expected: size * size,
                actual: data.len(),
            });
        }
        Ok(Self { data, size })
    }

    /// Returns the distance from location `from` to location `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Sets the distance from location `from` to location `to`.
    pub fn set(&mut self, from: usize, to: usize, distance: f64) {
        self.data[from * self.size + to] = distance;
    }

    /// Number of locations in this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the matrix has no locations.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns `true` if the matrix is symmetric within the given tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if (self.get(i, j) - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Checks the routing contract: finite, non-negative, zero diagonal,
    /// symmetric within `tol`.
    pub fn validate(&self, tol: f64) -> Result<()> {
        for i in 0..self.size {
            if self.get(i, i) != 0.0 {
                return Err(RoutingError::invalid(format!(
                    "diagonal entry ({i}, {i}) is {}",
                    self.get(i, i)
                )));
            }
            for j in 0..self.size {
                let d = self.get(i, j);
                if !d.is_finite() || d < 0.0 {
                    return Err(RoutingError::invalid(format!(
                        "entry ({i}, {j}) is {d}"
                    )));
                }
            }
        }
        if !self.is_symmetric(tol) {
            return Err(RoutingError::invalid("distance matrix is not symmetric"));
        }
        Ok(())
    }

    /// Fails with [`RoutingError::DimensionMismatch`] unless every index is in range.
    pub fn check_indices(&self, indices: &[usize]) -> Result<()> {
        match indices.iter().find(|&&i| i >= self.size) {
            Some(&i) => Err(RoutingError::DimensionMismatch {
                expected: self.size,
                actual: i + 1,
            }),
            None => Ok(()),
        }
    }

    /// Returns a copy with every entry passed through `f`.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            data: self.data.iter().map(|&d| f(d)).collect(),
            size: self.size,
        }
    }

    /// Returns the nearest neighbor of `from` among the given candidates.
    ///
    /// Ties go to the candidate listed first. Returns `None` if `candidates`
    /// is empty.
    pub fn nearest_neighbor(&self, from: usize, candidates: &[usize]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &c in candidates {
            let d = self.get(from, c);
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((c, d)),
            }
        }
        best.map(|(c, _)| c)
    }
}
