use nalgebra::{Point2, RealField};
use serde::{Deserialize, Serialize};

/// A rectangular grid of equally sized cells used for field sampling and evaluation.
///
/// Distances are in domain units (meters); sample points sit at the cell centers, half a cell
/// width away from the domain edges.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SampleGrid<T>
where
    T: Copy + RealField,
{
    x_distance: T,
    y_distance: T,
    x_cell_count: usize,
    y_cell_count: usize,
    x_cell_width: T,
    y_cell_width: T,
}

impl<T> SampleGrid<T>
where
    T: Copy + RealField,
{
    /// Create a new [`SampleGrid`] covering `x_distance × y_distance` with the given cell
    /// counts per axis.
    pub fn new(x_distance: T, y_distance: T, x_cell_count: usize, y_cell_count: usize) -> Self {
        Self {
            x_distance,
            y_distance,
            x_cell_count,
            y_cell_count,
            x_cell_width: x_distance / T::from_usize(x_cell_count).unwrap(),
            y_cell_width: y_distance / T::from_usize(y_cell_count).unwrap(),
        }
    }

    /// Create a new [`SampleGrid`] with the same cell count along both axes.
    pub fn uniform(x_distance: T, y_distance: T, cell_count: usize) -> Self {
        Self::new(x_distance, y_distance, cell_count, cell_count)
    }

    /// The total number of cells.
    pub fn len(&self) -> usize {
        self.x_cell_count * self.y_cell_count
    }

    /// Returns `true` if the grid contains no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of cells along the x axis.
    pub fn x_cell_count(&self) -> usize {
        self.x_cell_count
    }

    /// The number of cells along the y axis.
    pub fn y_cell_count(&self) -> usize {
        self.y_cell_count
    }

    /// The cell width along the x axis.
    pub fn x_cell_width(&self) -> T {
        self.x_cell_width
    }

    /// The cell width along the y axis.
    pub fn y_cell_width(&self) -> T {
        self.y_cell_width
    }

    /// The covered distance along the x axis.
    pub fn x_distance(&self) -> T {
        self.x_distance
    }

    /// The covered distance along the y axis.
    pub fn y_distance(&self) -> T {
        self.y_distance
    }

    /// The cell-center coordinates along the x axis.
    pub fn x_centers(&self) -> impl Iterator<Item = T> {
        let width = self.x_cell_width;
        let half = width / T::from_usize(2).unwrap();

        (0..self.x_cell_count).map(move |idx| half + width * T::from_usize(idx).unwrap())
    }

    /// The cell-center coordinates along the y axis.
    pub fn y_centers(&self) -> impl Iterator<Item = T> {
        let width = self.y_cell_width;
        let half = width / T::from_usize(2).unwrap();

        (0..self.y_cell_count).map(move |idx| half + width * T::from_usize(idx).unwrap())
    }

    /// All cell-center points, in x-major order.
    pub fn cell_centers(&self) -> Vec<Point2<T>> {
        let mut centers = Vec::with_capacity(self.len());

        for x in self.x_centers() {
            for y in self.y_centers() {
                centers.push(Point2::new(x, y));
            }
        }

        centers
    }
}
