//! # Point-velocity measurements, sample grids, and spatial aggregation.
//!
//! A [`Measurement`] is a scored observation of the flow velocity at a point. Measurements are
//! created either by extracting velocities from a [`Track`](`crate::track::Track`) or by
//! sampling a [`VectorField`](`crate::field::VectorField`) directly, and are consumed by the
//! [`MeasurementProcessor`] and by the field approximators.
//!
//! The [`MeasurementProcessor`] bins measurements into a spatial cell grid with bounded per-cell
//! capacity, greedily keeping the highest-scored measurements seen so far in each cell.

mod grid;
mod processor;

pub use grid::*;
pub use processor::*;

use nalgebra::{Point2, RealField, Vector2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single scored measurement of a vector field at a point.
///
/// Measurements are compared by score only; a larger score means higher quality.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Measurement<T>
where
    T: Copy + RealField,
{
    point: Point2<T>,
    vector: Vector2<T>,
    score: T,
}

impl<T> Measurement<T>
where
    T: Copy + RealField,
{
    /// Create a new [`Measurement`] with zero score.
    pub fn new(point: Point2<T>, vector: Vector2<T>) -> Self {
        Self::with_score(point, vector, T::zero())
    }

    /// Create a new [`Measurement`] with the given quality score.
    pub fn with_score(point: Point2<T>, vector: Vector2<T>, score: T) -> Self {
        Self {
            point,
            vector,
            score,
        }
    }

    /// The location of the measurement.
    pub fn point(&self) -> Point2<T> {
        self.point
    }

    /// The measured velocity vector.
    pub fn vector(&self) -> Vector2<T> {
        self.vector
    }

    /// The quality score of the measurement.
    pub fn score(&self) -> T {
        self.score
    }
}

impl<T> PartialEq for Measurement<T>
where
    T: Copy + RealField,
{
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}

impl<T> PartialOrd for Measurement<T>
where
    T: Copy + RealField,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.score.partial_cmp(&other.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_ordering() {
        let low = Measurement::new(Point2::new(0.0, 0.0), Vector2::new(1.0, 0.0));
        let high = Measurement::with_score(Point2::new(5.0, 5.0), Vector2::new(0.0, 1.0), 2.0);

        assert!(low.score() == 0.0);
        assert!(low < high);
        assert!(high > low);

        // Comparison only considers the score, never the location.
        let other = Measurement::with_score(Point2::new(9.0, 9.0), Vector2::zeros(), 2.0);

        assert!(high == other);
    }
}
