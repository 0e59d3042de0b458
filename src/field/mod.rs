//! # Vector field representations and the [`VectorField`] wrapper.
//!
//! This module introduces the [`FieldRepresentation`] trait, the trait that is shared by all
//! sampling functions paired with a region of validity.
//!
//! Currently implemented representations:
//! - [`UniformFlow`] A constant flow vector over the entire region.
//! - [`PipeFlow`] Fully developed pipe flow along the y axis in a channel of fixed width.
//! - [`DivergingFlow`] / [`ConvergingFlow`] Radial flow out of a source (or into a sink) with
//!   linear decay.
//! - [`CompoundFlow`] An ordered first-match-wins composition of other representations.
//! - [`PolynomialFlow`] A polynomial representation produced by the least-squares approximator.
//! - [`RegressionFlow`](`regression::RegressionFlow`) A representation delegating to an external
//!   regression model, one per velocity component.
//!
//! A [`VectorField`] owns exactly one representation and is immutable thereafter; changing the
//! representation means building a new field. All sampling, grid-sampling and
//! measurement-generation operations delegate to the owned representation.

mod analytic;
mod poly;

pub mod extents;
pub mod regression;

pub use analytic::*;
pub use poly::*;

use crate::{
    field::extents::FieldExtents,
    meas::{Measurement, SampleGrid},
};
use nalgebra::{DMatrix, Point2, RealField, Vector2};
use serde::{Deserialize, Serialize};
use std::{io::Write, marker::PhantomData};

/// A trait that is shared by all field representations.
///
/// A representation is a sampling function together with the extents over which the samples are
/// meaningful. Sampling a leaf representation outside of its valid extents is not an error, but
/// the returned value carries no physical meaning; compound representations define an explicit
/// fall-through value instead.
pub trait FieldRepresentation<T>
where
    T: Copy + RealField,
{
    /// Sample the field value at a point.
    fn sample(&self, point: &Point2<T>) -> Vector2<T>;

    /// The extents over which the representation is valid.
    fn valid_extents(&self) -> &FieldExtents<T>;
}

/// A 2-D vector field owning a single [`FieldRepresentation`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VectorField<T, R>(R, PhantomData<T>)
where
    T: Copy + RealField;

impl<T, R> VectorField<T, R>
where
    T: Copy + RealField,
    R: FieldRepresentation<T>,
{
    /// Create a new [`VectorField`] from a representation.
    pub fn new(representation: R) -> Self {
        Self(representation, PhantomData::<T>)
    }

    /// The extents over which the field is valid.
    pub fn extents(&self) -> &FieldExtents<T> {
        self.0.valid_extents()
    }

    /// Returns a reference to the owned representation.
    pub fn representation(&self) -> &R {
        &self.0
    }

    /// Sample the field value at a point.
    pub fn sample_at_point(&self, point: &Point2<T>) -> Vector2<T> {
        self.0.sample(point)
    }

    /// Sample the field value at each of the given points.
    pub fn sample_at_points<'a, I>(&self, points: I) -> Vec<Vector2<T>>
    where
        I: IntoIterator<Item = &'a Point2<T>>,
        T: 'a,
    {
        points
            .into_iter()
            .map(|point| self.sample_at_point(point))
            .collect()
    }

    /// Sample the field over every cell center of a grid.
    ///
    /// Returns one matrix per velocity component, indexed by `(x_cell, y_cell)`.
    pub fn sample_grid(&self, grid: &SampleGrid<T>) -> (DMatrix<T>, DMatrix<T>) {
        let mut x_samples = DMatrix::<T>::zeros(grid.x_cell_count(), grid.y_cell_count());
        let mut y_samples = DMatrix::<T>::zeros(grid.x_cell_count(), grid.y_cell_count());

        for (i, x) in grid.x_centers().enumerate() {
            for (j, y) in grid.y_centers().enumerate() {
                let value = self.sample_at_point(&Point2::new(x, y));

                x_samples[(i, j)] = value[0];
                y_samples[(i, j)] = value[1];
            }
        }

        (x_samples, y_samples)
    }

    /// Create a measurement of the field at a point, with zero score.
    pub fn measure_at_point(&self, point: &Point2<T>) -> Measurement<T> {
        Measurement::new(*point, self.sample_at_point(point))
    }

    /// Create a measurement of the field at each of the given points.
    pub fn measure_at_points<'a, I>(&self, points: I) -> Vec<Measurement<T>>
    where
        I: IntoIterator<Item = &'a Point2<T>>,
        T: 'a,
    {
        points
            .into_iter()
            .map(|point| self.measure_at_point(point))
            .collect()
    }

    /// Generate one measurement per cell center of a grid.
    pub fn generate_measurements_on_grid(&self, grid: &SampleGrid<T>) -> Vec<Measurement<T>> {
        grid.cell_centers()
            .iter()
            .map(|point| self.measure_at_point(point))
            .collect()
    }

    /// Serialize the field to a JSON file.
    pub fn save(&self, path: String) -> std::io::Result<()>
    where
        Self: Serialize,
    {
        let mut file = std::fs::File::create(path)?;

        file.write_all(serde_json5::to_string(&self).unwrap().as_bytes())?;

        Ok(())
    }

    /// Deserialize a field from a JSON file.
    pub fn load(path: String) -> std::io::Result<Self>
    where
        Self: for<'x> Deserialize<'x>,
    {
        let content = std::fs::read_to_string(path)?;

        serde_json5::from_str(&content).map_err(std::io::Error::other)
    }
}
