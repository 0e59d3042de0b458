//! # Field approximators: fitting a [`VectorField`] to measurements.
//!
//! This module introduces the [`FieldApproximator`] trait, the trait that is shared by all
//! estimators that consume [`Measurement`]s and produce a fitted [`VectorField`].
//!
//! The concrete implementation is [`PolynomialLsApproximator`], a linear least-squares fit on
//! the monomial basis. Gaussian-process style approximators live outside this crate and plug in
//! behind the same contract together with the
//! [`RegressionModel`](`crate::field::regression::RegressionModel`) seam.

mod poly;

pub use poly::*;

use crate::{
    field::{FieldRepresentation, VectorField, extents::FieldExtents},
    meas::Measurement,
};
use nalgebra::RealField;
use thiserror::Error;

/// Error types associated with the [`FieldApproximator`] trait.
#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq)]
pub enum ApproximatorError {
    #[error("no measurements available to fit a field")]
    InsufficientData,
    #[error("normal equations could not be solved: {0}")]
    SingularSystem(&'static str),
}

/// A trait that is shared by all field approximators.
pub trait FieldApproximator<T>
where
    T: Copy + RealField,
{
    /// The field representation type produced by this approximator.
    type Representation: FieldRepresentation<T>;

    /// Add a single measurement to the estimation problem.
    fn add_measurement(&mut self, measurement: &Measurement<T>);

    /// Add a batch of measurements to the estimation problem.
    fn add_measurements<'a, I>(&mut self, measurements: I)
    where
        I: IntoIterator<Item = &'a Measurement<T>>,
        T: 'a,
    {
        for measurement in measurements {
            self.add_measurement(measurement);
        }
    }

    /// Discard all accumulated measurements.
    fn clear_measurements(&mut self);

    /// Fit a field to the accumulated measurements, valid over the given extents (or
    /// unrestricted when no extents are given).
    fn approximate(
        &mut self,
        extents: Option<FieldExtents<T>>,
    ) -> Result<VectorField<T, Self::Representation>, ApproximatorError>;
}
