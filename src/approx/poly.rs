use crate::{
    approx::{ApproximatorError, FieldApproximator},
    field::{PolynomialFlow, VectorField, extents::{FieldExtents, InfiniteExtents}, monomial_length, monomial_vector},
    meas::Measurement,
};
use log::{debug, warn};
use nalgebra::{DMatrix, DVector, RealField};
use serde::{Deserialize, Serialize};

/// A linear least-squares field approximator on the monomial basis.
///
/// Measurements are folded into running sums one at a time: with `w` the monomial basis vector
/// at a measurement location and `(vx, vy)` the measured velocity, the approximator maintains
/// `S += w wᵀ`, `Sx += vx w`, `Sy += vy w` and `Sxy += vx² + vy²`. Fitting therefore scales
/// with the basis length rather than the measurement count, and the normal equations are solved
/// through the Moore-Penrose pseudoinverse so that singular systems degrade gracefully instead
/// of failing. An optional ridge term can be added for ill-conditioned systems.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PolynomialLsApproximator<T>
where
    T: Copy + RealField,
{
    degree: usize,
    ridge: T,
    s: DMatrix<T>,
    sx: DVector<T>,
    sy: DVector<T>,
    sxy: T,
    count: usize,
    residual: Option<T>,
}

impl<T> PolynomialLsApproximator<T>
where
    T: Copy + RealField,
{
    /// Create a new [`PolynomialLsApproximator`] of the given polynomial degree, without
    /// regularization.
    pub fn new(degree: usize) -> Self {
        Self::with_ridge(degree, T::zero())
    }

    /// Create a new [`PolynomialLsApproximator`] with a ridge regularization term that is added
    /// to the diagonal of the normal equations matrix.
    pub fn with_ridge(degree: usize, ridge: T) -> Self {
        let length = monomial_length(degree);

        Self {
            degree,
            ridge,
            s: DMatrix::zeros(length, length),
            sx: DVector::zeros(length),
            sy: DVector::zeros(length),
            sxy: T::zero(),
            count: 0,
            residual: None,
        }
    }

    /// The polynomial degree of the fitted field.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The number of accumulated measurements.
    pub fn measurement_count(&self) -> usize {
        self.count
    }

    /// The residual (training) error of the most recent fit, for diagnostics.
    pub fn last_residual(&self) -> Option<T> {
        self.residual
    }
}

impl<T> FieldApproximator<T> for PolynomialLsApproximator<T>
where
    T: Copy + RealField,
{
    type Representation = PolynomialFlow<T>;

    fn add_measurement(&mut self, measurement: &Measurement<T>) {
        let w = monomial_vector(&measurement.point(), self.degree);
        let velocity = measurement.vector();

        self.s += &w * w.transpose();
        self.sx += &w * velocity[0];
        self.sy += &w * velocity[1];
        self.sxy += velocity[0].powi(2) + velocity[1].powi(2);
        self.count += 1;
    }

    fn clear_measurements(&mut self) {
        let length = monomial_length(self.degree);

        self.s = DMatrix::zeros(length, length);
        self.sx = DVector::zeros(length);
        self.sy = DVector::zeros(length);
        self.sxy = T::zero();
        self.count = 0;
        self.residual = None;
    }

    fn approximate(
        &mut self,
        extents: Option<FieldExtents<T>>,
    ) -> Result<VectorField<T, PolynomialFlow<T>>, ApproximatorError> {
        if self.count == 0 {
            warn!("no measurements available");

            return Err(ApproximatorError::InsufficientData);
        }

        let mut system = self.s.clone();

        if self.ridge > T::zero() {
            for idx in 0..system.nrows() {
                system[(idx, idx)] += self.ridge;
            }
        }

        let pinv = system
            .svd(true, true)
            .pseudo_inverse(T::default_epsilon())
            .map_err(ApproximatorError::SingularSystem)?;

        let a = &pinv * &self.sx;
        let b = &pinv * &self.sy;

        let two = T::from_usize(2).unwrap();
        let residual = a.dot(&(&self.s * &a)) + b.dot(&(&self.s * &b))
            - two * a.dot(&self.sx)
            - two * b.dot(&self.sy)
            + self.sxy;

        self.residual = Some(residual);

        debug!(
            "fitted degree {} polynomial field to {} measurements",
            self.degree, self.count
        );

        let extents = extents.unwrap_or_else(|| InfiniteExtents::new().into());

        Ok(VectorField::new(PolynomialFlow::new(
            self.degree,
            a,
            b,
            extents,
        )))
    }
}
