//! # External regression-model seam for learned field representations.
//!
//! Gaussian-process style approximators are not implemented in this crate; their fitted models
//! plug in behind the [`RegressionModel`] trait, and [`RegressionFlow`] adapts one model per
//! velocity component into a [`FieldRepresentation`].

use crate::field::{FieldRepresentation, extents::FieldExtents};
use nalgebra::{Point2, RealField, Vector2};
use serde::{Deserialize, Serialize};

/// A trait that is shared by all external per-component regression models.
pub trait RegressionModel<T>
where
    T: Copy + RealField,
{
    /// Predict the mean and variance of the modeled quantity at a point.
    fn predict(&self, point: &Point2<T>) -> (T, T);
}

/// A field representation delegating to one external regression model per velocity component.
///
/// Points outside the valid extents sample the configured undefined value instead of
/// extrapolating the models.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegressionFlow<T, M>
where
    T: Copy + RealField,
{
    x_model: M,
    y_model: M,
    extents: FieldExtents<T>,
    undefined_value: Vector2<T>,
}

impl<T, M> RegressionFlow<T, M>
where
    T: Copy + RealField,
    M: RegressionModel<T>,
{
    /// Create a new [`RegressionFlow`] from per-component models.
    pub fn new(x_model: M, y_model: M, extents: FieldExtents<T>) -> Self {
        Self {
            x_model,
            y_model,
            extents,
            undefined_value: Vector2::zeros(),
        }
    }

    /// Set the value returned for points outside the valid extents.
    pub fn set_undefined_value(&mut self, value: Vector2<T>) {
        self.undefined_value = value;
    }

    /// Predict the per-component variances at a point.
    pub fn variance(&self, point: &Point2<T>) -> Vector2<T> {
        Vector2::new(self.x_model.predict(point).1, self.y_model.predict(point).1)
    }
}

impl<T, M> FieldRepresentation<T> for RegressionFlow<T, M>
where
    T: Copy + RealField,
    M: RegressionModel<T>,
{
    fn sample(&self, point: &Point2<T>) -> Vector2<T> {
        if !self.extents.contains(point) {
            return self.undefined_value;
        }

        Vector2::new(self.x_model.predict(point).0, self.y_model.predict(point).0)
    }

    fn valid_extents(&self) -> &FieldExtents<T> {
        &self.extents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::extents::RangeExtents;

    struct LinearModel {
        slope: (f64, f64),
    }

    impl RegressionModel<f64> for LinearModel {
        fn predict(&self, point: &Point2<f64>) -> (f64, f64) {
            (self.slope.0 * point.x + self.slope.1 * point.y, 0.25)
        }
    }

    #[test]
    fn test_regression_flow() {
        let flow = RegressionFlow::new(
            LinearModel { slope: (1.0, 0.0) },
            LinearModel { slope: (0.0, 2.0) },
            RangeExtents::square((0.0, 10.0)).into(),
        );

        assert!(flow.sample(&Point2::new(3.0, 4.0)) == Vector2::new(3.0, 8.0));
        assert!(flow.variance(&Point2::new(3.0, 4.0)) == Vector2::new(0.25, 0.25));

        // Out-of-domain points fall back to the undefined value.
        assert!(flow.sample(&Point2::new(11.0, 4.0)) == Vector2::zeros());
    }
}
