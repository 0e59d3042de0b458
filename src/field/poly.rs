use crate::field::{FieldRepresentation, extents::FieldExtents};
use nalgebra::{DVector, Point2, RealField, Vector2};
use serde::{Deserialize, Serialize};

/// Evaluate the monomial basis vector of the given degree at a point.
///
/// The basis contains all terms `x^i y^j` with `i + j <= degree`, ordered by ascending `j` and,
/// within each `j`, by ascending `i`. Its length is `(degree + 1) (degree + 2) / 2`.
pub fn monomial_vector<T>(point: &Point2<T>, degree: usize) -> DVector<T>
where
    T: Copy + RealField,
{
    let mut terms = Vec::with_capacity(monomial_length(degree));

    for y_exp in 0..=degree {
        for x_exp in 0..=(degree - y_exp) {
            terms.push(point.x.powi(x_exp as i32) * point.y.powi(y_exp as i32));
        }
    }

    DVector::from_vec(terms)
}

/// The length of the monomial basis vector of the given degree.
pub fn monomial_length(degree: usize) -> usize {
    (degree + 1) * (degree + 2) / 2
}

/// A polynomial field representation on the monomial basis.
///
/// Samples `(wᵀ a, wᵀ b)` where `w` is the monomial basis vector at the sample point and `a`,
/// `b` are the fitted coefficient vectors for the two velocity components. Produced by
/// [`PolynomialLsApproximator`](`crate::approx::PolynomialLsApproximator`).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PolynomialFlow<T>
where
    T: Copy + RealField,
{
    degree: usize,
    coeff_x: DVector<T>,
    coeff_y: DVector<T>,
    extents: FieldExtents<T>,
}

impl<T> PolynomialFlow<T>
where
    T: Copy + RealField,
{
    /// Create a new [`PolynomialFlow`] from fitted coefficient vectors.
    ///
    /// Panics if the coefficient vector lengths do not match the basis length of the degree.
    pub fn new(
        degree: usize,
        coeff_x: DVector<T>,
        coeff_y: DVector<T>,
        extents: FieldExtents<T>,
    ) -> Self {
        assert_eq!(coeff_x.len(), monomial_length(degree));
        assert_eq!(coeff_y.len(), monomial_length(degree));

        Self {
            degree,
            coeff_x,
            coeff_y,
            extents,
        }
    }

    /// The polynomial degree.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The fitted coefficients of the x velocity component.
    pub fn coeff_x(&self) -> &DVector<T> {
        &self.coeff_x
    }

    /// The fitted coefficients of the y velocity component.
    pub fn coeff_y(&self) -> &DVector<T> {
        &self.coeff_y
    }
}

impl<T> FieldRepresentation<T> for PolynomialFlow<T>
where
    T: Copy + RealField,
{
    fn sample(&self, point: &Point2<T>) -> Vector2<T> {
        let w = monomial_vector(point, self.degree);

        Vector2::new(w.dot(&self.coeff_x), w.dot(&self.coeff_y))
    }

    fn valid_extents(&self) -> &FieldExtents<T> {
        &self.extents
    }
}
