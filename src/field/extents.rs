//! # Spatial validity regions for 2-D fields.
//!
//! Every field representation is paired with a [`FieldExtents`] value describing the region of
//! the plane over which sampling the field is meaningful. Extents answer two related but distinct
//! questions:
//! - `contains(point)` — is this point inside the valid region?
//! - `x_range` / `y_range` — what is the bounding interval along each axis, if one exists?
//!
//! For the union types the two answers deliberately differ: [`PiecewiseExtents`] reports no
//! ranges at all, while [`EncompassingExtents`] reports the enclosing bounding rectangle over
//! all of its members even though its containment predicate still routes through the individual
//! sub-extents. Callers that build compound domains rely on this asymmetry.

use nalgebra::{Point2, RealField};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types associated with extents construction.
///
/// These errors indicate domain-modeling bugs and are therefore surfaced at construction or
/// insertion time rather than during sampling.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ExtentsError {
    #[error("sub-extents overlap an existing member and would make routing ambiguous")]
    OverlappingSubExtents,
    #[error("sub-extents without bounding ranges cannot grow an encompassing region")]
    UnboundedSubExtents,
    #[error("partition axes must be sorted and lie strictly inside the partitioned range")]
    InvalidPartition,
}

/// A closed rectangular region.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct RangeExtents<T> {
    x_min: T,
    x_max: T,
    y_min: T,
    y_max: T,
}

impl<T> RangeExtents<T>
where
    T: Copy + RealField,
{
    /// Create a new [`RangeExtents`] from per-axis closed ranges.
    pub fn new(x_range: (T, T), y_range: (T, T)) -> Self {
        Self {
            x_min: x_range.0,
            x_max: x_range.1,
            y_min: y_range.0,
            y_max: y_range.1,
        }
    }

    /// Create a new square [`RangeExtents`] where the y range mirrors the x range.
    pub fn square(range: (T, T)) -> Self {
        Self::new(range, range)
    }

    /// Returns `true` if the point lies within the closed rectangle.
    pub fn contains(&self, point: &Point2<T>) -> bool {
        (self.x_min <= point.x)
            & (point.x <= self.x_max)
            & (self.y_min <= point.y)
            & (point.y <= self.y_max)
    }

    /// The closed range along the x axis.
    pub fn x_range(&self) -> (T, T) {
        (self.x_min, self.x_max)
    }

    /// The closed range along the y axis.
    pub fn y_range(&self) -> (T, T) {
        (self.y_min, self.y_max)
    }

    /// The side lengths of the rectangle.
    pub fn size(&self) -> (T, T) {
        (self.x_max - self.x_min, self.y_max - self.y_min)
    }

    /// Partition the rectangle along the x axis at the given sorted axes.
    ///
    /// Returns `axes.len() + 1` adjacent rectangles covering the original region. The axes must
    /// be strictly increasing and lie strictly inside the x range.
    pub fn x_split(&self, axes: &[T]) -> Result<Vec<RangeExtents<T>>, ExtentsError> {
        let cuts = validate_partition(axes, self.x_min, self.x_max)?;

        Ok(cuts
            .windows(2)
            .map(|pair| Self::new((pair[0], pair[1]), (self.y_min, self.y_max)))
            .collect())
    }

    /// Partition the rectangle along the y axis at the given sorted axes.
    pub fn y_split(&self, axes: &[T]) -> Result<Vec<RangeExtents<T>>, ExtentsError> {
        let cuts = validate_partition(axes, self.y_min, self.y_max)?;

        Ok(cuts
            .windows(2)
            .map(|pair| Self::new((self.x_min, self.x_max), (pair[0], pair[1])))
            .collect())
    }
}

fn validate_partition<T>(axes: &[T], min: T, max: T) -> Result<Vec<T>, ExtentsError>
where
    T: Copy + RealField,
{
    let mut cuts = Vec::with_capacity(axes.len() + 2);

    cuts.push(min);
    cuts.extend_from_slice(axes);
    cuts.push(max);

    if cuts.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(ExtentsError::InvalidPartition);
    }

    Ok(cuts)
}

/// An unbounded region containing every point.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct InfiniteExtents;

impl InfiniteExtents {
    /// Create a new [`InfiniteExtents`].
    pub fn new() -> Self {
        Self
    }
}

/// An ordered union of disjoint sub-extents.
///
/// The gap between members is *not* part of the region. Members whose bounding rectangles
/// overlap are rejected on insertion since they would make piecewise field routing ambiguous.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PiecewiseExtents<T> {
    parts: Vec<FieldExtents<T>>,
}

impl<T> PiecewiseExtents<T>
where
    T: Copy + RealField,
{
    /// Create a new, empty [`PiecewiseExtents`].
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Append a sub-region to the union.
    pub fn add_extents(&mut self, extents: FieldExtents<T>) -> Result<(), ExtentsError> {
        if self.parts.iter().any(|part| part.overlaps(&extents)) {
            return Err(ExtentsError::OverlappingSubExtents);
        }

        self.parts.push(extents);

        Ok(())
    }

    /// Returns `true` if any member contains the point.
    pub fn contains(&self, point: &Point2<T>) -> bool {
        self.parts.iter().any(|part| part.contains(point))
    }

    /// The sub-extents in insertion order.
    pub fn parts(&self) -> &[FieldExtents<T>] {
        &self.parts
    }
}

/// A union of sub-extents that also maintains the enclosing bounding rectangle.
///
/// The reported ranges grow monotonically as members are added (minimum of minimums, maximum of
/// maximums). The containment predicate still routes through the individual sub-extents, so a
/// point in the gap between members lies inside the reported ranges but is *not* contained.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EncompassingExtents<T> {
    parts: Vec<FieldExtents<T>>,
    x_min: T,
    x_max: T,
    y_min: T,
    y_max: T,
}

impl<T> EncompassingExtents<T>
where
    T: Copy + RealField,
{
    /// Create a new [`EncompassingExtents`] from an initial sub-region.
    ///
    /// The initial region must report ranges along both axes.
    pub fn new(extents: FieldExtents<T>) -> Result<Self, ExtentsError> {
        let (x_range, y_range) = match (extents.x_range(), extents.y_range()) {
            (Some(xr), Some(yr)) => (xr, yr),
            _ => return Err(ExtentsError::UnboundedSubExtents),
        };

        Ok(Self {
            parts: vec![extents],
            x_min: x_range.0,
            x_max: x_range.1,
            y_min: y_range.0,
            y_max: y_range.1,
        })
    }

    /// Append a sub-region, widening the bounding rectangle to include it.
    pub fn add_extents(&mut self, extents: FieldExtents<T>) -> Result<(), ExtentsError> {
        let (x_range, y_range) = match (extents.x_range(), extents.y_range()) {
            (Some(xr), Some(yr)) => (xr, yr),
            _ => return Err(ExtentsError::UnboundedSubExtents),
        };

        self.x_min = self.x_min.min(x_range.0);
        self.x_max = self.x_max.max(x_range.1);
        self.y_min = self.y_min.min(y_range.0);
        self.y_max = self.y_max.max(y_range.1);

        self.parts.push(extents);

        Ok(())
    }

    /// Returns `true` if any member contains the point.
    ///
    /// Points in the gap between members are not contained, even though they lie within the
    /// bounding ranges.
    pub fn contains(&self, point: &Point2<T>) -> bool {
        self.parts.iter().any(|part| part.contains(point))
    }

    /// The bounding range along the x axis.
    pub fn x_range(&self) -> (T, T) {
        (self.x_min, self.x_max)
    }

    /// The bounding range along the y axis.
    pub fn y_range(&self) -> (T, T) {
        (self.y_min, self.y_max)
    }

    /// The sub-extents in insertion order.
    pub fn parts(&self) -> &[FieldExtents<T>] {
        &self.parts
    }
}

/// An algebraic data type over all extents variants.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", content = "content")]
pub enum FieldExtents<T> {
    Range(RangeExtents<T>),
    Infinite(InfiniteExtents),
    Piecewise(PiecewiseExtents<T>),
    Encompassing(EncompassingExtents<T>),
}

impl<T> FieldExtents<T>
where
    T: Copy + RealField,
{
    /// Returns `true` if the point lies within the valid region.
    pub fn contains(&self, point: &Point2<T>) -> bool {
        match self {
            FieldExtents::Range(extents) => extents.contains(point),
            FieldExtents::Infinite(_) => true,
            FieldExtents::Piecewise(extents) => extents.contains(point),
            FieldExtents::Encompassing(extents) => extents.contains(point),
        }
    }

    /// The bounding range along the x axis, if one exists.
    pub fn x_range(&self) -> Option<(T, T)> {
        match self {
            FieldExtents::Range(extents) => Some(extents.x_range()),
            FieldExtents::Encompassing(extents) => Some(extents.x_range()),
            _ => None,
        }
    }

    /// The bounding range along the y axis, if one exists.
    pub fn y_range(&self) -> Option<(T, T)> {
        match self {
            FieldExtents::Range(extents) => Some(extents.y_range()),
            FieldExtents::Encompassing(extents) => Some(extents.y_range()),
            _ => None,
        }
    }

    /// Returns `true` if the two regions can intersect.
    ///
    /// Regions with bounding ranges are compared by closed rectangle intersection; an infinite
    /// region intersects everything and a piecewise region intersects if any of its members
    /// does.
    pub fn overlaps(&self, other: &FieldExtents<T>) -> bool {
        match (self, other) {
            (FieldExtents::Infinite(_), _) | (_, FieldExtents::Infinite(_)) => true,
            (FieldExtents::Piecewise(extents), other) => {
                extents.parts().iter().any(|part| part.overlaps(other))
            }
            (this, FieldExtents::Piecewise(extents)) => {
                extents.parts().iter().any(|part| this.overlaps(part))
            }
            (this, other) => {
                // Both sides report ranges here (range or encompassing variants).
                let ((ax0, ax1), (ay0, ay1)) = match (this.x_range(), this.y_range()) {
                    (Some(xr), Some(yr)) => (xr, yr),
                    _ => return false,
                };
                let ((bx0, bx1), (by0, by1)) = match (other.x_range(), other.y_range()) {
                    (Some(xr), Some(yr)) => (xr, yr),
                    _ => return false,
                };

                (ax0 <= bx1) & (bx0 <= ax1) & (ay0 <= by1) & (by0 <= ay1)
            }
        }
    }
}

impl<T> From<RangeExtents<T>> for FieldExtents<T> {
    fn from(value: RangeExtents<T>) -> Self {
        FieldExtents::Range(value)
    }
}

impl<T> From<InfiniteExtents> for FieldExtents<T> {
    fn from(value: InfiniteExtents) -> Self {
        FieldExtents::Infinite(value)
    }
}

impl<T> From<PiecewiseExtents<T>> for FieldExtents<T> {
    fn from(value: PiecewiseExtents<T>) -> Self {
        FieldExtents::Piecewise(value)
    }
}

impl<T> From<EncompassingExtents<T>> for FieldExtents<T> {
    fn from(value: EncompassingExtents<T>) -> Self {
        FieldExtents::Encompassing(value)
    }
}
