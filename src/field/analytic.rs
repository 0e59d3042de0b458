use crate::field::{
    FieldRepresentation,
    extents::{
        EncompassingExtents, ExtentsError, FieldExtents, InfiniteExtents, RangeExtents,
    },
};
use log::debug;
use nalgebra::{Point2, RealField, Vector2};
use serde::{Deserialize, Serialize};

/// A constant flow vector over the entire valid region.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UniformFlow<T>
where
    T: Copy + RealField,
{
    vector: Vector2<T>,
    extents: FieldExtents<T>,
}

impl<T> UniformFlow<T>
where
    T: Copy + RealField,
{
    /// Create a new [`UniformFlow`] over the given extents, or over infinite extents when no
    /// extents are given.
    pub fn new(vector: Vector2<T>, extents: Option<FieldExtents<T>>) -> Self {
        Self {
            vector,
            extents: extents.unwrap_or_else(|| InfiniteExtents::new().into()),
        }
    }
}

impl<T> FieldRepresentation<T> for UniformFlow<T>
where
    T: Copy + RealField,
{
    fn sample(&self, _point: &Point2<T>) -> Vector2<T> {
        self.vector
    }

    fn valid_extents(&self) -> &FieldExtents<T> {
        &self.extents
    }
}

/// Fully developed pipe flow along the positive y axis.
///
/// The flow profile is parabolic across the channel,
/// `vy = (4 (x - ox) / w - 4 (x - ox)² / w²) vmax`, reaching `vmax` at the channel centerline
/// and zero at both walls.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PipeFlow<T>
where
    T: Copy + RealField,
{
    channel_width: T,
    v_max: T,
    offset: Vector2<T>,
    extents: FieldExtents<T>,
}

impl<T> PipeFlow<T>
where
    T: Copy + RealField,
{
    /// Create a new [`PipeFlow`] with the channel wall at the origin.
    ///
    /// When no extents are given, a square region with side length `channel_width` is used.
    pub fn new(channel_width: T, v_max: T, extents: Option<FieldExtents<T>>) -> Self {
        Self::with_offset(channel_width, v_max, Vector2::zeros(), extents)
    }

    /// Create a new [`PipeFlow`] with the channel wall offset from the origin.
    pub fn with_offset(
        channel_width: T,
        v_max: T,
        offset: Vector2<T>,
        extents: Option<FieldExtents<T>>,
    ) -> Self {
        let extents = extents.unwrap_or_else(|| {
            RangeExtents::new(
                (offset[0], offset[0] + channel_width),
                (offset[1], offset[1] + channel_width),
            )
            .into()
        });

        Self {
            channel_width,
            v_max,
            offset,
            extents,
        }
    }
}

impl<T> FieldRepresentation<T> for PipeFlow<T>
where
    T: Copy + RealField,
{
    fn sample(&self, point: &Point2<T>) -> Vector2<T> {
        let four = T::from_usize(4).unwrap();
        let dx = point.x - self.offset[0];
        let profile = four * dx / self.channel_width
            - four * dx.powi(2) / self.channel_width.powi(2);

        Vector2::new(T::zero(), profile * self.v_max)
    }

    fn valid_extents(&self) -> &FieldExtents<T> {
        &self.extents
    }
}

/// Radial flow away from a source point, with linear decay.
///
/// The flow magnitude is `strength` at the source and decays linearly to zero at
/// `decay_distance` away from it. The value at the source itself is the zero vector since the
/// flow direction is undefined there.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DivergingFlow<T>
where
    T: Copy + RealField,
{
    strength: T,
    source: Point2<T>,
    decay_distance: T,
    extents: FieldExtents<T>,
}

impl<T> DivergingFlow<T>
where
    T: Copy + RealField,
{
    /// Create a new [`DivergingFlow`] around a source point.
    pub fn new(
        strength: T,
        source: Point2<T>,
        decay_distance: T,
        extents: Option<FieldExtents<T>>,
    ) -> Self {
        Self {
            strength,
            source,
            decay_distance,
            extents: extents.unwrap_or_else(|| InfiniteExtents::new().into()),
        }
    }

    fn radial(&self, point: &Point2<T>) -> Vector2<T> {
        let offset = point - self.source;
        let distance = offset.norm();

        if (distance == T::zero()) | (distance >= self.decay_distance) {
            return Vector2::zeros();
        }

        offset * (self.strength * (T::one() - distance / self.decay_distance) / distance)
    }
}

impl<T> FieldRepresentation<T> for DivergingFlow<T>
where
    T: Copy + RealField,
{
    fn sample(&self, point: &Point2<T>) -> Vector2<T> {
        self.radial(point)
    }

    fn valid_extents(&self) -> &FieldExtents<T> {
        &self.extents
    }
}

/// Radial flow into a sink point, with linear decay.
///
/// The mirror image of [`DivergingFlow`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConvergingFlow<T>
where
    T: Copy + RealField,
{
    inner: DivergingFlow<T>,
}

impl<T> ConvergingFlow<T>
where
    T: Copy + RealField,
{
    /// Create a new [`ConvergingFlow`] around a sink point.
    pub fn new(
        strength: T,
        sink: Point2<T>,
        decay_distance: T,
        extents: Option<FieldExtents<T>>,
    ) -> Self {
        Self {
            inner: DivergingFlow::new(strength, sink, decay_distance, extents),
        }
    }
}

impl<T> FieldRepresentation<T> for ConvergingFlow<T>
where
    T: Copy + RealField,
{
    fn sample(&self, point: &Point2<T>) -> Vector2<T> {
        -self.inner.radial(point)
    }

    fn valid_extents(&self) -> &FieldExtents<T> {
        self.inner.valid_extents()
    }
}

/// An ordered first-match-wins composition of flow models.
///
/// Each member is routed by its own valid extents; the first member (in insertion order) whose
/// extents contain the sample point provides the value. Members may overlap, in which case the
/// insertion order decides. Points matched by no member sample the configured undefined value.
///
/// The overall extents are an [`EncompassingExtents`] over all members, so the reported ranges
/// grow monotonically as members are pushed.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CompoundFlow<T>
where
    T: Copy + RealField,
{
    parts: Vec<FlowModel<T>>,
    extents: FieldExtents<T>,
    undefined_value: Vector2<T>,
}

impl<T> CompoundFlow<T>
where
    T: Copy + RealField,
{
    /// Create a new [`CompoundFlow`] from an initial member.
    ///
    /// The member must report bounded extents along both axes.
    pub fn new(first: FlowModel<T>) -> Result<Self, ExtentsError> {
        let extents = EncompassingExtents::new(first.valid_extents().clone())?;

        Ok(Self {
            parts: vec![first],
            extents: extents.into(),
            undefined_value: Vector2::zeros(),
        })
    }

    /// Set the value returned for points matched by no member.
    pub fn set_undefined_value(&mut self, value: Vector2<T>) {
        self.undefined_value = value;
    }

    /// Append a member, widening the overall extents to include it.
    pub fn push(&mut self, model: FlowModel<T>) -> Result<(), ExtentsError> {
        match &mut self.extents {
            FieldExtents::Encompassing(extents) => {
                extents.add_extents(model.valid_extents().clone())?
            }
            _ => unreachable!(),
        }

        self.parts.push(model);

        Ok(())
    }

    /// The members in insertion order.
    pub fn parts(&self) -> &[FlowModel<T>] {
        &self.parts
    }
}

impl<T> FieldRepresentation<T> for CompoundFlow<T>
where
    T: Copy + RealField,
{
    fn sample(&self, point: &Point2<T>) -> Vector2<T> {
        for part in &self.parts {
            if part.valid_extents().contains(point) {
                return part.sample(point);
            }
        }

        debug!("sampling compound flow outside of any member region");

        self.undefined_value
    }

    fn valid_extents(&self) -> &FieldExtents<T> {
        &self.extents
    }
}

/// An algebraic data type over all closed-form flow representations.
///
/// Used by [`CompoundFlow`] to compose heterogeneous members while remaining serializable.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", content = "content")]
pub enum FlowModel<T>
where
    T: Copy + RealField,
{
    Uniform(UniformFlow<T>),
    Pipe(PipeFlow<T>),
    Diverging(DivergingFlow<T>),
    Converging(ConvergingFlow<T>),
    Compound(CompoundFlow<T>),
}

impl<T> FieldRepresentation<T> for FlowModel<T>
where
    T: Copy + RealField,
{
    fn sample(&self, point: &Point2<T>) -> Vector2<T> {
        match self {
            FlowModel::Uniform(flow) => flow.sample(point),
            FlowModel::Pipe(flow) => flow.sample(point),
            FlowModel::Diverging(flow) => flow.sample(point),
            FlowModel::Converging(flow) => flow.sample(point),
            FlowModel::Compound(flow) => flow.sample(point),
        }
    }

    fn valid_extents(&self) -> &FieldExtents<T> {
        match self {
            FlowModel::Uniform(flow) => flow.valid_extents(),
            FlowModel::Pipe(flow) => flow.valid_extents(),
            FlowModel::Diverging(flow) => flow.valid_extents(),
            FlowModel::Converging(flow) => flow.valid_extents(),
            FlowModel::Compound(flow) => flow.valid_extents(),
        }
    }
}

impl<T> From<UniformFlow<T>> for FlowModel<T>
where
    T: Copy + RealField,
{
    fn from(value: UniformFlow<T>) -> Self {
        FlowModel::Uniform(value)
    }
}

impl<T> From<PipeFlow<T>> for FlowModel<T>
where
    T: Copy + RealField,
{
    fn from(value: PipeFlow<T>) -> Self {
        FlowModel::Pipe(value)
    }
}

impl<T> From<DivergingFlow<T>> for FlowModel<T>
where
    T: Copy + RealField,
{
    fn from(value: DivergingFlow<T>) -> Self {
        FlowModel::Diverging(value)
    }
}

impl<T> From<ConvergingFlow<T>> for FlowModel<T>
where
    T: Copy + RealField,
{
    fn from(value: ConvergingFlow<T>) -> Self {
        FlowModel::Converging(value)
    }
}

impl<T> From<CompoundFlow<T>> for FlowModel<T>
where
    T: Copy + RealField,
{
    fn from(value: CompoundFlow<T>) -> Self {
        FlowModel::Compound(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::approx::ulps_eq;

    #[test]
    fn test_pipe_flow_profile() {
        let flow = PipeFlow::new(100.0, 3.0, None);

        // Zero velocity at both walls, maximum at the centerline.
        assert!(ulps_eq!(flow.sample(&Point2::new(0.0, 10.0))[1], 0.0));
        assert!(ulps_eq!(flow.sample(&Point2::new(100.0, 10.0))[1], 0.0));
        assert!(ulps_eq!(flow.sample(&Point2::new(50.0, 10.0))[1], 3.0));
        assert!(flow.sample(&Point2::new(50.0, 10.0))[0] == 0.0);

        let offset = PipeFlow::with_offset(100.0, 3.0, Vector2::new(20.0, 0.0), None);

        assert!(ulps_eq!(offset.sample(&Point2::new(70.0, 0.0))[1], 3.0));
        assert!(offset.valid_extents().x_range() == Some((20.0, 120.0)));
    }

    #[test]
    fn test_radial_flows() {
        let source = Point2::new(0.0, 0.0);
        let diverging = DivergingFlow::new(2.0, source, 10.0, None);

        // Direction points away from the source, magnitude decays linearly.
        let value = diverging.sample(&Point2::new(5.0, 0.0));

        assert!(ulps_eq!(value[0], 1.0));
        assert!(ulps_eq!(value[1], 0.0));

        assert!(diverging.sample(&source) == Vector2::zeros());
        assert!(diverging.sample(&Point2::new(20.0, 0.0)) == Vector2::zeros());

        let converging = ConvergingFlow::new(2.0, source, 10.0, None);

        assert!(ulps_eq!(converging.sample(&Point2::new(5.0, 0.0))[0], -1.0));
    }

    #[test]
    fn test_compound_flow_routing() {
        let left = UniformFlow::new(
            Vector2::new(1.0, 0.0),
            Some(RangeExtents::new((0.0, 1.0), (0.0, 1.0)).into()),
        );
        let right = UniformFlow::new(
            Vector2::new(-1.0, 0.0),
            Some(RangeExtents::new((1.0, 2.0), (0.0, 1.0)).into()),
        );

        let mut compound = CompoundFlow::new(left.into()).unwrap();
        compound.push(right.into()).unwrap();

        assert!(compound.sample(&Point2::new(0.5, 0.5)) == Vector2::new(1.0, 0.0));
        assert!(compound.sample(&Point2::new(1.5, 0.5)) == Vector2::new(-1.0, 0.0));

        // The boundary belongs to the first member in insertion order.
        assert!(compound.sample(&Point2::new(1.0, 0.5)) == Vector2::new(1.0, 0.0));

        // Unmatched points fall through to the undefined value.
        assert!(compound.sample(&Point2::new(5.0, 5.0)) == Vector2::zeros());

        assert!(compound.valid_extents().x_range() == Some((0.0, 2.0)));
        assert!(compound.valid_extents().y_range() == Some((0.0, 1.0)));
    }
}
