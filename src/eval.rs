//! # Error comparison between two vector fields.
//!
//! Two complementary engines quantify how well an approximated field matches a source field:
//!
//! - [`GridSampleComparison`] samples both fields at the centers of a [`SampleGrid`] and
//!   reports per-component statistics of the point-wise differences.
//! - [`StreamLineComparison`] advects identical seed particles through both fields with a
//!   noise-free [`ParticleSimulator`] and reports per-component statistics of the positional
//!   divergence, capturing the compounding drift error that point-wise sampling misses.
//!
//! Both engines compute lazily and cache their statistics; changing a field, the grid or the
//! seed particles invalidates the cache.

use crate::{
    field::{FieldRepresentation, VectorField},
    meas::SampleGrid,
    sim::{ParticleSimulator, SimulatorError},
};
use itertools::zip_eq;
use nalgebra::{Point2, RealField, Vector2};
use rand_distr::uniform::SampleUniform;
use serde::{Deserialize, Serialize};

/// Per-component statistics of the point-wise differences between two fields on a grid.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GridErrorStats<T>
where
    T: Copy + RealField,
{
    /// Sum of squared differences per component.
    pub sum_squared: Vector2<T>,
    /// Mean absolute difference per component.
    pub mean_abs: Vector2<T>,
    /// Minimum absolute difference per component.
    pub min_abs: Vector2<T>,
    /// Maximum absolute difference per component.
    pub max_abs: Vector2<T>,
    /// Population standard deviation of the differences per component.
    pub std_dev: Vector2<T>,
    /// Sum of squared differences normalized by the number of grid cells.
    pub normalized: Vector2<T>,
}

impl<T> GridErrorStats<T>
where
    T: Copy + RealField,
{
    fn zeros() -> Self {
        Self {
            sum_squared: Vector2::zeros(),
            mean_abs: Vector2::zeros(),
            min_abs: Vector2::zeros(),
            max_abs: Vector2::zeros(),
            std_dev: Vector2::zeros(),
            normalized: Vector2::zeros(),
        }
    }
}

/// Point-wise comparison of two vector fields sampled over a [`SampleGrid`].
#[derive(Debug)]
pub struct GridSampleComparison<T, S, A>
where
    T: Copy + RealField,
{
    source: VectorField<T, S>,
    approx: VectorField<T, A>,
    grid: SampleGrid<T>,
    cache: Option<GridErrorStats<T>>,
}

impl<T, S, A> GridSampleComparison<T, S, A>
where
    T: Copy + RealField,
    S: FieldRepresentation<T>,
    A: FieldRepresentation<T>,
{
    /// Create a new [`GridSampleComparison`] between a source and an approximated field.
    pub fn new(source: VectorField<T, S>, approx: VectorField<T, A>, grid: SampleGrid<T>) -> Self {
        Self {
            source,
            approx,
            grid,
            cache: None,
        }
    }

    /// Replace either or both fields, invalidating the cached statistics.
    pub fn change_fields(
        &mut self,
        source: Option<VectorField<T, S>>,
        approx: Option<VectorField<T, A>>,
    ) {
        if let Some(source) = source {
            self.source = source;
            self.cache = None;
        }

        if let Some(approx) = approx {
            self.approx = approx;
            self.cache = None;
        }
    }

    /// Replace the sample grid, invalidating the cached statistics.
    pub fn change_grid(&mut self, grid: SampleGrid<T>) {
        self.grid = grid;
        self.cache = None;
    }

    /// The comparison statistics, computed on first access and cached thereafter.
    ///
    /// An empty grid yields all-zero statistics.
    pub fn error(&mut self) -> GridErrorStats<T> {
        if let Some(stats) = &self.cache {
            return stats.clone();
        }

        let stats = self.compute();

        self.cache = Some(stats.clone());

        stats
    }

    fn compute(&self) -> GridErrorStats<T> {
        let centers = self.grid.cell_centers();

        if centers.is_empty() {
            return GridErrorStats::zeros();
        }

        let diffs = centers
            .iter()
            .map(|point| self.approx.sample_at_point(point) - self.source.sample_at_point(point))
            .collect::<Vec<Vector2<T>>>();

        let count = T::from_usize(diffs.len()).unwrap();

        let mut sum = Vector2::<T>::zeros();
        let mut sum_squared = Vector2::<T>::zeros();
        let mut min_abs = diffs[0].map(|value| value.abs());
        let mut max_abs = min_abs;

        for diff in &diffs {
            let abs = diff.map(|value| value.abs());

            sum += diff;
            sum_squared += diff.component_mul(diff);

            for k in 0..2 {
                if abs[k] < min_abs[k] {
                    min_abs[k] = abs[k];
                }

                if abs[k] > max_abs[k] {
                    max_abs[k] = abs[k];
                }
            }
        }

        let mean = sum / count;

        let variance = diffs
            .iter()
            .map(|diff| {
                let centered = diff - &mean;

                centered.component_mul(&centered)
            })
            .sum::<Vector2<T>>()
            / count;

        GridErrorStats {
            sum_squared,
            mean_abs: diffs
                .iter()
                .map(|diff| diff.map(|value| value.abs()))
                .sum::<Vector2<T>>()
                / count,
            min_abs,
            max_abs,
            std_dev: variance.map(|value| value.sqrt()),
            normalized: sum_squared / count,
        }
    }
}

/// Per-component statistics of the positional divergence between streamlines.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StreamLineErrorStats<T>
where
    T: Copy + RealField,
{
    /// Sum of squared positional differences per component over all particles and timesteps.
    pub sum_squared: Vector2<T>,
    /// Sum of squared differences normalized by the number of particles.
    pub per_particle: Vector2<T>,
    /// Sum of squared differences normalized by the total number of track samples.
    pub per_sample: Vector2<T>,
}

/// Streamline comparison of two vector fields from identical seed particles.
///
/// Both fields are advected with zero observation noise so that any positional divergence is
/// attributable to the fields themselves.
#[derive(Debug)]
pub struct StreamLineComparison<T, S, A>
where
    T: Copy + RealField,
{
    seeds: Vec<(T, Point2<T>)>,
    source: VectorField<T, S>,
    approx: VectorField<T, A>,
    sim_time: T,
    sim_resolution: T,
    cache: Option<StreamLineErrorStats<T>>,
}

impl<T, S, A> StreamLineComparison<T, S, A>
where
    T: Copy + RealField + SampleUniform,
    S: FieldRepresentation<T>,
    A: FieldRepresentation<T>,
{
    /// Create a new [`StreamLineComparison`] between a source and an approximated field.
    pub fn new(
        seeds: Vec<(T, Point2<T>)>,
        source: VectorField<T, S>,
        approx: VectorField<T, A>,
        sim_time: T,
        sim_resolution: T,
    ) -> Self {
        Self {
            seeds,
            source,
            approx,
            sim_time,
            sim_resolution,
            cache: None,
        }
    }

    /// Replace either or both fields, invalidating the cached statistics.
    pub fn change_fields(
        &mut self,
        source: Option<VectorField<T, S>>,
        approx: Option<VectorField<T, A>>,
    ) {
        if let Some(source) = source {
            self.source = source;
            self.cache = None;
        }

        if let Some(approx) = approx {
            self.approx = approx;
            self.cache = None;
        }
    }

    /// Replace the seed particles, invalidating the cached statistics.
    pub fn change_particles(&mut self, seeds: Vec<(T, Point2<T>)>) {
        self.seeds = seeds;
        self.cache = None;
    }

    /// The comparison statistics, computed on first access and cached thereafter.
    pub fn error(&mut self) -> Result<StreamLineErrorStats<T>, SimulatorError<T>> {
        if let Some(stats) = &self.cache {
            return Ok(stats.clone());
        }

        let stats = self.compute()?;

        self.cache = Some(stats.clone());

        Ok(stats)
    }

    fn compute(&self) -> Result<StreamLineErrorStats<T>, SimulatorError<T>> {
        let source_tracks = ParticleSimulator::new(&self.source).simulate(
            &self.seeds,
            self.sim_time,
            self.sim_resolution,
        )?;
        let approx_tracks = ParticleSimulator::new(&self.approx).simulate(
            &self.seeds,
            self.sim_time,
            self.sim_resolution,
        )?;

        let mut sum_squared = Vector2::<T>::zeros();
        let mut sample_count = 0;

        for (source_track, approx_track) in zip_eq(&source_tracks, &approx_tracks) {
            for (source_point, approx_point) in
                zip_eq(source_track.point_sequence(), approx_track.point_sequence())
            {
                let diff = approx_point - source_point;

                sum_squared += diff.component_mul(&diff);
                sample_count += 1;
            }
        }

        let particle_count = T::from_usize(source_tracks.len().max(1)).unwrap();
        let total_samples = T::from_usize(sample_count.max(1)).unwrap();

        Ok(StreamLineErrorStats {
            sum_squared,
            per_particle: sum_squared / particle_count,
            per_sample: sum_squared / total_samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{PipeFlow, UniformFlow};
    use ::approx::{abs_diff_eq, ulps_eq};

    #[test]
    fn test_grid_self_comparison_is_zero() {
        let source = VectorField::new(PipeFlow::new(100.0, 3.0, None));
        let approx = VectorField::new(PipeFlow::new(100.0, 3.0, None));
        let grid = SampleGrid::new(100.0, 100.0, 5, 5);

        let mut comparison = GridSampleComparison::new(source, approx, grid);
        let stats = comparison.error();

        assert!(ulps_eq!(stats.sum_squared.norm(), 0.0));
        assert!(ulps_eq!(stats.mean_abs.norm(), 0.0));
        assert!(ulps_eq!(stats.min_abs.norm(), 0.0));
        assert!(ulps_eq!(stats.max_abs.norm(), 0.0));
        assert!(ulps_eq!(stats.std_dev.norm(), 0.0));
        assert!(ulps_eq!(stats.normalized.norm(), 0.0));
    }

    #[test]
    fn test_grid_constant_offset_statistics() {
        let source = VectorField::new(UniformFlow::new(Vector2::new(1.0, 0.0), None));
        let approx = VectorField::new(UniformFlow::new(Vector2::new(1.5, -0.5), None));
        let grid = SampleGrid::new(4.0, 4.0, 4, 4);

        let mut comparison = GridSampleComparison::new(source, approx, grid);
        let stats = comparison.error();

        // A constant offset of (0.5, -0.5) across 16 cells.
        assert!(ulps_eq!(stats.sum_squared[0], 4.0));
        assert!(ulps_eq!(stats.sum_squared[1], 4.0));
        assert!(ulps_eq!(stats.mean_abs[0], 0.5));
        assert!(ulps_eq!(stats.mean_abs[1], 0.5));
        assert!(ulps_eq!(stats.min_abs[0], 0.5));
        assert!(ulps_eq!(stats.max_abs[0], 0.5));
        assert!(abs_diff_eq!(stats.std_dev[0], 0.0, epsilon = 1e-12));
        assert!(ulps_eq!(stats.normalized[0], 0.25));
        assert!(ulps_eq!(stats.normalized[1], 0.25));
    }

    #[test]
    fn test_grid_change_invalidates_cache() {
        let source = VectorField::new(UniformFlow::new(Vector2::new(1.0, 0.0), None));
        let approx = VectorField::new(UniformFlow::new(Vector2::new(1.0, 0.0), None));
        let grid = SampleGrid::new(2.0, 2.0, 2, 2);

        let mut comparison = GridSampleComparison::new(source, approx, grid);

        assert!(ulps_eq!(comparison.error().sum_squared.norm(), 0.0));

        comparison.change_fields(
            None,
            Some(VectorField::new(UniformFlow::new(
                Vector2::new(2.0, 0.0),
                None,
            ))),
        );

        // Four cells with a unit x offset each.
        assert!(ulps_eq!(comparison.error().sum_squared[0], 4.0));
    }

    #[test]
    fn test_streamline_self_comparison_is_zero() {
        let source = VectorField::new(PipeFlow::new(100.0, 3.0, None));
        let approx = VectorField::new(PipeFlow::new(100.0, 3.0, None));

        let seeds = vec![(0.0, Point2::new(10.0, 0.0)), (0.5, Point2::new(50.0, 0.0))];
        let mut comparison = StreamLineComparison::new(seeds, source, approx, 5.0, 0.1);

        let stats = comparison.error().unwrap();

        assert!(ulps_eq!(stats.sum_squared.norm(), 0.0));
        assert!(ulps_eq!(stats.per_particle.norm(), 0.0));
        assert!(ulps_eq!(stats.per_sample.norm(), 0.0));
    }

    #[test]
    fn test_streamline_drift_accumulates() {
        let source = VectorField::new(UniformFlow::new(Vector2::new(1.0, 0.0), None));
        let approx = VectorField::new(UniformFlow::new(Vector2::new(2.0, 0.0), None));

        let seeds = vec![(0.0, Point2::new(0.0, 0.0))];
        let mut comparison = StreamLineComparison::new(seeds, source, approx, 1.05, 0.1);

        let stats = comparison.error().unwrap();

        // After k steps the x positions differ by 0.1 k, so the squared sum over
        // k = 0..=10 is 0.01 * 385.
        assert!(abs_diff_eq!(stats.sum_squared[0], 3.85, epsilon = 1e-9));
        assert!(ulps_eq!(stats.sum_squared[1], 0.0));
        assert!(abs_diff_eq!(stats.per_particle[0], 3.85, epsilon = 1e-9));
        assert!(abs_diff_eq!(stats.per_sample[0], 0.35, epsilon = 1e-9));
    }
}
