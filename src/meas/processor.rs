use crate::meas::Measurement;
use log::{debug, warn};
use nalgebra::RealField;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Error types associated with the [`MeasurementProcessor`].
#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq)]
pub enum ProcessorError {
    #[error("measurement cell ({0}, {1}) lies outside of the processor grid")]
    OutOfBounds(i64, i64),
}

/// Spatial aggregation of measurements with bounded per-cell capacity.
///
/// The covered domain is divided into a grid of cells; each cell retains at most
/// `max_per_cell` measurements. When an insertion exceeds the capacity, the single
/// lowest-scored measurement in the cell is evicted (the first one found in insertion order
/// when several share the minimum score), so every cell greedily keeps the highest-quality
/// measurements seen so far.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MeasurementProcessor<T>
where
    T: Copy + RealField,
{
    x_cell_width: T,
    y_cell_width: T,
    x_cell_count: usize,
    y_cell_count: usize,
    max_per_cell: usize,
    bins: HashMap<(i64, i64), Vec<Measurement<T>>>,
}

impl<T> MeasurementProcessor<T>
where
    T: Copy + RealField + AsPrimitive<i64>,
{
    /// The default per-cell measurement capacity.
    pub const DEFAULT_MAX_PER_CELL: usize = 2;

    /// Create a new [`MeasurementProcessor`] over a domain of the given size and cell counts,
    /// with the default per-cell capacity.
    pub fn new(x_distance: T, y_distance: T, x_cell_count: usize, y_cell_count: usize) -> Self {
        Self::with_capacity(
            x_distance,
            y_distance,
            x_cell_count,
            y_cell_count,
            Self::DEFAULT_MAX_PER_CELL,
        )
    }

    /// Create a new [`MeasurementProcessor`] with an explicit per-cell capacity.
    pub fn with_capacity(
        x_distance: T,
        y_distance: T,
        x_cell_count: usize,
        y_cell_count: usize,
        max_per_cell: usize,
    ) -> Self {
        Self {
            x_cell_width: x_distance / T::from_usize(x_cell_count).unwrap(),
            y_cell_width: y_distance / T::from_usize(y_cell_count).unwrap(),
            x_cell_count,
            y_cell_count,
            max_per_cell,
            bins: HashMap::new(),
        }
    }

    /// The grid cell coordinates a measurement falls into.
    pub fn bin_measurement(&self, measurement: &Measurement<T>) -> (i64, i64) {
        let point = measurement.point();

        (
            (point.x / self.x_cell_width).floor().as_(),
            (point.y / self.y_cell_width).floor().as_(),
        )
    }

    /// Insert a measurement into its cell, evicting the lowest-scored entry when the cell
    /// exceeds its capacity.
    ///
    /// Measurements outside of the cell grid are rejected and never stored.
    pub fn add_measurement(&mut self, measurement: Measurement<T>) -> Result<(), ProcessorError> {
        let (x_cell, y_cell) = self.bin_measurement(&measurement);

        if (x_cell < 0)
            | (x_cell >= self.x_cell_count as i64)
            | (y_cell < 0)
            | (y_cell >= self.y_cell_count as i64)
        {
            return Err(ProcessorError::OutOfBounds(x_cell, y_cell));
        }

        let bin = self.bins.entry((x_cell, y_cell)).or_default();

        bin.push(measurement);

        if bin.len() > self.max_per_cell {
            let mut min_index = 0;

            for index in 1..bin.len() {
                if bin[index] < bin[min_index] {
                    min_index = index;
                }
            }

            bin.remove(min_index);
        }

        Ok(())
    }

    /// Insert a batch of measurements, reporting and dropping any out-of-bounds entries.
    ///
    /// Returns the number of accepted measurements.
    pub fn add_measurements<I>(&mut self, measurements: I) -> usize
    where
        I: IntoIterator<Item = Measurement<T>>,
    {
        let mut accepted = 0;

        for measurement in measurements {
            match self.add_measurement(measurement) {
                Ok(()) => accepted += 1,
                Err(error) => warn!("dropping measurement: {}", error),
            }
        }

        debug!("binned {} measurements", accepted);

        accepted
    }

    /// All retained measurements across all cells, in unspecified order.
    pub fn get_measurements(&self) -> Vec<Measurement<T>> {
        self.bins.values().flatten().copied().collect()
    }

    /// The number of retained measurements.
    pub fn len(&self) -> usize {
        self.bins.values().map(Vec::len).sum()
    }

    /// Returns `true` if no measurements are retained.
    pub fn is_empty(&self) -> bool {
        self.bins.values().all(Vec::is_empty)
    }

    /// Empty all cells, e.g. between estimation rounds of a sliding-window pipeline.
    pub fn clear_measurements(&mut self) {
        self.bins.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Vector2};

    fn scored(x: f64, y: f64, score: f64) -> Measurement<f64> {
        Measurement::with_score(Point2::new(x, y), Vector2::new(0.0, 1.0), score)
    }

    #[test]
    fn test_binning() {
        let processor = MeasurementProcessor::new(100.0, 50.0, 20, 10);

        assert!(processor.bin_measurement(&scored(0.0, 0.0, 0.0)) == (0, 0));
        assert!(processor.bin_measurement(&scored(4.9, 5.1, 0.0)) == (0, 1));
        assert!(processor.bin_measurement(&scored(99.0, 49.0, 0.0)) == (19, 9));
        assert!(processor.bin_measurement(&scored(-1.0, 0.0, 0.0)) == (-1, 0));
    }

    #[test]
    fn test_capacity_eviction() {
        let mut processor = MeasurementProcessor::new(10.0, 10.0, 2, 2);

        // All of these land in cell (0, 0).
        processor.add_measurement(scored(1.0, 1.0, 3.0)).unwrap();
        processor.add_measurement(scored(2.0, 2.0, 1.0)).unwrap();
        processor.add_measurement(scored(3.0, 3.0, 2.0)).unwrap();

        let retained = processor.get_measurements();

        assert!(retained.len() == 2);
        assert!(retained.iter().all(|m| m.score() >= 2.0));

        // Low-score inserts into a full cell are evicted immediately.
        processor.add_measurement(scored(4.0, 4.0, 0.5)).unwrap();

        assert!(processor.len() == 2);
        assert!(processor.get_measurements().iter().all(|m| m.score() >= 2.0));
    }

    #[test]
    fn test_eviction_tie_break() {
        let mut processor = MeasurementProcessor::with_capacity(10.0, 10.0, 2, 2, 2);

        processor.add_measurement(scored(1.0, 1.0, 1.0)).unwrap();
        processor.add_measurement(scored(2.0, 2.0, 1.0)).unwrap();
        processor.add_measurement(scored(3.0, 3.0, 1.0)).unwrap();

        // The first-found minimum is evicted, so the earliest insert goes first.
        let retained = processor.get_measurements();

        assert!(retained.len() == 2);
        assert!(retained.iter().all(|m| m.point().x >= 2.0));
    }

    #[test]
    fn test_out_of_bounds_rejection() {
        let mut processor = MeasurementProcessor::new(10.0, 10.0, 2, 2);

        assert!(
            processor.add_measurement(scored(-1.0, 5.0, 0.0))
                == Err(ProcessorError::OutOfBounds(-1, 1))
        );
        assert!(processor.add_measurement(scored(5.0, 11.0, 0.0)).is_err());
        assert!(processor.is_empty());

        let accepted = processor.add_measurements(vec![
            scored(1.0, 1.0, 0.0),
            scored(20.0, 1.0, 0.0),
            scored(6.0, 6.0, 0.0),
        ]);

        assert!(accepted == 2);
        assert!(processor.len() == 2);
    }

    #[test]
    fn test_clear() {
        let mut processor = MeasurementProcessor::new(10.0, 10.0, 2, 2);

        processor.add_measurement(scored(1.0, 1.0, 0.0)).unwrap();
        processor.clear_measurements();

        assert!(processor.is_empty());
        assert!(processor.get_measurements().is_empty());
    }
}
