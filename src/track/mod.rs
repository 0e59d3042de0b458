//! # Tracked particle histories and feature continuation.
//!
//! A [`Track`] is the time-ordered position history of a single tracked feature or simulated
//! particle. Tracks are append-only; their consecutive observation pairs yield point-velocity
//! [`Measurement`]s via [`Track::measurements`], localized and scored by the
//! [`Localization`] and [`TrackScoring`] strategies.
//!
//! The [`tracker`] submodule provides the per-frame feature continuation state machine built on
//! top of an external correspondence primitive.

pub mod tracker;

use crate::meas::Measurement;
use derive_more::IntoIterator;
use nalgebra::{Point2, RealField, Vector2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types associated with [`Track`] mutation.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("observation time does not advance past the previous observation")]
    NonMonotonicObservation,
}

/// Where along a consecutive observation pair a velocity measurement is localized.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum Localization {
    /// The first point of the pair.
    First,
    /// The second point of the pair.
    Last,
    /// The midpoint of the pair.
    #[default]
    Midpoint,
}

/// How the quality score shared by all measurements of a track is computed.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum TrackScoring {
    /// Total elapsed track duration.
    #[default]
    Duration,
    /// Number of observations.
    Count,
}

/// The time-ordered position history of a tracked particle.
///
/// Observations are stored as `(offset, point)` pairs where `offset` is the time elapsed since
/// the first observation; the absolute time of entry `i` is `start_time + offset_i`. Offsets
/// are strictly increasing in insertion order, and entries are never removed.
#[derive(Clone, Debug, Default, Deserialize, IntoIterator, Serialize)]
pub struct Track<T>
where
    T: Copy + RealField,
{
    start_time: Option<T>,
    /// Relative-time observations.
    #[into_iterator(ref)]
    observations: Vec<(T, Point2<T>)>,
}

impl<T> Track<T>
where
    T: Copy + RealField,
{
    /// Create a new, empty [`Track`].
    pub fn new() -> Self {
        Self {
            start_time: None,
            observations: Vec::new(),
        }
    }

    /// Create a new [`Track`] with an initial observation.
    pub fn from_origin(point: Point2<T>, time: T) -> Self {
        Self {
            start_time: Some(time),
            observations: vec![(T::zero(), point)],
        }
    }

    /// Append an observation at an absolute time.
    ///
    /// The first observation fixes the track start time; any later observation must advance in
    /// time past the previous one.
    pub fn add_observation(&mut self, point: Point2<T>, time: T) -> Result<(), TrackError> {
        let start_time = match self.start_time {
            Some(start_time) => start_time,
            None => {
                self.start_time = Some(time);
                time
            }
        };

        let offset = time - start_time;

        if let Some((last_offset, _)) = self.observations.last() {
            if offset <= *last_offset {
                return Err(TrackError::NonMonotonicObservation);
            }
        }

        self.observations.push((offset, point));

        Ok(())
    }

    /// The observation at an index, with its absolute time.
    pub fn observation(&self, index: usize) -> Option<(T, Point2<T>)> {
        let start_time = self.start_time?;

        self.observations
            .get(index)
            .map(|(offset, point)| (start_time + *offset, *point))
    }

    /// The position of the most recent observation.
    pub fn last_observation(&self) -> Option<Point2<T>> {
        self.observations.last().map(|(_, point)| *point)
    }

    /// The time of the first observation.
    pub fn start_time(&self) -> Option<T> {
        self.start_time
    }

    /// The elapsed time between the first and last observation.
    pub fn duration(&self) -> T {
        self.observations
            .last()
            .map(|(offset, _)| *offset)
            .unwrap_or_else(T::zero)
    }

    /// The number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns `true` if the track holds no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// The observed positions in time order.
    pub fn point_sequence(&self) -> Vec<Point2<T>> {
        self.observations.iter().map(|(_, point)| *point).collect()
    }

    /// Extract one velocity measurement per consecutive observation pair.
    ///
    /// The velocity of a pair is the position difference divided by the time difference; the
    /// measurement location is chosen by the localization strategy and the score, computed once
    /// per track, by the scoring strategy. Tracks with fewer than two observations yield no
    /// measurements.
    pub fn measurements(
        &self,
        localization: Localization,
        scoring: TrackScoring,
    ) -> Vec<Measurement<T>> {
        if self.observations.len() < 2 {
            return Vec::new();
        }

        let score = match scoring {
            TrackScoring::Duration => self.duration(),
            TrackScoring::Count => T::from_usize(self.len()).unwrap(),
        };

        let two = T::from_usize(2).unwrap();

        self.observations
            .windows(2)
            .map(|pair| {
                let (prev_offset, prev_point) = pair[0];
                let (offset, point) = pair[1];

                let delta_t = offset - prev_offset;
                let velocity = Vector2::new(
                    (point.x - prev_point.x) / delta_t,
                    (point.y - prev_point.y) / delta_t,
                );

                let location = match localization {
                    Localization::First => prev_point,
                    Localization::Last => point,
                    Localization::Midpoint => Point2::new(
                        (prev_point.x + point.x) / two,
                        (prev_point.y + point.y) / two,
                    ),
                };

                Measurement::with_score(location, velocity, score)
            })
            .collect()
    }
}
