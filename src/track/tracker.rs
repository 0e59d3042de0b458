//! # Per-frame feature continuation built on an external correspondence primitive.
//!
//! The [`FeatureTracker`] maintains a set of active [`Track`]s across a monotonically
//! timestamped frame feed. On every frame it periodically detects new features (away from the
//! endpoints of the tracks it already follows), continues the active tracks through a
//! forward-backward consistency check, and rebuilds the active set from the survivors. A track
//! that fails continuation is dropped silently; this is expected steady-state behavior, not an
//! error.

use crate::track::Track;
use log::debug;
use nalgebra::{Point2, RealField};

/// The external point-correspondence primitive consumed by the [`FeatureTracker`].
///
/// Implementations typically wrap an optical-flow routine plus a feature detector. Per-point
/// correspondence failures are reported as `None` entries, never as hard errors.
pub trait Correspondence<T>
where
    T: Copy + RealField,
{
    /// The image data type of a single frame.
    type Frame;

    /// Find the corresponding location of each point from one frame in another.
    ///
    /// The returned vector has the same length as `points`; entries are `None` for points the
    /// primitive failed to match.
    fn continue_points(
        &mut self,
        from: &Self::Frame,
        to: &Self::Frame,
        points: &[Point2<T>],
    ) -> Vec<Option<Point2<T>>>;

    /// Detect new candidate feature points in a frame.
    ///
    /// Implementations should avoid the disk of the given radius around each exclusion point;
    /// the tracker additionally discards candidates inside these disks.
    fn detect(
        &mut self,
        frame: &Self::Frame,
        exclusions: &[Point2<T>],
        radius: T,
    ) -> Vec<Point2<T>>;
}

/// Configuration of a [`FeatureTracker`].
#[derive(Clone, Copy, Debug)]
pub struct TrackerConfig<T> {
    /// Minimum time between feature detection passes.
    pub detection_interval: T,
    /// Radius of the exclusion disk around each active track endpoint during detection.
    pub exclusion_radius: T,
    /// Maximum per-axis deviation between an original point and its backward reprojection for
    /// a continuation to be accepted.
    pub deviation_threshold: T,
}

/// A stateful per-frame feature continuation state machine.
///
/// Tracks progress through detected and continuing states; a track whose forward-backward
/// consistency check fails is lost and destroyed. The next active set is built explicitly on
/// every frame from new detections plus accepted continuations.
#[derive(Debug)]
pub struct FeatureTracker<T, C>
where
    T: Copy + RealField,
    C: Correspondence<T>,
{
    correspondence: C,
    config: TrackerConfig<T>,
    prev_frame: Option<C::Frame>,
    last_detection: Option<T>,
    active: Vec<Track<T>>,
}

impl<T, C> FeatureTracker<T, C>
where
    T: Copy + RealField,
    C: Correspondence<T>,
{
    /// Create a new [`FeatureTracker`] around a correspondence primitive.
    pub fn new(correspondence: C, config: TrackerConfig<T>) -> Self {
        Self {
            correspondence,
            config,
            prev_frame: None,
            last_detection: None,
            active: Vec::new(),
        }
    }

    /// Process the next frame of the feed.
    ///
    /// Frames must arrive with monotonically increasing timestamps.
    pub fn process_frame(&mut self, frame: C::Frame, timestamp: T) {
        let endpoints = self
            .active
            .iter()
            .filter_map(Track::last_observation)
            .collect::<Vec<Point2<T>>>();

        let mut next_active = Vec::new();

        let detection_due = match self.last_detection {
            None => true,
            Some(last) => timestamp - last > self.config.detection_interval,
        };

        if detection_due {
            self.last_detection = Some(timestamp);

            let candidates =
                self.correspondence
                    .detect(&frame, &endpoints, self.config.exclusion_radius);

            let mut accepted = 0;

            for candidate in candidates {
                let duplicate = endpoints.iter().any(|endpoint| {
                    let deviation = candidate - endpoint;

                    deviation.norm() < self.config.exclusion_radius
                });

                if !duplicate {
                    next_active.push(Track::from_origin(candidate, timestamp));
                    accepted += 1;
                }
            }

            debug!("detection pass started {} new tracks", accepted);
        }

        if let Some(prev_frame) = &self.prev_frame
            && !endpoints.is_empty()
        {
            let forward = self
                .correspondence
                .continue_points(prev_frame, &frame, &endpoints);

            // Only matched forward points are reprojected; their indices map them back to the
            // originating tracks.
            let mut forward_indices = Vec::with_capacity(forward.len());
            let mut forward_points = Vec::with_capacity(forward.len());

            for (index, point) in forward.iter().enumerate() {
                if let Some(point) = point {
                    forward_indices.push(index);
                    forward_points.push(*point);
                }
            }

            let backward =
                self.correspondence
                    .continue_points(&frame, prev_frame, &forward_points);

            let mut continuations = vec![None; endpoints.len()];

            for ((index, forward_point), backward_point) in
                forward_indices.iter().zip(&forward_points).zip(&backward)
            {
                if let Some(backward_point) = backward_point {
                    let deviation = endpoints[*index] - backward_point;
                    let max_axis_deviation = deviation[0].abs().max(deviation[1].abs());

                    if max_axis_deviation < self.config.deviation_threshold {
                        continuations[*index] = Some(*forward_point);
                    }
                }
            }

            let mut lost = 0;

            for (mut track, continuation) in std::mem::take(&mut self.active)
                .into_iter()
                .zip(continuations)
            {
                match continuation {
                    Some(point) => match track.add_observation(point, timestamp) {
                        Ok(()) => next_active.push(track),
                        Err(error) => {
                            debug!("dropping track: {}", error);
                            lost += 1;
                        }
                    },
                    None => lost += 1,
                }
            }

            if lost > 0 {
                debug!("lost {} tracks in continuation", lost);
            }
        }

        self.active = next_active;
        self.prev_frame = Some(frame);
    }

    /// The currently active tracks.
    pub fn tracks(&self) -> &[Track<T>] {
        &self.active
    }

    /// Consume the tracker, returning the active tracks.
    pub fn into_tracks(self) -> Vec<Track<T>> {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    /// A correspondence primitive over a synthetic scene of drifting features.
    ///
    /// A frame is just the set of feature positions at that time; points are continued by
    /// nearest-neighbor lookup and fail when nothing lies nearby.
    struct SceneCorrespondence {
        match_radius: f64,
    }

    type Scene = Vec<Point2<f64>>;

    impl SceneCorrespondence {
        fn nearest(scene: &Scene, point: &Point2<f64>, radius: f64) -> Option<Point2<f64>> {
            scene
                .iter()
                .map(|candidate| (candidate, (candidate - point).norm()))
                .filter(|(_, distance)| *distance <= radius)
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
                .map(|(candidate, _)| *candidate)
        }
    }

    impl Correspondence<f64> for SceneCorrespondence {
        type Frame = Scene;

        fn continue_points(
            &mut self,
            _from: &Scene,
            to: &Scene,
            points: &[Point2<f64>],
        ) -> Vec<Option<Point2<f64>>> {
            points
                .iter()
                .map(|point| Self::nearest(to, point, self.match_radius))
                .collect()
        }

        fn detect(
            &mut self,
            frame: &Scene,
            exclusions: &[Point2<f64>],
            radius: f64,
        ) -> Vec<Point2<f64>> {
            frame
                .iter()
                .filter(|candidate| {
                    !exclusions
                        .iter()
                        .any(|exclusion| (*candidate - exclusion).norm() < radius)
                })
                .copied()
                .collect()
        }
    }

    fn drift(scene: &Scene, velocity: Vector2<f64>, dt: f64) -> Scene {
        scene.iter().map(|point| point + velocity * dt).collect()
    }

    #[test]
    fn test_tracker_continues_features() {
        let correspondence = SceneCorrespondence { match_radius: 2.0 };
        let config = TrackerConfig {
            detection_interval: 100.0,
            exclusion_radius: 1.0,
            deviation_threshold: 0.5,
        };

        let mut tracker = FeatureTracker::new(correspondence, config);

        let scene = vec![Point2::new(10.0, 10.0), Point2::new(30.0, 5.0)];
        let velocity = Vector2::new(1.0, 0.5);

        tracker.process_frame(scene.clone(), 0.0);

        assert!(tracker.tracks().len() == 2);
        assert!(tracker.tracks().iter().all(|track| track.len() == 1));

        let mut frame = scene;

        for step in 1..=4 {
            frame = drift(&frame, velocity, 1.0);
            tracker.process_frame(frame.clone(), step as f64);
        }

        // The detection interval has not elapsed, so the same two tracks keep growing.
        assert!(tracker.tracks().len() == 2);
        assert!(tracker.tracks().iter().all(|track| track.len() == 5));

        let track = &tracker.tracks()[0];

        assert!(track.last_observation() == Some(Point2::new(14.0, 12.0)));

        let measurements = track.measurements(Default::default(), Default::default());

        assert!(measurements.len() == 4);
        assert!(measurements
            .iter()
            .all(|m| (m.vector() - velocity).norm() < 1e-9));
    }

    #[test]
    fn test_tracker_drops_lost_features() {
        let correspondence = SceneCorrespondence { match_radius: 2.0 };
        let config = TrackerConfig {
            detection_interval: 100.0,
            exclusion_radius: 1.0,
            deviation_threshold: 0.5,
        };

        let mut tracker = FeatureTracker::new(correspondence, config);

        let scene = vec![Point2::new(10.0, 10.0), Point2::new(30.0, 5.0)];

        tracker.process_frame(scene.clone(), 0.0);

        // The second feature disappears from the next frame.
        let frame = vec![Point2::new(11.0, 10.0)];

        tracker.process_frame(frame, 1.0);

        assert!(tracker.tracks().len() == 1);
        assert!(tracker.tracks()[0].last_observation() == Some(Point2::new(11.0, 10.0)));
    }

    #[test]
    fn test_detection_excludes_active_endpoints() {
        let correspondence = SceneCorrespondence { match_radius: 2.0 };
        let config = TrackerConfig {
            detection_interval: 0.5,
            exclusion_radius: 1.0,
            deviation_threshold: 0.5,
        };

        let mut tracker = FeatureTracker::new(correspondence, config);

        let scene = vec![Point2::new(10.0, 10.0)];

        tracker.process_frame(scene.clone(), 0.0);
        assert!(tracker.tracks().len() == 1);

        // A new feature appears; the detection pass picks it up without duplicating the track
        // already following the stationary feature.
        let frame = vec![Point2::new(10.0, 10.0), Point2::new(20.0, 20.0)];

        tracker.process_frame(frame, 1.0);

        assert!(tracker.tracks().len() == 2);

        let lengths = tracker
            .tracks()
            .iter()
            .map(Track::len)
            .collect::<Vec<usize>>();

        assert!(lengths.contains(&1));
        assert!(lengths.contains(&2));
    }
}
