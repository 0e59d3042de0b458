use env_logger::Builder;
use log::info;
use lspiv::{
    approx::{FieldApproximator, PolynomialLsApproximator},
    eval::{GridSampleComparison, StreamLineComparison},
    field::{PipeFlow, VectorField, extents::RangeExtents},
    meas::{MeasurementProcessor, SampleGrid},
    sim::ParticleSimulator,
    track::{Localization, TrackScoring},
};
use nalgebra::Point2;

fn main() {
    Builder::new()
        .filter(None, log::LevelFilter::Debug)
        .init();

    // Ground-truth channel flow, 100 units wide with a 3 unit/s centerline velocity.
    let source = VectorField::new(PipeFlow::new(100.0, 3.0, None));

    // Seed particles spread across the channel width, released in two waves.
    let seeds = (0..20)
        .map(|idx| {
            let wave = (idx % 2) as f64;

            (wave * 2.0, Point2::new(2.5 + 5.0 * idx as f64, 10.0))
        })
        .collect::<Vec<(f64, Point2<f64>)>>();

    let mut simulator = ParticleSimulator::with_noise(&source, 0.25, 42).unwrap();
    let tracks = simulator.simulate(&seeds, 10.0, 0.1).unwrap();

    info!("simulated {} tracks", tracks.len());

    // Reduce tracks to localized velocity measurements and spatially deduplicate them.
    let mut processor = MeasurementProcessor::new(100.0, 100.0, 10, 10);

    for track in &tracks {
        let accepted = processor
            .add_measurements(track.measurements(Localization::Midpoint, TrackScoring::Duration));

        info!(
            "track with {} observations contributed {} measurements",
            track.len(),
            accepted
        );
    }

    // Fit a degree-2 polynomial field to the retained measurements.
    let mut estimator = PolynomialLsApproximator::new(2);

    let retained = processor.get_measurements();

    estimator.add_measurements(&retained);

    let extents = RangeExtents::square((0.0, 100.0));
    let estimate = estimator.approximate(Some(extents.into())).unwrap();

    info!(
        "fit {} measurements with residual {:?}",
        estimator.measurement_count(),
        estimator.last_residual()
    );

    // Point-wise and streamline error against the ground truth.
    let grid = SampleGrid::new(100.0, 100.0, 10, 10);
    let mut grid_comparison = GridSampleComparison::new(source.clone(), estimate.clone(), grid);

    info!("grid error statistics: {:?}", grid_comparison.error());

    let eval_seeds = vec![
        (0.0, Point2::new(25.0, 0.0)),
        (0.0, Point2::new(50.0, 0.0)),
        (0.0, Point2::new(75.0, 0.0)),
    ];
    let mut stream_comparison =
        StreamLineComparison::new(eval_seeds, source, estimate, 5.0, 0.1);

    info!(
        "streamline error statistics: {:?}",
        stream_comparison.error().unwrap()
    );
}
