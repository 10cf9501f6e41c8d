use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;
use thermowave::dataset::{load_dataset, Channel};
use thermowave::mock::{generate, GeneratorSettings};
use thermowave::transient::{
    remove_transient, truncate_transient, AmplitudeOptions, CycleOptions, NullSink, Outcome,
};

fn warmup_settings() -> GeneratorSettings {
    GeneratorSettings {
        periods: vec![10.0],
        runs: 1,
        thermistors: 2,
        transient_offset: 5.0,
        transient_decay: 30.0,
        ..Default::default()
    }
}

#[test]
fn generated_warmup_is_removed_by_cycle_means() {
    let dir = TempDir::new().unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let files = generate(dir.path(), &warmup_settings(), &mut rng).unwrap();
    let dataset = load_dataset(&files[0]).unwrap();

    let y = dataset.channel(Channel::Thermistor(0)).unwrap();
    let options = CycleOptions::with_comments(dataset.comments.clone());
    let result = remove_transient(&dataset.timestamp, y, &options, &mut NullSink).unwrap();

    match result.outcome {
        Outcome::Cut { cycle, index, .. } => {
            let cycle = cycle.unwrap();
            assert!((9..=11).contains(&cycle), "cut at cycle {}", cycle);
            assert_eq!(index, cycle * 100);
        }
        other => panic!("expected a cut, got {:?}", other),
    }
    assert_eq!(result.t.len(), result.y.len());
    assert_eq!(result.t[0], 0.0);
    assert!(result.t.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn generated_warmup_is_removed_by_amplitude_envelope() {
    let dir = TempDir::new().unwrap();
    let mut rng = StdRng::seed_from_u64(12);
    let files = generate(dir.path(), &warmup_settings(), &mut rng).unwrap();
    let dataset = load_dataset(&files[0]).unwrap();

    let y = dataset.channel(Channel::Thermistor(0)).unwrap();
    let result =
        truncate_transient(&dataset.timestamp, y, &AmplitudeOptions::default(), &mut NullSink).unwrap();

    match result.outcome {
        Outcome::Cut { t_cut, removed, .. } => {
            // The earliest possible cut is t = 49.9s; the warm-up pushes it well past that.
            assert!(t_cut > 80.0 && t_cut < 250.0, "cut at {}", t_cut);
            assert_eq!(removed + result.len(), dataset.len());
        }
        other => panic!("expected a cut, got {:?}", other),
    }
    assert_eq!(result.t[0], 0.0);
}
