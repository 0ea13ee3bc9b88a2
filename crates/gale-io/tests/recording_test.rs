//! Writing a live simulation to disk and reading it back.

use gale_fluids::{FluidError, FluidSimulator, Vec2};
use gale_io::{
    encode::EncodingError, DecodingError, FieldDataDecoder, FieldDataEncoder, FieldMetadata,
};
use ndarray::Array2;
use tempfile::TempDir;

fn gusty_sim(resolution: u32) -> FluidSimulator {
    let mut sim = FluidSimulator::default();
    sim.initialize(resolution, 1e-5).unwrap();
    sim
}

#[test]
fn test_record_and_replay() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wind");

    let mut sim = gusty_sim(24);
    let mut encoder = FieldDataEncoder::new(path.clone(), 3, 30).unwrap();
    encoder.encode_metadata(&sim).unwrap();

    let mut recorded = vec![];
    for frame in 0..3 {
        sim.add_wind(Vec2::splat(0.5), Vec2::new(frame as f32 - 1.0, -1.0), 2.0, 0.3).unwrap();
        sim.step(1.0 / 30.0).unwrap();
        encoder.encode_frame(&sim).unwrap();
        recorded.push(sim.current_field().unwrap().to_owned());
    }
    assert_eq!(encoder.frames_written(), 3);
    assert!(path.join("0.dat").exists() && path.join("2.dat").exists());

    let mut decoder = FieldDataDecoder::new(path);
    let meta = decoder.decode_metadata().unwrap();
    assert_eq!(meta, FieldMetadata { dimension: 24, fps: 30, num_frames: 3, viscosity: 1e-5 });
    assert_eq!(meta.duration(), 0.1);

    for (i, expected) in recorded.iter().enumerate() {
        let frame = decoder.decode_frame().unwrap().unwrap();
        assert_eq!(frame.index, i as u64);
        assert_eq!(frame.dimension(), 24);
        assert_eq!(frame.velocity(), expected.view());
    }
    assert!(decoder.decode_frame().unwrap().is_none());

    decoder.reset();
    let first = decoder.decode_frame().unwrap().unwrap();
    assert_eq!(first.into_velocity(), recorded[0]);
}

#[test]
fn test_replayed_sample_matches_simulator() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample");

    let mut sim = gusty_sim(16);
    sim.add_wind(Vec2::new(0.3, 0.6), Vec2::X, 3.0, 0.25).unwrap();
    sim.step(0.02).unwrap();

    let mut encoder = FieldDataEncoder::new(path.clone(), 1, 50).unwrap();
    encoder.encode_metadata(&sim).unwrap();
    encoder.encode_frame(&sim).unwrap();

    let mut decoder = FieldDataDecoder::new(path);
    decoder.decode_metadata().unwrap();
    let frame = decoder.decode_frame().unwrap().unwrap();

    for p in [Vec2::new(0.3, 0.6), Vec2::new(0.01, 0.99), Vec2::new(0.77, 0.21), Vec2::splat(2.0)] {
        assert_eq!(frame.sample(p), sim.sample(p).unwrap());
    }
}

/// Fields built outside a simulator are recorded in the same layout.
#[test]
fn test_record_raw_field() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw");

    let sim = gusty_sim(8);
    let field = Array2::from_shape_fn((8, 8), |(i, j)| Vec2::new(i as f32, -(j as f32)));

    let mut encoder = FieldDataEncoder::new(path.clone(), 1, 24).unwrap();
    encoder.encode_metadata(&sim).unwrap();
    encoder.encode_frame(&field).unwrap();

    let mut decoder = FieldDataDecoder::new(path);
    decoder.decode_metadata().unwrap();
    let frame = decoder.decode_frame().unwrap().unwrap();

    assert_eq!(frame.velocity(), field.view());
    assert_eq!(frame.velocity()[(5, 2)], Vec2::new(5.0, -2.0));
}

#[test]
fn test_frame_limit() {
    let dir = TempDir::new().unwrap();
    let sim = gusty_sim(8);

    let mut encoder = FieldDataEncoder::new(dir.path().join("limit"), 1, 60).unwrap();
    encoder.encode_frame(&sim).unwrap();
    assert!(matches!(encoder.encode_frame(&sim), Err(EncodingError::FrameLimit(1))));

    assert!(matches!(
        FieldDataEncoder::new(dir.path().join("empty"), 0, 60),
        Err(EncodingError::Empty)
    ));
}

#[test]
fn test_existing_directory_is_not_overwritten() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        FieldDataEncoder::new(dir.path().to_path_buf(), 10, 60),
        Err(EncodingError::Io(_))
    ));
}

#[test]
fn test_uninitialized_simulator_cannot_be_recorded() {
    let dir = TempDir::new().unwrap();
    let sim: FluidSimulator = FluidSimulator::default();

    let mut encoder = FieldDataEncoder::new(dir.path().join("none"), 1, 60).unwrap();
    assert!(matches!(
        encoder.encode_metadata(&sim),
        Err(EncodingError::Fluid(FluidError::Uninitialized))
    ));
    assert!(matches!(
        encoder.encode_frame(&sim),
        Err(EncodingError::Fluid(FluidError::Uninitialized))
    ));
}

#[test]
fn test_frame_from_a_different_resolution_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed");

    let small = gusty_sim(8);
    let large = gusty_sim(16);

    let mut encoder = FieldDataEncoder::new(path.clone(), 2, 60).unwrap();
    encoder.encode_metadata(&small).unwrap();
    encoder.encode_frame(&small).unwrap();
    encoder.encode_frame(&large).unwrap();

    let mut decoder = FieldDataDecoder::new(path);
    decoder.decode_metadata().unwrap();
    assert!(decoder.decode_frame().unwrap().is_some());
    assert!(matches!(
        decoder.decode_frame(),
        Err(DecodingError::CellCount { frame: 1, expected: 64, found: 256 })
    ));
}

#[test]
fn test_truncated_frame() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("truncated");

    let sim = gusty_sim(8);
    let mut encoder = FieldDataEncoder::new(path.clone(), 1, 60).unwrap();
    encoder.encode_metadata(&sim).unwrap();
    encoder.encode_frame(&sim).unwrap();

    let frame = path.join("0.dat");
    let bytes = std::fs::read(&frame).unwrap();
    std::fs::write(&frame, &bytes[..bytes.len() - 3]).unwrap();

    let mut decoder = FieldDataDecoder::new(path);
    decoder.decode_metadata().unwrap();
    assert!(matches!(decoder.decode_frame(), Err(DecodingError::Io(_))));
}

#[test]
fn test_frames_hidden_until_metadata_is_read() {
    let dir = TempDir::new().unwrap();
    let mut decoder = FieldDataDecoder::new(dir.path().to_path_buf());

    assert!(decoder.decode_frame().unwrap().is_none());
    assert!(matches!(decoder.decode_metadata(), Err(DecodingError::Io(_))));
}
