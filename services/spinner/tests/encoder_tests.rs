//! Video encoder tests. These spawn ffmpeg and skip when it is not installed.

use image::{Rgb, RgbImage};
use spinner::{EncoderError, EncoderSettings, FfmpegEncoder, FrameSink};
use test_utils::require_program;

fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

#[test]
fn test_encodes_frames_to_mp4() {
    require_program!("ffmpeg");

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("spin.mp4");
    let mut encoder =
        FfmpegEncoder::open(EncoderSettings::new(&output, "mp4v", 6, (64, 32))).unwrap();

    for color in [[255, 0, 0], [0, 255, 0], [0, 0, 255]] {
        encoder.append(&solid(64, 32, color)).unwrap();
    }
    let summary = encoder.finalize().unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.outputs, vec![output.clone()]);
    assert!(std::fs::metadata(&output).unwrap().len() > 0);
}

#[test]
fn test_wrong_frame_size_is_rejected() {
    require_program!("ffmpeg");

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("spin.mp4");
    let mut encoder =
        FfmpegEncoder::open(EncoderSettings::new(&output, "mp4v", 6, (64, 32))).unwrap();

    let err = encoder.append(&solid(32, 32, [0, 0, 0])).unwrap_err();
    assert!(matches!(
        err,
        EncoderError::FrameSizeMismatch {
            width: 64,
            height: 32,
            actual_width: 32,
            actual_height: 32,
        }
    ));

    // The encoder is still usable after a rejected frame
    encoder.append(&solid(64, 32, [9, 9, 9])).unwrap();
    assert_eq!(encoder.finalize().unwrap().frames, 1);
}

#[test]
fn test_dropping_unfinalized_encoder_does_not_hang() {
    require_program!("ffmpeg");

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("abandoned.mp4");
    let mut encoder =
        FfmpegEncoder::open(EncoderSettings::new(&output, "mp4v", 6, (16, 16))).unwrap();
    encoder.append(&solid(16, 16, [1, 2, 3])).unwrap();
    drop(encoder);
}
