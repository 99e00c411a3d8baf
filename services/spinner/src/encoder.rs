//! Frame sinks: the video encoder and an optional PNG frame dump.
//!
//! A sink is opened with a fixed frame size, accepts frames of exactly that
//! size in order, and is finalized once. `finalize` takes the sink by value,
//! so nothing can be appended afterwards.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use image::RgbImage;
use renderer::RenderError;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("frame is {actual_width}x{actual_height}, encoder expects {width}x{height}")]
    FrameSizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },

    #[error("encoder pipe closed before all frames were written")]
    PipeClosed,

    #[error("frame encoding failed: {0}")]
    Png(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a finalized sink produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub frames: usize,
    pub outputs: Vec<PathBuf>,
}

/// An ordered consumer of equally sized RGB frames.
pub trait FrameSink {
    /// (width, height) every appended frame must have.
    fn frame_size(&self) -> (u32, u32);

    fn append(&mut self, frame: &RgbImage) -> Result<(), EncoderError>;

    fn finalize(self) -> Result<SinkSummary, EncoderError>
    where
        Self: Sized;
}

fn check_size(expected: (u32, u32), frame: &RgbImage) -> Result<(), EncoderError> {
    let (actual_width, actual_height) = frame.dimensions();
    if (actual_width, actual_height) != expected {
        return Err(EncoderError::FrameSizeMismatch {
            width: expected.0,
            height: expected.1,
            actual_width,
            actual_height,
        });
    }
    Ok(())
}

/// Copy an RGB frame into `out` with the channel order swapped to BGR.
pub fn rgb_to_bgr(frame: &RgbImage, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(frame.as_raw().len());
    for px in frame.as_raw().chunks_exact(3) {
        out.extend_from_slice(&[px[2], px[1], px[0]]);
    }
}

/// Map a FourCC such as `mp4v` onto the ffmpeg encoder that writes it.
pub fn ffmpeg_codec(name: &str) -> &str {
    match name {
        "mp4v" | "MP4V" => "mpeg4",
        "avc1" | "h264" | "H264" => "libx264",
        "MJPG" | "mjpg" => "mjpeg",
        other => other,
    }
}

/// Settings for an [`FfmpegEncoder`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    pub program: String,
    pub output: PathBuf,
    pub codec: String,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

impl EncoderSettings {
    pub fn new(output: impl Into<PathBuf>, codec: &str, fps: u32, size: (u32, u32)) -> Self {
        Self {
            program: "ffmpeg".to_string(),
            output: output.into(),
            codec: codec.to_string(),
            fps,
            width: size.0,
            height: size.1,
        }
    }

    /// Arguments reading raw BGR frames from stdin.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "bgr24".to_string(),
            "-s".to_string(),
            format!("{}x{}", self.width, self.height),
            "-r".to_string(),
            self.fps.to_string(),
            "-i".to_string(),
            "-".to_string(),
            "-an".to_string(),
            "-c:v".to_string(),
            ffmpeg_codec(&self.codec).to_string(),
            self.output.to_string_lossy().into_owned(),
        ]
    }
}

/// Streams frames into an `ffmpeg` child process.
///
/// Dropping an encoder without finalizing kills the child; the output file
/// is then left incomplete.
pub struct FfmpegEncoder {
    settings: EncoderSettings,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    buffer: Vec<u8>,
    frames: usize,
}

impl FfmpegEncoder {
    pub fn open(settings: EncoderSettings) -> Result<Self, EncoderError> {
        if let Some(parent) = settings.output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut child = Command::new(&settings.program)
            .args(settings.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| EncoderError::Spawn {
                program: settings.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();

        info!(
            output = %settings.output.display(),
            codec = ffmpeg_codec(&settings.codec),
            fps = settings.fps,
            width = settings.width,
            height = settings.height,
            "Opened video encoder"
        );

        Ok(Self {
            settings,
            child: Some(child),
            stdin,
            buffer: Vec::new(),
            frames: 0,
        })
    }

    pub fn output(&self) -> &Path {
        &self.settings.output
    }
}

impl FrameSink for FfmpegEncoder {
    fn frame_size(&self) -> (u32, u32) {
        (self.settings.width, self.settings.height)
    }

    fn append(&mut self, frame: &RgbImage) -> Result<(), EncoderError> {
        check_size(self.frame_size(), frame)?;
        let stdin = self.stdin.as_mut().ok_or(EncoderError::PipeClosed)?;

        rgb_to_bgr(frame, &mut self.buffer);
        stdin.write_all(&self.buffer).map_err(|e| match e.kind() {
            ErrorKind::BrokenPipe => EncoderError::PipeClosed,
            _ => EncoderError::Io(e),
        })?;

        self.frames += 1;
        debug!(frame = self.frames, "Appended frame to video");
        Ok(())
    }

    fn finalize(mut self) -> Result<SinkSummary, EncoderError> {
        // Closing stdin signals end of stream
        drop(self.stdin.take());

        let Some(mut child) = self.child.take() else {
            return Err(EncoderError::PipeClosed);
        };
        let status = child.wait()?;
        if !status.success() {
            return Err(EncoderError::Exit {
                program: self.settings.program.clone(),
                status: status.to_string(),
            });
        }

        info!(
            output = %self.settings.output.display(),
            frames = self.frames,
            "Video finalized"
        );

        Ok(SinkSummary {
            frames: self.frames,
            outputs: vec![self.settings.output.clone()],
        })
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            warn!(
                output = %self.settings.output.display(),
                frames = self.frames,
                "Video encoder dropped before finalize; output is incomplete"
            );
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Writes each frame as `frame_00000.png`, `frame_00001.png`, ...
#[derive(Debug)]
pub struct PngSequenceWriter {
    dir: PathBuf,
    size: (u32, u32),
    frames: usize,
}

impl PngSequenceWriter {
    pub fn create(dir: impl Into<PathBuf>, size: (u32, u32)) -> Result<Self, EncoderError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "Writing PNG frames");
        Ok(Self {
            dir,
            size,
            frames: 0,
        })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{:05}.png", index))
    }
}

impl FrameSink for PngSequenceWriter {
    fn frame_size(&self) -> (u32, u32) {
        self.size
    }

    fn append(&mut self, frame: &RgbImage) -> Result<(), EncoderError> {
        check_size(self.size, frame)?;
        let png = renderer::png::encode_frame(frame)?;
        std::fs::write(self.frame_path(self.frames), png)?;
        self.frames += 1;
        Ok(())
    }

    fn finalize(self) -> Result<SinkSummary, EncoderError> {
        Ok(SinkSummary {
            frames: self.frames,
            outputs: vec![self.dir],
        })
    }
}

/// Forwards every frame to a primary sink and an optional secondary one.
pub struct TeeSink<A, B> {
    primary: A,
    secondary: Option<B>,
}

impl<A: FrameSink, B: FrameSink> TeeSink<A, B> {
    pub fn new(primary: A, secondary: Option<B>) -> Result<Self, EncoderError> {
        if let Some(other) = &secondary {
            let (width, height) = primary.frame_size();
            let (actual_width, actual_height) = other.frame_size();
            if (width, height) != (actual_width, actual_height) {
                return Err(EncoderError::FrameSizeMismatch {
                    width,
                    height,
                    actual_width,
                    actual_height,
                });
            }
        }
        Ok(Self { primary, secondary })
    }
}

impl<A: FrameSink, B: FrameSink> FrameSink for TeeSink<A, B> {
    fn frame_size(&self) -> (u32, u32) {
        self.primary.frame_size()
    }

    fn append(&mut self, frame: &RgbImage) -> Result<(), EncoderError> {
        self.primary.append(frame)?;
        if let Some(secondary) = self.secondary.as_mut() {
            secondary.append(frame)?;
        }
        Ok(())
    }

    /// The frame count is the primary sink's.
    fn finalize(self) -> Result<SinkSummary, EncoderError> {
        let mut summary = self.primary.finalize()?;
        if let Some(secondary) = self.secondary {
            summary.outputs.extend(secondary.finalize()?.outputs);
        }
        Ok(summary)
    }
}
