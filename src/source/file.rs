//! Video source resolution and backend dispatch.
//!
//! `FrameSource::open` is the single resource acquisition per run. It either
//! produces a source whose `next_frame` yields decoded frames in order until
//! the stream is exhausted, or it fails and no frame is ever produced.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

#[cfg(feature = "decode-ffmpeg")]
use super::file_ffmpeg::FfmpegSource;
use super::stub::StubSource;
use crate::frame::Frame;

/// Configuration for a frame source.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Video identifier: `stub://...`, a directory of image files, or (with
    /// the decode-ffmpeg feature) a video file path.
    pub identifier: String,
    /// Target frame rate. Backends that have no intrinsic timing use this
    /// for pacing hints only; it never affects frame order.
    pub target_fps: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            target_fps: 10,
        }
    }
}

/// A one-pass, finite, in-order frame source.
pub struct FrameSource {
    backend: SourceBackend,
    frames_decoded: u64,
}

enum SourceBackend {
    Stub(StubSource),
    ImageDir(ImageDirSource),
    #[cfg(feature = "decode-ffmpeg")]
    Ffmpeg(FfmpegSource),
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self.backend {
            SourceBackend::Stub(_) => "Stub",
            SourceBackend::ImageDir(_) => "ImageDir",
            #[cfg(feature = "decode-ffmpeg")]
            SourceBackend::Ffmpeg(_) => "Ffmpeg",
        };
        f.debug_struct("FrameSource")
            .field("backend", &backend)
            .field("frames_decoded", &self.frames_decoded)
            .finish()
    }
}

impl FrameSource {
    /// Open the source. This is the only acquisition point; an error here
    /// means no frame will ever be produced for this identifier.
    pub fn open(config: SourceConfig) -> Result<Self> {
        let identifier = config.identifier.trim();
        if identifier.is_empty() {
            return Err(anyhow!("source identifier must be non-empty"));
        }
        if let Some(rest) = identifier.strip_prefix("stub://") {
            let backend = SourceBackend::Stub(StubSource::parse(rest)?);
            log::info!("source opened: {} (synthetic)", identifier);
            return Ok(Self {
                backend,
                frames_decoded: 0,
            });
        }
        if identifier.contains("://") {
            return Err(anyhow!(
                "only local paths and stub:// identifiers are supported, got '{}'",
                identifier
            ));
        }
        let path = Path::new(identifier);
        if path.is_dir() {
            let backend = SourceBackend::ImageDir(ImageDirSource::open(path)?);
            log::info!("source opened: {} (image directory)", identifier);
            return Ok(Self {
                backend,
                frames_decoded: 0,
            });
        }
        #[cfg(feature = "decode-ffmpeg")]
        {
            let backend = SourceBackend::Ffmpeg(FfmpegSource::open(identifier)?);
            log::info!("source opened: {} (ffmpeg)", identifier);
            Ok(Self {
                backend,
                frames_decoded: 0,
            })
        }
        #[cfg(not(feature = "decode-ffmpeg"))]
        {
            Err(anyhow!(
                "cannot open '{}': not a directory, and video file decode requires the decode-ffmpeg feature",
                identifier
            ))
        }
    }

    /// Decode the next frame. `Ok(None)` means the source is exhausted; a
    /// decode error is terminal and is also surfaced exactly once.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let frame = match &mut self.backend {
            SourceBackend::Stub(source) => source.next_frame(),
            SourceBackend::ImageDir(source) => source.next_frame()?,
            #[cfg(feature = "decode-ffmpeg")]
            SourceBackend::Ffmpeg(source) => source.next_frame()?,
        };
        if frame.is_some() {
            self.frames_decoded += 1;
        }
        Ok(frame)
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames_decoded: self.frames_decoded,
        }
    }
}

/// Decode statistics for health logging.
#[derive(Clone, Copy, Debug)]
pub struct SourceStats {
    pub frames_decoded: u64,
}

// ----------------------------------------------------------------------------
// Image directory source
// ----------------------------------------------------------------------------

/// Decodes `*.jpg`/`*.jpeg`/`*.png` files from a directory in lexicographic
/// order, one frame per file.
struct ImageDirSource {
    files: std::vec::IntoIter<PathBuf>,
}

impl ImageDirSource {
    fn open(dir: &Path) -> Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read source directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("jpg") | Some("jpeg") | Some("png")
                )
            })
            .collect();
        if files.is_empty() {
            return Err(anyhow!(
                "source directory {} contains no image files",
                dir.display()
            ));
        }
        files.sort();
        Ok(Self {
            files: files.into_iter(),
        })
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.next() else {
            return Ok(None);
        };
        let decoded = image::open(&path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .into_rgb8();
        let (width, height) = decoded.dimensions();
        let frame = Frame::new(decoded.into_raw(), width, height, 3)?;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifier_is_rejected() {
        let err = FrameSource::open(SourceConfig {
            identifier: "  ".into(),
            ..SourceConfig::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn url_schemes_are_rejected() {
        let err = FrameSource::open(SourceConfig {
            identifier: "rtsp://camera-1".into(),
            ..SourceConfig::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("stub://"));
    }

    #[test]
    fn missing_path_fails_to_open() {
        assert!(FrameSource::open(SourceConfig {
            identifier: "/nonexistent/axon/video".into(),
            ..SourceConfig::default()
        })
        .is_err());
    }

    #[test]
    fn stub_source_is_finite_and_counted() {
        let mut source = FrameSource::open(SourceConfig {
            identifier: "stub://unit?frames=3".into(),
            ..SourceConfig::default()
        })
        .unwrap();
        let mut n = 0;
        while source.next_frame().unwrap().is_some() {
            n += 1;
        }
        assert_eq!(n, 3);
        assert_eq!(source.stats().frames_decoded, 3);
        // Exhaustion is stable.
        assert!(source.next_frame().unwrap().is_none());
    }
}
