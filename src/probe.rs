//! Stream probing through FFmpeg.
//!
//! The index knows the coded pictures but not how the decoder will present
//! them. [`StreamProbe`] opens the first video file of a project with
//! FFmpeg and reads the facts DGIndex does not record, most importantly the
//! colour range signalled in the sequence header.
//!
//! Only available with the `ffmpeg` feature.
//!
//! # Example
//!
//! ```no_run
//! use mpgg::{Project, StreamProbe};
//!
//! let project = Project::load("VTS_01_1.VOB.d2v")?;
//! let probe = StreamProbe::probe(&project.videos[0])?;
//! println!("{}x{}, {} range", probe.width, probe.height, probe.color_range);
//! # Ok::<(), mpgg::MpggError>(())
//! ```

use std::path::Path;

use ffmpeg_next::{
    codec::context::Context as CodecContext, media::Type, util::color::Range,
};
use num_rational::Rational64;

use crate::{analysis::ColorRange, error::MpggError};

/// Video stream properties as FFmpeg reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamProbe {
    /// Coded width in pixels.
    pub width: u32,
    /// Coded height in pixels.
    pub height: u32,
    /// Average frame rate, `None` when the container does not say.
    pub frame_rate: Option<Rational64>,
    /// Signalled colour range; unspecified streams are treated as limited.
    pub color_range: ColorRange,
}

impl StreamProbe {
    /// Open `path`, read its best video stream, and close it again.
    ///
    /// # Errors
    ///
    /// Returns [`MpggError::Load`] if FFmpeg cannot open the file or it has
    /// no video stream.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self, MpggError> {
        let path = path.as_ref();
        let fail = |reason: String| MpggError::Load {
            path: path.to_path_buf(),
            reason,
        };

        log::debug!("Probing {}", path.display());
        ffmpeg_next::init().map_err(|error| fail(format!("FFmpeg initialisation failed: {error}")))?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| fail(error.to_string()))?;
        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| fail("no video stream".to_string()))?;

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| {
                fail(format!(
                    "Failed to create video decoder for stream {}: {error}",
                    stream.index()
                ))
            })?;

        let rate = stream.avg_frame_rate();
        let frame_rate = (rate.numerator() > 0 && rate.denominator() > 0).then(|| {
            Rational64::new(i64::from(rate.numerator()), i64::from(rate.denominator()))
        });

        let color_range = match decoder.color_range() {
            Range::JPEG => ColorRange::Full,
            _ => ColorRange::Limited,
        };

        Ok(Self {
            width: decoder.width(),
            height: decoder.height(),
            frame_rate,
            color_range,
        })
    }
}
