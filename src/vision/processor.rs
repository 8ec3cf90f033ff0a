use anyhow::{Context, Result, anyhow, bail};
use opencv::core::{Mat, Point, Rect, Scalar, Size};
use opencv::prelude::*;
use opencv::{imgproc, videoio};
use std::path::Path;
use tracing::{debug, info};

use super::pipeline::FrameAnnotator;
use super::types::Detection;

const FALLBACK_FPS: f64 = 30.0;
const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    /// Forced output frame rate; the source rate is used when unset.
    pub output_fps: Option<f64>,
    pub fourcc: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub frames: usize,
    pub annotations: usize,
}

pub fn fourcc_chars(code: &str) -> Result<[char; 4]> {
    let chars: Vec<char> = code.chars().collect();
    match chars.as_slice() {
        [a, b, c, d] => Ok([*a, *b, *c, *d]),
        _ => Err(anyhow!("FourCC must be exactly four characters, got {:?}", code)),
    }
}

pub fn resolve_output_fps(configured: Option<f64>, source_fps: f64) -> f64 {
    match configured {
        Some(fps) if fps > 0.0 => fps,
        _ if source_fps > 0.0 && source_fps.is_finite() => source_fps,
        _ => FALLBACK_FPS,
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow!("Path is not valid UTF-8: {}", path.display()))
}

/// Read every frame of `input`, draw what the annotator returns, write to `output`.
pub fn process_video(
    input: &Path,
    output: &Path,
    annotator: &mut dyn FrameAnnotator<Mat>,
    settings: &ProcessorSettings,
) -> Result<ProcessingStats> {
    let mut capture = videoio::VideoCapture::from_file(path_str(input)?, videoio::CAP_ANY)?;
    if !capture.is_opened()? {
        bail!("Failed to open video file: {}", input.display());
    }

    let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
    let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
    if width <= 0 || height <= 0 {
        bail!("Video has no frame size: {}", input.display());
    }
    let total_frames = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as usize;
    let fps = resolve_output_fps(settings.output_fps, capture.get(videoio::CAP_PROP_FPS)?);

    let [a, b, c, d] = fourcc_chars(&settings.fourcc)?;
    let mut writer = videoio::VideoWriter::new(
        path_str(output)?,
        videoio::VideoWriter::fourcc(a, b, c, d)?,
        fps,
        Size::new(width, height),
        true,
    )?;
    if !writer.is_opened()? {
        bail!("VideoWriter failed to open {} ({})", output.display(), settings.fourcc);
    }

    info!(
        "Processing {}: {}x{}, {} frames, writing at {:.2} fps",
        input.display(),
        width,
        height,
        total_frames,
        fps
    );

    let mut stats = ProcessingStats::default();
    let mut frame = Mat::default();
    loop {
        if !capture.read(&mut frame)? || frame.empty() {
            break;
        }

        let annotations = annotator
            .annotate(&frame)
            .with_context(|| format!("Annotation failed on frame {}", stats.frames))?;
        draw_annotations(&mut frame, &annotations)?;
        writer.write(&frame)?;

        stats.frames += 1;
        stats.annotations += annotations.len();
        if stats.frames % PROGRESS_EVERY == 0 {
            debug!("Processed {}/{} frames", stats.frames, total_frames);
        }
    }

    capture.release()?;
    writer.release()?;

    info!(
        "Finished {}: {} frames, {} boxes drawn",
        output.display(),
        stats.frames,
        stats.annotations
    );
    Ok(stats)
}

pub fn draw_annotations(frame: &mut Mat, annotations: &[Detection]) -> Result<()> {
    let box_color = Scalar::new(0.0, 255.0, 0.0, 0.0);
    let text_color = Scalar::new(255.0, 0.0, 0.0, 0.0);

    for detection in annotations {
        let rect = Rect::from(detection.bbox);
        imgproc::rectangle(frame, rect, box_color, 2, imgproc::LINE_8, 0)?;
        imgproc::put_text(
            frame,
            &detection.caption(),
            Point::new(rect.x, rect.y - 10),
            imgproc::FONT_HERSHEY_SIMPLEX,
            1.0,
            text_color,
            3,
            imgproc::LINE_8,
            false,
        )?;
    }
    Ok(())
}
