use crate::config::settings::AppConfig;
use crate::common::time::format_runtime;
use crate::modules::video::model::JobStatus;
use crate::modules::video::repository::VideoRepository;
use crate::state::AppState;
use crate::vision::detector::OnnxDetector;
use crate::vision::pipeline::{DetectionAnnotator, FrameAnnotator, TrackingAnnotator};
use crate::vision::processor::{self, ProcessingStats, ProcessorSettings};
use crate::vision::tracker::CsrtTrackerFactory;
use crate::vision::types::DetectionMode;
use anyhow::{anyhow, Result};
use opencv::core::Mat;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Everything the blocking pipeline needs, detached from the async state.
#[derive(Debug, Clone)]
pub struct DetectionJob {
    pub id: Uuid,
    pub input: PathBuf,
    pub output: PathBuf,
    pub model_path: PathBuf,
    pub labels: Vec<String>,
    pub input_size: i32,
    pub score_filter: f32,
    pub mode: DetectionMode,
    pub settings: ProcessorSettings,
}

impl DetectionJob {
    pub fn new(config: &AppConfig, id: Uuid, input: PathBuf, output: PathBuf) -> Self {
        Self {
            id,
            input,
            output,
            model_path: config.model_path.clone(),
            labels: config.model_labels.clone(),
            input_size: config.model_input_size,
            score_filter: config.score_filter,
            mode: config.detection_mode,
            settings: ProcessorSettings {
                output_fps: config.output_fps,
                fourcc: config.output_fourcc.clone(),
            },
        }
    }
}

/// Run one uploaded video through the model on a blocking thread and record the outcome.
pub fn spawn_detection_job(state: AppState, id: Uuid) {
    let job = DetectionJob::new(
        &state.config,
        id,
        state.media.input_path(id),
        state.media.output_path(id),
    );

    tokio::spawn(async move {
        info!("🎥 Starting detection job {} ({})", id, job.mode);
        let started = Instant::now();

        let outcome = run_blocking(move || run_detection(&job)).await;
        let (status, runtime) = job_outcome(id, outcome, started.elapsed());

        match VideoRepository::set_outcome(&state.db, id, status, runtime.as_deref()).await {
            Ok(true) => {}
            Ok(false) => warn!("Job {} vanished before its outcome was recorded", id),
            Err(e) => error!("Failed to record outcome of job {}: {}", id, e),
        }
    });
}

/// Run the pipeline off the async workers. A panic becomes an error.
async fn run_blocking<P>(pipeline: P) -> Result<ProcessingStats>
where
    P: FnOnce() -> Result<ProcessingStats> + Send + 'static,
{
    match tokio::task::spawn_blocking(pipeline).await {
        Ok(result) => result,
        Err(join_error) => Err(anyhow!("Detection task aborted: {}", join_error)),
    }
}

/// Final status of a job, and its runtime when it succeeded.
fn job_outcome(
    id: Uuid,
    outcome: Result<ProcessingStats>,
    elapsed: Duration,
) -> (JobStatus, Option<String>) {
    match outcome {
        Ok(stats) => {
            let runtime = format_runtime(elapsed);
            info!(
                "✅ Job {} done in {} ({} frames, {} boxes)",
                id, runtime, stats.frames, stats.annotations
            );
            (JobStatus::Done, Some(runtime))
        }
        Err(e) => {
            error!("❌ Job {} failed: {:#}", id, e);
            (JobStatus::Error, None)
        }
    }
}

fn build_annotator(job: &DetectionJob) -> Result<Box<dyn FrameAnnotator<Mat>>> {
    let detector = OnnxDetector::load(&job.model_path, job.labels.clone(), job.input_size)?;

    Ok(match job.mode {
        DetectionMode::Detect => Box::new(DetectionAnnotator::new(detector, job.score_filter)),
        DetectionMode::Track => Box::new(TrackingAnnotator::<Mat, _, _>::new(
            detector,
            CsrtTrackerFactory,
            job.score_filter,
        )),
    })
}

pub fn run_detection(job: &DetectionJob) -> Result<ProcessingStats> {
    ensure_exists(&job.input)?;
    info!("Running {} pipeline for job {}", job.mode, job.id);
    let mut annotator = build_annotator(job)?;
    processor::process_video(&job.input, &job.output, annotator.as_mut(), &job.settings)
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(anyhow!("Input video missing: {}", path.display()))
    }
}
