use anyhow::Result;
use std::marker::PhantomData;
use tracing::debug;

use super::detector::ObjectDetector;
use super::tracker::{ObjectTracker, TrackerFactory};
use super::types::Detection;

/// Number of consecutive detection frames used to settle the object count.
pub const COUNT_UNTIL: usize = 3;

/// Decides what gets drawn on each frame.
pub trait FrameAnnotator<F> {
    fn annotate(&mut self, frame: &F) -> Result<Vec<Detection>>;
}

fn passing<F, D: ObjectDetector<F>>(
    detector: &mut D,
    frame: &F,
    score_filter: f32,
) -> Result<Vec<Detection>> {
    Ok(detector
        .detect(frame)?
        .into_iter()
        .filter(|d| d.score >= score_filter && !d.bbox.is_empty())
        .collect())
}

/// Runs the detector on every frame.
pub struct DetectionAnnotator<D> {
    detector: D,
    score_filter: f32,
}

impl<D> DetectionAnnotator<D> {
    pub fn new(detector: D, score_filter: f32) -> Self {
        Self {
            detector,
            score_filter,
        }
    }
}

impl<F, D: ObjectDetector<F>> FrameAnnotator<F> for DetectionAnnotator<D> {
    fn annotate(&mut self, frame: &F) -> Result<Vec<Detection>> {
        passing(&mut self.detector, frame, self.score_filter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Detecting every frame to learn how many objects are present.
    Counting { rounds: usize, max_seen: usize },
    /// Detecting until `target` trackers could be started on a single frame.
    Acquiring { target: usize },
    /// Following the acquired objects without the detector.
    Tracking,
}

impl Phase {
    fn counting() -> Self {
        Phase::Counting {
            rounds: 0,
            max_seen: 0,
        }
    }
}

struct ActiveTrack<T> {
    tracker: T,
    label: String,
    score: f32,
}

/// Detection until the object count settles, then one tracker per object.
///
/// Any lost tracker drops all of them and restarts the count.
pub struct TrackingAnnotator<F, D, TF: TrackerFactory<F>> {
    detector: D,
    factory: TF,
    score_filter: f32,
    phase: Phase,
    tracks: Vec<ActiveTrack<TF::Tracker>>,
    _frame: PhantomData<fn(&F)>,
}

impl<F, D, TF> TrackingAnnotator<F, D, TF>
where
    D: ObjectDetector<F>,
    TF: TrackerFactory<F>,
{
    pub fn new(detector: D, factory: TF, score_filter: f32) -> Self {
        Self {
            detector,
            factory,
            score_filter,
            phase: Phase::counting(),
            tracks: Vec::new(),
            _frame: PhantomData,
        }
    }

    fn count(&mut self, frame: &F, rounds: usize, max_seen: usize) -> Result<Vec<Detection>> {
        let found = passing(&mut self.detector, frame, self.score_filter)?;
        let max_seen = max_seen.max(found.len());
        let rounds = rounds + 1;

        self.phase = if rounds < COUNT_UNTIL {
            Phase::Counting { rounds, max_seen }
        } else if max_seen == 0 {
            debug!("No objects found after {} frames, counting again", rounds);
            Phase::counting()
        } else {
            debug!("Object count settled at {}", max_seen);
            Phase::Acquiring { target: max_seen }
        };

        Ok(found)
    }

    fn acquire(&mut self, frame: &F, target: usize) -> Result<Vec<Detection>> {
        self.tracks.clear();
        let found = passing(&mut self.detector, frame, self.score_filter)?;

        let mut drawn = Vec::with_capacity(target);
        for detection in found {
            let tracker = self.factory.start(frame, detection.bbox)?;
            self.tracks.push(ActiveTrack {
                tracker,
                label: detection.label.clone(),
                score: detection.score,
            });
            drawn.push(detection);
            if self.tracks.len() == target {
                break;
            }
        }

        if self.tracks.len() == target {
            debug!("Tracking {} objects", target);
            self.phase = Phase::Tracking;
        }
        Ok(drawn)
    }

    fn track(&mut self, frame: &F) -> Result<Vec<Detection>> {
        let mut drawn = Vec::with_capacity(self.tracks.len());
        let mut lost = false;

        for track in &mut self.tracks {
            match track.tracker.update(frame)? {
                Some(bbox) => drawn.push(Detection::new(track.label.clone(), track.score, bbox)),
                None => lost = true,
            }
        }

        if lost {
            debug!("Tracker lost its target, falling back to detection");
            self.tracks.clear();
            self.phase = Phase::counting();
        }
        Ok(drawn)
    }
}

impl<F, D, TF> FrameAnnotator<F> for TrackingAnnotator<F, D, TF>
where
    D: ObjectDetector<F>,
    TF: TrackerFactory<F>,
{
    fn annotate(&mut self, frame: &F) -> Result<Vec<Detection>> {
        match self.phase {
            Phase::Counting { rounds, max_seen } => self.count(frame, rounds, max_seen),
            Phase::Acquiring { target } => self.acquire(frame, target),
            Phase::Tracking => self.track(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::types::BoundingBox;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Frames are just their index.
    type Frame = u32;

    fn det(label: &str, score: f32, x: i32) -> Detection {
        Detection::new(label, score, BoundingBox::new(x, 10, 20, 20))
    }

    #[derive(Clone, Default)]
    struct ScriptedDetector {
        script: Rc<RefCell<VecDeque<Vec<Detection>>>>,
        calls: Rc<RefCell<Vec<Frame>>>,
    }

    impl ScriptedDetector {
        fn with(frames: Vec<Vec<Detection>>) -> Self {
            Self {
                script: Rc::new(RefCell::new(frames.into())),
                calls: Rc::default(),
            }
        }

        fn calls(&self) -> Vec<Frame> {
            self.calls.borrow().clone()
        }
    }

    impl ObjectDetector<Frame> for ScriptedDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
            self.calls.borrow_mut().push(*frame);
            Ok(self.script.borrow_mut().pop_front().unwrap_or_default())
        }
    }

    /// Moves its box one pixel right per frame and loses the target on `lose_at`.
    struct ShiftTracker {
        start: BoundingBox,
        started_at: Frame,
        lose_at: Option<Frame>,
    }

    impl ObjectTracker<Frame> for ShiftTracker {
        fn update(&mut self, frame: &Frame) -> Result<Option<BoundingBox>> {
            if Some(*frame) == self.lose_at {
                return Ok(None);
            }
            let dx = (*frame - self.started_at) as i32;
            Ok(Some(BoundingBox::new(self.start.x + dx, self.start.y, self.start.width, self.start.height)))
        }
    }

    #[derive(Default)]
    struct ShiftFactory {
        lose_at: Option<Frame>,
        started: RefCell<usize>,
    }

    impl TrackerFactory<Frame> for ShiftFactory {
        type Tracker = ShiftTracker;

        fn start(&self, frame: &Frame, bbox: BoundingBox) -> Result<ShiftTracker> {
            *self.started.borrow_mut() += 1;
            Ok(ShiftTracker {
                start: bbox,
                started_at: *frame,
                lose_at: self.lose_at,
            })
        }
    }

    fn run<A: FrameAnnotator<Frame>>(annotator: &mut A, frames: std::ops::Range<Frame>) -> Vec<Vec<Detection>> {
        frames.map(|f| annotator.annotate(&f).unwrap()).collect()
    }

    #[test]
    fn detection_annotator_applies_score_filter() {
        let detector = ScriptedDetector::with(vec![vec![det("1", 0.95, 0), det("2", 0.59, 30), det("3", 0.6, 60)]]);
        let mut annotator = DetectionAnnotator::new(detector, 0.6);

        let drawn = annotator.annotate(&0).unwrap();
        let labels: Vec<_> = drawn.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["1", "3"]);
    }

    #[test]
    fn counts_then_acquires_then_tracks() {
        let detector = ScriptedDetector::with(vec![
            vec![det("1", 0.9, 0), det("2", 0.3, 30)],
            vec![det("1", 0.9, 0), det("2", 0.8, 30)],
            vec![det("1", 0.9, 0)],
            vec![det("1", 0.9, 0), det("2", 0.7, 30), det("3", 0.65, 60)],
        ]);
        let mut annotator = TrackingAnnotator::new(detector.clone(), ShiftFactory::default(), 0.6);

        let frames = run(&mut annotator, 0..6);

        // three counting frames and one acquisition frame hit the model
        assert_eq!(detector.calls(), vec![0, 1, 2, 3]);
        assert_eq!(frames[0].len(), 1);
        assert_eq!(frames[1].len(), 2);
        // target is two, so the third detection is not acquired
        assert_eq!(frames[3].len(), 2);
        assert_eq!(annotator.tracks.len(), 2);
        assert_eq!(annotator.phase, Phase::Tracking);

        // tracked frames keep the acquisition label and score
        assert_eq!(frames[5][1].label, "2");
        assert_eq!(frames[5][1].score, 0.7);
        assert_eq!(frames[5][1].bbox.x, 32);
    }

    #[test]
    fn acquisition_retries_until_target_is_met() {
        let detector = ScriptedDetector::with(vec![
            vec![det("1", 0.9, 0), det("2", 0.9, 30)],
            vec![],
            vec![],
            vec![det("1", 0.9, 0)],
            vec![det("1", 0.9, 0), det("2", 0.9, 30)],
        ]);
        let factory = ShiftFactory::default();
        let mut annotator = TrackingAnnotator::new(detector.clone(), factory, 0.6);

        run(&mut annotator, 0..6);

        assert_eq!(detector.calls(), vec![0, 1, 2, 3, 4]);
        // first attempt started one tracker, second attempt rebuilt both
        assert_eq!(*annotator.factory.started.borrow(), 3);
        assert_eq!(annotator.phase, Phase::Tracking);
    }

    #[test]
    fn lost_tracker_restarts_counting() {
        let detector = ScriptedDetector::with(vec![
            vec![det("1", 0.9, 0)],
            vec![],
            vec![],
            vec![det("1", 0.9, 0)],
        ]);
        let factory = ShiftFactory {
            lose_at: Some(5),
            ..Default::default()
        };
        let mut annotator = TrackingAnnotator::new(detector.clone(), factory, 0.6);

        let frames = run(&mut annotator, 0..7);

        assert_eq!(frames[4].len(), 1);
        assert!(frames[5].is_empty());
        assert!(annotator.tracks.is_empty());
        // frame 6 is a counting frame again
        assert_eq!(detector.calls(), vec![0, 1, 2, 3, 6]);
        assert_eq!(annotator.phase, Phase::Counting { rounds: 1, max_seen: 0 });
    }

    #[test]
    fn empty_count_keeps_detecting() {
        let detector = ScriptedDetector::with(vec![vec![det("1", 0.2, 0)]]);
        let mut annotator = TrackingAnnotator::new(detector.clone(), ShiftFactory::default(), 0.6);

        let frames = run(&mut annotator, 0..5);

        assert!(frames.iter().all(Vec::is_empty));
        assert_eq!(detector.calls(), vec![0, 1, 2, 3, 4]);
        assert_eq!(*annotator.factory.started.borrow(), 0);
    }
}
