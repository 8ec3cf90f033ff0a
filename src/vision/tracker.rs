use anyhow::{Context, Result};
use opencv::core::{Mat, Ptr, Rect};
use opencv::prelude::*;
use opencv::tracking::{TrackerCSRT, TrackerCSRT_Params};

use super::types::BoundingBox;

/// Follows one previously detected object across frames.
pub trait ObjectTracker<F> {
    /// New position of the target, or `None` once it is lost.
    fn update(&mut self, frame: &F) -> Result<Option<BoundingBox>>;
}

pub trait TrackerFactory<F> {
    type Tracker: ObjectTracker<F>;

    fn start(&self, frame: &F, bbox: BoundingBox) -> Result<Self::Tracker>;
}

impl From<BoundingBox> for Rect {
    fn from(b: BoundingBox) -> Self {
        Rect::new(b.x, b.y, b.width, b.height)
    }
}

impl From<Rect> for BoundingBox {
    fn from(r: Rect) -> Self {
        BoundingBox::new(r.x, r.y, r.width, r.height)
    }
}

/// OpenCV CSRT tracker for a single object.
pub struct CsrtTracker {
    inner: Ptr<TrackerCSRT>,
}

impl ObjectTracker<Mat> for CsrtTracker {
    fn update(&mut self, frame: &Mat) -> Result<Option<BoundingBox>> {
        let mut rect = Rect::default();
        let found = self
            .inner
            .update(frame, &mut rect)
            .context("CSRT tracker update failed")?;
        Ok(found.then(|| BoundingBox::from(rect)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsrtTrackerFactory;

impl TrackerFactory<Mat> for CsrtTrackerFactory {
    type Tracker = CsrtTracker;

    fn start(&self, frame: &Mat, bbox: BoundingBox) -> Result<CsrtTracker> {
        let params = TrackerCSRT_Params::default()?;
        let mut inner = TrackerCSRT::create(&params).context("Failed to create CSRT tracker")?;
        inner
            .init(frame, Rect::from(bbox))
            .context("Failed to initialise CSRT tracker")?;
        Ok(CsrtTracker { inner })
    }
}
