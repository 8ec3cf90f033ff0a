use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Axis aligned box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from corner coordinates, truncating towards zero like the model output is drawn.
    pub fn from_xyxy(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        let x = xmin as i32;
        let y = ymin as i32;
        Self {
            x,
            y,
            width: (xmax - xmin) as i32,
            height: (ymax - ymin) as i32,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        let inter = BoundingBox::new(x1, y1, x2 - x1, y2 - y1).area();
        if inter == 0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        if union <= 0 {
            return 0.0;
        }
        inter as f32 / union as f32
    }

    /// Intersect with the `width` x `height` frame.
    pub fn clamp_to(&self, width: i32, height: i32) -> BoundingBox {
        let x1 = self.x.clamp(0, width);
        let y1 = self.y.clamp(0, height);
        let x2 = self.right().clamp(0, width);
        let y2 = self.bottom().clamp(0, height);
        BoundingBox::new(x1, y1, x2 - x1, y2 - y1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub score: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, score: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            score,
            bbox,
        }
    }

    /// Text drawn above the box.
    pub fn caption(&self) -> String {
        format!("{}: {:.2}", self.label, self.score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Run the model on every frame.
    Detect,
    /// Detect until the object count settles, then hand off to trackers.
    #[default]
    Track,
}

impl FromStr for DetectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detect" | "detection" => Ok(DetectionMode::Detect),
            "track" | "tracker" | "tracking" => Ok(DetectionMode::Track),
            other => Err(format!("unknown detection mode: {other}")),
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMode::Detect => write!(f, "detect"),
            DetectionMode::Track => write!(f, "track"),
        }
    }
}
