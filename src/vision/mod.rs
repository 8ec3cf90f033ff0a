//! Frame-by-frame object detection with optional tracker hand-off.

pub mod detector;
pub mod pipeline;
pub mod processor;
pub mod tracker;
pub mod types;
