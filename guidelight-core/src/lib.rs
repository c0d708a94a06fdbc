//! guidelight-core: shared vocabulary for the GuideLight assistant
//!
//! Holds the types every organ crate speaks: detections and their bounding
//! boxes, the directional advisory verdict, the cooperative stop signal,
//! and the workspace error type.

pub mod banner;
pub mod error;
pub mod signal;
pub mod types;

pub use error::{Error, Result};
pub use signal::StopSignal;
pub use types::{BoundingBox, Detection, DirectionVerdict};
