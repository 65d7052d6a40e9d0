//! PPE watch
//!
//! Reads a camera feed frame by frame, runs a PPE object-detection model on
//! each frame, draws the detections, reports which required equipment is
//! visible, and raises a rate-limited warning when a `NO-` class is seen.
//!
//! # Module Structure
//!
//! - `frame`: captured RGB frames and the fixed-size inference view
//! - `ingest`: frame sources (camera, image directory)
//! - `detect`: detector backends and the resizing adapter
//! - `ppe`: equipment status and the warning debounce policy
//! - `annotate`: boxes, labels and warning text drawn onto frames
//! - `display`: where processed frames go
//! - `session`: the single-threaded control loop
//! - `config`, `ui`: binary plumbing

pub mod annotate;
pub mod config;
pub mod detect;
pub mod display;
pub mod frame;
pub mod ingest;
pub mod ppe;
pub mod session;
pub mod ui;

pub use annotate::Annotator;
pub use config::{ModelSettings, PpeConfig};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use detect::{BoundingBox, Detection, DetectorAdapter, DetectorBackend, ScriptedBackend};
pub use display::{ConsoleDisplay, FrameDisplay, SnapshotDisplay};
pub use frame::{Frame, InferenceView, INFERENCE_HEIGHT, INFERENCE_WIDTH};
pub use ingest::{CameraConfig, CameraSource, FrameSource, ImageDirSource};
pub use ppe::{
    Equipment, EquipmentStatus, MissingEquipment, Warning, WarningCooldownState, WarningPolicy,
    WARNING_INTERVAL,
};
pub use session::{
    Clock, EndReason, FrameReport, MonotonicClock, Session, SessionSummary, CAMERA_LOST_NOTICE,
};
