mod adapter;
mod backend;
pub mod backends;
mod result;

pub use adapter::DetectorAdapter;
pub use backend::DetectorBackend;
pub use backends::ScriptedBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use result::{BoundingBox, Detection, DEFAULT_LABELS};
