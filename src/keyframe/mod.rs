pub mod detector;
pub mod exercise;
pub mod interval;
pub mod phase;
pub mod rep;
pub mod session;

pub use detector::{FrameSignal, KeyframeDetector, KeyframeKind};
pub use exercise::Exercise;
pub use interval::{IntervalTimer, DEFAULT_PLANK_INTERVAL_SECS};
pub use phase::{classify, Phase, PhaseClassifier, DEFAULT_PHASE_THRESHOLD};
pub use rep::RepTracker;
pub use session::SessionId;
