pub mod compiler;
pub mod conflict;
pub mod document;
pub mod loader;

pub use compiler::compile;
pub use conflict::{ConflictDetail, ConflictKind};
pub use document::{BeatEvent, BeatPosition, ChartDocument, ValidationError};
