pub mod event;
pub mod judge;
pub mod note;
pub mod scheduler;
pub mod score;
pub mod session;

pub use event::PlayEvent;
pub use judge::{JudgeKind, JudgeWindows, JudgementEngine};
pub use note::{HoldState, NoteId, NoteKind, NoteRuntime, NoteState};
pub use scheduler::NoteScheduler;
pub use score::JudgeStats;
pub use session::BattleCore;
