pub mod chart;
pub mod play;
pub mod traits;
pub mod util;
