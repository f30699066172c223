// Library root: snake-draft arithmetic, the ranked board, rosters, pick
// forecasting and the draft session that routes events through them.

pub mod draft;
pub mod forecast;
pub mod rankings;
pub mod session;

pub use session::{DraftConfig, DraftError, DraftSession};
