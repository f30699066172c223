// Player data, per-settings metrics and the ranked board.

pub mod board;
pub mod metrics;
pub mod player;
