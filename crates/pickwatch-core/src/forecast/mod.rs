// Opponent pick simulation and positional run alerts.

pub mod predictor;
pub mod runs;
