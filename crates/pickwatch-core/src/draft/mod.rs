// Draft order and rosters.

pub mod roster;
pub mod sequence;
