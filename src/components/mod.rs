pub mod bracket;
pub mod standings;
