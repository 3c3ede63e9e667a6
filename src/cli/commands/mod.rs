pub mod remind;
pub mod token;
pub mod trigger;
