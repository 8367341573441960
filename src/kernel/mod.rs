pub mod environment;
pub mod proposition;
pub mod substitution;
pub mod symbol;
