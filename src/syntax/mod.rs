pub mod statement;
pub mod token;
