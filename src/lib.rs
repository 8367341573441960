pub mod checker;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod kernel;
pub mod memory;
pub mod report;
pub mod runner;
pub mod syntax;

#[cfg(test)]
mod tests;
