pub mod cli;
pub mod error;
pub mod handler;
pub mod utils;
