// src/lib.rs
pub mod arena;
pub mod cli;
pub mod commands;
pub mod emit;
pub mod errors;
pub mod identity;
pub mod lower;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod store;
pub mod symbols;
pub mod units;

pub use errors::Error;
