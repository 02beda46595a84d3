// src/commands/mod.rs

mod common;
pub mod inspect;
pub mod translate;
