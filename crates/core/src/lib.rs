//! Core library for Dayplan
//!
//! This crate contains the core business logic, including:
//! - The task model and its create/patch inputs
//! - The task store contract and its in-memory and MongoDB backends
//! - Week ranges and weekly completion statistics

pub mod error;
pub mod task;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
