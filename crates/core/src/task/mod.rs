//! Task module
//!
//! This module contains task-related types, the storage contract and its
//! backends.

mod memory_store;
mod model;
mod mongo_store;
mod repository;
mod stats;

pub use memory_store::MemoryTaskStore;
pub use model::*;
pub use mongo_store::{MongoConfig, MongoTaskStore};
pub use repository::TaskRepository;
pub use stats::{WeekRange, WeeklyStats, DATE_FORMAT};
