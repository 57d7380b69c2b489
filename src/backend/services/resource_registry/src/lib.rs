pub mod api;
pub mod config;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

pub use resource_models::{IdGenerator, Identifiable, SequenceGenerator, Timestamped, UuidGenerator};
