//! Exam seating: roster and room intake, constraint-based seat assignment,
//! versioned plan storage and seating-chart queries, served over HTTP.

pub mod catalog;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod exams;
pub mod locks;
pub mod query;
pub mod roster;
pub mod server;
pub mod service;
pub mod store;

pub use engine::cancel::CancellationToken;
pub use engine::{Engine, SeatingJob};
pub use error::{SeatingError, SeatingResult};
pub use service::SeatingService;
