//! Gradebook turns an e-learning platform's points export and registrar
//! roster exports into final course grades, applying declarative per-course
//! scoring policies (thresholds, attempt precedence, bonus handling).

pub mod cli;
pub mod config;
pub mod error;
pub mod grading;
pub mod telemetry;
