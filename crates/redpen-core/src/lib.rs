//! redpen-core: Assessment synthesis, scoring, calibration and reporting.
//!
//! This crate holds the deterministic engine that every other redpen crate
//! builds on: the question synthesizer, the per-kind answer scorers, the
//! rubric decomposer, the reviewer calibration loop and the report aggregator.

pub mod answers;
pub mod calibration;
pub mod engine;
pub mod error;
pub mod glossary;
pub mod model;
pub mod report;
pub mod rubric;
pub mod scoring;
pub mod service;
pub mod statistics;
pub mod store;
pub mod synthesis;
pub mod traits;
pub mod validate;

pub use calibration::{CalibrationStore, ReviewerCalibration};
pub use engine::{evaluate, Evaluator};
pub use model::{Assessment, CandidateAnswer, Question};
pub use report::{apply_override, Report};
pub use service::{AssessmentService, ServiceConfig};
pub use synthesis::synthesize_assessment;
pub use traits::{AssessmentSource, Submission};
