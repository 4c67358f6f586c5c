pub mod registry;
pub mod types;
pub mod worker;

pub use registry::{JobRegistry, Submission};
pub use types::{Job, JobState};
pub use worker::{ZipJobWorker, ZipperTuning};
