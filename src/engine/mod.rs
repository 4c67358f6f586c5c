pub mod cache;
pub mod dispatcher;
pub mod errors;
pub mod job;
pub mod lease;
pub mod zip;

pub use errors::*;
