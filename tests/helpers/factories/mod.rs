pub mod cache_factory;
pub mod dispatcher_factory;
pub mod memory_store;
pub mod recording_lease;
pub mod requester_factory;
pub mod zip_request_factory;

pub use cache_factory::{CacheFactory, TestCache};
pub use dispatcher_factory::{DispatcherFactory, INPUT_BUCKET, OUTPUT_BUCKET, TestEngine};
pub use memory_notifier::MemoryNotifier;
pub use memory_store::MemoryObjectStore;
pub use recording_lease::{LeaseAction, RecordingLease};
pub use requester_factory::RequesterFactory;
pub use zip_request_factory::ZipRequestFactory;

#[cfg(test)]
mod requester_factory_test;
#[cfg(test)]
mod zip_request_factory_test;
