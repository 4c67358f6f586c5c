pub mod broker;
pub mod errors;
pub mod fs_store;
pub mod http_notifier;
pub mod notifier;
pub mod storage;

pub use broker::BrokerLease;
pub use errors::{LeaseError, NotifyError, StorageError};
pub use fs_store::FsObjectStore;
pub use http_notifier::HttpNotifier;
pub use notifier::{Notification, NotificationOutcome, Notifier};
pub use storage::{ObjectMeta, ObjectStore};
