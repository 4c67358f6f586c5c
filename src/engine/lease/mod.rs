pub mod extender;

pub use extender::{BrokerTuning, LeaseExtender, estimate_remaining};
