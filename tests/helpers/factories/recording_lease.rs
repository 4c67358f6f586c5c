use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::remote::{BrokerLease, LeaseError};

#[derive(Debug, Clone, PartialEq)]
pub enum LeaseAction {
    Extended(Duration),
    Acked,
    Nacked,
}

/// Broker lease double that records every call. It can be scripted to
/// start rejecting extensions after a fixed number of them.
pub struct RecordingLease {
    id: String,
    state: Mutex<LeaseState>,
}

struct LeaseState {
    actions: Vec<LeaseAction>,
    extends_before_expiry: Option<u32>,
}

impl RecordingLease {
    pub fn new(id: &str) -> Arc<Self> {
        Self::build(id, None)
    }

    /// Lease whose deadline lapses after `extends` successful extensions.
    pub fn expiring(id: &str, extends: u32) -> Arc<Self> {
        Self::build(id, Some(extends))
    }

    fn build(id: &str, extends_before_expiry: Option<u32>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            state: Mutex::new(LeaseState {
                actions: Vec::new(),
                extends_before_expiry,
            }),
        })
    }

    pub fn actions(&self) -> Vec<LeaseAction> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn extend_count(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, LeaseAction::Extended(_)))
            .count()
    }

    pub fn acked(&self) -> bool {
        self.actions().contains(&LeaseAction::Acked)
    }

    pub fn nacked(&self) -> bool {
        self.actions().contains(&LeaseAction::Nacked)
    }
}

#[async_trait]
impl BrokerLease for RecordingLease {
    fn id(&self) -> &str {
        &self.id
    }

    async fn extend(&self, by: Duration) -> Result<(), LeaseError> {
        let mut state = self.state.lock().unwrap();
        if let Some(left) = state.extends_before_expiry.as_mut() {
            if *left == 0 {
                return Err(LeaseError::Expired);
            }
            *left -= 1;
        }
        state.actions.push(LeaseAction::Extended(by));
        Ok(())
    }

    async fn ack(&self) -> Result<(), LeaseError> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(LeaseAction::Acked);
        Ok(())
    }

    async fn nack(&self) -> Result<(), LeaseError> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(LeaseAction::Nacked);
        Ok(())
    }
}
