use std::sync::Arc;

use crate::remote::BrokerLease;
use crate::request::{RequestedFile, Requester, ZipRequest};

use super::RequesterFactory;

pub struct ZipRequestFactory {
    keys: Vec<String>,
    requester: Option<Requester>,
    lease: Option<Arc<dyn BrokerLease>>,
}

impl ZipRequestFactory {
    pub fn new() -> Self {
        Self {
            keys: vec![
                "results/a.txt".to_string(),
                "results/b.txt".to_string(),
                "results/sub/c.txt".to_string(),
            ],
            requester: None,
            lease: None,
        }
    }

    pub fn with_keys(mut self, keys: &[&str]) -> Self {
        self.keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_requester(mut self, requester: Requester) -> Self {
        self.requester = Some(requester);
        self
    }

    pub fn with_lease(mut self, lease: Arc<dyn BrokerLease>) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn create(self) -> ZipRequest {
        let requester = self
            .requester
            .unwrap_or_else(|| RequesterFactory::new().create());
        let files = self
            .keys
            .into_iter()
            .map(|key| RequestedFile { key, size: 0 })
            .collect();
        let request = ZipRequest::new(files, requester);
        match self.lease {
            Some(lease) => request.with_lease(lease),
            None => request,
        }
    }
}
