use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::remote::BrokerLease;

/// Identity of whoever asked for an archive. Equal identities collapse
/// into a single notification per job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requester {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} ({}) <{}>", self.name, id, self.email),
            None => write!(f, "{} <{}>", self.name, self.email),
        }
    }
}

/// One object requested for the archive. The size is advisory; the store
/// is the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedFile {
    pub key: String,
    #[serde(default)]
    pub size: u64,
}

/// A request to assemble one archive, optionally tied to the broker
/// message that delivered it.
pub struct ZipRequest {
    pub files: Vec<RequestedFile>,
    pub requester: Requester,
    pub lease: Option<Arc<dyn BrokerLease>>,
}

impl ZipRequest {
    pub fn new(files: Vec<RequestedFile>, requester: Requester) -> Self {
        Self {
            files,
            requester,
            lease: None,
        }
    }

    pub fn with_lease(mut self, lease: Arc<dyn BrokerLease>) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn file_keys(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.key.as_str())
    }
}

impl fmt::Debug for ZipRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipRequest")
            .field("files", &self.files)
            .field("requester", &self.requester)
            .field("lease", &self.lease.as_ref().map(|l| l.id().to_string()))
            .finish()
    }
}
