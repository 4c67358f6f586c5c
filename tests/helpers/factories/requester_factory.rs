use std::collections::HashMap;

use serde_json::{Value, json};

use crate::request::Requester;

pub struct RequesterFactory {
    params: HashMap<String, Value>,
}

impl RequesterFactory {
    pub fn new() -> Self {
        let mut params = HashMap::new();
        params.insert("name".into(), json!("Ada Lovelace"));
        params.insert("email".into(), json!("ada@example.org"));
        Self { params }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn create(self) -> Requester {
        Requester {
            name: self.params["name"].as_str().unwrap().to_string(),
            email: self.params["email"].as_str().unwrap().to_string(),
            id: self
                .params
                .get("id")
                .and_then(|v| v.as_str())
                .map(String::from),
        }
    }

    pub fn create_list(self, count: usize) -> Vec<Requester> {
        (0..count)
            .map(|i| Requester {
                name: format!("Requester {}", i + 1),
                email: format!("requester{}@example.org", i + 1),
                id: Some(format!("req-{}", i + 1)),
            })
            .collect()
    }
}
