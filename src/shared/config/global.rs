use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::shared::config::model::{Settings, load_settings};

/// Process-wide settings, resolved on first use from the file named by
/// `BUNDEL_CONFIG` (default `config.toml`).
pub static CONFIG: Lazy<Arc<Settings>> =
    Lazy::new(|| Arc::new(load_settings().expect("Failed to load configuration")));
