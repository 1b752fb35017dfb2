use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Configuration for the users_info module (`modules.users_info` in the app config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersInfoConfig {
    /// Maximum accepted `name` length; absent or 0 means no cap.
    #[serde(default)]
    pub max_name_length: Option<usize>,
}

impl UsersInfoConfig {
    /// Parse the module section of the config bag; a missing section yields defaults.
    pub fn from_value(value: Option<&serde_json::Value>) -> anyhow::Result<Self> {
        match value {
            Some(v) => Ok(serde_json::from_value(v.clone())?),
            None => Ok(Self::default()),
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_name_length: self.max_name_length.filter(|&max| max > 0),
        }
    }
}
