use serde::{Deserialize, Serialize};

use super::Dialect;

/// One named template as it appears in a catalog file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct YmlSettings {
    pub name: String,
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<Dialect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
}
