use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_max_chain_depth() -> usize {
    5
}

fn default_max_pagination_pages() -> u32 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementConfig {
    #[serde(default = "default_true")]
    pub require_complete_pagination: bool,
    #[serde(default = "default_true")]
    pub auto_resolve_ids: bool,
    /// Upper bound on `chain_operations` length, the enhanced call included.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,
    /// Upper bound on pages fetched by any pagination loop.
    #[serde(default = "default_max_pagination_pages")]
    pub max_pagination_pages: u32,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            require_complete_pagination: true,
            auto_resolve_ids: true,
            max_chain_depth: default_max_chain_depth(),
            max_pagination_pages: default_max_pagination_pages(),
        }
    }
}
