//! Outbound tool-call rewriting.
//!
//! Each call passes once through [`rules::default_rule_chain`]: identifier
//! injection, name-to-id resolution, pagination flagging, then operation
//! chaining. Only resolution may touch the network, and nothing it does
//! can make [`Enforcer::enforce`] fail.

pub mod capability;
pub mod rules;


pub use capability::Capability;
pub use rules::{EnforcementDraft, EnforcementRule, RuleContext, default_rule_chain};

use crate::calibration::CalibrationSnapshot;
use crate::config::EnforcementConfig;
use crate::connectors::IdResolver;
use crate::error::PersistenceError;
use crate::store::SnapshotStore;
use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// An outbound invocation: tool name plus open parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            params,
        }
    }

    /// `params` must be a JSON object; anything else yields no params.
    pub fn from_value(tool: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(tool, params)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcementResult {
    pub original: ToolCall,
    pub enhanced: ToolCall,
    pub modifications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_pagination: Option<bool>,
    /// Page cap the executor should honor while exhausting pagination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_operations: Option<Vec<ToolCall>>,
}

pub struct Enforcer {
    snapshot: ArcSwapOption<CalibrationSnapshot>,
    resolver: Option<Arc<dyn IdResolver>>,
    settings: EnforcementConfig,
    rules: Vec<Arc<dyn EnforcementRule>>,
}

impl Enforcer {
    pub fn new(settings: EnforcementConfig) -> Self {
        Self {
            snapshot: ArcSwapOption::empty(),
            resolver: None,
            settings,
            rules: default_rule_chain(),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn IdResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn with_snapshot(self, snapshot: CalibrationSnapshot) -> Self {
        self.set_snapshot(Some(snapshot));
        self
    }

    /// Swaps in a newer snapshot; calls already in flight keep the old one.
    pub fn set_snapshot(&self, snapshot: Option<CalibrationSnapshot>) {
        self.snapshot.store(snapshot.map(Arc::new));
    }

    pub fn snapshot(&self) -> Option<Arc<CalibrationSnapshot>> {
        self.snapshot.load_full()
    }

    /// Refreshes from the store; returns whether a snapshot was found.
    pub async fn load_snapshot(&self, store: &dyn SnapshotStore) -> Result<bool, PersistenceError> {
        let snapshot = store.load().await?;
        let found = snapshot.is_some();
        self.set_snapshot(snapshot);
        Ok(found)
    }

    pub async fn enforce(&self, call: ToolCall) -> EnforcementResult {
        let snapshot = self.snapshot.load_full();
        let ctx = RuleContext {
            snapshot: snapshot.as_deref(),
            resolver: self.resolver.as_deref(),
            settings: &self.settings,
        };

        let mut draft = EnforcementDraft::new(&call);
        for rule in &self.rules {
            let before = draft.modifications.len();
            rule.apply(&mut draft, &ctx).await;
            if draft.modifications.len() > before {
                tracing::debug!(tool = %call.tool, rule = rule.name(), "rule rewrote call");
            }
        }

        let enhanced = ToolCall::new(call.tool.clone(), draft.params);
        let chain_operations = (!draft.follow_ups.is_empty()).then(|| {
            std::iter::once(enhanced.clone())
                .chain(draft.follow_ups)
                .collect()
        });
        let enforce_pagination = draft.enforce_pagination.then_some(true);
        let modifications = draft.modifications;

        if !modifications.is_empty() {
            tracing::debug!(
                tool = %call.tool,
                modifications = modifications.len(),
                "tool call enforced"
            );
        }

        EnforcementResult {
            pagination_limit: enforce_pagination.map(|_| self.settings.max_pagination_pages),
            original: call,
            enhanced,
            modifications,
            enforce_pagination,
            chain_operations,
        }
    }
}
