use super::ToolCall;
use super::capability::Capability;
use crate::calibration::CalibrationSnapshot;
use crate::config::EnforcementConfig;
use crate::connectors::{IdResolver, NameField, Resolution, ScopeContext};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Tool-name fragments whose results must be read to the last page.
pub const PAGINATION_FRAGMENTS: [&str; 5] =
    ["list_", "search_", "get_comments", "get_many_", "query_"];

/// `(create fragment, dependent param, follow-up action)`.
pub const CHAIN_CONDITIONS: [(&str, &str, &str); 4] = [
    ("create_issue", "labels", "add_labels"),
    ("create_task", "subtasks", "add_subtasks"),
    ("create_task", "followers", "add_followers"),
    ("create_project", "members", "add_members"),
];

/// Mutable state threaded through the rule chain for one call.
#[derive(Debug)]
pub struct EnforcementDraft<'a> {
    pub tool: &'a str,
    pub capability: Capability<'a>,
    pub params: Map<String, Value>,
    pub modifications: Vec<String>,
    pub enforce_pagination: bool,
    pub follow_ups: Vec<ToolCall>,
}

impl<'a> EnforcementDraft<'a> {
    pub fn new(call: &'a ToolCall) -> Self {
        Self {
            tool: &call.tool,
            capability: Capability::classify(&call.tool),
            params: call.params.clone(),
            modifications: Vec::new(),
            enforce_pagination: false,
            follow_ups: Vec::new(),
        }
    }
}

/// Read-only inputs every rule sees.
pub struct RuleContext<'a> {
    pub snapshot: Option<&'a CalibrationSnapshot>,
    pub resolver: Option<&'a dyn IdResolver>,
    pub settings: &'a EnforcementConfig,
}

pub trait EnforcementRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply<'a>(
        &'a self,
        draft: &'a mut EnforcementDraft<'_>,
        ctx: &'a RuleContext<'a>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

fn is_present(params: &Map<String, Value>, key: &str) -> bool {
    params.get(key).is_some_and(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    })
}

// ── IdentifierInjectionRule ─────────────────────────────────────────

#[derive(Debug)]
pub struct IdentifierInjectionRule;

impl EnforcementRule for IdentifierInjectionRule {
    fn name(&self) -> &'static str {
        "identifier_injection"
    }

    fn apply<'a>(
        &'a self,
        draft: &'a mut EnforcementDraft<'_>,
        ctx: &'a RuleContext<'a>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let (Some(connector), Some(snapshot)) = (draft.capability.connector(), ctx.snapshot)
            else {
                return;
            };
            let param = connector.scope_param();
            if draft.params.contains_key(param) {
                return;
            }
            let Some(scope_id) = snapshot
                .get(connector)
                .and_then(|status| status.scope_id(connector))
            else {
                return;
            };

            draft
                .params
                .insert(param.to_string(), Value::String(scope_id.to_string()));
            draft
                .modifications
                .push(format!("injected {param}={scope_id} from {connector} calibration"));
        })
    }
}

// ── NameResolutionRule ──────────────────────────────────────────────

#[derive(Debug)]
pub struct NameResolutionRule;

impl EnforcementRule for NameResolutionRule {
    fn name(&self) -> &'static str {
        "name_resolution"
    }

    fn apply<'a>(
        &'a self,
        draft: &'a mut EnforcementDraft<'_>,
        ctx: &'a RuleContext<'a>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if !ctx.settings.auto_resolve_ids {
                return;
            }
            let (Some(connector), Some(resolver)) = (draft.capability.connector(), ctx.resolver)
            else {
                return;
            };

            let scope = ScopeContext {
                scope_id: draft
                    .params
                    .get(connector.scope_param())
                    .and_then(Value::as_str)
                    .map(str::to_string),
            };

            for field in NameField::ALL {
                let Some(name) = draft
                    .params
                    .get(field.param())
                    .and_then(Value::as_str)
                    .map(str::to_string)
                else {
                    continue;
                };
                if field
                    .id_params()
                    .iter()
                    .any(|id| draft.params.contains_key(*id))
                {
                    continue;
                }

                match resolver
                    .resolve_id_by_name(connector, &scope, field, &name)
                    .await
                {
                    Ok(Resolution::Resolved(fields)) => {
                        let mut merged = Vec::new();
                        for (key, value) in fields {
                            if draft.params.contains_key(&key) {
                                continue;
                            }
                            merged.push(format!("{key}={}", display_value(&value)));
                            draft.params.insert(key, value);
                        }
                        if !merged.is_empty() {
                            draft.modifications.push(format!(
                                "resolved {field} '{name}' to {}",
                                merged.join(", ")
                            ));
                        }
                    }
                    Ok(Resolution::NotFound) => {
                        tracing::debug!(
                            connector = %connector,
                            field = %field,
                            name = %name,
                            "no id found for name"
                        );
                    }
                    Err(e) => {
                        tracing::debug!(
                            connector = %connector,
                            field = %field,
                            error = %e,
                            "name lookup failed"
                        );
                    }
                }
            }
        })
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── PaginationRule ──────────────────────────────────────────────────

#[derive(Debug)]
pub struct PaginationRule;

impl EnforcementRule for PaginationRule {
    fn name(&self) -> &'static str {
        "pagination"
    }

    fn apply<'a>(
        &'a self,
        draft: &'a mut EnforcementDraft<'_>,
        ctx: &'a RuleContext<'a>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if !ctx.settings.require_complete_pagination {
                return;
            }
            if let Some(fragment) = PAGINATION_FRAGMENTS
                .iter()
                .find(|fragment| draft.tool.contains(*fragment))
            {
                draft.enforce_pagination = true;
                draft.modifications.push(format!(
                    "pagination required: '{}' matches '{fragment}'",
                    draft.tool
                ));
            }
        })
    }
}

// ── ChainingRule ────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ChainingRule;

impl EnforcementRule for ChainingRule {
    fn name(&self) -> &'static str {
        "chaining"
    }

    fn apply<'a>(
        &'a self,
        draft: &'a mut EnforcementDraft<'_>,
        ctx: &'a RuleContext<'a>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            for (fragment, param, follow_up) in CHAIN_CONDITIONS {
                let Some(at) = draft.tool.find(fragment) else {
                    continue;
                };
                if !is_present(&draft.params, param) {
                    continue;
                }
                let Some(value) = draft.params.get(param).cloned() else {
                    continue;
                };

                let mut params = Map::new();
                params.insert(param.to_string(), value);
                let tool = format!("{}{follow_up}", &draft.tool[..at]);
                draft
                    .modifications
                    .push(format!("chained {tool} after {}", draft.tool));
                draft.follow_ups.push(ToolCall { tool, params });
            }

            // The enhanced call itself occupies one slot of the chain.
            let room = ctx.settings.max_chain_depth.max(1) - 1;
            if draft.follow_ups.len() > room {
                let dropped = draft.follow_ups.len() - room;
                draft.follow_ups.truncate(room);
                tracing::warn!(tool = draft.tool, dropped, "operation chain truncated");
                draft.modifications.push(format!(
                    "chain truncated to {} operations; {dropped} follow-up(s) dropped",
                    ctx.settings.max_chain_depth.max(1)
                ));
            }
        })
    }
}

// ── Chain constructor ───────────────────────────────────────────────

/// Rules in application order; later rules see earlier rewrites.
pub fn default_rule_chain() -> Vec<Arc<dyn EnforcementRule>> {
    vec![
        Arc::new(IdentifierInjectionRule),
        Arc::new(NameResolutionRule),
        Arc::new(PaginationRule),
        Arc::new(ChainingRule),
    ]
}
