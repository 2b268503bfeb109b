use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use crate::mock_services::{asana_server, config_for};
use waypoint::app::Services;
use waypoint::enforcement::ToolCall;

#[tokio::test]
async fn calibrated_call_is_scoped_resolved_and_chained() {
    let asana = asana_server().await;
    let state = TempDir::new().unwrap();
    let services =
        Services::from_config(Arc::new(config_for(state.path(), &asana, None))).unwrap();
    services.calibrator.calibrate().await.unwrap();

    let enforcer = services.enforcer();
    assert!(enforcer.load_snapshot(services.store.as_ref()).await.unwrap());

    let call = ToolCall::from_value(
        "asana.create_task",
        json!({"name": "Ship it", "projectName": "Roadmap", "followers": ["u-1"]}),
    );
    let result = enforcer.enforce(call.clone()).await;

    assert_eq!(result.original, call);
    assert_eq!(result.enhanced.params["workspace"], "ws-1");
    assert_eq!(result.enhanced.params["projectId"], "p-7");
    assert_eq!(result.enhanced.params["name"], "Ship it");

    let chain = result.chain_operations.unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0], result.enhanced);
    assert_eq!(chain[1].tool, "asana.add_followers");
    assert_eq!(chain[1].params["followers"], json!(["u-1"]));
    assert!(result.enforce_pagination.is_none());
}

#[tokio::test]
async fn uncalibrated_listing_only_gets_pagination() {
    let asana = asana_server().await;
    let state = TempDir::new().unwrap();
    let services =
        Services::from_config(Arc::new(config_for(state.path(), &asana, None))).unwrap();

    let enforcer = services.enforcer();
    assert!(!enforcer.load_snapshot(services.store.as_ref()).await.unwrap());

    let result = enforcer
        .enforce(ToolCall::from_value("asana.list_tasks", json!({})))
        .await;

    assert!(result.enhanced.params.is_empty());
    assert_eq!(result.enforce_pagination, Some(true));
    assert_eq!(result.pagination_limit, Some(50));
    assert_eq!(result.modifications.len(), 1);

    let rendered = serde_json::to_value(&result).unwrap();
    assert!(rendered.get("chain_operations").is_none());
}
