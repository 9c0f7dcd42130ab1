//! Fail-fast broadcast behaviour of the controller

mod common;

use capctl_connect::{CapabilityInfo, CapabilityType, ControlError};
use capctl_proto as pb;
use common::{controller, FakeNode};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_register_to_workflow_stops_at_first_failure() {
    let (a, b, c) = (FakeNode::new(), FakeNode::new(), FakeNode::new());
    b.fail("RegisterToWorkflow");
    let controller = controller(&[a.clone(), b.clone(), c.clone()]);

    let result = controller
        .register_to_workflow(
            &CancellationToken::new(),
            &pb::RegisterToWorkflowRequest::default(),
        )
        .await;

    match result {
        Err(ControlError::NodeFailed { node, operation, .. }) => {
            assert_eq!(node, "node-1");
            assert_eq!(operation, "RegisterToWorkflow");
        }
        other => panic!("expected NodeFailed, got {:?}", other),
    }
    assert_eq!(a.calls("RegisterToWorkflow"), 1);
    assert_eq!(b.calls("RegisterToWorkflow"), 1);
    assert_eq!(c.calls("RegisterToWorkflow"), 0);
}

#[tokio::test]
async fn test_execute_and_send_trigger_reach_every_node() {
    let nodes = [FakeNode::new(), FakeNode::new(), FakeNode::new()];
    let controller = controller(&nodes);
    let cancel = CancellationToken::new();

    controller
        .execute(&cancel, &pb::ExecutableRequest::default())
        .await
        .unwrap();
    controller
        .send_trigger(
            &cancel,
            &pb::SendTriggerEventRequest {
                trigger_id: "cron-trigger@1.0.0".to_string(),
                id: "evt-1".to_string(),
                outputs: Vec::new(),
            },
        )
        .await
        .unwrap();

    for node in &nodes {
        assert_eq!(node.calls("Execute"), 1);
        assert_eq!(node.calls("SendTriggerEvent"), 1);
    }
}

#[tokio::test]
async fn test_create_then_delete_capability() {
    let nodes = [FakeNode::new(), FakeNode::new()];
    let controller = controller(&nodes);
    let cancel = CancellationToken::new();

    let info = CapabilityInfo {
        id: "write_geth@1.0.0".to_string(),
        capability_type: CapabilityType::Target,
        description: "geth writer".to_string(),
        is_local: true,
    };

    controller.create_capability(&cancel, &info).await.unwrap();
    assert!(controller.has_capability(&cancel, &info.id).await.unwrap());

    controller.delete_capability(&cancel, &info.id).await.unwrap();
    assert!(!controller.has_capability(&cancel, &info.id).await.unwrap());
}

#[tokio::test]
async fn test_delete_capability_names_node_and_capability() {
    let (a, b) = (FakeNode::new(), FakeNode::new());
    a.fail("RemoveCapability");
    let controller = controller(&[a, b.clone()]);

    let err = controller
        .delete_capability(&CancellationToken::new(), "write@1.0.0")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ControlError::CapabilityDeleteFailed { ref capability, ref node, .. }
            if capability == "write@1.0.0" && node == "node-0"
    ));
    assert_eq!(b.calls("RemoveCapability"), 0);
}

#[tokio::test]
async fn test_list_returns_one_entry_per_node_in_order() {
    let nodes = [
        FakeNode::with_capabilities(&["cron@1.0.0"]),
        FakeNode::with_capabilities(&[]),
        FakeNode::with_capabilities(&["cron@1.0.0", "write@1.0.0"]),
    ];
    let controller = controller(&nodes);

    let inventory = controller.list(&CancellationToken::new()).await.unwrap();

    let names: Vec<&str> = inventory.iter().map(|n| n.node.as_str()).collect();
    assert_eq!(names, vec!["node-0", "node-1", "node-2"]);
    assert_eq!(inventory[1].capabilities.len(), 0);
    assert_eq!(inventory[2].capabilities[1].id, "write@1.0.0");
    assert_eq!(
        inventory[0].capabilities[0].capability_type,
        CapabilityType::Trigger
    );
}

#[tokio::test]
async fn test_has_capability_is_and_reduction() {
    let nodes = [
        FakeNode::with_capabilities(&["cron@1.0.0"]),
        FakeNode::with_capabilities(&["cron@1.0.0"]),
        FakeNode::with_capabilities(&["cron@1.0.0"]),
    ];
    let controller = controller(&nodes);
    let cancel = CancellationToken::new();

    assert!(controller.has_capability(&cancel, "cron@1.0.0").await.unwrap());

    nodes[1].remove_capability_id("cron@1.0.0");
    assert!(!controller.has_capability(&cancel, "cron@1.0.0").await.unwrap());

    nodes[1].add_capability("cron@1.0.0");
    assert!(controller.has_capability(&cancel, "cron@1.0.0").await.unwrap());
}

#[tokio::test]
async fn test_list_failure_propagates_with_node() {
    let (a, b) = (FakeNode::new(), FakeNode::new());
    b.fail("List");
    let controller = controller(&[a, b]);

    let err = controller
        .has_capability(&CancellationToken::new(), "cron@1.0.0")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("node-1"));
}

#[tokio::test]
async fn test_trigger_subscribers_keyed_by_node() {
    let (a, b) = (FakeNode::new(), FakeNode::new());
    a.set_subscribers(&["wf-1"]);
    let controller = controller(&[a, b]);

    let subscribers = controller
        .get_trigger_subscribers(&CancellationToken::new(), "cron@1.0.0")
        .await
        .unwrap();

    assert_eq!(subscribers.len(), 2);
    assert_eq!(subscribers["node-0"], vec!["wf-1".to_string()]);
    assert!(subscribers["node-1"].is_empty());
}

#[tokio::test]
async fn test_cancelled_broadcast_does_not_call_nodes_once_cancelled() {
    let nodes = [FakeNode::new(), FakeNode::new()];
    let controller = controller(&nodes);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = controller
        .execute(&cancel, &pb::ExecutableRequest::default())
        .await
        .unwrap_err();

    match err {
        ControlError::NodeFailed { source, node, .. } => {
            assert_eq!(node, "node-0");
            assert_eq!(source.code(), tonic::Code::Cancelled);
        }
        other => panic!("expected NodeFailed, got {:?}", other),
    }
    assert_eq!(nodes[1].calls("Execute"), 0);
}
