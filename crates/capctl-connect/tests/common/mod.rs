//! In-memory capability nodes for controller tests

#![allow(dead_code)]

use async_trait::async_trait;
use capctl_connect::{
    CapabilityApi, Controller, ControllerConfig, ExecutableReplies, ExecutableStream, Node,
    NodeRegistry, TriggerStream,
};
use capctl_proto as pb;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;

/// What a node streams back after `RegisterTrigger` succeeds.
pub enum TriggerScript {
    /// Yield these items, then end the stream
    Finite(Vec<Result<pb::TriggerResponse, Status>>),
    /// Yield the same event forever
    Endless(pb::TriggerResponse),
}

#[derive(Default)]
pub struct FakeNode {
    capabilities: Mutex<Vec<String>>,
    /// Capability that shows up once `List` has been called this many times
    late_capability: Mutex<Option<(usize, String)>>,
    subscribers: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    trigger_script: Mutex<Option<TriggerScript>>,
    hook_requests: Mutex<Option<mpsc::Receiver<Result<pb::ExecutableRequest, Status>>>>,
    hook_replies: Mutex<Option<ExecutableReplies>>,
}

impl FakeNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_capabilities(ids: &[&str]) -> Arc<Self> {
        let node = Self::default();
        *node.capabilities.lock().unwrap() = ids.iter().map(|s| s.to_string()).collect();
        Arc::new(node)
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn add_capability(&self, id: &str) {
        self.capabilities.lock().unwrap().push(id.to_string());
    }

    pub fn remove_capability_id(&self, id: &str) {
        self.capabilities.lock().unwrap().retain(|c| c != id);
    }

    pub fn capability_after_lists(&self, calls: usize, id: &str) {
        *self.late_capability.lock().unwrap() = Some((calls, id.to_string()));
    }

    pub fn set_subscribers(&self, workflow_ids: &[&str]) {
        *self.subscribers.lock().unwrap() = workflow_ids.iter().map(|s| s.to_string()).collect();
    }

    pub fn script_trigger(&self, script: TriggerScript) {
        *self.trigger_script.lock().unwrap() = Some(script);
    }

    /// Returns the sender used to push execution requests through the hook.
    pub fn script_hook(&self) -> mpsc::Sender<Result<pb::ExecutableRequest, Status>> {
        let (tx, rx) = mpsc::channel(16);
        *self.hook_requests.lock().unwrap() = Some(rx);
        tx
    }

    /// Responses the controller sent back over the hook, once it is open.
    pub fn take_hook_replies(&self) -> Option<ExecutableReplies> {
        self.hook_replies.lock().unwrap().take()
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, operation: &'static str) -> Result<usize, Status> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(operation).or_insert(0);
            *count += 1;
            *count
        };

        if self.failing.lock().unwrap().contains(operation) {
            return Err(Status::unavailable(format!("{} is down", operation)));
        }
        Ok(count)
    }
}

pub fn trigger_event(id: &str, outputs: &str) -> pb::TriggerResponse {
    pb::TriggerResponse {
        trigger_event: Some(pb::TriggerEvent {
            trigger_type: "cron-trigger@1.0.0".to_string(),
            id: id.to_string(),
            outputs: outputs.as_bytes().to_vec(),
        }),
        error: String::new(),
    }
}

#[async_trait]
impl CapabilityApi for FakeNode {
    async fn register_to_workflow(
        &self,
        _request: pb::RegisterToWorkflowRequest,
    ) -> Result<(), Status> {
        self.record("RegisterToWorkflow").map(|_| ())
    }

    async fn execute(&self, _request: pb::ExecutableRequest) -> Result<(), Status> {
        self.record("Execute").map(|_| ())
    }

    async fn create_capability(&self, request: pb::CapabilityInfo) -> Result<(), Status> {
        self.record("CreateCapability")?;
        self.add_capability(&request.id);
        Ok(())
    }

    async fn send_trigger_event(
        &self,
        _request: pb::SendTriggerEventRequest,
    ) -> Result<(), Status> {
        self.record("SendTriggerEvent").map(|_| ())
    }

    async fn remove_capability(
        &self,
        request: pb::RemoveCapabilityRequest,
    ) -> Result<(), Status> {
        self.record("RemoveCapability")?;
        self.remove_capability_id(&request.id);
        Ok(())
    }

    async fn list(&self, _request: pb::ListRequest) -> Result<pb::ListResponse, Status> {
        let count = self.record("List")?;

        let mut ids = self.capabilities.lock().unwrap().clone();
        if let Some((after, id)) = self.late_capability.lock().unwrap().as_ref() {
            if count >= *after {
                ids.push(id.clone());
            }
        }

        Ok(pb::ListResponse {
            cap_infos: ids
                .into_iter()
                .map(|id| pb::CapabilityInfo {
                    id,
                    capability_type: pb::CapabilityType::Trigger as i32,
                    description: String::new(),
                    is_local: false,
                })
                .collect(),
        })
    }

    async fn get_trigger_subscribers(
        &self,
        _request: pb::GetTriggerSubscribersRequest,
    ) -> Result<pb::GetTriggerSubscribersResponse, Status> {
        self.record("GetTriggerSubscribers")?;
        Ok(pb::GetTriggerSubscribersResponse {
            workflow_ids: self.subscribers.lock().unwrap().clone(),
        })
    }

    async fn unregister_trigger(
        &self,
        _request: pb::TriggerRegistrationRequest,
    ) -> Result<(), Status> {
        self.record("UnregisterTrigger").map(|_| ())
    }

    async fn register_trigger(
        &self,
        _request: pb::TriggerRegistrationRequest,
    ) -> Result<TriggerStream, Status> {
        self.record("RegisterTrigger")?;

        match self.trigger_script.lock().unwrap().take() {
            Some(TriggerScript::Finite(items)) => Ok(futures::stream::iter(items).boxed()),
            Some(TriggerScript::Endless(event)) => {
                Ok(futures::stream::repeat_with(move || Ok(event.clone())).boxed())
            }
            None => Ok(futures::stream::pending().boxed()),
        }
    }

    async fn hook_executables(
        &self,
        replies: ExecutableReplies,
    ) -> Result<ExecutableStream, Status> {
        self.record("HookExecutables")?;
        *self.hook_replies.lock().unwrap() = Some(replies);

        match self.hook_requests.lock().unwrap().take() {
            Some(rx) => Ok(ReceiverStream::new(rx).boxed()),
            None => Ok(futures::stream::pending().boxed()),
        }
    }
}

/// Controller over fake nodes, addressed `node-0`, `node-1`, ...
pub fn controller(nodes: &[Arc<FakeNode>]) -> Controller {
    controller_with(nodes, ControllerConfig::default())
}

pub fn controller_with(nodes: &[Arc<FakeNode>], config: ControllerConfig) -> Controller {
    let registry = NodeRegistry::from_nodes(
        nodes
            .iter()
            .enumerate()
            .map(|(i, fake)| Node::new(format!("node-{}", i), fake.clone() as Arc<dyn CapabilityApi>))
            .collect(),
    );
    Controller::new(registry, config).unwrap()
}
