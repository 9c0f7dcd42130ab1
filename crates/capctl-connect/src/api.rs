//! The RPC surface of one capability node, as seen by the controller.

use async_trait::async_trait;
use capctl_proto as pb;
use capctl_proto::MockCapabilityClient;
use futures::stream::BoxStream;
use futures::StreamExt;
use tonic::transport::Channel;
use tonic::{Response, Status};

/// Server-streamed trigger events of one registration.
pub type TriggerStream = BoxStream<'static, Result<pb::TriggerResponse, Status>>;

/// Execution requests pushed by a node over its executable hook.
pub type ExecutableStream = BoxStream<'static, Result<pb::ExecutableRequest, Status>>;

/// Responses sent back to a node over its executable hook.
pub type ExecutableReplies = BoxStream<'static, pb::ExecutableResponse>;

/// Operations exposed by a remote capability node.
///
/// `GrpcCapabilityApi` is the production implementation; tests substitute
/// in-memory nodes.
#[async_trait]
pub trait CapabilityApi: Send + Sync {
    async fn register_to_workflow(&self, request: pb::RegisterToWorkflowRequest)
        -> Result<(), Status>;

    async fn execute(&self, request: pb::ExecutableRequest) -> Result<(), Status>;

    async fn create_capability(&self, request: pb::CapabilityInfo) -> Result<(), Status>;

    async fn send_trigger_event(&self, request: pb::SendTriggerEventRequest)
        -> Result<(), Status>;

    async fn remove_capability(&self, request: pb::RemoveCapabilityRequest)
        -> Result<(), Status>;

    async fn list(&self, request: pb::ListRequest) -> Result<pb::ListResponse, Status>;

    async fn get_trigger_subscribers(
        &self,
        request: pb::GetTriggerSubscribersRequest,
    ) -> Result<pb::GetTriggerSubscribersResponse, Status>;

    async fn unregister_trigger(&self, request: pb::TriggerRegistrationRequest)
        -> Result<(), Status>;

    async fn register_trigger(
        &self,
        request: pb::TriggerRegistrationRequest,
    ) -> Result<TriggerStream, Status>;

    async fn hook_executables(&self, replies: ExecutableReplies)
        -> Result<ExecutableStream, Status>;
}

/// `CapabilityApi` over a tonic channel.
///
/// Cheaply cloneable (tonic's `Channel` is reference counted).
#[derive(Debug, Clone)]
pub struct GrpcCapabilityApi {
    client: MockCapabilityClient,
}

impl GrpcCapabilityApi {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: MockCapabilityClient::new(channel),
        }
    }
}

#[async_trait]
impl CapabilityApi for GrpcCapabilityApi {
    async fn register_to_workflow(
        &self,
        request: pb::RegisterToWorkflowRequest,
    ) -> Result<(), Status> {
        self.client.clone().register_to_workflow(request).await?;
        Ok(())
    }

    async fn execute(&self, request: pb::ExecutableRequest) -> Result<(), Status> {
        self.client.clone().execute(request).await?;
        Ok(())
    }

    async fn create_capability(&self, request: pb::CapabilityInfo) -> Result<(), Status> {
        self.client.clone().create_capability(request).await?;
        Ok(())
    }

    async fn send_trigger_event(
        &self,
        request: pb::SendTriggerEventRequest,
    ) -> Result<(), Status> {
        self.client.clone().send_trigger_event(request).await?;
        Ok(())
    }

    async fn remove_capability(
        &self,
        request: pb::RemoveCapabilityRequest,
    ) -> Result<(), Status> {
        self.client.clone().remove_capability(request).await?;
        Ok(())
    }

    async fn list(&self, request: pb::ListRequest) -> Result<pb::ListResponse, Status> {
        self.client
            .clone()
            .list(request)
            .await
            .map(Response::into_inner)
    }

    async fn get_trigger_subscribers(
        &self,
        request: pb::GetTriggerSubscribersRequest,
    ) -> Result<pb::GetTriggerSubscribersResponse, Status> {
        self.client
            .clone()
            .get_trigger_subscribers(request)
            .await
            .map(Response::into_inner)
    }

    async fn unregister_trigger(
        &self,
        request: pb::TriggerRegistrationRequest,
    ) -> Result<(), Status> {
        self.client.clone().unregister_trigger(request).await?;
        Ok(())
    }

    async fn register_trigger(
        &self,
        request: pb::TriggerRegistrationRequest,
    ) -> Result<TriggerStream, Status> {
        let response = self.client.clone().register_trigger(request).await?;
        Ok(response.into_inner().boxed())
    }

    async fn hook_executables(
        &self,
        replies: ExecutableReplies,
    ) -> Result<ExecutableStream, Status> {
        let response = self.client.clone().hook_executables(replies).await?;
        Ok(response.into_inner().boxed())
    }
}
