//! Client for the `mockcapability.v1.MockCapability` service.

use std::future::Future;

use http::uri::PathAndQuery;
use tonic::codec::Streaming;
use tonic::transport::Channel;
use tonic::{IntoRequest, IntoStreamingRequest, Request, Response, Status};

use super::messages::{
    CapabilityInfo, Empty, ExecutableRequest, ExecutableResponse, GetTriggerSubscribersRequest,
    GetTriggerSubscribersResponse, ListRequest, ListResponse, RegisterToWorkflowRequest,
    RemoveCapabilityRequest, SendTriggerEventRequest, TriggerRegistrationRequest,
    TriggerResponse,
};

const REGISTER_TO_WORKFLOW: &str = "/mockcapability.v1.MockCapability/RegisterToWorkflow";
const EXECUTE: &str = "/mockcapability.v1.MockCapability/Execute";
const CREATE_CAPABILITY: &str = "/mockcapability.v1.MockCapability/CreateCapability";
const SEND_TRIGGER_EVENT: &str = "/mockcapability.v1.MockCapability/SendTriggerEvent";
const REMOVE_CAPABILITY: &str = "/mockcapability.v1.MockCapability/RemoveCapability";
const LIST: &str = "/mockcapability.v1.MockCapability/List";
const GET_TRIGGER_SUBSCRIBERS: &str = "/mockcapability.v1.MockCapability/GetTriggerSubscribers";
const UNREGISTER_TRIGGER: &str = "/mockcapability.v1.MockCapability/UnregisterTrigger";
const REGISTER_TRIGGER: &str = "/mockcapability.v1.MockCapability/RegisterTrigger";
const HOOK_EXECUTABLES: &str = "/mockcapability.v1.MockCapability/HookExecutables";

/// gRPC client for one mock capability node.
///
/// Cheap to clone; clones share the underlying channel.
#[derive(Debug, Clone)]
pub struct MockCapabilityClient {
    inner: tonic::client::Grpc<Channel>,
}

impl MockCapabilityClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    async fn ready(&mut self) -> Result<(), Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unknown(format!("Service was not ready: {}", e)))
    }

    async fn unary<Req, Resp>(
        &mut self,
        request: Request<Req>,
        path: &'static str,
    ) -> Result<Response<Resp>, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.ready().await?;
        let codec = tonic_prost::ProstCodec::<Req, Resp>::default();
        self.inner
            .unary(request, PathAndQuery::from_static(path), codec)
            .await
    }

    pub async fn register_to_workflow(
        &mut self,
        request: impl IntoRequest<RegisterToWorkflowRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.unary(request.into_request(), REGISTER_TO_WORKFLOW)
            .await
    }

    pub async fn execute(
        &mut self,
        request: impl IntoRequest<ExecutableRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.unary(request.into_request(), EXECUTE).await
    }

    pub async fn create_capability(
        &mut self,
        request: impl IntoRequest<CapabilityInfo>,
    ) -> Result<Response<Empty>, Status> {
        self.unary(request.into_request(), CREATE_CAPABILITY).await
    }

    pub async fn send_trigger_event(
        &mut self,
        request: impl IntoRequest<SendTriggerEventRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.unary(request.into_request(), SEND_TRIGGER_EVENT).await
    }

    pub async fn remove_capability(
        &mut self,
        request: impl IntoRequest<RemoveCapabilityRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.unary(request.into_request(), REMOVE_CAPABILITY).await
    }

    pub async fn list(
        &mut self,
        request: impl IntoRequest<ListRequest>,
    ) -> Result<Response<ListResponse>, Status> {
        self.unary(request.into_request(), LIST).await
    }

    pub async fn get_trigger_subscribers(
        &mut self,
        request: impl IntoRequest<GetTriggerSubscribersRequest>,
    ) -> Result<Response<GetTriggerSubscribersResponse>, Status> {
        self.unary(request.into_request(), GET_TRIGGER_SUBSCRIBERS)
            .await
    }

    pub async fn unregister_trigger(
        &mut self,
        request: impl IntoRequest<TriggerRegistrationRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.unary(request.into_request(), UNREGISTER_TRIGGER).await
    }

    /// Registers a trigger; the node answers with a stream of trigger events.
    pub async fn register_trigger(
        &mut self,
        request: impl IntoRequest<TriggerRegistrationRequest>,
    ) -> Result<Response<Streaming<TriggerResponse>>, Status> {
        self.ready().await?;
        let codec =
            tonic_prost::ProstCodec::<TriggerRegistrationRequest, TriggerResponse>::default();
        self.inner
            .server_streaming(
                request.into_request(),
                PathAndQuery::from_static(REGISTER_TRIGGER),
                codec,
            )
            .await
    }

    /// Opens the executable hook. The node streams execution requests and
    /// expects one response per request on the outbound stream.
    pub fn hook_executables(
        &mut self,
        request: impl IntoStreamingRequest<Message = ExecutableResponse>,
    ) -> impl Future<Output = Result<Response<Streaming<ExecutableRequest>>, Status>> + Send + '_
    {
        // Resolve the request stream to a concrete type before the async
        // body so callers can prove the returned future is `Send`.
        self.hook_executables_inner(request.into_streaming_request())
    }

    async fn hook_executables_inner<S>(
        &mut self,
        request: Request<S>,
    ) -> Result<Response<Streaming<ExecutableRequest>>, Status>
    where
        S: tonic::codegen::tokio_stream::Stream<Item = ExecutableResponse> + Send + 'static,
    {
        self.ready().await?;
        let codec =
            tonic_prost::ProstCodec::<ExecutableResponse, ExecutableRequest>::default();
        self.inner
            .streaming(
                request,
                PathAndQuery::from_static(HOOK_EXECUTABLES),
                codec,
            )
            .await
    }
}
