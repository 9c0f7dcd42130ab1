//! Wire messages of `mockcapability.v1`.
//!
//! Value maps (trigger outputs, executable config and inputs) travel as
//! opaque bytes; the controller decodes them.

/// Kind of capability registered on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CapabilityType {
    Unknown = 0,
    Trigger = 1,
    Action = 2,
    Consensus = 3,
    Target = 4,
}

impl CapabilityType {
    /// Name used in the protocol definition.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            CapabilityType::Unknown => "Unknown",
            CapabilityType::Trigger => "Trigger",
            CapabilityType::Action => "Action",
            CapabilityType::Consensus => "Consensus",
            CapabilityType::Target => "Target",
        }
    }
}

/// Workflow metadata attached to registrations and execution requests.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metadata {
    #[prost(string, tag = "1")]
    pub workflow_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub workflow_owner: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub workflow_execution_id: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub workflow_name: ::prost::alloc::string::String,
    #[prost(uint32, tag = "5")]
    pub workflow_don_id: u32,
    #[prost(uint32, tag = "6")]
    pub workflow_don_config_version: u32,
    #[prost(string, tag = "7")]
    pub reference_id: ::prost::alloc::string::String,
    #[prost(string, tag = "8")]
    pub decoded_workflow_name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Empty {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterToWorkflowRequest {
    #[prost(message, optional, tag = "1")]
    pub metadata: ::core::option::Option<Metadata>,
    #[prost(string, tag = "2")]
    pub capability_id: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "3")]
    pub config: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExecutableRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(enumeration = "CapabilityType", tag = "2")]
    pub capability_type: i32,
    #[prost(message, optional, tag = "3")]
    pub request_metadata: ::core::option::Option<Metadata>,
    #[prost(bytes = "vec", tag = "4")]
    pub config: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub inputs: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExecutableResponse {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(enumeration = "CapabilityType", tag = "2")]
    pub capability_type: i32,
    #[prost(bytes = "vec", tag = "3")]
    pub value: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "4")]
    pub error: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CapabilityInfo {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(enumeration = "CapabilityType", tag = "2")]
    pub capability_type: i32,
    #[prost(string, tag = "3")]
    pub description: ::prost::alloc::string::String,
    #[prost(bool, tag = "4")]
    pub is_local: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SendTriggerEventRequest {
    #[prost(string, tag = "1")]
    pub trigger_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub id: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "3")]
    pub outputs: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RemoveCapabilityRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListResponse {
    #[prost(message, repeated, tag = "1")]
    pub cap_infos: ::prost::alloc::vec::Vec<CapabilityInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTriggerSubscribersRequest {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTriggerSubscribersResponse {
    #[prost(string, repeated, tag = "1")]
    pub workflow_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TriggerRegistrationRequest {
    #[prost(string, tag = "1")]
    pub trigger_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub metadata: ::core::option::Option<Metadata>,
    #[prost(bytes = "vec", tag = "3")]
    pub config: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag = "4")]
    pub payload: ::core::option::Option<::prost_types::Any>,
    #[prost(string, tag = "5")]
    pub method: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub registration_trigger_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TriggerEvent {
    #[prost(string, tag = "1")]
    pub trigger_type: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub id: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "3")]
    pub outputs: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TriggerResponse {
    #[prost(message, optional, tag = "1")]
    pub trigger_event: ::core::option::Option<TriggerEvent>,
    #[prost(string, tag = "2")]
    pub error: ::prost::alloc::string::String,
}
