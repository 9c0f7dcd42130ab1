//! Domain values exchanged with callers, and their conversions from the wire

use capctl_proto as pb;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::StreamError;

/// Decoded value map (trigger outputs, executable config and inputs).
pub type ValueMap = BTreeMap<String, serde_json::Value>;

/// Decode a JSON-encoded value map. Empty bytes decode to an empty map.
pub fn decode_value_map(bytes: &[u8]) -> Result<ValueMap, serde_json::Error> {
    if bytes.is_empty() {
        return Ok(ValueMap::new());
    }
    serde_json::from_slice(bytes)
}

pub fn encode_value_map(map: &ValueMap) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(map)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityType {
    #[default]
    Unknown,
    Trigger,
    Action,
    Consensus,
    Target,
}

impl CapabilityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityType::Unknown => "unknown",
            CapabilityType::Trigger => "trigger",
            CapabilityType::Action => "action",
            CapabilityType::Consensus => "consensus",
            CapabilityType::Target => "target",
        }
    }
}

impl fmt::Display for CapabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Case-insensitive; anything unrecognised parses as `Unknown`.
impl FromStr for CapabilityType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "TRIGGER" => CapabilityType::Trigger,
            "CONSENSUS" => CapabilityType::Consensus,
            "ACTION" => CapabilityType::Action,
            "TARGET" => CapabilityType::Target,
            _ => CapabilityType::Unknown,
        })
    }
}

impl From<pb::CapabilityType> for CapabilityType {
    fn from(value: pb::CapabilityType) -> Self {
        match value {
            pb::CapabilityType::Unknown => CapabilityType::Unknown,
            pb::CapabilityType::Trigger => CapabilityType::Trigger,
            pb::CapabilityType::Action => CapabilityType::Action,
            pb::CapabilityType::Consensus => CapabilityType::Consensus,
            pb::CapabilityType::Target => CapabilityType::Target,
        }
    }
}

impl From<CapabilityType> for pb::CapabilityType {
    fn from(value: CapabilityType) -> Self {
        match value {
            CapabilityType::Unknown => pb::CapabilityType::Unknown,
            CapabilityType::Trigger => pb::CapabilityType::Trigger,
            CapabilityType::Action => pb::CapabilityType::Action,
            CapabilityType::Consensus => pb::CapabilityType::Consensus,
            CapabilityType::Target => pb::CapabilityType::Target,
        }
    }
}

/// Snapshot of one capability as reported by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityInfo {
    pub id: String,
    pub capability_type: CapabilityType,
    pub description: String,
    pub is_local: bool,
}

impl From<pb::CapabilityInfo> for CapabilityInfo {
    fn from(info: pb::CapabilityInfo) -> Self {
        Self {
            capability_type: info.capability_type().into(),
            id: info.id,
            description: info.description,
            is_local: info.is_local,
        }
    }
}

impl From<&CapabilityInfo> for pb::CapabilityInfo {
    fn from(info: &CapabilityInfo) -> Self {
        Self {
            id: info.id.clone(),
            capability_type: pb::CapabilityType::from(info.capability_type) as i32,
            description: info.description.clone(),
            is_local: info.is_local,
        }
    }
}

/// Capability inventory of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapInfosByNode {
    pub node: String,
    pub capabilities: Vec<CapabilityInfo>,
}

impl CapInfosByNode {
    pub fn has(&self, capability_id: &str) -> bool {
        self.capabilities.iter().any(|c| c.id == capability_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestMetadata {
    pub workflow_id: String,
    pub workflow_owner: String,
    pub workflow_execution_id: String,
    pub workflow_name: String,
    pub workflow_don_id: u32,
    pub workflow_don_config_version: u32,
    pub reference_id: String,
    pub decoded_workflow_name: String,
}

impl From<pb::Metadata> for RequestMetadata {
    fn from(m: pb::Metadata) -> Self {
        Self {
            workflow_id: m.workflow_id,
            workflow_owner: m.workflow_owner,
            workflow_execution_id: m.workflow_execution_id,
            workflow_name: m.workflow_name,
            workflow_don_id: m.workflow_don_id,
            workflow_don_config_version: m.workflow_don_config_version,
            reference_id: m.reference_id,
            decoded_workflow_name: m.decoded_workflow_name,
        }
    }
}

impl From<&RequestMetadata> for pb::Metadata {
    fn from(m: &RequestMetadata) -> Self {
        Self {
            workflow_id: m.workflow_id.clone(),
            workflow_owner: m.workflow_owner.clone(),
            workflow_execution_id: m.workflow_execution_id.clone(),
            workflow_name: m.workflow_name.clone(),
            workflow_don_id: m.workflow_don_id,
            workflow_don_config_version: m.workflow_don_config_version,
            reference_id: m.reference_id.clone(),
            decoded_workflow_name: m.decoded_workflow_name.clone(),
        }
    }
}

/// Parameters of a trigger subscription, shared by register and unregister.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerRegistration {
    pub trigger_id: String,
    pub metadata: Option<RequestMetadata>,
    pub config: Vec<u8>,
    pub payload: Option<prost_types::Any>,
    pub method: String,
    pub registration_trigger_id: String,
}

impl TriggerRegistration {
    pub fn new(trigger_id: impl Into<String>) -> Self {
        Self {
            trigger_id: trigger_id.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: RequestMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_config(mut self, config: Vec<u8>) -> Self {
        self.config = config;
        self
    }

    pub fn with_payload(mut self, payload: prost_types::Any) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_registration_trigger_id(mut self, id: impl Into<String>) -> Self {
        self.registration_trigger_id = id.into();
        self
    }

    pub(crate) fn to_request(&self) -> pb::TriggerRegistrationRequest {
        pb::TriggerRegistrationRequest {
            trigger_id: self.trigger_id.clone(),
            metadata: self.metadata.as_ref().map(pb::Metadata::from),
            config: self.config.clone(),
            payload: self.payload.clone(),
            method: self.method.clone(),
            registration_trigger_id: self.registration_trigger_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriggerEvent {
    pub trigger_type: String,
    pub id: String,
    pub outputs: ValueMap,
}

/// One item of a trigger subscription's output queue.
///
/// A value with `err` set carries either a remote trigger error alongside
/// its event, a single undecodable message, or the terminal transport error
/// of the stream.
#[derive(Debug, Clone)]
pub struct TriggerResponse {
    pub event: TriggerEvent,
    pub err: Option<StreamError>,
}

impl TriggerResponse {
    pub fn failed(err: StreamError) -> Self {
        Self {
            event: TriggerEvent::default(),
            err: Some(err),
        }
    }

    pub fn is_err(&self) -> bool {
        self.err.is_some()
    }

    pub(crate) fn decode(node: &str, response: pb::TriggerResponse) -> Result<Self, StreamError> {
        let event = response.trigger_event.ok_or_else(|| StreamError::Decode {
            node: node.to_string(),
            reason: "received response with nil trigger event".to_string(),
        })?;

        let outputs = decode_value_map(&event.outputs).map_err(|e| StreamError::Decode {
            node: node.to_string(),
            reason: format!("failed to decode outputs: {}", e),
        })?;

        let err = (!response.error.is_empty()).then(|| StreamError::Remote {
            node: node.to_string(),
            message: response.error,
        });

        Ok(Self {
            event: TriggerEvent {
                trigger_type: event.trigger_type,
                id: event.id,
                outputs,
            },
            err,
        })
    }
}

/// Execution request received from a node's executable hook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityRequest {
    /// Address of the node that issued the request
    pub node: String,
    pub id: String,
    pub capability_type: CapabilityType,
    pub metadata: RequestMetadata,
    pub config: ValueMap,
    pub inputs: ValueMap,
}

impl CapabilityRequest {
    pub(crate) fn decode(node: &str, request: &pb::ExecutableRequest) -> Result<Self, StreamError> {
        let decode_error = |what: &str, e: serde_json::Error| StreamError::Decode {
            node: node.to_string(),
            reason: format!("can not decode {}: {}", what, e),
        };

        let config = decode_value_map(&request.config).map_err(|e| decode_error("config", e))?;
        let inputs = decode_value_map(&request.inputs).map_err(|e| decode_error("inputs", e))?;

        Ok(Self {
            node: node.to_string(),
            id: request.id.clone(),
            capability_type: request.capability_type().into(),
            metadata: request
                .request_metadata
                .clone()
                .map(RequestMetadata::from)
                .unwrap_or_default(),
            config,
            inputs,
        })
    }
}
