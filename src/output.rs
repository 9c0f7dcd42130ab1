//! Structured output writer supporting JSON Lines and human-readable modes.

use capctl_connect::{CapInfosByNode, CapabilityRequest, TriggerResponse, ValueMap};
use serde::Serialize;
use std::collections::BTreeMap;

/// Output mode for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Structured operation result for JSON output
#[derive(Debug, Serialize)]
pub struct OperationResult {
    pub operation: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One received trigger event, flattened for printing
#[derive(Debug, Serialize)]
struct TriggerLine<'a> {
    node: &'a str,
    trigger_type: &'a str,
    id: &'a str,
    outputs: &'a ValueMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Structured output writer that supports both human-readable and JSON output
#[derive(Debug, Clone)]
pub struct OutputWriter {
    pub mode: OutputMode,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            mode: if json { OutputMode::Json } else { OutputMode::Human },
        }
    }

    /// Print an operation result
    pub fn operation_result(&self, result: &OperationResult) {
        match self.mode {
            OutputMode::Json => print_json(result),
            OutputMode::Human => {
                if result.success {
                    match &result.target {
                        Some(target) => println!("{}: {} ok", result.operation, target),
                        None => println!("{}: ok", result.operation),
                    }
                } else if let Some(err) = &result.error {
                    eprintln!("{}: {}", result.operation, sanitize_error(err));
                }
            }
        }
    }

    /// Print the capability inventory of every node
    pub fn inventory(&self, inventory: &[CapInfosByNode]) {
        match self.mode {
            OutputMode::Json => print_json(&inventory),
            OutputMode::Human => print!("{}", render_inventory(inventory)),
        }
    }

    /// Print whether a capability is present fleet-wide
    pub fn presence(&self, capability_id: &str, present: bool) {
        match self.mode {
            OutputMode::Json => print_json(&serde_json::json!({
                "capability": capability_id,
                "present_on_all": present,
            })),
            OutputMode::Human => println!("{}: {}", capability_id, present),
        }
    }

    /// Print subscriber workflow IDs per node
    pub fn subscribers(&self, trigger_id: &str, subscribers: &BTreeMap<String, Vec<String>>) {
        match self.mode {
            OutputMode::Json => print_json(&serde_json::json!({
                "trigger_id": trigger_id,
                "subscribers": subscribers,
            })),
            OutputMode::Human => print!("{}", render_subscribers(subscribers)),
        }
    }

    /// Print one item of a node's trigger queue
    pub fn trigger_response(&self, node: &str, response: &TriggerResponse) {
        let line = TriggerLine {
            node,
            trigger_type: &response.event.trigger_type,
            id: &response.event.id,
            outputs: &response.event.outputs,
            error: response.err.as_ref().map(|e| sanitize_error(&e.to_string())),
        };
        match self.mode {
            OutputMode::Json => print_json(&line),
            OutputMode::Human => match &line.error {
                Some(err) => eprintln!("[{}] error: {}", node, err),
                None => println!("{}", render_event(&line)),
            },
        }
    }

    /// Print one execution request received over a hook
    pub fn capability_request(&self, request: &CapabilityRequest) {
        match self.mode {
            OutputMode::Json => print_json(request),
            OutputMode::Human => println!(
                "[{}] {} workflow={} execution={} inputs={}",
                request.node,
                request.id,
                request.metadata.workflow_id,
                request.metadata.workflow_execution_id,
                serde_json::to_string(&request.inputs).unwrap_or_default(),
            ),
        }
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", self.error_line(msg));
    }

    fn error_line(&self, msg: &str) -> String {
        match self.mode {
            OutputMode::Json => {
                let result = OperationResult {
                    operation: "error".to_string(),
                    success: false,
                    target: None,
                    error: Some(sanitize_error(msg)),
                };
                serde_json::to_string(&result).unwrap_or_default()
            }
            OutputMode::Human => format!("Error: {}", sanitize_error(msg)),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        println!("{}", json);
    }
}

fn render_inventory(inventory: &[CapInfosByNode]) -> String {
    let mut out = String::new();
    for node in inventory {
        out.push_str(&format!("{} ({} capabilities)\n", node.node, node.capabilities.len()));
        for cap in &node.capabilities {
            out.push_str(&format!(
                "  {:<40} {:<10} {:<6} {}\n",
                cap.id,
                cap.capability_type,
                if cap.is_local { "local" } else { "remote" },
                cap.description
            ));
        }
    }
    out
}

fn render_subscribers(subscribers: &BTreeMap<String, Vec<String>>) -> String {
    let mut out = String::new();
    for (node, workflow_ids) in subscribers {
        if workflow_ids.is_empty() {
            out.push_str(&format!("{}: (none)\n", node));
        } else {
            out.push_str(&format!("{}: {}\n", node, workflow_ids.join(", ")));
        }
    }
    out
}

fn render_event(line: &TriggerLine<'_>) -> String {
    let outputs = serde_json::to_string(line.outputs).unwrap_or_default();
    format!("[{}] {} {} {}", line.node, line.trigger_type, line.id, outputs)
}

/// Sanitize error messages by collapsing whitespace
pub fn sanitize_error(msg: &str) -> String {
    msg.split_whitespace().collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use capctl_connect::{CapabilityInfo, CapabilityType};

    #[test]
    fn test_sanitize_error_mixed() {
        assert_eq!(
            sanitize_error("  error:\n  detail\t  info \r\n"),
            "error: detail info"
        );
        assert_eq!(sanitize_error(" \n \t \r "), "");
    }

    #[test]
    fn test_output_writer_mode_switch() {
        assert_eq!(OutputWriter::new(true).mode, OutputMode::Json);
        assert_eq!(OutputWriter::new(false).mode, OutputMode::Human);
    }

    #[test]
    fn test_error_line_per_mode() {
        let msg = "Failed to connect:\n  node-1 refused";

        let line = OutputWriter::new(true).error_line(msg);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["operation"], "error");
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Failed to connect: node-1 refused");
        assert!(value.get("target").is_none());

        assert_eq!(
            OutputWriter::new(false).error_line(msg),
            "Error: Failed to connect: node-1 refused"
        );
    }

    #[test]
    fn test_operation_result_skips_empty_fields() {
        let result = OperationResult {
            operation: "delete".to_string(),
            success: true,
            target: Some("write@1.0.0".to_string()),
            error: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"target\":\"write@1.0.0\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_render_inventory() {
        let inventory = vec![
            CapInfosByNode {
                node: "10.0.0.5:7777".to_string(),
                capabilities: vec![CapabilityInfo {
                    id: "cron-trigger@1.0.0".to_string(),
                    capability_type: CapabilityType::Trigger,
                    description: "cron".to_string(),
                    is_local: true,
                }],
            },
            CapInfosByNode {
                node: "10.0.0.6:7777".to_string(),
                capabilities: Vec::new(),
            },
        ];

        let text = render_inventory(&inventory);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "10.0.0.5:7777 (1 capabilities)");
        assert!(lines[1].contains("cron-trigger@1.0.0"));
        assert!(lines[1].contains("trigger"));
        assert!(lines[1].contains("local"));
        assert_eq!(lines[2], "10.0.0.6:7777 (0 capabilities)");
    }

    #[test]
    fn test_render_subscribers() {
        let mut subscribers = BTreeMap::new();
        subscribers.insert("a:1".to_string(), vec!["wf-1".to_string(), "wf-2".to_string()]);
        subscribers.insert("b:1".to_string(), Vec::new());

        assert_eq!(render_subscribers(&subscribers), "a:1: wf-1, wf-2\nb:1: (none)\n");
    }

    #[test]
    fn test_trigger_line_json() {
        let mut outputs = ValueMap::new();
        outputs.insert("n".to_string(), serde_json::json!(3));
        let line = TriggerLine {
            node: "a:1",
            trigger_type: "cron-trigger@1.0.0",
            id: "evt-1",
            outputs: &outputs,
            error: None,
        };

        let parsed: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&line).unwrap()).unwrap();
        assert_eq!(parsed["outputs"]["n"], 3);
        assert!(parsed.get("error").is_none());
        assert_eq!(render_event(&line), r#"[a:1] cron-trigger@1.0.0 evt-1 {"n":3}"#);
    }
}
