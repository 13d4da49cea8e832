//! MCP tool definitions for the CEP server

use serde_json::json;

use super::protocol::ToolDefinition;
use crate::handler::TOOL_NAME;

/// All tool definitions: (name, description, JSON input schema)
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[(
    TOOL_NAME,
    "Get address information from a Brazilian ZIP code (CEP). Accepts formats like 01310-100 or 01310100.",
    r#"{
        "type": "object",
        "properties": {
            "cep": {"type": "string", "description": "Brazilian ZIP code (CEP) with or without hyphen (e.g., 01310-100 or 01310100)"}
        },
        "required": ["cep"]
    }"#,
)];

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schemas_are_valid_json() {
        for (name, _, schema) in TOOL_DEFINITIONS {
            assert!(
                serde_json::from_str::<serde_json::Value>(schema).is_ok(),
                "invalid schema for {}",
                name
            );
        }
    }

    #[test]
    fn test_lookup_address_definition() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 1);

        let tool = &tools[0];
        assert_eq!(tool.name, "lookup_address");
        assert_eq!(tool.input_schema["required"], json!(["cep"]));
        assert_eq!(tool.input_schema["properties"]["cep"]["type"], "string");
    }
}
