//! JSON-RPC flavored envelopes spoken on `POST /mcp`, and the static
//! server/tool description served on `GET /`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const SERVER_NAME: &str = "Weather MCP Server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVER_DESCRIPTION: &str =
    "MCP server providing weather information backed by the Open-Meteo API";

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_LIST_TOOLS: &str = "list_tools";
pub const METHOD_CALL_TOOL: &str = "call_tool";

pub const TOOL_GET_WEATHER: &str = "get_weather";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Protocol version as sent by the caller, under whichever key it used.
/// Replies echo it back under the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEcho {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(
        default,
        rename = "protocolVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub protocol_version: Option<String>,
}

impl VersionEcho {
    pub fn jsonrpc(version: impl Into<String>) -> Self {
        Self {
            jsonrpc: Some(version.into()),
            protocol_version: None,
        }
    }

    /// Best-effort recovery from a body that is JSON but not a valid envelope.
    pub fn from_raw(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            jsonrpc: field("jsonrpc"),
            protocol_version: field("protocolVersion"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    #[serde(flatten)]
    pub version: VersionEcho,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ToolCallParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl InboundEnvelope {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            version: VersionEcho::jsonrpc("2.0"),
            method: method.into(),
            params: None,
            id: None,
        }
    }

    /// `call_tool` request for `get_weather`.
    pub fn get_weather(city: &str) -> Self {
        let mut arguments = Map::new();
        arguments.insert("city".to_string(), Value::String(city.to_string()));

        Self {
            params: Some(ToolCallParams {
                name: TOOL_GET_WEATHER.to_string(),
                arguments,
            }),
            ..Self::new(METHOD_CALL_TOOL)
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Reply to an [`InboundEnvelope`]. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    #[serde(flatten)]
    pub version: VersionEcho,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl OutboundEnvelope {
    pub fn success(version: VersionEcho, id: Option<Value>, result: Value) -> Self {
        Self {
            version,
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(version: VersionEcho, id: Option<Value>, error: impl Into<String>) -> Self {
        Self {
            version,
            result: None,
            error: Some(error.into()),
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(flatten)]
    pub server: ServerInfo,
    pub tools: Vec<ToolDescriptor>,
}

pub fn server_info() -> ServerInfo {
    ServerInfo {
        name: SERVER_NAME.to_string(),
        version: SERVER_VERSION.to_string(),
        description: SERVER_DESCRIPTION.to_string(),
    }
}

pub fn tools() -> Vec<ToolDescriptor> {
    let mut parameters = Map::new();
    parameters.insert(
        "city".to_string(),
        json!({
            "type": "string",
            "description": "City to look up (e.g. Tokyo, New York)",
        }),
    );

    vec![ToolDescriptor {
        name: TOOL_GET_WEATHER.to_string(),
        description: "Get the current weather and a 3-day forecast for a city".to_string(),
        parameters,
    }]
}

pub fn capabilities() -> Capabilities {
    Capabilities {
        server: server_info(),
        tools: tools(),
    }
}
