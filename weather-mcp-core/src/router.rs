//! Dispatches inbound envelopes to the `get_weather` tool.
//!
//! Every failure is answered in-band: the router always produces an
//! [`OutboundEnvelope`], never an error.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{
    error::RpcError,
    protocol::{
        self, InboundEnvelope, METHOD_CALL_TOOL, METHOD_INITIALIZE, METHOD_LIST_TOOLS,
        OutboundEnvelope, TOOL_GET_WEATHER, ToolCallParams, VersionEcho,
    },
    provider::WeatherLookup,
};

#[derive(Debug, Clone)]
pub struct McpRouter {
    lookup: Arc<dyn WeatherLookup>,
}

impl McpRouter {
    pub fn new(lookup: Arc<dyn WeatherLookup>) -> Self {
        Self { lookup }
    }

    /// Parse a raw request body and handle it. Unparsable bodies become error envelopes.
    pub async fn handle_bytes(&self, body: &[u8]) -> OutboundEnvelope {
        match serde_json::from_slice::<InboundEnvelope>(body) {
            Ok(envelope) => self.handle(envelope).await,
            Err(e) => {
                warn!(error = %e, "rejecting malformed request");
                let (version, id) = match serde_json::from_slice::<Value>(body) {
                    Ok(raw) => (VersionEcho::from_raw(&raw), raw.get("id").cloned()),
                    Err(_) => (VersionEcho::default(), None),
                };
                let message = RpcError::MalformedRequest(e.to_string()).to_string();
                OutboundEnvelope::failure(version, id, message)
            }
        }
    }

    pub async fn handle(&self, envelope: InboundEnvelope) -> OutboundEnvelope {
        let InboundEnvelope {
            version,
            method,
            params,
            id,
        } = envelope;

        match self.dispatch(&method, params).await {
            Ok(result) => OutboundEnvelope::success(version, id, result),
            Err(e) => OutboundEnvelope::failure(version, id, e.to_string()),
        }
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Option<ToolCallParams>,
    ) -> Result<Value, RpcError> {
        match method {
            METHOD_INITIALIZE => Ok(serde_json::to_value(protocol::server_info())?),
            METHOD_LIST_TOOLS => Ok(json!({ "tools": protocol::tools() })),
            METHOD_CALL_TOOL => self.call_tool(params.unwrap_or_default()).await,
            other => Err(RpcError::UnknownMethod(other.to_string())),
        }
    }

    /// The city is handed to the lookup exactly as sent; blank values count as missing.
    async fn call_tool(&self, params: ToolCallParams) -> Result<Value, RpcError> {
        if params.name != TOOL_GET_WEATHER {
            return Err(RpcError::UnknownTool(params.name));
        }

        let city = params
            .arguments
            .get("city")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .ok_or(RpcError::MissingArgument("city"))?;

        info!(city, "get_weather");

        let report = self
            .lookup
            .weather_for_city(city)
            .await
            .inspect_err(|e| warn!(city, error = %e, "weather lookup failed"))?;

        Ok(serde_json::to_value(report)?)
    }
}
