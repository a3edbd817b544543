use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use weather_mcp_core::{
    InboundEnvelope, OutboundEnvelope, WeatherReport,
    protocol::{METHOD_LIST_TOOLS, ToolDescriptor},
};

/// Thin client for the server's `/mcp` endpoint.
#[derive(Debug, Clone)]
pub struct McpClient {
    endpoint: String,
    http: Client,
}

impl McpClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: format!("{}/mcp", base_url.trim_end_matches('/')),
            http,
        })
    }

    pub async fn get_weather(&self, city: &str) -> Result<WeatherReport> {
        let result = self.call(InboundEnvelope::get_weather(city).with_id(1)).await?;
        serde_json::from_value(result).context("Server returned an unexpected weather report")
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut result = self.call(InboundEnvelope::new(METHOD_LIST_TOOLS).with_id(1)).await?;
        let tools = result
            .get_mut("tools")
            .map(Value::take)
            .ok_or_else(|| anyhow!("Server response is missing the tool list"))?;
        serde_json::from_value(tools).context("Server returned an unexpected tool list")
    }

    /// Send one envelope and unwrap its result; an in-band error becomes `Err`.
    async fn call(&self, envelope: InboundEnvelope) -> Result<Value> {
        debug!(endpoint = %self.endpoint, method = %envelope.method, "sending request");

        let res = self
            .http
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .with_context(|| format!("Failed to reach MCP server at {}", self.endpoint))?;

        let status = res.status();
        if !status.is_success() {
            bail!("MCP server at {} returned status {status}", self.endpoint);
        }

        let reply: OutboundEnvelope = res
            .json()
            .await
            .context("Failed to parse MCP server response")?;

        debug!(id = ?reply.id, has_result = reply.result.is_some(), "received response");

        match (reply.result, reply.error) {
            (_, Some(error)) => Err(anyhow!(error)),
            (Some(result), None) => Ok(result),
            (None, None) => bail!("MCP server response carried neither result nor error"),
        }
    }
}
