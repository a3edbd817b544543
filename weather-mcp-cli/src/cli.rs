use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Text;
use weather_mcp_core::Config;

use crate::{client::McpClient, render::ReportView};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Client for the weather MCP server")]
pub struct Cli {
    /// Base URL of the MCP server; overrides the config file.
    #[arg(long, global = true, env = "MCP_BASE_URL")]
    pub base_url: Option<String>,

    /// Log requests and responses to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the server base URL interactively and save it.
    Configure,

    /// Show current weather and a 3-day forecast for a city.
    Show {
        /// City name; prompted for when absent.
        city: Option<String>,

        /// Print the raw report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the tools exposed by the server.
    Tools,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => {
                let mut cfg = Config::load_file(&Config::config_file_path()?)?;

                let base_url = Text::new("MCP server base URL:")
                    .with_default(&cfg.client.base_url)
                    .prompt()
                    .context("Failed to read base URL")?;

                cfg.client.base_url = base_url.trim().to_string();
                let path = cfg.save()?;
                println!("Saved configuration to {}", path.display());
            }
            Command::Show { city, json } => {
                let city = match city {
                    Some(city) => city,
                    None => Text::new("City to look up:")
                        .prompt()
                        .context("Failed to read city name")?,
                };

                let client = McpClient::new(&resolve_base_url(self.base_url)?)?;
                let report = client.get_weather(&city).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", ReportView(&report));
                }
            }
            Command::Tools => {
                let client = McpClient::new(&resolve_base_url(self.base_url)?)?;

                for tool in client.list_tools().await? {
                    println!("{}: {}", tool.name, tool.description);
                    for (name, schema) in &tool.parameters {
                        let kind = schema["type"].as_str().unwrap_or("any");
                        let description = schema["description"].as_str().unwrap_or_default();
                        println!("  {name} ({kind}) {description}");
                    }
                }
            }
        }

        Ok(())
    }
}

/// Flag (or `MCP_BASE_URL`) wins over the config file, which wins over the default.
fn resolve_base_url(flag: Option<String>) -> anyhow::Result<String> {
    match flag {
        Some(url) if !url.trim().is_empty() => Ok(url),
        _ => Ok(Config::load()?.client.base_url),
    }
}
