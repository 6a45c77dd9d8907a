use anyhow::{anyhow, Context as _};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use crate::config::RouterConfig;
use crate::context::Context;
use crate::demo::demo_provider;
use crate::descriptor::Describable;
use crate::ids::RequestId;
use crate::logging::LogConfig;
use crate::pointer::parse_fields;
use crate::provider::RequestHandler;
use crate::request::{Operation, PatchOperation, Request};
use crate::router::new_handler_with_config;

/// Command-line interface for the resource router
#[derive(Parser, Debug)]
#[command(name = "resrouter")]
#[command(about = "Resource router demo CLI", long_about = None, version)]
pub struct Cli {
    /// Router configuration file (YAML). Defaults to RESRT_* environment variables.
    #[arg(short, long, global = true, env = "RESRT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose pretty logs with source locations instead of RESRT_LOG_* settings
    #[arg(long, global = true)]
    pub dev: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Logging configuration selected by the `--dev` flag
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        if self.dev {
            LogConfig::default_dev()
        } else {
            LogConfig::from_env()
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the route table in resolution order
    Routes,

    /// Print the API descriptor as JSON
    Describe {
        /// Only describe the sub-resource at this path (e.g. `users/roles`)
        #[arg(long)]
        path: Option<String>,
    },

    /// Execute a single request against the demo tree
    Request {
        /// Operation: create, read, update, delete, patch, action or query
        operation: Operation,

        /// Resource path, e.g. `users/ada`
        #[arg(default_value = "")]
        path: String,

        /// JSON body (for patch: an array of patch operations)
        #[arg(short, long)]
        body: Option<String>,

        /// Comma-separated field selectors, e.g. `name,address/city`
        #[arg(short, long)]
        fields: Option<String>,

        /// Action name (action requests only)
        #[arg(short, long)]
        action: Option<String>,

        /// Client-assigned id (create requests only)
        #[arg(long)]
        id: Option<String>,

        /// Expected revision (update, delete and patch requests only)
        #[arg(long)]
        rev: Option<String>,

        /// Page size (query requests only)
        #[arg(long)]
        page_size: Option<u32>,

        /// Additional parameters as `name=value`; may be repeated
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Request id to stamp into the context (ULID); generated if absent
        #[arg(long)]
        request_id: Option<String>,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

fn parse_body(body: Option<&str>) -> anyhow::Result<Value> {
    match body {
        Some(text) => serde_json::from_str(text).context("--body is not valid JSON"),
        None => Ok(Value::Object(serde_json::Map::new())),
    }
}

/// Build the request described by the `request` subcommand's arguments
#[allow(clippy::too_many_arguments)]
pub(crate) fn build_request(
    operation: Operation,
    path: &str,
    body: Option<&str>,
    fields: Option<&str>,
    action: Option<&str>,
    id: Option<&str>,
    rev: Option<&str>,
    page_size: Option<u32>,
) -> anyhow::Result<Request> {
    let mut request = match operation {
        Operation::Create => Request::create(path, parse_body(body)?),
        Operation::Read => Request::read(path),
        Operation::Update => Request::update(path, parse_body(body)?),
        Operation::Delete => Request::delete(path),
        Operation::Patch => {
            let operations: Vec<PatchOperation> = match body {
                Some(text) => serde_json::from_str(text)
                    .context("--body must be a JSON array of patch operations")?,
                None => Vec::new(),
            };
            Request::patch(path, operations)
        }
        Operation::Action => {
            let name = action.ok_or_else(|| anyhow!("action requests need --action"))?;
            Request::action(path, name).with_content(parse_body(body)?)
        }
        Operation::Query => Request::query(path),
    };
    if let Some(id) = id {
        request = request.with_new_resource_id(id);
    }
    if let Some(rev) = rev {
        request = request.with_revision(rev);
    }
    if let Some(size) = page_size {
        request = request.with_page_size(size);
    }
    if let Some(list) = fields {
        request = request.with_fields(parse_fields(list));
    }
    Ok(request)
}

/// Execute `cli` and return what should be printed to stdout.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the handler
/// tree cannot be built, the arguments are malformed or the request fails.
pub async fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = match &cli.config {
        Some(path) => RouterConfig::from_yaml_file(path)?,
        None => RouterConfig::from_env(),
    };
    let router = new_handler_with_config(demo_provider(), &config)
        .context("building the demo handler tree")?;

    match &cli.command {
        Commands::Routes => Ok(router.route_table().join("\n")),
        Commands::Describe { path } => {
            let api = router.api_descriptor();
            let rendered = match path {
                Some(path) => {
                    let node = api
                        .find(path)
                        .ok_or_else(|| anyhow!("no resource described at '{path}'"))?;
                    serde_json::to_string_pretty(node)?
                }
                None => serde_json::to_string_pretty(api.as_ref())?,
            };
            Ok(rendered)
        }
        Commands::Request {
            operation,
            path,
            body,
            fields,
            action,
            id,
            rev,
            page_size,
            params,
            request_id,
        } => {
            let mut request = build_request(
                *operation,
                path,
                body.as_deref(),
                fields.as_deref(),
                action.as_deref(),
                id.as_deref(),
                rev.as_deref(),
                *page_size,
            )?;
            for (name, value) in params {
                request = request.with_parameter(name, value);
            }
            let context = Context::with_request_id(RequestId::parse_or_new(request_id.as_deref()));
            let response = router.handle(context, request).await?;
            Ok(serde_json::to_string_pretty(&response.to_json())?)
        }
    }
}
