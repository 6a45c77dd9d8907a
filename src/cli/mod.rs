//! # CLI Module
//!
//! Command-line access to the demo handler tree, for poking at routing,
//! filtering and descriptors without writing a transport.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the route table in resolution order:
//!
//! ```bash
//! resrouter routes
//! ```
//!
//! ### `describe`
//!
//! Print the API descriptor as JSON, optionally only the sub-tree at a path:
//!
//! ```bash
//! resrouter describe
//! resrouter describe --path users/roles
//! ```
//!
//! ### `request`
//!
//! Execute one request and print the JSON response:
//!
//! ```bash
//! resrouter request read users/ada --fields name
//! resrouter request create users --id grace --body '{"name": "Grace Hopper"}'
//! resrouter request patch settings \
//!     --body '[{"operation": "replace", "field": "theme", "value": "light"}]'
//! resrouter request action users --action count
//! resrouter request query users --page-size 1
//! ```
//!
//! ## Configuration
//!
//! `--config <FILE>` loads a YAML [`RouterConfig`](crate::config::RouterConfig);
//! without it the `RESRT_*` environment variables apply. Logging is
//! configured through `RESRT_LOG_*` (see [`crate::logging`]).

mod commands;


pub use commands::{run, Cli, Commands};
