pub mod builder;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod extract;
pub mod graph;
pub mod prompt;
pub mod repo;
pub mod resolver;
pub mod tokens;
pub mod workflow;

pub use config::Config;
pub use graph::DependencyGraph;
