//! Configuration resolution across defaults, file and environment

mod config_resolver;

pub use config_resolver::{ConfigResolver, ResolvedConfig};
