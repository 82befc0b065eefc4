// * Configuration layer
// * Constants, the validated run configuration and the clap surface that builds it

pub mod cli;
pub mod constants;
pub mod settings;

pub use cli::{Cli, Verbosity};
pub use settings::{
    resolve_api_key, ConfigError, HarvestConfig, NsfwMode, OutputFormat, QueryOptions, Thresholds,
};
