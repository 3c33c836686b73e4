//! getarg - startup argument store with typed lookups.
//!
//! This library turns a raw argument vector into a queryable store of
//! flags. `--foo` is read as `-foo`, `-nofoo` negates `-foo` unless `-foo`
//! is given explicitly, and values are coerced to bool, string or integer
//! only when looked up. The export half renders selected keys as shell
//! export statements driven by a JSON configuration.

pub mod config;
pub mod output;
pub mod store;
pub mod token;

pub use config::{Config, ConfigError, KeyConfig, ValueType};
pub use output::{generate_output, generate_output_string, resolve_exports};
pub use store::{ArgStore, Snapshot};
pub use token::{normalize, Entry};
