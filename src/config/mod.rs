//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! runner.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (SEPOLIA_RPC_URL / CONSUMER_ADDRESS / SUBSCRIPTION_ID overrides)
//!     → CLI flag overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → RunnerConfig (validated, immutable for the run)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - The signing key is never read from the file, only from `PRIVATE_KEY`
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ConsumerConfig, FeeConfig, ObservabilityConfig, RpcConfig, RunnerConfig, WorkflowConfig,
};
pub use validation::{validate_config, ValidationError};
