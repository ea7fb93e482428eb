pub mod schema;

pub use schema::{
    credential_from_env, Config, ObservabilityConfig, ProviderConfig, RevealConfig,
    SessionConfig,
};
