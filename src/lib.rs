pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logger;
pub mod models;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;

pub use auth::{MetadataTokenSource, StaticTokenSource, TokenSource};
pub use config::{GatewayConfig, GeminiConfig, ProviderKind, ResponseFormat, VertexConfig};
pub use error::{ErrorBody, ErrorKind, GatewayError, Result};
pub use gateway::{GatewayResponse, ImageGateway};
pub use models::*;
pub use providers::{
    Credential, GeminiProvider, ImageProvider, ImagenProvider, VertexGeminiProvider,
};
