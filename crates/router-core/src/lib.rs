//! Core coordination substrate for the semantic MCP tool router: the
//! Embedding Index, Upstream Connection state machine, Discovery Manager,
//! Tool-Call Proxy, and Router Facade.

pub mod alias;
pub mod catalog;
pub mod config;
pub mod default_subset;
pub mod discovery;
pub mod embedding_model;
pub mod error;
pub mod facade;
pub mod namespace;
pub mod proxy;
pub mod sanitize;
pub mod similarity;
pub mod types;
pub mod upstream;
pub mod validation;

pub use catalog::EmbeddingIndex;
pub use config::{load_config_file, parse_config};
pub use discovery::DiscoveryManager;
pub use embedding_model::EmbeddingModel;
pub use error::{RouterError, Result};
pub use facade::{RouterFacade, ToolDescriptor};
pub use proxy::ToolCallProxy;
pub use types::{
    AutoLoad, ContentItem, JsonSchema, LoadingConfig, RouterConfig, SearchResult, ToolCallResult,
    ToolMetadata, Transport, UpstreamConfig, EMBEDDING_DIMENSION,
};
