//! Data model shared across the core.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed embedding dimension used throughout the index (all-MiniLM-L6-v2 equivalent).
pub const EMBEDDING_DIMENSION: usize = 384;

/// A JSON-schema-shaped description of a tool's input object.
///
/// Unknown fields round-trip bit for bit: `additional_fields` absorbs anything
/// not explicitly modeled here, and `to_value`/`from_value` preserve it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonSchema {
    pub schema_type: String,
    pub properties: Option<BTreeMap<String, Value>>,
    pub required: Option<Vec<String>>,
    pub additional_properties: Option<bool>,
    pub description: Option<String>,
    pub items: Option<Value>,
    pub enum_values: Option<Vec<Value>>,
    pub default: Option<Value>,
    pub additional_fields: BTreeMap<String, Value>,
}

impl JsonSchema {
    const KNOWN_FIELDS: &'static [&'static str] = &[
        "type",
        "properties",
        "required",
        "additionalProperties",
        "description",
        "items",
        "enum",
        "default",
    ];

    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("type".into(), Value::String(self.schema_type.clone()));
        if let Some(props) = &self.properties {
            let obj: serde_json::Map<String, Value> = props.clone().into_iter().collect();
            map.insert("properties".into(), Value::Object(obj));
        }
        if let Some(required) = &self.required {
            map.insert(
                "required".into(),
                Value::Array(required.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(ap) = self.additional_properties {
            map.insert("additionalProperties".into(), Value::Bool(ap));
        }
        if let Some(desc) = &self.description {
            map.insert("description".into(), Value::String(desc.clone()));
        }
        if let Some(items) = &self.items {
            map.insert("items".into(), items.clone());
        }
        if let Some(enum_values) = &self.enum_values {
            map.insert("enum".into(), Value::Array(enum_values.clone()));
        }
        if let Some(default) = &self.default {
            map.insert("default".into(), default.clone());
        }
        for (k, v) in &self.additional_fields {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }

    pub fn from_value(value: &Value) -> Self {
        let obj = value.as_object();
        let get = |key: &str| obj.and_then(|o| o.get(key)).cloned();

        let schema_type = get("type")
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| "object".to_string());
        let properties = get("properties").and_then(|v| match v {
            Value::Object(map) => Some(map.into_iter().collect()),
            _ => None,
        });
        let required = get("required").and_then(|v| match v {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|i| i.as_str().map(String::from))
                    .collect(),
            ),
            _ => None,
        });
        let additional_properties = get("additionalProperties").and_then(|v| v.as_bool());
        let description = get("description").and_then(|v| v.as_str().map(String::from));
        let items = get("items");
        let enum_values = get("enum").and_then(|v| match v {
            Value::Array(items) => Some(items),
            _ => None,
        });
        let default = get("default");

        let additional_fields = obj
            .map(|o| {
                o.iter()
                    .filter(|(k, _)| !Self::KNOWN_FIELDS.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        JsonSchema {
            schema_type,
            properties,
            required,
            additional_properties,
            description,
            items,
            enum_values,
            default,
            additional_fields,
        }
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.properties
            .as_ref()
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Metadata for a tool discovered from an upstream MCP server.
#[derive(Debug, Clone)]
pub struct ToolMetadata {
    /// `"<prefix>.<original_name>"`, globally unique in the catalog.
    pub namespaced_name: String,
    pub original_name: String,
    pub description: String,
    pub input_schema: JsonSchema,
    pub upstream_id: String,
    pub category_description: Option<String>,
    /// Absent until the Embedding Index has scored this tool.
    pub embedding: Option<Vec<f32>>,
}

impl ToolMetadata {
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "name": self.namespaced_name,
            "description": self.description,
            "inputSchema": self.input_schema.to_value(),
        })
    }
}

/// One content item in a tool-call result (MCP wire shape).
///
/// `Resource` keeps its nested `resource` object opaque (a `TextResourceContents`
/// or `BlobResourceContents` per the MCP schema) so unknown fields round-trip
/// instead of being narrowed to a single `uri` string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Resource {
        resource: Value,
    },
}

/// Result of executing a tool against an upstream, returned verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ContentItem>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

/// A `(tool, similarity)` pair from a semantic search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub tool: ToolMetadata,
    pub similarity: f32,
}

/// MCP transport kind for an upstream. Only `Stdio` is connectable in this
/// design; `Sse`/`Http` are reserved and must fail connection cleanly.
#[derive(Debug, Clone, PartialEq)]
pub enum Transport {
    Stdio { command: String, args: Vec<String> },
    Sse { url: String },
    Http { url: String },
}

/// Per-upstream configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub transport: Transport,
    pub semantic_prefix: Option<String>,
    pub category_description: Option<String>,
    pub aliases: Vec<String>,
}

impl UpstreamConfig {
    /// The prefix under which this upstream's tools are namespaced: its
    /// `semantic_prefix` if configured, else the canonical id passed in.
    pub fn namespace_prefix<'a>(&'a self, canonical_id: &'a str) -> &'a str {
        self.semantic_prefix.as_deref().unwrap_or(canonical_id)
    }
}

/// Loading/runtime tuning knobs.
#[derive(Debug, Clone)]
pub struct LoadingConfig {
    pub auto_load: AutoLoad,
    pub lazy_load: bool,
    pub cache_embeddings: bool,
    pub connection_timeout_seconds: u64,
    pub max_concurrent_upstreams: usize,
    pub rate_limit: u32,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        LoadingConfig {
            auto_load: AutoLoad::All,
            lazy_load: true,
            cache_embeddings: true,
            connection_timeout_seconds: 30,
            max_concurrent_upstreams: 10,
            rate_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutoLoad {
    All,
    None,
    Named(Vec<String>),
}

/// The fully parsed and validated router configuration. Immutable for
/// the process lifetime once constructed.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub mcp_servers: BTreeMap<String, UpstreamConfig>,
    pub loading: LoadingConfig,
}
