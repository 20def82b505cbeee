//! # Design Token Compiler
//!
//! Turns design-tool variable exports into CSS custom properties.
//!
//! ## Pipeline
//!
//! 1. **Parse**: each export is one collection with its modes and variables
//!    ([`RawDocument`]). Malformed shapes fail before flattening starts.
//! 2. **Flatten**: every (mode, variable) pair becomes a [`FlatToken`] keyed by
//!    `kebab(collection-mode-variable)`. Documents merge in source order and a
//!    colliding key keeps the last value.
//! 3. **Transform**: name rules, then value rules, each in registration order
//!    ([`TransformRule`]). Matchers only ever see the original token. One
//!    failing rule fails the build.
//! 4. **Render**: a named [`Format`] groups tokens by collection in first-seen
//!    order.
//!
//! Rules and formats are plain values handed to each build; there is no
//! process-wide registry.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod builder;
mod cache;
mod color;
mod config;
mod discovery;
mod document;
mod error;
mod flatten;
mod format;
mod naming;
mod transform;


pub use builder::{build_outputs, build_platform, flatten_sources, write_outputs, Builder, RenderedOutput, SourceDocument};
pub use cache::IncrementalCache;
pub use color::{to_hex, Rgb};
pub use config::{BuildConfig, FileConfig, PlatformConfig};
pub use discovery::discover_sources;
pub use document::{ModeValue, RawDocument, RawVariable, TokenValue};
pub use error::{Result, TokenError};
pub use flatten::{flatten, merge_into, FlatToken, TokenMap};
pub use format::Format;
pub use naming::{camel_case, kebab_case};
pub use transform::{
    builtin_rules, transform, transform_token, CollectionKind, RuleInput, RuleKind,
    TransformRegistry, TransformRule, TransformedToken, DEFAULT_GROUP,
};

// ═══════════════════════════════════════════════════════════════════════════════
// NODE BRIDGE
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi(object)]
pub struct SourceFile {
    pub path: String,
    pub contents: String,
}

#[cfg(feature = "napi")]
#[napi(object)]
pub struct RenderedFile {
    pub platform: String,
    pub path: String,
    pub contents: String,
}

/// Run the in-memory pipeline for a JSON build config and already-read sources.
#[cfg(feature = "napi")]
#[napi]
pub fn build_tokens_native(
    config_json: String,
    sources: Vec<SourceFile>,
) -> napi::Result<Vec<RenderedFile>> {
    let config = BuildConfig::from_json(&config_json)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let sources: Vec<SourceDocument> = sources
        .into_iter()
        .map(|s| SourceDocument {
            path: s.path,
            contents: s.contents,
        })
        .collect();

    let outputs = build_outputs(&config, &sources, &TransformRegistry::builtin(), None)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;

    Ok(outputs
        .into_iter()
        .map(|o| RenderedFile {
            platform: o.platform,
            path: o.path.to_string_lossy().to_string(),
            contents: o.contents,
        })
        .collect())
}
