//! Flattening of mode-indexed variable documents into uniquely keyed tokens.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{RawDocument, TokenValue};
use crate::naming::kebab_case;

/// Flattened tokens keyed by [`FlatToken::key`], in first-insertion order.
pub type TokenMap = IndexMap<String, FlatToken>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatToken {
    pub key: String,
    pub collection: String,
    pub mode: String,
    pub source_path: String,
    pub raw_value: TokenValue,
    /// Normalized alias target, empty when the value is not an alias.
    #[serde(default)]
    pub alias: String,
}

impl FlatToken {
    pub fn new(collection: &str, mode: &str, name: &str, raw_value: TokenValue) -> Self {
        let collection = kebab_case(collection);
        let mode = kebab_case(mode);
        FlatToken {
            key: kebab_case(&format!("{}-{}-{}", collection, mode, name)),
            collection,
            mode,
            source_path: String::new(),
            raw_value,
            alias: String::new(),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = kebab_case(alias);
        self
    }

    pub fn with_source(mut self, source_path: &str) -> Self {
        self.source_path = source_path.to_string();
        self
    }
}

/// Flatten one document. Modes form the outer loop and variables the inner
/// one; with colliding keys the last (mode, variable) pair visited wins.
pub fn flatten(document: &RawDocument, source_path: &str) -> TokenMap {
    let mut tokens = TokenMap::new();

    for (mode_id, mode_name) in &document.modes {
        for variable in &document.variables {
            let Some((value, alias)) = variable.value_for(mode_id) else {
                tracing::trace!(
                    variable = %variable.name,
                    mode = %mode_name,
                    source = source_path,
                    "no resolved value, skipping"
                );
                continue;
            };

            let token = FlatToken::new(&document.name, mode_name, &variable.name, value.clone())
                .with_alias(alias.unwrap_or_default())
                .with_source(source_path);
            insert(&mut tokens, token);
        }
    }

    tokens
}

/// Merge `incoming` into `merged`. Later documents overwrite earlier keys.
pub fn merge_into(merged: &mut TokenMap, incoming: TokenMap) {
    for (_, token) in incoming {
        insert(merged, token);
    }
}

fn insert(tokens: &mut TokenMap, token: FlatToken) {
    if let Some(previous) = tokens.insert(token.key.clone(), token) {
        tracing::debug!(
            key = %previous.key,
            overwritten_source = %previous.source_path,
            "token key collision, keeping the later value"
        );
    }
}
