//! # Variable Document Model
//!
//! A variable document is one collection exported from the design tool:
//!
//! ```json
//! {
//!   "name": "Semantic",
//!   "modes": { "1:0": "Light", "1:1": "Dark" },
//!   "variables": [
//!     {
//!       "name": "Color/Primary",
//!       "resolvedValuesByMode": {
//!         "1:0": { "resolvedValue": { "r": 1, "g": 0, "b": 0 }, "aliasName": "Red/500" }
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Shape First**: `modes` must be an object and `variables` an array before
//!    any variable is looked at. Anything else is a structural error for the
//!    whole document.
//! 2. **Mode Order**: modes are kept in document order; flattening iterates them
//!    in that order.
//! 3. **Missing Values**: a variable with no (or a `null`) resolved value for a
//!    mode is not an error. It simply contributes nothing for that mode.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::color::Rgb;
use crate::error::{Result, TokenError};

/// A resolved variable value as exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Color(Rgb),
    Number(f64),
    Bool(bool),
    Text(String),
}

impl TokenValue {
    pub fn as_color(&self) -> Option<&Rgb> {
        match self {
            TokenValue::Color(rgb) => Some(rgb),
            _ => None,
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Color(rgb) => write!(f, "{}", rgb.to_hex()),
            TokenValue::Number(n) => f.write_str(&number_to_string(*n)),
            TokenValue::Bool(b) => write!(f, "{}", b),
            TokenValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Numbers print the way the export tool's own scripts print them: plain
/// decimals for `1e-6 <= |n| < 1e21`, exponent form with an explicit sign
/// outside that range (`1e+21`, `1.5e-7`).
fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return n.to_string();
    }

    let exponent_form = format!("{:e}", n);
    match exponent_form.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => exponent_form,
    }
}

impl From<f64> for TokenValue {
    fn from(value: f64) -> Self {
        TokenValue::Number(value)
    }
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        TokenValue::Text(value.to_string())
    }
}

impl From<Rgb> for TokenValue {
    fn from(value: Rgb) -> Self {
        TokenValue::Color(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeValue {
    #[serde(default)]
    pub resolved_value: Option<TokenValue>,
    #[serde(default)]
    pub alias_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariable {
    pub name: String,
    #[serde(default)]
    pub resolved_values_by_mode: HashMap<String, ModeValue>,
}

impl RawVariable {
    /// The value for `mode`, if the export defines a non-null one.
    pub fn value_for(&self, mode: &str) -> Option<(&TokenValue, Option<&str>)> {
        let entry = self.resolved_values_by_mode.get(mode)?;
        let value = entry.resolved_value.as_ref()?;
        Some((value, entry.alias_name.as_deref()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(default)]
    pub name: String,
    pub modes: IndexMap<String, String>,
    pub variables: Vec<RawVariable>,
}

impl RawDocument {
    /// Parse a document, failing fast on anything that is not the minimal
    /// collection shape. `source_path` is only used for diagnostics.
    pub fn parse(contents: &str, source_path: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(contents).map_err(|source| TokenError::Json {
                path: source_path.to_string(),
                source,
            })?;

        Self::from_value(value, source_path)
    }

    pub fn from_value(value: serde_json::Value, source_path: &str) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| TokenError::structural(source_path, "document is not a JSON object"))?;

        match object.get("modes") {
            Some(serde_json::Value::Object(_)) => {}
            Some(_) => return Err(TokenError::structural(source_path, "`modes` is not an object")),
            None => return Err(TokenError::structural(source_path, "missing `modes`")),
        }
        match object.get("variables") {
            Some(serde_json::Value::Array(_)) => {}
            Some(_) => {
                return Err(TokenError::structural(
                    source_path,
                    "`variables` is not an array",
                ))
            }
            None => return Err(TokenError::structural(source_path, "missing `variables`")),
        }

        serde_json::from_value(value).map_err(|e| TokenError::structural(source_path, e.to_string()))
    }
}
