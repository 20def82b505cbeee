//! Output formats.
//!
//! Formats are a closed set selected by name from the build configuration.
//! Rendering is a pure function of the token sequence: collections appear in
//! first-seen order and tokens keep their sequence order inside a collection.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError};
use crate::naming::camel_case;
use crate::transform::TransformedToken;

pub const PROLOGUE: &str = "/* Generated by friendly robots. */";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    /// `:root { --name : value; }` grouped by collection.
    #[serde(rename = "custom/css")]
    CustomCss,
}

impl Format {
    pub const ALL: &'static [Format] = &[Format::CustomCss];

    pub fn name(self) -> &'static str {
        match self {
            Format::CustomCss => "custom/css",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| TokenError::UnknownFormat(name.to_string()))
    }

    pub fn render(self, tokens: &[TransformedToken]) -> String {
        match self {
            Format::CustomCss => render_css(tokens),
        }
    }
}

/// Distinct collection names in first-seen order.
pub fn collections_in_order(tokens: &[TransformedToken]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for token in tokens {
        if !seen.contains(&token.collection.as_str()) {
            seen.push(&token.collection);
        }
    }
    seen
}

fn render_css(tokens: &[TransformedToken]) -> String {
    let sections: Vec<String> = collections_in_order(tokens)
        .into_iter()
        .map(|collection| {
            let lines: Vec<String> = tokens
                .iter()
                .filter(|t| t.collection == collection)
                .map(|t| format!("  --{} : {};", t.display_name, t.display_value))
                .collect();
            format!("  /* {} */\n{}\n", camel_case(collection), lines.join("\n"))
        })
        .collect();

    format!("{}\n\n:root {{\n{}}}\n", PROLOGUE, sections.join("\n"))
}
