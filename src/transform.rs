use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, TokenError};
use crate::flatten::FlatToken;

// ═══════════════════════════════════════════════════════════════════════════════
// RULE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Which working field a rule rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Name,
    Value,
}

/// What a transformer sees: the untouched token plus the working name and
/// value produced by the rules that ran before it.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub token: &'a FlatToken,
    pub name: &'a str,
    pub value: &'a str,
}

pub type Matcher = Arc<dyn Fn(&FlatToken) -> bool + Send + Sync>;
pub type Transformer = Arc<dyn Fn(&RuleInput<'_>) -> std::result::Result<String, String> + Send + Sync>;

#[derive(Clone)]
pub struct TransformRule {
    pub name: String,
    pub kind: RuleKind,
    matcher: Option<Matcher>,
    transformer: Transformer,
}

impl TransformRule {
    pub fn new<F>(name: &str, kind: RuleKind, transformer: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        TransformRule {
            name: name.to_string(),
            kind,
            matcher: None,
            transformer: Arc::new(transformer),
        }
    }

    /// Restrict the rule to tokens matching `matcher`. The matcher only ever
    /// sees the original token, never the working name or value.
    pub fn when<M>(mut self, matcher: M) -> Self
    where
        M: Fn(&FlatToken) -> bool + Send + Sync + 'static,
    {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    pub fn applies_to(&self, token: &FlatToken) -> bool {
        self.matcher.as_ref().map_or(true, |m| m(token))
    }

    fn apply(&self, input: &RuleInput<'_>) -> Result<String> {
        (self.transformer)(input).map_err(|message| TokenError::RuleExecution {
            rule: self.name.clone(),
            token: input.token.key.clone(),
            message,
        })
    }
}

impl fmt::Debug for TransformRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("conditional", &self.matcher.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedToken {
    pub key: String,
    pub collection: String,
    pub mode: String,
    pub source_path: String,
    pub display_name: String,
    pub display_value: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Run `rules` over every token. Name rules run first, then value rules, each
/// in registration order. The first failing rule aborts the whole run.
pub fn transform(tokens: &[FlatToken], rules: &[TransformRule]) -> Result<Vec<TransformedToken>> {
    tokens
        .iter()
        .map(|token| transform_token(token, rules))
        .collect()
}

pub fn transform_token(token: &FlatToken, rules: &[TransformRule]) -> Result<TransformedToken> {
    let mut name = token.key.clone();
    let mut value = token.raw_value.to_string();

    for rule in rules.iter().filter(|r| r.kind == RuleKind::Name) {
        if rule.applies_to(token) {
            name = rule.apply(&RuleInput {
                token,
                name: &name,
                value: &value,
            })?;
        }
    }

    for rule in rules.iter().filter(|r| r.kind == RuleKind::Value) {
        if rule.applies_to(token) {
            value = rule.apply(&RuleInput {
                token,
                name: &name,
                value: &value,
            })?;
        }
    }

    Ok(TransformedToken {
        key: token.key.clone(),
        collection: token.collection.clone(),
        mode: token.mode.clone(),
        source_path: token.source_path.clone(),
        display_name: name,
        display_value: value,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLECTION KINDS
// ═══════════════════════════════════════════════════════════════════════════════

/// The collections whose values get a dedicated rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Semantic,
    Foundation,
    Size,
    Typography,
    Other,
}

impl CollectionKind {
    pub fn of(collection: &str) -> Self {
        match collection {
            "semantic" => CollectionKind::Semantic,
            "foundation" => CollectionKind::Foundation,
            "size" => CollectionKind::Size,
            c if c.contains("typography") => CollectionKind::Typography,
            _ => CollectionKind::Other,
        }
    }

    /// Render a value for this kind, or `None` when the kind leaves values alone.
    pub fn render(self, input: &RuleInput<'_>) -> Option<String> {
        let token = input.token;
        match self {
            // an empty alias still renders as `var(--, fallback)`
            CollectionKind::Semantic => {
                Some(format!("var(--{}, {})", token.alias, token.raw_value))
            }
            CollectionKind::Foundation => Some(
                token
                    .raw_value
                    .as_color()
                    .map(|rgb| rgb.to_hex())
                    .unwrap_or_else(|| input.value.to_string()),
            ),
            CollectionKind::Size => Some(format!("{}px", token.raw_value)),
            CollectionKind::Typography | CollectionKind::Other => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILT-IN RULES
// ═══════════════════════════════════════════════════════════════════════════════

pub const STRIP_PREFIXES: &str = "name/strip-prefixes";
pub const PX_SUFFIX: &str = "value/px";
pub const REM_SUFFIX: &str = "value/rem";
pub const COLLECTION_VALUE: &str = "value/collection";

pub const DEFAULT_GROUP: &str = "custom/group";

const STRUCTURAL_PREFIXES: &[&str] = &["mode-1-", "typography-", "effects-"];
const PX_COLLECTIONS: &[&str] = &["size", "breakpoint", "border", "space"];

/// The built-in rules in registration order.
pub fn builtin_rules() -> Vec<TransformRule> {
    vec![
        TransformRule::new(STRIP_PREFIXES, RuleKind::Name, |input| {
            Ok(STRUCTURAL_PREFIXES
                .iter()
                .fold(input.name.to_string(), |name, prefix| name.replacen(prefix, "", 1)))
        }),
        TransformRule::new(PX_SUFFIX, RuleKind::Value, |input| {
            Ok(format!("{}px", input.value))
        })
        .when(|token| PX_COLLECTIONS.iter().any(|c| token.collection.contains(c))),
        TransformRule::new(REM_SUFFIX, RuleKind::Value, |input| {
            if input.name.contains("font-size-") {
                Ok(format!("{}rem", input.value))
            } else {
                Ok(input.value.to_string())
            }
        })
        .when(|token| CollectionKind::of(&token.collection) == CollectionKind::Typography),
        // Size overlaps with value/px; rendering from the raw value means the
        // later rule wins instead of stacking a second suffix.
        TransformRule::new(COLLECTION_VALUE, RuleKind::Value, |input| {
            Ok(CollectionKind::of(&input.token.collection)
                .render(input)
                .unwrap_or_else(|| input.value.to_string()))
        })
        .when(|token| {
            matches!(
                CollectionKind::of(&token.collection),
                CollectionKind::Semantic | CollectionKind::Foundation | CollectionKind::Size
            )
        }),
    ]
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Rules by name plus named, ordered groups of rule names.
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    rules: IndexMap<String, TransformRule>,
    groups: IndexMap<String, Vec<String>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding [`builtin_rules`] and the `custom/group` group.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let mut names = Vec::new();
        for rule in builtin_rules() {
            names.push(rule.name.clone());
            registry.register(rule);
        }
        registry.register_group(DEFAULT_GROUP, names);
        registry
    }

    /// Register a rule. A rule with the same name is replaced.
    pub fn register(&mut self, rule: TransformRule) -> &mut Self {
        self.rules.insert(rule.name.clone(), rule);
        self
    }

    pub fn register_group<S: Into<String>>(&mut self, name: &str, rules: Vec<S>) -> &mut Self {
        self.groups
            .insert(name.to_string(), rules.into_iter().map(Into::into).collect());
        self
    }

    pub fn rule(&self, name: &str) -> Option<&TransformRule> {
        self.rules.get(name)
    }

    /// The rules of `group`, in the order the group lists them.
    pub fn resolve_group(&self, group: &str) -> Result<Vec<TransformRule>> {
        let names = self
            .groups
            .get(group)
            .ok_or_else(|| TokenError::UnknownTransformGroup(group.to_string()))?;

        names
            .iter()
            .map(|name| {
                self.rules
                    .get(name)
                    .cloned()
                    .ok_or_else(|| TokenError::UnknownTransform {
                        group: group.to_string(),
                        transform: name.clone(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::document::TokenValue;

    fn run(token: FlatToken) -> TransformedToken {
        transform_token(&token, &builtin_rules()).unwrap()
    }

    #[test]
    fn test_strip_structural_prefixes() {
        let token = FlatToken::new("Typography", "Mode 1", "Font Size/16", TokenValue::from(1.0));
        assert_eq!(token.key, "typography-mode-1-font-size-16");
        assert_eq!(run(token).display_name, "font-size-16");

        let token = FlatToken::new("Effects", "Mode 1", "Shadow/Large", TokenValue::from("0 1px"));
        assert_eq!(run(token).display_name, "shadow-large");

        // only the first occurrence goes
        let token = FlatToken::new("Size", "Mode 1", "mode 1 gap", TokenValue::from(4.0));
        assert_eq!(run(token).display_name, "size-mode-1-gap");
    }

    #[test]
    fn test_size_collection_gets_single_px() {
        let token = FlatToken::new("size", "Mode 1", "gap", TokenValue::from(16.0));
        assert_eq!(run(token).display_value, "16px");
    }

    #[test]
    fn test_px_substring_collections() {
        for collection in ["Breakpoints", "Border Radius", "Spacer Space", "Icon Size"] {
            let token = FlatToken::new(collection, "Mode 1", "x", TokenValue::from(8.0));
            assert_eq!(run(token).display_value, "8px", "collection {}", collection);
        }
        let token = FlatToken::new("Opacity", "Mode 1", "x", TokenValue::from(0.5));
        assert_eq!(run(token).display_value, "0.5");
    }

    #[test]
    fn test_typography_rem_only_for_font_sizes() {
        let size = FlatToken::new("Typography", "Mode 1", "Font Size/Body", TokenValue::from(1.25));
        assert_eq!(run(size).display_value, "1.25rem");

        let family = FlatToken::new("Typography", "Mode 1", "Font Family", TokenValue::from("Inter"));
        assert_eq!(run(family).display_value, "Inter");
    }

    #[test]
    fn test_semantic_alias_reference() {
        let token = FlatToken::new(
            "semantic",
            "Light",
            "Button/Background",
            TokenValue::Color(Rgb::new(1.0, 0.0, 0.0)),
        )
        .with_alias("Color/Primary");
        assert_eq!(token.alias, "color-primary");
        assert_eq!(run(token).display_value, "var(--color-primary, #FF0000)");
    }

    #[test]
    fn test_semantic_without_alias_keeps_var_reference() {
        let token = FlatToken::new("semantic", "Light", "Text", TokenValue::Color(Rgb::new(0.0, 0.0, 0.0)));
        assert_eq!(run(token).display_value, "var(--, #000000)");
    }

    #[test]
    fn test_foundation_colors_are_hex() {
        let token = FlatToken::new("Foundation", "Mode 1", "Blue", TokenValue::Color(Rgb::new(0.0, 0.0, 1.0)));
        let out = run(token);
        assert_eq!(out.display_name, "foundation-blue");
        assert_eq!(out.display_value, "#0000FF");

        let token = FlatToken::new("Foundation", "Mode 1", "Opacity", TokenValue::from(0.4));
        assert_eq!(run(token).display_value, "0.4");
    }

    #[test]
    fn test_other_collections_untouched() {
        let token = FlatToken::new("Motion", "Mode 1", "Easing", TokenValue::from("ease-in"));
        let out = run(token);
        assert_eq!(out.display_name, "motion-easing");
        assert_eq!(out.display_value, "ease-in");
    }

    #[test]
    fn test_rules_compose_left_to_right() {
        let rules = vec![
            TransformRule::new("upper", RuleKind::Name, |i| Ok(i.name.to_uppercase())),
            TransformRule::new("wrap", RuleKind::Name, |i| Ok(format!("[{}]", i.name))),
            TransformRule::new("double", RuleKind::Value, |i| Ok(format!("{}{}", i.value, i.value))),
            TransformRule::new("suffix", RuleKind::Value, |i| Ok(format!("{}!", i.value))),
        ];
        let token = FlatToken::new("a", "b", "c", TokenValue::from(1.0));
        let out = transform_token(&token, &rules).unwrap();
        assert_eq!(out.display_name, "[A-B-C]");
        assert_eq!(out.display_value, "11!");
    }

    #[test]
    fn test_matchers_see_original_token() {
        // the first rule rewrites the name; the matcher still sees the key
        let rules = vec![
            TransformRule::new("rename", RuleKind::Name, |_| Ok("renamed".to_string())),
            TransformRule::new("tag", RuleKind::Name, |i| Ok(format!("{}-tagged", i.name)))
                .when(|t| t.key.starts_with("a-")),
        ];
        let token = FlatToken::new("a", "b", "c", TokenValue::from(1.0));
        assert_eq!(
            transform_token(&token, &rules).unwrap().display_name,
            "renamed-tagged"
        );
    }

    #[test]
    fn test_failing_rule_aborts_whole_run() {
        let rules = vec![TransformRule::new("explode", RuleKind::Value, |i| {
            if i.token.key.ends_with("bad") {
                Err("cannot render".to_string())
            } else {
                Ok(i.value.to_string())
            }
        })];
        let tokens = vec![
            FlatToken::new("a", "m", "good", TokenValue::from(1.0)),
            FlatToken::new("a", "m", "bad", TokenValue::from(2.0)),
            FlatToken::new("a", "m", "fine", TokenValue::from(3.0)),
        ];

        match transform(&tokens, &rules) {
            Err(TokenError::RuleExecution { rule, token, message }) => {
                assert_eq!(rule, "explode");
                assert_eq!(token, "a-m-bad");
                assert_eq!(message, "cannot render");
            }
            other => panic!("expected rule error, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_groups() {
        let registry = TransformRegistry::builtin();
        let rules = registry.resolve_group(DEFAULT_GROUP).unwrap();
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![STRIP_PREFIXES, PX_SUFFIX, REM_SUFFIX, COLLECTION_VALUE]);

        assert!(matches!(
            registry.resolve_group("missing"),
            Err(TokenError::UnknownTransformGroup(_))
        ));

        let mut registry = TransformRegistry::builtin();
        registry.register_group("broken", vec!["name/strip-prefixes", "value/nope"]);
        match registry.resolve_group("broken") {
            Err(TokenError::UnknownTransform { group, transform }) => {
                assert_eq!(group, "broken");
                assert_eq!(transform, "value/nope");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_registering_same_name_replaces() {
        let mut registry = TransformRegistry::builtin();
        registry.register(TransformRule::new(STRIP_PREFIXES, RuleKind::Name, |i| {
            Ok(i.name.to_string())
        }));
        let rules = registry.resolve_group(DEFAULT_GROUP).unwrap();
        assert_eq!(rules.len(), 4);

        let token = FlatToken::new("Typography", "Mode 1", "Weight", TokenValue::from(400.0));
        assert_eq!(
            transform_token(&token, &rules).unwrap().display_name,
            "typography-mode-1-weight"
        );
    }

    #[test]
    fn test_collection_kind_dispatch() {
        assert_eq!(CollectionKind::of("semantic"), CollectionKind::Semantic);
        assert_eq!(CollectionKind::of("foundation"), CollectionKind::Foundation);
        assert_eq!(CollectionKind::of("size"), CollectionKind::Size);
        assert_eq!(CollectionKind::of("icon-size"), CollectionKind::Other);
        assert_eq!(CollectionKind::of("typography-mobile"), CollectionKind::Typography);
        assert_eq!(CollectionKind::of("semantic-dark"), CollectionKind::Other);
    }
}
