//! Build orchestration.
//!
//! `build_outputs` is the in-memory pipeline: parse → flatten → merge →
//! transform → render, one [`RenderedOutput`] per configured file. [`Builder`]
//! adds discovery, the optional cache and writing on top of it.
//!
//! Every target renders before anything is written, so a failing document or
//! rule never leaves a partial set of files behind.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::IncrementalCache;
use crate::config::{BuildConfig, PlatformConfig};
use crate::discovery::discover_sources;
use crate::document::RawDocument;
use crate::error::{Result, TokenError};
use crate::flatten::{flatten, merge_into, FlatToken, TokenMap};
use crate::format::Format;
use crate::transform::{transform, TransformRegistry};

/// A variable document and the path it was read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub path: String,
    pub contents: String,
}

impl SourceDocument {
    pub fn new(path: &str, contents: &str) -> Self {
        SourceDocument {
            path: path.to_string(),
            contents: contents.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedOutput {
    pub platform: String,
    pub path: PathBuf,
    pub contents: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse and flatten every source, merging sequentially in source order.
///
/// Each document is parsed on its own; every malformed one is reported and the
/// first error is returned once all sources were looked at.
pub fn flatten_sources(
    sources: &[SourceDocument],
    cache: Option<&IncrementalCache>,
) -> Result<TokenMap> {
    let mut merged = TokenMap::new();
    let mut first_error = None;

    for source in sources {
        match flatten_source(source, cache) {
            Ok(tokens) => merge_into(&mut merged, tokens),
            Err(e) => {
                tracing::error!(file = %source.path, error = %e, "cannot flatten source");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(merged),
    }
}

fn flatten_source(source: &SourceDocument, cache: Option<&IncrementalCache>) -> Result<TokenMap> {
    if let Some(tokens) = cache.and_then(|c| c.get(&source.path, &source.contents)) {
        return Ok(tokens);
    }

    let document = RawDocument::parse(&source.contents, &source.path)?;
    let tokens = flatten(&document, &source.path);
    tracing::debug!(
        file = %source.path,
        collection = %document.name,
        tokens = tokens.len(),
        "flattened document"
    );

    if let Some(cache) = cache {
        cache.set(&source.path, &source.contents, &tokens);
    }
    Ok(tokens)
}

/// Render every file of one platform. Paths are relative to the build root.
pub fn build_platform(
    name: &str,
    platform: &PlatformConfig,
    tokens: &[FlatToken],
    registry: &TransformRegistry,
) -> Result<Vec<RenderedOutput>> {
    let rules = registry.resolve_group(&platform.transform_group)?;
    let transformed = transform(tokens, &rules)?;

    platform
        .files
        .iter()
        .map(|file| {
            let format = Format::from_name(&file.format)?;
            let path = platform.destination(name, file);
            tracing::info!(platform = name, format = format.name(), path = %path.display(), "rendered");
            Ok(RenderedOutput {
                platform: name.to_string(),
                path,
                contents: format.render(&transformed),
            })
        })
        .collect()
}

/// The whole pipeline over in-memory sources, platforms in config order.
pub fn build_outputs(
    config: &BuildConfig,
    sources: &[SourceDocument],
    registry: &TransformRegistry,
    cache: Option<&IncrementalCache>,
) -> Result<Vec<RenderedOutput>> {
    let merged = flatten_sources(sources, cache)?;
    let tokens: Vec<FlatToken> = merged.into_values().collect();

    let mut outputs = Vec::new();
    for (name, platform) in &config.platforms {
        outputs.extend(build_platform(name, platform, &tokens, registry)?);
    }
    Ok(outputs)
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILESYSTEM BUILDER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Builder {
    config: BuildConfig,
    base_dir: PathBuf,
    registry: TransformRegistry,
}

impl Builder {
    /// Relative sources, build paths and cache dir resolve against `base_dir`.
    pub fn new(config: BuildConfig, base_dir: impl Into<PathBuf>) -> Self {
        Builder {
            config,
            base_dir: base_dir.into(),
            registry: TransformRegistry::builtin(),
        }
    }

    /// Load `config_path` and use its directory as the base dir.
    pub fn from_config_file(config_path: &Path) -> Result<Self> {
        let config = BuildConfig::load(config_path)?;
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::new(config, base_dir))
    }

    pub fn with_registry(mut self, registry: TransformRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry_mut(&mut self) -> &mut TransformRegistry {
        &mut self.registry
    }

    pub fn load_sources(&self) -> Result<Vec<SourceDocument>> {
        discover_sources(&self.base_dir, &self.config.source)?
            .into_iter()
            .map(|path| {
                let contents = fs::read_to_string(&path).map_err(|e| TokenError::io(&path, e))?;
                let display = path
                    .strip_prefix(&self.base_dir)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .to_string();
                Ok(SourceDocument {
                    path: display,
                    contents,
                })
            })
            .collect()
    }

    /// Render every target without writing. Output paths include the base dir.
    pub fn build(&self) -> Result<Vec<RenderedOutput>> {
        let sources = self.load_sources()?;
        tracing::info!(sources = sources.len(), "building design tokens");

        let cache = self
            .config
            .cache_dir
            .as_ref()
            .map(|dir| IncrementalCache::new(self.base_dir.join(dir)));

        let outputs = build_outputs(&self.config, &sources, &self.registry, cache.as_ref())?;
        Ok(outputs
            .into_iter()
            .map(|mut output| {
                output.path = self.base_dir.join(&output.path);
                output
            })
            .collect())
    }

    /// Build and write every target, returning the written paths.
    pub fn build_all(&self) -> Result<Vec<PathBuf>> {
        let outputs = self.build()?;
        write_outputs(&outputs)?;
        Ok(outputs.into_iter().map(|o| o.path).collect())
    }
}

pub fn write_outputs(outputs: &[RenderedOutput]) -> Result<()> {
    for output in outputs {
        if let Some(parent) = output.path.parent() {
            fs::create_dir_all(parent).map_err(|e| TokenError::io(parent, e))?;
        }
        fs::write(&output.path, &output.contents).map_err(|e| TokenError::io(&output.path, e))?;
        tracing::info!(path = %output.path.display(), "wrote output");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{RuleKind, TransformRule};

    const SIZE: &str = r#"{ "name": "Size", "modes": { "1:0": "Mode 1" }, "variables": [
        { "name": "Spacing/Small", "resolvedValuesByMode": { "1:0": { "resolvedValue": 4 } } } ] }"#;

    fn config(json: &str) -> BuildConfig {
        BuildConfig::from_json(json).unwrap()
    }

    #[test]
    fn test_build_outputs_in_memory() {
        let config = config(
            r#"{ "source": ["x"], "platforms": {
                "css": { "buildPath": "build/", "files": [{ "destination": "vars.css", "format": "custom/css" }] } } }"#,
        );
        let outputs = build_outputs(
            &config,
            &[SourceDocument::new("size.json", SIZE)],
            &TransformRegistry::builtin(),
            None,
        )
        .unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].platform, "css");
        assert_eq!(outputs[0].path, PathBuf::from("build/vars.css"));
        assert!(outputs[0].contents.contains("  --size-spacing-small : 4px;"));
    }

    #[test]
    fn test_structural_error_fails_build() {
        let config = config(
            r#"{ "source": ["x"], "platforms": { "css": { "files": [{ "destination": "a.css", "format": "custom/css" }] } } }"#,
        );
        let err = build_outputs(
            &config,
            &[
                SourceDocument::new("size.json", SIZE),
                SourceDocument::new("broken.json", r#"{ "name": "Broken", "modes": {} }"#),
            ],
            &TransformRegistry::builtin(),
            None,
        )
        .unwrap_err();

        match err {
            TokenError::Structural { path, .. } => assert_eq!(path, "broken.json"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_group_fails_platform() {
        let config = config(
            r#"{ "source": ["x"], "platforms": { "css": { "transformGroup": "nope", "files": [{ "destination": "a.css", "format": "custom/css" }] } } }"#,
        );
        let err = build_outputs(
            &config,
            &[SourceDocument::new("size.json", SIZE)],
            &TransformRegistry::builtin(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TokenError::UnknownTransformGroup(_)));
    }

    #[test]
    fn test_builder_writes_nothing_when_a_rule_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("tokens")).unwrap();
        fs::write(dir.path().join("tokens/size.json"), SIZE).unwrap();

        let config = config(
            r#"{ "source": ["tokens/*.json"], "platforms": {
                "ok": { "files": [{ "destination": "ok.css", "format": "custom/css" }] },
                "bad": { "transformGroup": "failing", "files": [{ "destination": "bad.css", "format": "custom/css" }] } } }"#,
        );

        let mut builder = Builder::new(config, dir.path());
        builder
            .registry_mut()
            .register(TransformRule::new("value/fail", RuleKind::Value, |_| {
                Err("boom".to_string())
            }))
            .register_group("failing", vec!["value/fail"]);

        let err = builder.build_all().unwrap_err();
        assert!(matches!(err, TokenError::RuleExecution { .. }));
        assert!(!dir.path().join("ok.css").exists());
        assert!(!dir.path().join("bad.css").exists());
    }

    #[test]
    fn test_cache_is_used_between_builds() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("size.json"), SIZE).unwrap();

        let config = config(
            r#"{ "source": ["size.json"], "cacheDir": ".cache", "platforms": {
                "css": { "files": [{ "destination": "out/{platform}.css", "format": "custom/css" }] } } }"#,
        );
        let builder = Builder::new(config, dir.path());

        let first = builder.build().unwrap();
        assert!(dir.path().join(".cache/size.json.json").exists());
        let second = builder.build().unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].path, dir.path().join("out/css.css"));
    }
}
