//! Vendor-supplied SQL scripts used instead of generated statements.
//!
//! A repository may ship hand-written create and drop scripts per database
//! type. The mapping is validated when it is loaded, not when a script is
//! first needed, so a broken deployment fails at startup.

use crate::error::DdlError;
use crate::statement::split_script;
use crate::types::DatabaseKind;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Script mapping as written in configuration.
///
/// Keys are database type tokens; values are comma-separated file lists
/// that may contain `{property}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScriptMappingConfig {
    pub create: BTreeMap<String, String>,
    pub drop: BTreeMap<String, String>,
    /// Accept create scripts that have no matching drop scripts.
    pub allow_missing_drop: bool,
}

impl ScriptMappingConfig {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.drop.is_empty()
    }
}

/// Validated script mapping with placeholders resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorScripts {
    create: BTreeMap<DatabaseKind, Vec<PathBuf>>,
    drop: BTreeMap<DatabaseKind, Vec<PathBuf>>,
}

impl VendorScripts {
    /// Resolve and validate `config`.
    ///
    /// Relative paths are taken relative to `base_dir`. Placeholders are
    /// resolved through `lookup`.
    pub fn from_config(
        config: &ScriptMappingConfig,
        base_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, DdlError> {
        let create = resolve_mapping("create", &config.create, base_dir, &lookup)?;
        let drop = resolve_mapping("drop", &config.drop, base_dir, &lookup)?;

        let has = |map: &BTreeMap<DatabaseKind, Vec<PathBuf>>, kind: &DatabaseKind| {
            map.contains_key(kind) || map.contains_key(&DatabaseKind::Default)
        };

        if !config.allow_missing_drop {
            if let Some(kind) = create.keys().find(|kind| !has(&drop, *kind)) {
                return Err(DdlError::ScriptValidation(format!(
                    "database type {kind} has create scripts but no drop scripts"
                )));
            }
        }
        if let Some(kind) = drop.keys().find(|kind| !has(&create, *kind)) {
            return Err(DdlError::ScriptValidation(format!(
                "database type {kind} has drop scripts but no create scripts"
            )));
        }

        Ok(Self { create, drop })
    }

    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
    }

    /// Scripts for `kind`, falling back to the `default` entry.
    ///
    /// `None` when no create scripts apply, in which case generated
    /// statements should be used.
    pub fn scripts_for(&self, kind: DatabaseKind) -> Option<ScriptSet> {
        let pick = |map: &BTreeMap<DatabaseKind, Vec<PathBuf>>| {
            map.get(&kind)
                .or_else(|| map.get(&DatabaseKind::Default))
                .cloned()
        };

        let create = pick(&self.create)?;
        Some(ScriptSet {
            kind,
            create,
            drop: pick(&self.drop).unwrap_or_default(),
        })
    }
}

/// The script files selected for one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSet {
    pub kind: DatabaseKind,
    pub create: Vec<PathBuf>,
    pub drop: Vec<PathBuf>,
}

impl ScriptSet {
    /// Read and split every file.
    pub fn load(&self) -> Result<LoadedScripts, DdlError> {
        let load = |path: &PathBuf| -> Result<Script, DdlError> {
            let sql = std::fs::read_to_string(path).map_err(|source| DdlError::ScriptIo {
                path: path.clone(),
                source,
            })?;
            let statements = split_script(&sql, self.kind, path)?;
            debug!(path = %path.display(), statements = statements.len(), "loaded script");
            Ok(Script {
                path: path.clone(),
                statements,
            })
        };

        Ok(LoadedScripts {
            drop: self.drop.iter().map(load).collect::<Result<_, _>>()?,
            create: self.create.iter().map(load).collect::<Result<_, _>>()?,
        })
    }
}

/// One script file split into statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub path: PathBuf,
    pub statements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedScripts {
    pub drop: Vec<Script>,
    pub create: Vec<Script>,
}

fn resolve_mapping(
    direction: &str,
    mapping: &BTreeMap<String, String>,
    base_dir: &Path,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<BTreeMap<DatabaseKind, Vec<PathBuf>>, DdlError> {
    let mut resolved = BTreeMap::new();

    for (key, value) in mapping {
        let kind = DatabaseKind::from_token(key).ok_or_else(|| {
            DdlError::ScriptValidation(format!(
                "unknown database type '{key}' in {direction} scripts"
            ))
        })?;

        let value = resolve_placeholders(value, lookup).map_err(|message| {
            DdlError::ScriptValidation(format!("{direction} scripts for {kind}: {message}"))
        })?;

        let paths: Vec<PathBuf> = value
            .split(',')
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(|path| base_dir.join(path))
            .collect();
        if paths.is_empty() {
            return Err(DdlError::ScriptValidation(format!(
                "{direction} scripts for {kind} list no files"
            )));
        }

        if resolved.insert(kind, paths).is_some() {
            return Err(DdlError::ScriptValidation(format!(
                "database type {kind} is mapped twice in {direction} scripts"
            )));
        }
    }

    Ok(resolved)
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("Invalid regex pattern"))
}

/// Replace every `{name}` in `raw` with `lookup(name)`.
pub fn resolve_placeholders(
    raw: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, String> {
    let mut missing: Vec<String> = Vec::new();
    let resolved = placeholder_regex().replace_all(raw, |caps: &regex::Captures<'_>| {
        let name = caps[1].trim();
        match lookup(name) {
            Some(value) => value,
            None => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(format!("unresolved placeholder(s): {}", missing.join(", ")));
    }
    if resolved.contains(['{', '}']) {
        return Err(format!("unbalanced braces in '{raw}'"));
    }
    Ok(resolved.into_owned())
}
