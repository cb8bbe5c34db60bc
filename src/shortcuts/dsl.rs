//! Predicate authoring: serde model, shorthand strings and shortcut files
//!
//! A predicate can be written in full:
//!
//! ```yaml
//! predicate:
//!   key: s
//!   metaKey: true
//! ```
//!
//! or as a shorthand string, where `+` joins modifiers to a key and
//! whitespace separates the steps of a sequence:
//!
//! ```yaml
//! predicate: "meta+s"
//! predicate: "Control c"
//! predicate: "Escape:release"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::command::Command;
use super::event::{KeyEvent, KeyEventKind, Modifiers};
use super::predicate::{KeyPattern, Predicate};

/// Full predicate form with every field of the authoring surface
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredicateSpec {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub alt_key: bool,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub meta_key: bool,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default, rename = "type")]
    pub kind: KeyEventKind,
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub predicates: Vec<PredicateDef>,
}

/// A predicate as written in a file: shorthand string or full form
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PredicateDef {
    Shorthand(String),
    Spec(PredicateSpec),
}

impl PredicateDef {
    pub fn into_predicate(self) -> Result<Predicate, ShortcutError> {
        match self {
            PredicateDef::Shorthand(text) => parse_shorthand(&text),
            PredicateDef::Spec(spec) => spec.into_predicate(),
        }
    }
}

impl PredicateSpec {
    /// Sequence wins over presence, presence over a simple key match
    pub fn into_predicate(self) -> Result<Predicate, ShortcutError> {
        if self.predicates.len() >= 2 {
            let steps = self
                .predicates
                .into_iter()
                .map(PredicateDef::into_predicate)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Predicate::Sequence(steps));
        }

        let mods = Modifiers::new(self.ctrl_key, self.shift_key, self.alt_key, self.meta_key);

        match (self.key, self.predicates.into_iter().next()) {
            (Some(key), _) if key.is_empty() => Err(ShortcutError::MissingKey),
            (Some(key), _) if self.present => Ok(Predicate::Presence {
                key,
                kind: self.kind,
            }),
            (Some(key), _) => Ok(Predicate::Simple(
                KeyPattern::new(key).with_mods(mods).with_kind(self.kind),
            )),
            (None, Some(only)) => only.into_predicate(),
            (None, None) => Err(ShortcutError::MissingKey),
        }
    }
}

/// Parse a shorthand such as `"ctrl+shift+p"` or `"Control c"`
pub fn parse_shorthand(text: &str) -> Result<Predicate, ShortcutError> {
    let mut steps = text
        .split_whitespace()
        .map(parse_step)
        .collect::<Result<Vec<_>, _>>()?;

    match steps.len() {
        0 => Err(ShortcutError::InvalidShorthand(text.to_string())),
        1 => Ok(steps.remove(0)),
        _ => Ok(Predicate::Sequence(steps)),
    }
}

/// Parse one step: `[mod+]*key[:press|:release]`
fn parse_step(step: &str) -> Result<Predicate, ShortcutError> {
    let (body, kind) = match step.rsplit_once(':') {
        Some((body, suffix)) if !body.is_empty() => match suffix.to_lowercase().as_str() {
            "release" | "up" | "keyup" => (body, KeyEventKind::Release),
            "press" | "down" | "keydown" => (body, KeyEventKind::Press),
            _ => (step, KeyEventKind::Press),
        },
        _ => (step, KeyEventKind::Press),
    };

    // A literal plus key: "+" or "ctrl++"
    let (mod_part, literal_key) = if body == "+" {
        ("", Some("+".to_string()))
    } else if let Some(stripped) = body.strip_suffix("++") {
        (stripped, Some("+".to_string()))
    } else {
        (body, None)
    };

    let parts: Vec<&str> = if mod_part.is_empty() {
        Vec::new()
    } else {
        mod_part.split('+').collect()
    };

    if parts.iter().any(|p| p.is_empty()) {
        return Err(ShortcutError::InvalidShorthand(step.to_string()));
    }

    let mut mods = Modifiers::NONE;
    let mut key = literal_key;
    let last = parts.len().saturating_sub(1);

    for (idx, part) in parts.iter().enumerate() {
        match modifier_token(part) {
            // A trailing modifier with no other key names the modifier key itself
            Some((_, name)) if idx == last && key.is_none() => key = Some(name.to_string()),
            Some((flag, _)) => mods = mods | flag,
            None => {
                if key.is_some() {
                    return Err(ShortcutError::InvalidShorthand(format!(
                        "Multiple keys in step: {}",
                        step
                    )));
                }
                // Whitespace separates steps, so the space bar goes by name
                key = Some(if part.eq_ignore_ascii_case("space") {
                    " ".to_string()
                } else {
                    part.to_string()
                });
            }
        }
    }

    let key = key.ok_or_else(|| ShortcutError::InvalidShorthand(step.to_string()))?;
    Ok(Predicate::Simple(
        KeyPattern::new(key).with_mods(mods).with_kind(kind),
    ))
}

/// Parse a modifier list such as `"ctrl+shift"`; an empty string means none
pub fn parse_modifiers(text: &str) -> Result<Modifiers, ShortcutError> {
    text.split('+')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .try_fold(Modifiers::NONE, |mods, part| match modifier_token(part) {
            Some((flag, _)) => Ok(mods | flag),
            None => Err(ShortcutError::InvalidShorthand(format!(
                "Unknown modifier: {}",
                part
            ))),
        })
}

/// Modifier flag and the key name hosts report for it
fn modifier_token(token: &str) -> Option<(Modifiers, &'static str)> {
    match token.to_lowercase().as_str() {
        "ctrl" | "control" => Some((Modifiers::CTRL, "Control")),
        "shift" => Some((Modifiers::SHIFT, "Shift")),
        "alt" | "option" | "opt" => Some((Modifiers::ALT, "Alt")),
        "meta" | "super" | "win" | "command" => Some((Modifiers::META, "Meta")),
        "cmd" => {
            let flag = Modifiers::cmd();
            Some((flag, if flag.meta() { "Meta" } else { "Control" }))
        }
        _ => None,
    }
}

/// Root structure of a shortcut file
#[derive(Debug, Deserialize)]
pub struct ShortcutFile {
    pub shortcuts: Vec<ShortcutEntry>,
}

/// A single shortcut entry from YAML or JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ShortcutEntry {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    pub predicate: PredicateDef,
    #[serde(default)]
    pub priority: i32,
}

/// A parsed shortcut waiting for a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutDef {
    pub uuid: String,
    pub name: Option<String>,
    pub predicate: Predicate,
    pub priority: i32,
}

impl ShortcutDef {
    /// Attach a handler, producing a live command
    pub fn into_command(self, handler: impl Fn(&KeyEvent) + 'static) -> Command {
        let mut command =
            Command::new(self.uuid, self.predicate, handler).with_priority(self.priority);
        command.name = self.name;
        command
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uuid)
    }
}

/// Parse shortcut definitions from a YAML string
pub fn parse_shortcuts_yaml(yaml: &str) -> Result<Vec<ShortcutDef>, ShortcutError> {
    let file: ShortcutFile =
        serde_yaml::from_str(yaml).map_err(|e| ShortcutError::ParseError(e.to_string()))?;
    convert_entries(file.shortcuts)
}

/// Parse shortcut definitions from a JSON string
pub fn parse_shortcuts_json(json: &str) -> Result<Vec<ShortcutDef>, ShortcutError> {
    let file: ShortcutFile =
        serde_json::from_str(json).map_err(|e| ShortcutError::ParseError(e.to_string()))?;
    convert_entries(file.shortcuts)
}

/// Load shortcut definitions; `.json` files are read as JSON, anything else as YAML
pub fn load_shortcuts_file(path: &Path) -> Result<Vec<ShortcutDef>, ShortcutError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ShortcutError::IoError(e.to_string()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let defs = if is_json {
        parse_shortcuts_json(&content)?
    } else {
        parse_shortcuts_yaml(&content)?
    };
    tracing::info!("Loaded {} shortcuts from {}", defs.len(), path.display());
    Ok(defs)
}

pub fn convert_entries(entries: Vec<ShortcutEntry>) -> Result<Vec<ShortcutDef>, ShortcutError> {
    let mut seen = HashSet::new();
    let mut defs = Vec::with_capacity(entries.len());

    for entry in entries {
        if !seen.insert(entry.uuid.clone()) {
            return Err(ShortcutError::DuplicateUuid(entry.uuid));
        }
        let predicate = entry.predicate.into_predicate().map_err(|e| match e {
            ShortcutError::MissingKey => {
                ShortcutError::InvalidEntry(entry.uuid.clone(), "predicate has no key".to_string())
            }
            other => other,
        })?;
        defs.push(ShortcutDef {
            uuid: entry.uuid,
            name: entry.name,
            predicate,
            priority: entry.priority,
        });
    }

    Ok(defs)
}

/// Errors that can occur when reading shortcut definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutError {
    IoError(String),
    ParseError(String),
    MissingKey,
    InvalidShorthand(String),
    InvalidEntry(String, String),
    DuplicateUuid(String),
}

impl std::fmt::Display for ShortcutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShortcutError::IoError(e) => write!(f, "IO error: {}", e),
            ShortcutError::ParseError(e) => write!(f, "Parse error: {}", e),
            ShortcutError::MissingKey => write!(f, "Predicate has no key"),
            ShortcutError::InvalidShorthand(s) => write!(f, "Invalid shorthand: {}", s),
            ShortcutError::InvalidEntry(uuid, e) => write!(f, "Invalid shortcut {}: {}", uuid, e),
            ShortcutError::DuplicateUuid(uuid) => write!(f, "Duplicate shortcut uuid: {}", uuid),
        }
    }
}

impl std::error::Error for ShortcutError {}
