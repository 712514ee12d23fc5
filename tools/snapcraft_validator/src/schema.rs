use std::fmt::Write as _;

use serde_yaml::{Mapping, Value};

/// Top-level keys every snapcraft.yaml must define.
pub const REQUIRED_FIELDS: &[&str] = &[
    "name",
    "base",
    "version",
    "summary",
    "description",
    "grade",
    "confinement",
    "parts",
    "apps",
];

pub const ARCHITECTURES: &str = "architectures";
pub const CONFINEMENT: &str = "confinement";
pub const APPS: &str = "apps";
pub const PARTS: &str = "parts";

pub const BUILD_ON: &str = "build-on";
pub const PLUGS: &str = "plugs";
pub const PLUGIN: &str = "plugin";
pub const SOURCE: &str = "source";
pub const BUILD_PACKAGES: &str = "build-packages";

pub const STRICT_CONFINEMENT: &str = "strict";
pub const RUST_PLUGIN: &str = "rust";

/// Read-only view over a parsed snapcraft.yaml document.
#[derive(Debug, Clone)]
pub struct Manifest {
    root: Mapping,
}

impl Manifest {
    pub fn new(root: Mapping) -> Self {
        Self { root }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn missing_required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !self.contains(field))
    }

    pub fn has_strict_confinement(&self) -> bool {
        is_str(self.get(CONFINEMENT), STRICT_CONFINEMENT)
    }
}

/// Shape of a single `architectures` entry.
#[derive(Debug, Clone, Copy)]
pub enum ArchitectureEntry<'a> {
    Name(&'a str),
    BuildOn(&'a Value),
    MissingBuildOn(&'a Mapping),
    Invalid(&'a Value),
}

impl<'a> ArchitectureEntry<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(name) => Self::Name(name),
            Value::Mapping(map) => match map.get(BUILD_ON) {
                Some(build_on) => Self::BuildOn(build_on),
                None => Self::MissingBuildOn(map),
            },
            other => Self::Invalid(other),
        }
    }
}

/// Keys of a section entry; non-mapping entries behave as if they had none.
pub fn entry_get<'a>(entry: &'a Value, key: &str) -> Option<&'a Value> {
    entry.as_mapping().and_then(|map| map.get(key))
}

pub fn is_str(value: Option<&Value>, expected: &str) -> bool {
    matches!(value, Some(Value::String(s)) if s == expected)
}

/// Flattens a listing value (`plugs`, `build-packages`) into its items.
/// Null lists nothing; a lone scalar or mapping lists itself.
pub fn list_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// Renders a YAML value on a single line for report messages.
pub fn display_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

pub fn display_mapping(map: &Mapping) -> String {
    let mut out = String::new();
    write_mapping(&mut out, map);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::String(s) => out.push_str(s),
        Value::Sequence(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Mapping(map) => write_mapping(out, map),
        Value::Tagged(tagged) => {
            let _ = write!(out, "{} ", tagged.tag);
            write_value(out, &tagged.value);
        }
    }
}

fn write_mapping(out: &mut String, map: &Mapping) {
    out.push('{');
    for (idx, (key, val)) in map.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        write_value(out, key);
        out.push_str(": ");
        write_value(out, val);
    }
    out.push('}');
}
