use serde_yaml::Value;
use tracing::{debug, trace};

use crate::schema::{
    APPS, ARCHITECTURES, ArchitectureEntry, BUILD_PACKAGES, Manifest, PARTS, PLUGIN, PLUGS,
    RUST_PLUGIN, SOURCE, display_mapping, display_value, entry_get, is_str, list_items,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub location: Option<Location>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl ValidationIssue {
    pub fn new(path: String, message: String, severity: Severity) -> Self {
        Self {
            path,
            message,
            location: None,
            severity,
        }
    }
}

/// Informational output gathered while walking the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    Check(String),
    Label(String),
    Item { indent: usize, value: String },
}

impl Note {
    fn item(indent: usize, value: &Value) -> Self {
        Note::Item {
            indent,
            value: display_value(value),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub notes: Vec<Note>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.with_severity(Severity::Warning)
    }

    pub fn passed(&self) -> bool {
        self.errors().next().is_none()
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    fn error(&mut self, path: String, message: String) {
        self.issues
            .push(ValidationIssue::new(path, message, Severity::Error));
    }

    fn warn(&mut self, path: String, message: String) {
        self.issues
            .push(ValidationIssue::new(path, message, Severity::Warning));
    }
}

pub fn validate_manifest(manifest: &Manifest, source: &str) -> ValidationReport {
    let mut report = ValidationReport::default();

    for field in manifest.missing_required_fields() {
        report.error(field.into(), format!("Missing required field: {field}"));
    }

    check_architectures(manifest, &mut report);
    if manifest.has_strict_confinement() {
        check_strict_apps(manifest, &mut report);
    }
    check_parts(manifest, &mut report);

    debug!(
        errors = report.errors().count(),
        warnings = report.warnings().count(),
        "validation finished"
    );
    attach_locations(source, report)
}

fn check_architectures(manifest: &Manifest, report: &mut ValidationReport) {
    let Some(architectures) = manifest.get(ARCHITECTURES) else {
        report.error(
            ARCHITECTURES.into(),
            "Missing 'architectures' field - required for multi-platform builds".into(),
        );
        return;
    };
    report.notes.push(Note::Check("Architectures defined:".into()));

    let Some(entries) = architectures.as_sequence() else {
        report.warn(
            ARCHITECTURES.into(),
            "'architectures' should be a sequence of entries".into(),
        );
        return;
    };
    trace!(count = entries.len(), "checking architectures");

    for (idx, entry) in entries.iter().enumerate() {
        let path = format!("{ARCHITECTURES}[{idx}]");
        match ArchitectureEntry::classify(entry) {
            ArchitectureEntry::Name(name) => report.notes.push(Note::Item {
                indent: 1,
                value: name.to_string(),
            }),
            ArchitectureEntry::BuildOn(build_on) => report.notes.push(Note::item(1, build_on)),
            ArchitectureEntry::MissingBuildOn(map) => report.warn(
                path,
                format!(
                    "Architecture mapping entry missing 'build-on': {}",
                    display_mapping(map)
                ),
            ),
            ArchitectureEntry::Invalid(value) => report.warn(
                path,
                format!(
                    "Invalid architecture entry format: {}",
                    display_value(value)
                ),
            ),
        }
    }
}

fn check_strict_apps(manifest: &Manifest, report: &mut ValidationReport) {
    report
        .notes
        .push(Note::Check("Using strict confinement".into()));

    let Some(apps) = manifest.get(APPS) else {
        return;
    };
    let Some(apps) = apps.as_mapping() else {
        report.warn(APPS.into(), "'apps' should be a mapping of app names".into());
        return;
    };
    trace!(count = apps.len(), "checking app plugs");

    for (name, app) in apps {
        let name = display_value(name);
        match entry_get(app, PLUGS) {
            Some(plugs) => {
                report
                    .notes
                    .push(Note::Check(format!("App '{name}' has plugs:")));
                for plug in list_items(plugs) {
                    report.notes.push(Note::item(1, plug));
                }
            }
            None => report.error(
                format!("{APPS}.{name}"),
                format!("App '{name}' missing 'plugs' - required for strict confinement"),
            ),
        }
    }
}

fn check_parts(manifest: &Manifest, report: &mut ValidationReport) {
    let Some(parts) = manifest.get(PARTS) else {
        return;
    };
    let Some(parts) = parts.as_mapping() else {
        report.warn(PARTS.into(), "'parts' should be a mapping of part names".into());
        return;
    };
    trace!(count = parts.len(), "checking parts");

    for (name, part) in parts {
        let name = display_value(name);
        let path = format!("{PARTS}.{name}");

        if entry_get(part, PLUGIN).is_none() {
            report.error(path.clone(), format!("Part '{name}' missing 'plugin' field"));
        }
        if entry_get(part, SOURCE).is_none() {
            report.error(path, format!("Part '{name}' missing 'source' field"));
        }

        if is_str(entry_get(part, PLUGIN), RUST_PLUGIN) {
            report
                .notes
                .push(Note::Check(format!("Part '{name}' uses rust plugin")));
            if let Some(packages) = entry_get(part, BUILD_PACKAGES) {
                report.notes.push(Note::Label("Build packages:".into()));
                for package in list_items(packages) {
                    report.notes.push(Note::item(2, package));
                }
            }
        }
    }
}

fn attach_locations(source: &str, mut report: ValidationReport) -> ValidationReport {
    for issue in &mut report.issues {
        issue.location = find_location(source, &issue.path);
    }
    report
}

/// Resolves a dotted path such as `parts.cli` or `architectures[2]` to the
/// line declaring its innermost key. Each segment must be a direct child of
/// the previous one. Index suffixes resolve to their parent key.
fn find_location(source: &str, path: &str) -> Option<Location> {
    let lines: Vec<&str> = source.lines().collect();
    let mut start = 0;
    let mut parent_indent: Option<usize> = None;
    let mut found = None;

    for segment in path.split('.') {
        let key = segment.split('[').next().unwrap_or(segment);
        // Indent of the parent's direct children, fixed by its first content line.
        let mut child_indent = parent_indent.map_or(Some(0), |_| None);
        let mut hit = None;
        for (idx, line) in lines.iter().enumerate().skip(start) {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = line.len() - trimmed.len();
            if parent_indent.is_some_and(|parent| indent <= parent) {
                break;
            }
            let expected = *child_indent.get_or_insert(indent);
            if indent == expected && declares_key(trimmed, key) {
                hit = Some((idx, indent));
                break;
            }
        }

        let (idx, indent) = hit?;
        start = idx + 1;
        parent_indent = Some(indent);
        found = Some(Location {
            line: idx + 1,
            column: indent + 1,
        });
    }
    found
}

fn declares_key(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.trim_start().starts_with(':'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_str;

    const VALID: &str = r#"name: demo
base: core22
version: "1.0"
summary: A demo
description: Demo snap
grade: stable
confinement: strict
architectures:
  - amd64
  - arm64
apps:
  demo:
    command: bin/demo
    plugs: [network, home]
parts:
  demo:
    plugin: rust
    source: .
    build-packages: [pkg-config, libssl-dev]
"#;

    fn run(yaml: &str) -> ValidationReport {
        let manifest = parse_config_str(yaml).expect("parse");
        validate_manifest(&manifest, yaml)
    }

    fn messages(report: &ValidationReport, severity: Severity) -> Vec<&str> {
        report
            .issues
            .iter()
            .filter(|i| i.severity == severity)
            .map(|i| i.message.as_str())
            .collect()
    }

    fn item(indent: usize, value: &str) -> Note {
        Note::Item {
            indent,
            value: value.into(),
        }
    }

    #[test]
    fn complete_manifest_has_no_findings() {
        let report = run(VALID);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert!(report.passed());
    }

    #[test]
    fn each_missing_required_field_is_one_error() {
        let report = run("architectures: [amd64]\n");
        let errors = messages(&report, Severity::Error);
        assert_eq!(errors.len(), 9);
        assert_eq!(errors[0], "Missing required field: name");
        assert_eq!(errors[8], "Missing required field: apps");
        assert!(!report.passed());
    }

    #[test]
    fn missing_architectures_is_error() {
        let yaml = VALID.replace("architectures:\n  - amd64\n  - arm64\n", "");
        let report = run(&yaml);
        assert_eq!(
            messages(&report, Severity::Error),
            ["Missing 'architectures' field - required for multi-platform builds"]
        );
        assert!(!report.notes.contains(&Note::Check("Architectures defined:".into())));
    }

    #[test]
    fn architecture_mapping_without_build_on_warns() {
        let yaml = VALID.replace("  - arm64\n", "  - build-for: arm64\n");
        let report = run(&yaml);
        assert!(report.passed());
        assert_eq!(
            messages(&report, Severity::Warning),
            ["Architecture mapping entry missing 'build-on': {build-for: arm64}"]
        );
        assert_eq!(report.issues[0].path, "architectures[1]");
    }

    #[test]
    fn architecture_build_on_is_listed() {
        let yaml = VALID.replace("  - arm64\n", "  - build-on: [arm64]\n    build-for: [arm64]\n");
        let report = run(&yaml);
        assert!(report.issues.is_empty());
        assert!(report.notes.contains(&item(1, "amd64")));
        assert!(report.notes.contains(&item(1, "[arm64]")));
    }

    #[test]
    fn non_string_architecture_entry_warns() {
        let yaml = VALID.replace("  - arm64\n", "  - 64\n");
        let report = run(&yaml);
        assert_eq!(
            messages(&report, Severity::Warning),
            ["Invalid architecture entry format: 64"]
        );
    }

    #[test]
    fn scalar_architectures_value_warns() {
        let yaml = VALID.replace("architectures:\n  - amd64\n  - arm64\n", "architectures: amd64\n");
        let report = run(&yaml);
        assert!(report.passed());
        assert_eq!(
            messages(&report, Severity::Warning),
            ["'architectures' should be a sequence of entries"]
        );
    }

    #[test]
    fn strict_app_without_plugs_is_error() {
        let yaml = VALID.replace(
            "apps:\n",
            "apps:\n  daemon:\n    command: bin/daemon\n  worker: ~\n",
        );
        let report = run(&yaml);
        assert_eq!(
            messages(&report, Severity::Error),
            [
                "App 'daemon' missing 'plugs' - required for strict confinement",
                "App 'worker' missing 'plugs' - required for strict confinement",
            ]
        );
        assert_eq!(report.issues[0].path, "apps.daemon");
    }

    #[test]
    fn plugs_are_ignored_without_strict_confinement() {
        for confinement in ["devmode", "classic"] {
            let yaml = VALID
                .replace("confinement: strict", &format!("confinement: {confinement}"))
                .replace("    plugs: [network, home]\n", "");
            let report = run(&yaml);
            assert!(report.issues.is_empty(), "{confinement}: {:?}", report.issues);
            assert!(!report.notes.contains(&Note::Check("Using strict confinement".into())));
        }
    }

    #[test]
    fn empty_plugs_satisfy_strict_confinement() {
        let yaml = VALID.replace("plugs: [network, home]", "plugs: []");
        let report = run(&yaml);
        assert!(report.issues.is_empty());
        assert!(report.notes.contains(&Note::Check("App 'demo' has plugs:".into())));
    }

    #[test]
    fn plugs_are_listed_in_order() {
        let report = run(VALID);
        let start = report
            .notes
            .iter()
            .position(|n| *n == Note::Check("App 'demo' has plugs:".into()))
            .expect("plugs heading");
        assert_eq!(report.notes[start + 1], item(1, "network"));
        assert_eq!(report.notes[start + 2], item(1, "home"));
    }

    #[test]
    fn part_missing_plugin_and_source_has_two_errors() {
        let yaml = VALID.replace("parts:\n", "parts:\n  empty: {}\n");
        let report = run(&yaml);
        assert_eq!(
            messages(&report, Severity::Error),
            [
                "Part 'empty' missing 'plugin' field",
                "Part 'empty' missing 'source' field",
            ]
        );
    }

    #[test]
    fn rust_part_lists_build_packages() {
        let report = run(VALID);
        let tail: Vec<_> = report.notes.iter().rev().take(4).rev().cloned().collect();
        assert_eq!(
            tail,
            [
                Note::Check("Part 'demo' uses rust plugin".into()),
                Note::Label("Build packages:".into()),
                item(2, "pkg-config"),
                item(2, "libssl-dev"),
            ]
        );
    }

    #[test]
    fn non_rust_part_is_not_announced() {
        let yaml = VALID.replace("plugin: rust", "plugin: nil");
        let report = run(&yaml);
        assert!(report.issues.is_empty());
        assert!(!report.notes.iter().any(|n| matches!(n, Note::Label(_))));
    }

    #[test]
    fn scalar_parts_value_warns() {
        let yaml = VALID.replace(
            "parts:\n  demo:\n    plugin: rust\n    source: .\n    build-packages: [pkg-config, libssl-dev]\n",
            "parts: nothing\n",
        );
        let report = run(&yaml);
        assert!(report.passed());
        assert_eq!(
            messages(&report, Severity::Warning),
            ["'parts' should be a mapping of part names"]
        );
    }

    #[test]
    fn issues_are_located_by_nested_key() {
        let yaml = VALID.replace("parts:\n", "parts:\n  broken:\n    source: .\n");
        let report = run(&yaml);
        let issue = &report.issues[0];
        assert_eq!(issue.path, "parts.broken");
        let line = yaml.lines().position(|l| l == "  broken:").expect("line") + 1;
        assert_eq!(issue.location, Some(Location { line, column: 3 }));
    }

    #[test]
    fn location_skips_deeper_keys_with_same_name() {
        let yaml = VALID.replace(
            "apps:\n",
            "apps:\n  first:\n    plugs: [network]\n    environment:\n      second: y\n  second:\n    command: bin/second\n",
        );
        let report = run(&yaml);
        let issue = report
            .issues
            .iter()
            .find(|i| i.path == "apps.second")
            .expect("missing plugs error");
        let line = yaml.lines().position(|l| l == "  second:").expect("line") + 1;
        assert_eq!(issue.location, Some(Location { line, column: 3 }));
    }

    #[test]
    fn missing_fields_have_no_location() {
        let yaml = VALID.replace("name: demo\n", "");
        let report = run(&yaml);
        assert_eq!(report.issues[0].path, "name");
        assert_eq!(report.issues[0].location, None);
    }

    #[test]
    fn validation_is_deterministic() {
        let yaml = VALID.replace("parts:\n", "parts:\n  a: {}\n  b: {}\n");
        let first = run(&yaml);
        let second = run(&yaml);
        assert_eq!(first.issues, second.issues);
        assert_eq!(first.notes, second.notes);
    }
}
