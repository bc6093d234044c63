//! Runnable-target extraction from project build metadata.
//!
//! Scans a project root for `package.json`, `Makefile` and `pom.xml` and
//! turns what it finds into ready-to-run commands (`npm run dev`,
//! `make build`, `mvn compile`). Feeds the project-context predictor.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

/// Maven lifecycle phases worth suggesting when a pom declares them.
const MAVEN_PHASES: &[&str] = &[
    "clean", "validate", "compile", "test", "package", "verify", "install", "site", "deploy",
];

#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    scripts: BTreeMap<String, String>,
}

/// Union of runnable targets found in `root`, in a stable order.
pub fn project_commands(root: &Path) -> Vec<String> {
    let mut commands = Vec::new();

    if let Some(scripts) = npm_scripts(&root.join("package.json")) {
        commands.extend(scripts);
    }
    if let Some(targets) = make_targets(&root.join("Makefile")) {
        commands.extend(targets);
    }
    if let Some(phases) = maven_phases(&root.join("pom.xml")) {
        commands.extend(phases);
    }

    commands
}

/// `npm run <key>` for each entry under `scripts`. BTreeMap keeps the
/// output deterministic regardless of the JSON key order.
fn npm_scripts(path: &Path) -> Option<Vec<String>> {
    let content = std::fs::read_to_string(path).ok()?;
    let parsed: PackageJson = serde_json::from_str(&content).ok()?;
    Some(
        parsed
            .scripts
            .keys()
            .map(|name| format!("npm run {name}"))
            .collect(),
    )
}

/// `make <target>` for each top-level rule whose target is not special
/// (`.PHONY` and friends) and not a variable assignment.
fn make_targets(path: &Path) -> Option<Vec<String>> {
    let content = std::fs::read_to_string(path).ok()?;
    let mut commands = Vec::new();
    for line in content.lines() {
        if line.starts_with('\t') || line.starts_with('#') {
            continue;
        }
        let Some(idx) = line.find(':') else {
            continue;
        };
        if idx == 0 {
            continue;
        }
        // `CC := gcc` is an assignment, not a rule.
        if line[idx + 1..].starts_with('=') {
            continue;
        }
        let target = line[..idx].trim();
        if !target.is_empty() && !target.starts_with('.') && !target.contains(char::is_whitespace) {
            commands.push(format!("make {target}"));
        }
    }
    Some(commands)
}

/// `mvn <phase>` for each known lifecycle phase that appears as a
/// `<phase>` or `<goal>` element.
fn maven_phases(path: &Path) -> Option<Vec<String>> {
    let content = std::fs::read_to_string(path).ok()?;
    let mut commands = Vec::new();
    for phase in MAVEN_PHASES {
        if content.contains(&format!("<phase>{phase}</phase>"))
            || content.contains(&format!("<goal>{phase}</goal>"))
        {
            commands.push(format!("mvn {phase}"));
        }
    }
    Some(commands)
}
