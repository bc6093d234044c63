//! Alias extraction from shell rc files.

use std::io;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// A shell alias definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub cmd: String,
}

fn alias_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"^alias\s+(\w+)=["'](.+)["']"#).unwrap())
}

/// Extract `alias name='expansion'` definitions from an rc file.
///
/// Per-line failures are skipped; only an unreadable file is an error.
pub fn extract_aliases(path: &Path) -> io::Result<Vec<Alias>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_aliases(&content))
}

/// Extract aliases from rc-file content.
pub fn parse_aliases(content: &str) -> Vec<Alias> {
    let pattern = alias_pattern();
    content
        .lines()
        .filter_map(|line| {
            let caps = pattern.captures(line)?;
            Some(Alias {
                name: caps[1].to_string(),
                cmd: caps[2].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_single_and_double_quotes() {
        let aliases = parse_aliases("alias gcm='git commit'\nalias gst=\"git status\"\n");
        assert_eq!(
            aliases,
            vec![
                Alias {
                    name: "gcm".into(),
                    cmd: "git commit".into()
                },
                Alias {
                    name: "gst".into(),
                    cmd: "git status".into()
                },
            ]
        );
    }

    #[test]
    fn test_ignores_non_alias_lines() {
        let content = "export PATH=$PATH:/usr/local/bin\n# alias commented='nope'\nsource ~/.profile\n";
        assert!(parse_aliases(content).is_empty());
    }

    #[test]
    fn test_alias_with_arguments_in_expansion() {
        let aliases = parse_aliases("alias gaa='git add .'\n");
        assert_eq!(aliases[0].cmd, "git add .");
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(extract_aliases(Path::new("/nonexistent/.zshrc")).is_err());
    }
}
