//! Requirement manifest (`requirements.txt`) model
//!
//! The format belongs to pip; this parser only classifies lines so the
//! bootstrapper can report what is about to be installed.

use regex::Regex;

use crate::domain::DomainError;

/// A single requirement specifier, e.g. `python-telegram-bot[job-queue]>=20.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Distribution name as written (`python-telegram-bot`)
    pub name: String,
    /// Full specifier with inline comments stripped
    pub spec: String,
}

/// Classified manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestLine {
    Requirement(Requirement),
    /// Editable install (`-e <target>`); holds the target
    Editable(String),
    /// pip option such as `-r base.txt` or `--index-url ...`
    Option(String),
    /// Anything else pip would accept (URLs, local paths)
    Other(String),
}

/// Parsed dependency manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub lines: Vec<ManifestLine>,
}

impl Manifest {
    /// Parse manifest content. Blank lines and comments are dropped.
    pub fn parse(content: &str) -> Result<Self, DomainError> {
        let name_re = Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:[\[<>=!~;@ ]|$)")
            .map_err(|e| DomainError::InvalidManifest(e.to_string()))?;

        let mut lines = Vec::new();
        for raw in join_continuations(content) {
            let line = strip_comment(&raw);
            if line.is_empty() {
                continue;
            }

            if let Some(target) = editable_target(line) {
                lines.push(ManifestLine::Editable(target.to_string()));
            } else if line.starts_with('-') {
                lines.push(ManifestLine::Option(line.to_string()));
            } else if let Some(caps) = name_re.captures(line) {
                lines.push(ManifestLine::Requirement(Requirement {
                    name: caps[1].to_string(),
                    spec: line.to_string(),
                }));
            } else {
                lines.push(ManifestLine::Other(line.to_string()));
            }
        }

        Ok(Self { lines })
    }

    /// Requirement specifiers, in file order.
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.lines.iter().filter_map(|l| match l {
            ManifestLine::Requirement(r) => Some(r),
            _ => None,
        })
    }

    /// Distribution names, in file order.
    pub fn names(&self) -> Vec<&str> {
        self.requirements().map(|r| r.name.as_str()).collect()
    }

    /// Number of installable entries (specifiers, editables, URLs/paths).
    pub fn entry_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| !matches!(l, ManifestLine::Option(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}

/// Target of `-e <target>`, `-e<target>`, `--editable <target>` or `--editable=<target>`.
fn editable_target(line: &str) -> Option<&str> {
    let rest = if let Some(rest) = line.strip_prefix("--editable") {
        rest.strip_prefix('=').unwrap_or(rest)
    } else {
        line.strip_prefix("-e")?
    };
    let target = rest.trim();
    (!target.is_empty()).then_some(target)
}

/// Join lines ending in a backslash with the following line.
fn join_continuations(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = String::new();
    for line in content.lines() {
        if let Some(head) = line.strip_suffix('\\') {
            pending.push_str(head);
            continue;
        }
        pending.push_str(line);
        out.push(std::mem::take(&mut pending));
    }
    if !pending.is_empty() {
        out.push(pending);
    }
    out
}

/// Remove full-line and inline comments (` #` preceded by whitespace).
fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        return "";
    }
    let bytes = trimmed.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return trimmed[..i].trim_end();
        }
    }
    trimmed
}
