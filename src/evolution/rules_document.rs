// Rules Document Model
//
// A rules document is Markdown with three kinds of marked lines: version
// headings (`### v1.3 (2025-06-28)`), a version field (`*バージョン: 1.3*`)
// and an insertion anchor heading. Everything else is carried through as
// opaque text, so parse followed by render reproduces the input exactly.

use crate::config::DocumentAnchors;
use crate::error::{Result, ScrivenerError};
use crate::types::{RuleVersionNumber, SuggestedUpdate};
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    VersionHeading {
        version: RuleVersionNumber,
        raw: String,
    },
    VersionField(String),
    Anchor(String),
    Text(String),
}

impl Line {
    fn raw(&self) -> &str {
        match self {
            Line::VersionHeading { raw, .. } => raw,
            Line::VersionField(raw) | Line::Anchor(raw) | Line::Text(raw) => raw,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RulesDocument {
    lines: Vec<Line>,
    anchors: DocumentAnchors,
    field_pattern: Regex,
}

impl RulesDocument {
    pub fn parse(text: &str, anchors: &DocumentAnchors) -> Result<Self> {
        let field_pattern = Regex::new(&format!(
            r"\*{}: [\d.]+\*",
            regex::escape(&anchors.version_field_label)
        ))
        .map_err(|e| ScrivenerError::Other(format!("Invalid version field label: {}", e)))?;

        let lines = text
            .split('\n')
            .map(|line| classify(line, anchors, &field_pattern))
            .collect();

        Ok(Self {
            lines,
            anchors: anchors.clone(),
            field_pattern,
        })
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Highest version among the version headings
    pub fn current_version(&self) -> Option<RuleVersionNumber> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                Line::VersionHeading { version, .. } => Some(*version),
                _ => None,
            })
            .max()
    }

    pub fn has_anchor(&self) -> bool {
        self.lines.iter().any(|l| matches!(l, Line::Anchor(_)))
    }

    pub fn version_field_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, Line::VersionField(_)))
            .count()
    }

    /// Insert a dated section before the first anchor. Returns false when the
    /// document has no anchor.
    pub fn insert_section(
        &mut self,
        version: RuleVersionNumber,
        date: &str,
        updates: &[SuggestedUpdate],
    ) -> bool {
        let Some(index) = self.lines.iter().position(|l| matches!(l, Line::Anchor(_))) else {
            return false;
        };

        let mut section = Vec::with_capacity(updates.len() + 3);
        section.push(Line::Text(String::new()));
        section.push(Line::VersionHeading {
            version,
            raw: format!(
                "{}{} ({})",
                self.anchors.version_heading_prefix, version, date
            ),
        });
        for update in updates {
            section.push(Line::Text(format!("- {}: {}", update.rule, update.action)));
        }
        section.push(Line::Text(String::new()));

        self.lines.splice(index..index, section);
        true
    }

    /// Point every version field at `version`. Returns how many lines changed.
    pub fn set_version(&mut self, version: RuleVersionNumber) -> usize {
        let replacement = format!("*{}: {}*", self.anchors.version_field_label, version);
        let mut updated = 0;
        for line in &mut self.lines {
            if let Line::VersionField(raw) = line {
                *raw = self
                    .field_pattern
                    .replace_all(raw, regex::NoExpand(&replacement))
                    .into_owned();
                updated += 1;
            }
        }
        updated
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(Line::raw)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn classify(line: &str, anchors: &DocumentAnchors, field_pattern: &Regex) -> Line {
    if let Some(rest) = line.strip_prefix(anchors.version_heading_prefix.as_str()) {
        let number: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if let Ok(version) = number.parse::<RuleVersionNumber>() {
            return Line::VersionHeading {
                version,
                raw: line.to_string(),
            };
        }
    }

    if line.trim_start().starts_with(anchors.insertion_heading.as_str()) {
        return Line::Anchor(line.to_string());
    }

    if field_pattern.is_match(line) {
        return Line::VersionField(line.to_string());
    }

    Line::Text(line.to_string())
}
