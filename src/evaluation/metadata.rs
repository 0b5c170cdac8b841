//! Front-matter extraction
//!
//! An article may open with a `---` delimited block of `key: value` lines.
//! Extraction never fails: text without a leading delimiter yields empty
//! metadata and lines without a `:` are skipped.

use crate::types::ArticleMetadata;

/// Front-matter delimiter
pub const DELIMITER: &str = "---";

/// Extract the leading front-matter block from `text`
pub fn extract_metadata(text: &str) -> ArticleMetadata {
    let mut metadata = ArticleMetadata::new();

    if !text.starts_with(DELIMITER) {
        return metadata;
    }

    let mut parts = text.splitn(3, DELIMITER);
    parts.next(); // empty prefix before the opening delimiter
    let Some(block) = parts.next() else {
        return metadata;
    };

    for line in block.trim().lines() {
        if let Some((key, value)) = line.split_once(':') {
            metadata.insert(key.trim(), value.trim());
        }
    }

    metadata
}

/// Body of the article with the front-matter block removed
pub fn strip_front_matter(text: &str) -> &str {
    if !text.starts_with(DELIMITER) {
        return text;
    }

    let mut parts = text.splitn(3, DELIMITER);
    parts.next();
    parts.next();
    parts.next().unwrap_or(text)
}

/// Render `metadata` as a front-matter block followed by `body`
pub fn render_front_matter(metadata: &ArticleMetadata, body: &str) -> String {
    let mut out = String::from(DELIMITER);
    out.push('\n');
    for (key, value) in metadata.iter() {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(body);
    out
}
