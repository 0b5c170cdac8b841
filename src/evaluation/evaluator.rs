//! Article evaluator
//!
//! Ties metadata extraction, the four scorers and the analyzer together into
//! a single [`EvaluationRecord`].

use crate::config::ScoringConfig;
use crate::error::{Result, ScrivenerError};
use crate::evaluation::analyzer::Analyzer;
use crate::evaluation::metadata::extract_metadata;
use crate::evaluation::scoring::score_article;
use crate::types::{jst_now, EvaluationRecord};
use std::path::Path;
use tracing::debug;

/// Scores articles against a scoring configuration
#[derive(Debug, Clone, Default)]
pub struct ArticleEvaluator {
    config: ScoringConfig,
}

impl ArticleEvaluator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Evaluate article text. Scorers see the full text, front matter
    /// included.
    pub fn evaluate_text(&self, article_path: &str, text: &str) -> EvaluationRecord {
        let metadata = extract_metadata(text);
        let scores = score_article(text, &metadata, &self.config.table);
        let analysis = Analyzer::new(&self.config).analyze(text, &scores);

        debug!(
            "Evaluated {}: total {:.1} ({} strengths, {} weaknesses)",
            article_path,
            scores.total(),
            analysis.strengths.len(),
            analysis.weaknesses.len()
        );

        EvaluationRecord {
            article_path: article_path.to_string(),
            timestamp: jst_now(),
            metadata,
            total_score: scores.total(),
            scores,
            strengths: analysis.strengths,
            weaknesses: analysis.weaknesses,
            improvement_suggestions: analysis.suggestions,
        }
    }

    /// Read and evaluate an article file
    pub fn evaluate_file(&self, path: &Path) -> Result<EvaluationRecord> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScrivenerError::NotFound(path.to_path_buf()),
            _ => ScrivenerError::Io(e),
        })?;
        Ok(self.evaluate_text(&path.to_string_lossy(), &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_minimal_article() {
        let evaluator = ArticleEvaluator::default();
        let record = evaluator.evaluate_text("posts/test.md", "---\ntitle: Test\n---\n# Hello\nshort body");

        assert_eq!(record.title(), "Test");
        assert_eq!(record.article_stem(), "test");
        assert!(record.scores.technical_accuracy <= 15.0);
        assert_eq!(record.total_score, record.scores.total());
        assert!(record
            .weaknesses
            .iter()
            .any(|w| w.contains("AIの思考プロセス")));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let evaluator = ArticleEvaluator::default();
        let err = evaluator
            .evaluate_file(Path::new("/nonexistent/article.md"))
            .unwrap_err();
        assert!(matches!(err, ScrivenerError::NotFound(_)));
    }

    #[test]
    fn test_evaluate_file_records_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2025-06-28-rust.md");
        std::fs::write(&path, "---\ntitle: Rust\n---\nbody").unwrap();

        let record = ArticleEvaluator::default().evaluate_file(&path).unwrap();
        assert_eq!(record.article_path, path.to_string_lossy());
        assert_eq!(record.metadata.get("title"), Some("Rust"));
    }
}
