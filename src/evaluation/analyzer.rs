//! Strengths, weaknesses and improvement suggestions
//!
//! Classification is per dimension (strength, weakness or neither) followed by
//! content checks that only ever add entries.

use crate::config::ScoringConfig;
use crate::evaluation::predicates;
use crate::types::ScoreSet;

pub const RICH_CODE_STRENGTH: &str = "豊富なコード例";
pub const MORE_CODE_SUGGESTION: &str = "より多くのコード例を追加";
pub const THOUGHT_PROCESS_STRENGTH: &str = "AIの思考プロセスが明確";
pub const THOUGHT_PROCESS_WEAKNESS: &str = "AIの思考プロセスセクションが不足";
pub const THOUGHT_PROCESS_SUGGESTION: &str = "記事冒頭にAIの思考プロセスを追加";
pub const BALANCE_STRENGTH: &str = "文章とコードの良好なバランス";
pub const BALANCE_SUGGESTION: &str = "文章とコードのバランスを調整（目標: 70:30）";

/// Analyzer output, in the order entries were produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

pub struct Analyzer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> Analyzer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, text: &str, scores: &ScoreSet) -> Analysis {
        let mut analysis = Analysis::default();

        for (dimension, score) in scores.iter() {
            if score >= self.config.strength_threshold {
                analysis
                    .strengths
                    .push(format!("{}: 優秀なスコア ({:.1}/25)", dimension, score));
            } else if score < self.config.weakness_threshold {
                analysis
                    .weaknesses
                    .push(format!("{}: 改善が必要 ({:.1}/25)", dimension, score));
            }
        }

        if predicates::count_fence_lines(text) > self.config.rich_code_fences {
            analysis.strengths.push(RICH_CODE_STRENGTH.to_string());
        } else {
            analysis.suggestions.push(MORE_CODE_SUGGESTION.to_string());
        }

        if text.contains(&self.config.thought_process_marker) {
            analysis.strengths.push(THOUGHT_PROCESS_STRENGTH.to_string());
        } else {
            analysis.weaknesses.push(THOUGHT_PROCESS_WEAKNESS.to_string());
            analysis
                .suggestions
                .push(THOUGHT_PROCESS_SUGGESTION.to_string());
        }

        let ratio = code_ratio(text);
        if (self.config.code_balance_min..=self.config.code_balance_max).contains(&ratio) {
            analysis.strengths.push(BALANCE_STRENGTH.to_string());
        } else {
            analysis.suggestions.push(BALANCE_SUGGESTION.to_string());
        }

        analysis
    }
}

/// Code blocks per blank-line separator, with the denominator floored at 1
pub fn code_ratio(text: &str) -> f64 {
    let blocks = predicates::code_blocks(text).len() as f64;
    let paragraphs = predicates::count_blank_lines(text).max(1) as f64;
    blocks / paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(ta: f64, r: f64, p: f64, o: f64) -> ScoreSet {
        ScoreSet {
            technical_accuracy: ta,
            readability: r,
            practicality: p,
            originality: o,
        }
    }

    #[test]
    fn test_dimension_classification() {
        let config = ScoringConfig::default();
        let analysis = Analyzer::new(&config).analyze("", &scores(20.0, 19.9, 15.0, 14.9));

        assert_eq!(analysis.strengths[0], "technical_accuracy: 優秀なスコア (20.0/25)");
        assert_eq!(analysis.weaknesses[0], "originality: 改善が必要 (14.9/25)");
        assert!(!analysis.strengths.iter().any(|s| s.starts_with("readability")));
        assert!(!analysis.weaknesses.iter().any(|s| s.starts_with("practicality")));
    }

    #[test]
    fn test_empty_text_suggestions() {
        let config = ScoringConfig::default();
        let analysis = Analyzer::new(&config).analyze("", &scores(17.0, 17.0, 17.0, 17.0));

        assert_eq!(analysis.weaknesses, vec![THOUGHT_PROCESS_WEAKNESS]);
        assert_eq!(
            analysis.suggestions,
            vec![MORE_CODE_SUGGESTION, THOUGHT_PROCESS_SUGGESTION, BALANCE_SUGGESTION]
        );
        assert!(analysis.strengths.is_empty());
    }

    #[test]
    fn test_content_strengths() {
        let config = ScoringConfig::default();
        let mut text = String::from("## なぜこの記事を書こうと思ったのか\n\n");
        for _ in 0..3 {
            text.push_str("説明\n\n```python\nx = 1\n```\n\n");
        }
        text.push_str("a\n\nb\n\nc\n\nd\n\ne\n\n");
        // 3 blocks over 12 separators is within the band
        let analysis = Analyzer::new(&config).analyze(&text, &scores(17.0, 17.0, 17.0, 17.0));

        assert_eq!(
            analysis.strengths,
            vec![RICH_CODE_STRENGTH, THOUGHT_PROCESS_STRENGTH, BALANCE_STRENGTH]
        );
        assert!(analysis.suggestions.is_empty());
    }

    #[test]
    fn test_code_ratio_floor() {
        assert_eq!(code_ratio("```\nx\n```"), 1.0);
        assert_eq!(code_ratio("no code"), 0.0);
    }
}
