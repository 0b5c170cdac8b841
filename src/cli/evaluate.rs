//! Evaluate articles and print their scores

use anyhow::Context;
use scrivener_core::{storage::Stores, ArticleEvaluator, ScrivenerConfig};
use std::path::PathBuf;
use tracing::warn;

pub async fn handle(
    config: &ScrivenerConfig,
    files: Vec<PathBuf>,
    record: bool,
    json: bool,
) -> anyhow::Result<()> {
    let evaluator = ArticleEvaluator::new(config.scoring.clone());
    let mut records = Vec::with_capacity(files.len());

    for file in &files {
        match evaluator.evaluate_file(file) {
            Ok(evaluation) => records.push(evaluation),
            Err(e) => warn!("Skipping {}: {}", file.display(), e),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for evaluation in &records {
            println!("{} ({})", evaluation.title(), evaluation.article_path);
            for (dimension, score) in evaluation.scores.iter() {
                println!("  {:<20} {:>5.1}", dimension.as_str(), score);
            }
            println!("  {:<20} {:>5.1}", "total", evaluation.total_score);
            for strength in &evaluation.strengths {
                println!("  + {}", strength);
            }
            for weakness in &evaluation.weaknesses {
                println!("  - {}", weakness);
            }
            for suggestion in &evaluation.improvement_suggestions {
                println!("  > {}", suggestion);
            }
        }
    }

    if record && !records.is_empty() {
        let stores = Stores::from_paths(&config.paths);
        let appended = records.clone();
        stores
            .evaluations
            .update_blocking(move |history| history.evaluations.extend(appended))
            .await
            .context("Failed to record evaluations")?;
        println!(
            "✓ Recorded {} evaluation(s) in {}",
            records.len(),
            stores.evaluations.path().display()
        );
    }

    Ok(())
}
