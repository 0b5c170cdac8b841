// Quality Trend
//
// Compares the mean total score of the most recent evaluations against the
// window before them.

use crate::types::EvaluationRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFigures {
    pub improvement_rate: f64,
    pub recent_average: f64,
    pub historical_average: f64,
    pub evaluation_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trend", rename_all = "snake_case")]
pub enum QualityTrend {
    InsufficientData,
    Improving(TrendFigures),
    Declining(TrendFigures),
}

impl QualityTrend {
    pub fn label(&self) -> &'static str {
        match self {
            QualityTrend::InsufficientData => "insufficient_data",
            QualityTrend::Improving(_) => "improving",
            QualityTrend::Declining(_) => "declining",
        }
    }

    pub fn figures(&self) -> Option<&TrendFigures> {
        match self {
            QualityTrend::InsufficientData => None,
            QualityTrend::Improving(f) | QualityTrend::Declining(f) => Some(f),
        }
    }
}

fn mean_total(records: &[EvaluationRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    Some(records.iter().map(|r| r.total_score).sum::<f64>() / records.len() as f64)
}

/// Recent = the last `window` evaluations. Older = the `window` before them
/// when there are at least twice as many, otherwise the first half.
pub fn analyze_trends(evaluations: &[EvaluationRecord], window: usize) -> QualityTrend {
    let n = evaluations.len();
    if n < 2 {
        return QualityTrend::InsufficientData;
    }

    let window = window.max(1);
    let recent = &evaluations[n.saturating_sub(window)..];
    let older = if n >= window * 2 {
        &evaluations[n - window * 2..n - window]
    } else {
        &evaluations[..n / 2]
    };

    let recent_average = mean_total(recent).unwrap_or(0.0);
    let historical_average = mean_total(older).unwrap_or(recent_average);
    let improvement_rate = recent_average - historical_average;

    let figures = TrendFigures {
        improvement_rate,
        recent_average,
        historical_average,
        evaluation_count: n,
    };

    if improvement_rate > 0.0 {
        QualityTrend::Improving(figures)
    } else {
        QualityTrend::Declining(figures)
    }
}
