//! Offline evaluation of a ranking: Precision@K, Recall@K and coverage.
//!
//! Ground truth is every post whose engagement score is strictly above the
//! batch median. This is a sanity check of the blend, not a serving concern.

use crate::types::ScoredPost;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub const DEFAULT_K_VALUES: [usize; 3] = [5, 10, 20];

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub precision: BTreeMap<String, f64>,
    pub recall: BTreeMap<String, f64>,
    pub coverage: f64,
    #[serde(skip)]
    k_values: Vec<usize>,
}

impl EvaluationReport {
    pub fn precision_at(&self, k: usize) -> Option<f64> {
        self.precision.get(&format!("Precision@{}", k)).copied()
    }

    pub fn recall_at(&self, k: usize) -> Option<f64> {
        self.recall.get(&format!("Recall@{}", k)).copied()
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Popularity-Based Model Evaluation Metrics:")?;
        for k in &self.k_values {
            if let Some(p) = self.precision_at(*k) {
                writeln!(f, "Precision@{}: {:.4}", k, p)?;
            }
        }
        for k in &self.k_values {
            if let Some(r) = self.recall_at(*k) {
                writeln!(f, "Recall@{}: {:.4}", k, r)?;
            }
        }
        write!(f, "Coverage: {:.4}", self.coverage)
    }
}

/// Evaluate `ranked` (post IDs, best first) against the scored batch it came from
pub fn evaluate(scored: &[ScoredPost], ranked: &[String], k_values: &[usize]) -> EvaluationReport {
    let engagement: Vec<f64> = scored.iter().map(|s| s.engagement_score).collect();
    let relevant: HashSet<&str> = match median(&engagement) {
        Some(m) => scored
            .iter()
            .filter(|s| s.engagement_score > m)
            .map(|s| s.post.post_id.as_str())
            .collect(),
        None => HashSet::new(),
    };

    let mut precision = BTreeMap::new();
    let mut recall = BTreeMap::new();

    for &k in k_values {
        let hits = ranked
            .iter()
            .take(k)
            .filter(|id| relevant.contains(id.as_str()))
            .count() as f64;

        let p = if k == 0 { 0.0 } else { hits / k as f64 };
        let r = if relevant.is_empty() { 0.0 } else { hits / relevant.len() as f64 };

        precision.insert(format!("Precision@{}", k), p);
        recall.insert(format!("Recall@{}", k), r);
    }

    let batch_ids: HashSet<&str> = scored.iter().map(|s| s.post.post_id.as_str()).collect();
    let recommended: HashSet<&str> = ranked
        .iter()
        .map(String::as_str)
        .filter(|id| batch_ids.contains(id))
        .collect();
    let coverage = if batch_ids.is_empty() {
        0.0
    } else {
        recommended.len() as f64 / batch_ids.len() as f64
    };

    EvaluationReport {
        precision,
        recall,
        coverage,
        k_values: k_values.to_vec(),
    }
}

/// Median, averaging the two middle values of an even-length input
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostRecord;
    use chrono::Utc;

    fn scored(id: &str, engagement: f64) -> ScoredPost {
        ScoredPost {
            post: PostRecord {
                post_id: id.to_string(),
                title: String::new(),
                impressions: 0,
                likes_count: 0,
                comments_count: 0,
                created_at: Utc::now(),
                is_business_post: false,
                latitude: None,
                longitude: None,
            },
            likes_norm: 0.0,
            comments_norm: 0.0,
            impressions_norm: 0.0,
            engagement_score: engagement,
            days_since_posted: 0,
            recency_score: 1.0,
            business_weight: 0.0,
            distance_from_user: None,
            distance_norm: None,
            final_score_base: engagement,
            final_score: engagement,
        }
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_precision_recall_coverage() {
        // median engagement is 0.45, so p1..p3 are relevant
        let batch: Vec<ScoredPost> = [0.9, 0.8, 0.7, 0.2, 0.1, 0.0]
            .iter()
            .enumerate()
            .map(|(i, e)| scored(&format!("p{}", i + 1), *e))
            .collect();
        let ranked: Vec<String> = ["p1", "p4", "p2", "p5", "p3", "p6"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = evaluate(&batch, &ranked, &[2, 5]);

        assert_eq!(report.precision_at(2), Some(0.5));
        assert_eq!(report.recall_at(2), Some(1.0 / 3.0));
        assert_eq!(report.precision_at(5), Some(3.0 / 5.0));
        assert_eq!(report.recall_at(5), Some(1.0));
        assert_eq!(report.coverage, 1.0);
    }

    #[test]
    fn test_partial_coverage() {
        let batch = vec![scored("a", 0.1), scored("b", 0.2), scored("c", 0.3), scored("d", 0.4)];
        let ranked = vec!["d".to_string()];
        let report = evaluate(&batch, &ranked, &DEFAULT_K_VALUES);
        assert_eq!(report.coverage, 0.25);
        assert_eq!(report.precision_at(5), Some(0.2));
    }

    #[test]
    fn test_constant_engagement_has_no_relevant_posts() {
        let batch = vec![scored("a", 0.5), scored("b", 0.5)];
        let ranked = vec!["a".to_string(), "b".to_string()];
        let report = evaluate(&batch, &ranked, &[5]);
        assert_eq!(report.recall_at(5), Some(0.0));
        assert_eq!(report.precision_at(5), Some(0.0));
    }

    #[test]
    fn test_display() {
        let batch = vec![scored("a", 1.0), scored("b", 0.0)];
        let ranked = vec!["a".to_string(), "b".to_string()];
        let text = evaluate(&batch, &ranked, &[5]).to_string();
        assert!(text.contains("Precision@5: 0.2000"));
        assert!(text.contains("Recall@5: 1.0000"));
        assert!(text.ends_with("Coverage: 1.0000"));
    }
}
