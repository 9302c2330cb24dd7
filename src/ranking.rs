//! Ordering and deduplication of scored posts

use crate::types::ScoredPost;
use std::collections::HashSet;

/// Sort by final score, highest first.
///
/// The sort is stable, so exact ties keep ingestion order and repeated runs
/// over identical input give identical output.
pub fn sort_by_final_score(scored: &mut [ScoredPost]) {
    scored.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
}

/// Drop later occurrences of a post ID, keeping the highest-ranked one
pub fn dedup_by_post_id(sorted: Vec<ScoredPost>) -> Vec<ScoredPost> {
    let mut seen: HashSet<String> = HashSet::with_capacity(sorted.len());
    sorted
        .into_iter()
        .filter(|s| seen.insert(s.post.post_id.clone()))
        .collect()
}

/// Rank a scored batch into unique posts, best first
pub fn rank_posts(mut scored: Vec<ScoredPost>) -> Vec<ScoredPost> {
    sort_by_final_score(&mut scored);
    let ranked = dedup_by_post_id(scored);
    tracing::debug!("Ranked {} unique posts", ranked.len());
    ranked
}

/// Ordered unique post IDs
pub fn ranked_ids(ranked: &[ScoredPost]) -> Vec<String> {
    ranked.iter().map(|s| s.post.post_id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostRecord;
    use chrono::Utc;

    fn scored(id: &str, final_score: f64) -> ScoredPost {
        ScoredPost {
            post: PostRecord {
                post_id: id.to_string(),
                title: format!("Dish {}", id),
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
            engagement_score: 0.0,
            days_since_posted: 0,
            recency_score: 1.0,
            business_weight: 0.0,
            distance_from_user: None,
            distance_norm: None,
            final_score_base: final_score,
            final_score,
        }
    }

    #[test]
    fn test_sorted_descending() {
        let ranked = rank_posts(vec![scored("a", 0.1), scored("b", 0.9), scored("c", 0.5)]);
        assert_eq!(ranked_ids(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ties_keep_ingestion_order() {
        let ranked = rank_posts(vec![
            scored("x", 0.4),
            scored("y", 0.7),
            scored("z", 0.4),
            scored("w", 0.4),
        ]);
        assert_eq!(ranked_ids(&ranked), vec!["y", "x", "z", "w"]);
    }

    #[test]
    fn test_dedup_keeps_highest_ranked() {
        let ranked = rank_posts(vec![scored("dup", 0.2), scored("other", 0.5), scored("dup", 0.8)]);
        assert_eq!(ranked_ids(&ranked), vec!["dup", "other"]);
        assert_eq!(ranked[0].final_score, 0.8);
    }
}
