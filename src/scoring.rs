//! Scoring functions for the ranking pipeline

use crate::error::RankError;
use crate::geo::distance_km;
use crate::types::*;
use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Min-max normalize a column.
///
/// A constant column (which includes empty and single-element input) is
/// returned unchanged rather than divided by a zero spread, so its values are
/// not necessarily within [0, 1].
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if values.is_empty() || max == min {
        return values.to_vec();
    }

    values.iter().map(|&v| (v - min) / (max - min)).collect()
}

/// Weighted blend of the normalized engagement counters
pub fn engagement_score(
    likes_norm: f64,
    comments_norm: f64,
    impressions_norm: f64,
    weights: &ScoreWeights,
) -> f64 {
    weights.likes * likes_norm
        + weights.comments * comments_norm
        + weights.impressions * impressions_norm
}

/// Whole days elapsed between `created_at` and `now`, floored.
/// Future-dated posts give a negative count.
pub fn days_since_posted(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(created_at)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_DAY)
}

/// Exponential freshness decay. Not clamped: negative ages score above 1.
pub fn recency_score(days_since_posted: i64, decay: f64) -> f64 {
    (-decay * days_since_posted as f64).exp()
}

pub fn business_weight(is_business_post: bool, weights: &ScoreWeights) -> f64 {
    if is_business_post {
        weights.business_boost
    } else {
        0.0
    }
}

/// Final score before any proximity adjustment
pub fn compute_base_score(
    engagement: f64,
    recency: f64,
    business: f64,
    weights: &ScoreWeights,
) -> f64 {
    weights.engagement * engagement + weights.recency * recency + weights.business * business
}

/// Batch-relative proximity: `1 - d / max_d`.
///
/// Posts without a distance are treated as least proximate (0). When every
/// known distance is zero the whole batch is equally close and scores 1.
pub fn normalize_distances(distances: &[Option<f64>]) -> Vec<f64> {
    let max_distance = distances.iter().flatten().copied().fold(0.0f64, f64::max);

    distances
        .iter()
        .map(|d| match d {
            None => 0.0,
            Some(_) if max_distance <= 0.0 => 1.0,
            Some(d) => 1.0 - d / max_distance,
        })
        .collect()
}

/// Blend the base score with the normalized distance
pub fn blend_proximity(base: f64, distance_norm: f64, weights: &ScoreWeights) -> f64 {
    (1.0 - weights.distance) * base + weights.distance * distance_norm
}

/// Score a whole batch of records against a single instant.
///
/// Output order matches input order. Fails without partial output when a
/// coordinate or score is not finite.
pub fn score_batch(
    records: &[PostRecord],
    now: DateTime<Utc>,
    viewer: Option<ViewerLocation>,
    weights: &ScoreWeights,
) -> Result<Vec<ScoredPost>, RankError> {
    if let Some(v) = viewer {
        if !v.latitude.is_finite() || !v.longitude.is_finite() {
            return Err(RankError::Computation(format!(
                "viewer location is not finite: ({}, {})",
                v.latitude, v.longitude
            )));
        }
    }

    let likes = normalized_column(records, |r| r.likes_count);
    let comments = normalized_column(records, |r| r.comments_count);
    let impressions = normalized_column(records, |r| r.impressions);

    let mut scored = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let engagement = engagement_score(likes[idx], comments[idx], impressions[idx], weights);
        let days = days_since_posted(record.created_at, now);
        let recency = recency_score(days, weights.recency_decay);
        let business = business_weight(record.is_business_post, weights);
        let base = compute_base_score(engagement, recency, business, weights);

        scored.push(ScoredPost {
            post: record.clone(),
            likes_norm: likes[idx],
            comments_norm: comments[idx],
            impressions_norm: impressions[idx],
            engagement_score: engagement,
            days_since_posted: days,
            recency_score: recency,
            business_weight: business,
            distance_from_user: None,
            distance_norm: None,
            final_score_base: base,
            final_score: base,
        });
    }

    if let Some(viewer) = viewer {
        apply_proximity(&mut scored, viewer, weights)?;
    }

    if let Some(bad) = scored.iter().find(|s| !s.final_score.is_finite()) {
        return Err(RankError::Computation(format!(
            "non-finite final score for post '{}'",
            bad.post.post_id
        )));
    }

    Ok(scored)
}

fn normalized_column(records: &[PostRecord], counter: impl Fn(&PostRecord) -> u64) -> Vec<f64> {
    let raw: Vec<f64> = records.iter().map(|r| counter(r) as f64).collect();
    normalize(&raw)
}

fn apply_proximity(
    scored: &mut [ScoredPost],
    viewer: ViewerLocation,
    weights: &ScoreWeights,
) -> Result<(), RankError> {
    let mut distances = Vec::with_capacity(scored.len());
    for s in scored.iter() {
        let distance = match s.post.coordinates() {
            Some(at) if !at.latitude.is_finite() || !at.longitude.is_finite() => {
                return Err(RankError::Computation(format!(
                    "post '{}' has non-finite coordinates",
                    s.post.post_id
                )));
            }
            Some(at) => Some(distance_km(
                viewer.latitude,
                viewer.longitude,
                at.latitude,
                at.longitude,
            )),
            None => None,
        };
        distances.push(distance);
    }

    let norms = normalize_distances(&distances);
    for ((s, distance), norm) in scored.iter_mut().zip(distances).zip(norms) {
        s.distance_from_user = distance;
        s.distance_norm = Some(norm);
        s.final_score = blend_proximity(s.final_score_base, norm, weights);
    }

    Ok(())
}
