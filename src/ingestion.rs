//! Validation and durable append of new posts

use crate::error::IngestError;
use crate::store::RecordStore;
use crate::types::{NewPost, PostRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Accepts validated posts into a record store
pub struct Ingestion {
    store: Arc<dyn RecordStore>,
}

impl Ingestion {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Validate and append one post
    pub async fn add_post(&self, post: NewPost) -> Result<PostRecord, IngestError> {
        let record = match validate(post) {
            Ok(record) => record,
            Err(e) => {
                warn!("Rejected post: {}", e);
                return Err(e);
            }
        };

        self.store.append(record.clone()).await.map_err(|e| {
            warn!("Append to {} failed for post {}: {}", self.store.name(), record.post_id, e);
            IngestError::from(e)
        })?;

        info!("Ingested post {} (business={})", record.post_id, record.is_business_post);
        Ok(record)
    }
}

/// Turn an unvalidated post into a record, rejecting anything malformed
pub fn validate(post: NewPost) -> Result<PostRecord, IngestError> {
    let post_id = required(post.post_id, "postId")?.trim().to_string();
    if post_id.is_empty() {
        return Err(IngestError::Validation("postId must not be empty".into()));
    }

    let title = required(post.title, "title")?;
    let impressions = counter(post.impressions, "impressions")?;
    let likes_count = counter(post.likes_count, "likesCount")?;
    let comments_count = counter(post.comments_count, "commentsCount")?;

    let raw_created_at = required(post.created_at, "createdAt")?;
    let created_at = parse_created_at(&raw_created_at).ok_or_else(|| {
        IngestError::Validation(format!("createdAt '{}' is not a valid date-time", raw_created_at))
    })?;

    let is_business_post = required(post.is_business_post, "isBusinessPost")?;

    match (post.latitude, post.longitude) {
        (None, None) => {}
        (Some(lat), Some(lon)) => check_coordinates(lat, lon)?,
        _ => {
            return Err(IngestError::Validation(
                "latitude and longitude must be supplied together".into(),
            ))
        }
    }

    Ok(PostRecord {
        post_id,
        title,
        impressions,
        likes_count,
        comments_count,
        created_at,
        is_business_post,
        latitude: post.latitude,
        longitude: post.longitude,
    })
}

/// Parse a post timestamp. Times without an offset are taken as UTC.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, IngestError> {
    value.ok_or_else(|| IngestError::Validation(format!("missing field '{}'", field)))
}

fn counter(value: Option<i64>, field: &str) -> Result<u64, IngestError> {
    let value = required(value, field)?;
    u64::try_from(value)
        .map_err(|_| IngestError::Validation(format!("{} must be non-negative, got {}", field, value)))
}

fn check_coordinates(lat: f64, lon: f64) -> Result<(), IngestError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(IngestError::Validation(format!("latitude {} out of range", lat)));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(IngestError::Validation(format!("longitude {} out of range", lon)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::TimeZone;

    fn new_post(id: &str) -> NewPost {
        NewPost {
            post_id: Some(id.to_string()),
            title: Some("Shakshuka".to_string()),
            impressions: Some(1200),
            likes_count: Some(85),
            comments_count: Some(9),
            created_at: Some("2024-05-04 18:30:00".to_string()),
            is_business_post: Some(true),
            latitude: Some(32.0853),
            longitude: Some(34.7818),
        }
    }

    #[test]
    fn test_parse_created_at_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 4, 18, 30, 0).unwrap();
        assert_eq!(parse_created_at("2024-05-04 18:30:00"), Some(expected));
        assert_eq!(parse_created_at("2024-05-04T18:30:00"), Some(expected));
        assert_eq!(parse_created_at("2024-05-04T18:30:00Z"), Some(expected));
        assert_eq!(parse_created_at("2024-05-04T20:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_created_at("2024-05-04"),
            Some(Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_created_at("yesterday"), None);
        assert_eq!(parse_created_at("2024-13-01"), None);
    }

    #[test]
    fn test_validate_accepts_complete_post() {
        let record = validate(new_post(" P00007 ")).unwrap();
        assert_eq!(record.post_id, "P00007");
        assert_eq!(record.likes_count, 85);
        assert!(record.is_business_post);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let cases: Vec<(&str, NewPost)> = vec![
            ("empty id", NewPost { post_id: Some("  ".into()), ..new_post("x") }),
            ("missing createdAt", NewPost { created_at: None, ..new_post("x") }),
            ("bad createdAt", NewPost { created_at: Some("soon".into()), ..new_post("x") }),
            ("negative likes", NewPost { likes_count: Some(-1), ..new_post("x") }),
            ("missing title", NewPost { title: None, ..new_post("x") }),
            ("half location", NewPost { longitude: None, ..new_post("x") }),
            ("latitude range", NewPost { latitude: Some(91.0), ..new_post("x") }),
        ];

        for (name, post) in cases {
            assert!(
                matches!(validate(post), Err(IngestError::Validation(_))),
                "case '{}' should be a validation error",
                name
            );
        }
    }

    #[test]
    fn test_location_optional() {
        let post = NewPost { latitude: None, longitude: None, ..new_post("P1") };
        let record = validate(post).unwrap();
        assert!(record.coordinates().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let ingestion = Ingestion::new(Arc::new(InMemoryStore::default()));
        ingestion.add_post(new_post("P00001")).await.unwrap();

        let err = ingestion.add_post(new_post("P00001")).await.unwrap_err();
        assert!(matches!(err, IngestError::DuplicateId(id) if id == "P00001"));
    }
}
