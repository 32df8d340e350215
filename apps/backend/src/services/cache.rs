//! Quiz set cache keyed by quiz id.
//!
//! Generated sets are cached so the question and answer phases do not need
//! to hit PostgreSQL. Two backends exist: an in-process map with a TTL, and
//! an S3-compatible bucket (JSON objects under `quizzes/{quiz_id}.json`).
//! A miss is never fatal; callers rebuild the set from `quiz_items`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client, Config,
};
use quiz_core::GeneratedQuizSet;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("S3 error: {0}")]
    S3(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub enum QuizCache {
    Memory(MemoryQuizCache),
    S3(S3QuizCache),
}

impl QuizCache {
    pub async fn put(&self, quiz_id: Uuid, set: &GeneratedQuizSet) -> Result<(), CacheError> {
        match self {
            QuizCache::Memory(cache) => {
                cache.put(quiz_id, set.clone()).await;
                Ok(())
            }
            QuizCache::S3(cache) => cache.put(quiz_id, set).await,
        }
    }

    pub async fn get(&self, quiz_id: Uuid) -> Result<Option<GeneratedQuizSet>, CacheError> {
        match self {
            QuizCache::Memory(cache) => Ok(cache.get(quiz_id).await),
            QuizCache::S3(cache) => cache.get(quiz_id).await,
        }
    }

    pub async fn remove(&self, quiz_id: Uuid) -> Result<(), CacheError> {
        match self {
            QuizCache::Memory(cache) => {
                cache.remove(quiz_id).await;
                Ok(())
            }
            QuizCache::S3(cache) => cache.remove(quiz_id).await,
        }
    }
}

/// In-process cache; entries expire `ttl` after insertion.
pub struct MemoryQuizCache {
    ttl: Duration,
    entries: RwLock<HashMap<Uuid, (GeneratedQuizSet, Instant)>>,
}

impl MemoryQuizCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn put(&self, quiz_id: Uuid, set: GeneratedQuizSet) {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, (_, inserted)| inserted.elapsed() < ttl);
        entries.insert(quiz_id, (set, Instant::now()));
    }

    pub async fn get(&self, quiz_id: Uuid) -> Option<GeneratedQuizSet> {
        let entries = self.entries.read().await;
        entries
            .get(&quiz_id)
            .filter(|(_, inserted)| inserted.elapsed() < self.ttl)
            .map(|(set, _)| set.clone())
    }

    pub async fn remove(&self, quiz_id: Uuid) {
        self.entries.write().await.remove(&quiz_id);
    }
}

/// S3/R2 bucket holding one JSON object per quiz.
pub struct S3QuizCache {
    client: Client,
    bucket: String,
}

impl S3QuizCache {
    /// Create the cache from environment variables.
    ///
    /// - S3_BUCKET: Bucket name (required)
    /// - S3_REGION: Region, "auto" for Cloudflare R2
    /// - S3_ENDPOINT: Custom endpoint URL
    /// - S3_ACCESS_KEY / S3_SECRET_KEY: Static credentials; when absent the
    ///   default AWS credential chain is used
    pub async fn from_env() -> Result<Self, CacheError> {
        let bucket = std::env::var("S3_BUCKET")
            .map_err(|_| CacheError::Config("S3_BUCKET not set".to_string()))?;
        let region = std::env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string());
        let endpoint = std::env::var("S3_ENDPOINT").ok();

        let mut config_builder = match (
            std::env::var("S3_ACCESS_KEY").ok(),
            std::env::var("S3_SECRET_KEY").ok(),
        ) {
            (Some(access_key), Some(secret_key)) => {
                let credentials = Credentials::new(access_key, secret_key, None, None, "env");
                Config::builder()
                    .credentials_provider(credentials)
                    .behavior_version_latest()
            }
            _ => {
                let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                aws_sdk_s3::config::Builder::from(&shared)
            }
        };
        config_builder = config_builder.region(Region::new(region));

        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url).force_path_style(true);
        }

        let client = Client::from_conf(config_builder.build());
        Ok(Self { client, bucket })
    }

    pub async fn put(&self, quiz_id: Uuid, set: &GeneratedQuizSet) -> Result<(), CacheError> {
        let key = Self::make_key(quiz_id);
        let body = serde_json::to_vec(set)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| CacheError::S3(e.to_string()))?;

        tracing::debug!("Cached quiz set in S3: {}", key);
        Ok(())
    }

    pub async fn get(&self, quiz_id: Uuid) -> Result<Option<GeneratedQuizSet>, CacheError> {
        let key = Self::make_key(quiz_id);
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let err_str = e.to_string();
                if err_str.contains("NoSuchKey") || err_str.contains("not found") {
                    return Ok(None);
                }
                return Err(CacheError::S3(err_str));
            }
        };

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| CacheError::S3(e.to_string()))?
            .into_bytes();

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub async fn remove(&self, quiz_id: Uuid) -> Result<(), CacheError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(Self::make_key(quiz_id))
            .send()
            .await
            .map_err(|e| CacheError::S3(e.to_string()))?;
        Ok(())
    }

    /// Format: `quizzes/{quiz_id}.json`
    pub fn make_key(quiz_id: Uuid) -> String {
        format!("quizzes/{}.json", quiz_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::{generate, VocabularyItem};

    fn sample_set() -> GeneratedQuizSet {
        let pool: Vec<VocabularyItem> = (1..=5)
            .map(|id| VocabularyItem::new(id, format!("word{}", id), format!("語{}", id), 1))
            .collect();
        generate(&pool, 3, 4).unwrap()
    }

    #[tokio::test]
    async fn test_memory_put_get() {
        let cache = QuizCache::Memory(MemoryQuizCache::new(Duration::from_secs(60)));
        let quiz_id = Uuid::new_v4();
        let set = sample_set();

        cache.put(quiz_id, &set).await.unwrap();
        assert_eq!(cache.get(quiz_id).await.unwrap(), Some(set));
        assert_eq!(cache.get(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_remove() {
        let cache = QuizCache::Memory(MemoryQuizCache::new(Duration::from_secs(60)));
        let quiz_id = Uuid::new_v4();

        cache.put(quiz_id, &sample_set()).await.unwrap();
        cache.remove(quiz_id).await.unwrap();
        assert!(cache.get(quiz_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_entries_expire() {
        let cache = MemoryQuizCache::new(Duration::from_millis(20));
        let stale = Uuid::new_v4();
        cache.put(stale, sample_set()).await;

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get(stale).await.is_none());

        // Inserting sweeps expired entries
        let fresh = Uuid::new_v4();
        cache.put(fresh, sample_set()).await;
        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key(&fresh));
    }

    #[test]
    fn test_make_key() {
        let quiz_id = Uuid::nil();
        assert_eq!(
            S3QuizCache::make_key(quiz_id),
            "quizzes/00000000-0000-0000-0000-000000000000.json"
        );
    }
}
