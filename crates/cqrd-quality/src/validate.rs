//! Content validation backed by the remote source, with caching and
//! fallback.

use std::sync::Arc;
use std::time::Duration;

use cqrd_cache::{PruneExpired, TtlCache};
use cqrd_core::ContentType;
use cqrd_source::types::ContentValidationRequest;
use cqrd_source::SourceClient;

use crate::keys::{ContentKey, LinkSetKey};
use crate::types::{LinkValidationResult, ValidationResult};

/// Default rule set applied when the caller does not name rules explicitly.
#[must_use]
pub fn default_rules(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Markdown => &[
            "heading-structure",
            "link-validation",
            "image-alt-text",
            "code-block-language",
            "table-structure",
            "readability-score",
        ],
        ContentType::Html => &[
            "html-validation",
            "accessibility-check",
            "seo-optimization",
            "performance-hints",
            "security-check",
        ],
        ContentType::Text => &[
            "spelling-check",
            "grammar-check",
            "readability-score",
            "tone-analysis",
        ],
        ContentType::Unknown => &["basic-validation"],
    }
}

/// Validates content blobs and URL sets against the remote source.
///
/// Results are cached per composite key. Remote failures degrade to
/// optimistic fallbacks instead of propagating; advisory quality scores
/// prefer availability over strictness.
pub struct ValidationService {
    pub(crate) source: Arc<SourceClient>,
    pub(crate) content_cache: Arc<TtlCache<ContentKey, ValidationResult>>,
    pub(crate) link_cache: Arc<TtlCache<LinkSetKey, LinkValidationResult>>,
    pub(crate) content_ttl: Duration,
    pub(crate) link_ttl: Duration,
}

impl ValidationService {
    /// Creates the service with fresh caches and the given TTLs.
    #[must_use]
    pub fn new(source: Arc<SourceClient>, content_ttl: Duration, link_ttl: Duration) -> Self {
        Self {
            source,
            content_cache: Arc::new(TtlCache::new()),
            link_cache: Arc::new(TtlCache::new()),
            content_ttl,
            link_ttl,
        }
    }

    /// Handles for the process-wide cache sweeper.
    #[must_use]
    pub fn caches(&self) -> Vec<Arc<dyn PruneExpired>> {
        vec![
            Arc::clone(&self.content_cache) as Arc<dyn PruneExpired>,
            Arc::clone(&self.link_cache) as Arc<dyn PruneExpired>,
        ]
    }

    /// Validates one content blob.
    ///
    /// The cache key is the content type plus the content fingerprint, so
    /// identical submissions hit the cache without a remote call. `rules`
    /// falls back to the type-specific default set when `None`; `metadata`
    /// rides along to the remote validator untouched and never enters the
    /// cache key. Remote failures are logged and replaced with
    /// [`ValidationResult::fallback`]; this method never fails and
    /// fallbacks are never cached.
    pub async fn validate_content(
        &self,
        content: &str,
        content_type: ContentType,
        rules: Option<&[String]>,
        metadata: Option<&serde_json::Value>,
        use_cache: bool,
    ) -> ValidationResult {
        let key = ContentKey::new(content_type, content);
        if use_cache {
            if let Some(hit) = self.content_cache.get(&key) {
                tracing::debug!(%content_type, "content validation served from cache");
                return hit;
            }
        }

        let resolved: Vec<String> = match rules {
            Some(explicit) => explicit.to_vec(),
            None => default_rules(content_type)
                .iter()
                .map(|rule| (*rule).to_owned())
                .collect(),
        };

        let request = ContentValidationRequest {
            content: content.to_owned(),
            content_type,
            rules: resolved,
            metadata: metadata.cloned(),
        };

        match self.source.validate_content(&request).await {
            Ok(report) => {
                let result = ValidationResult::from(report);
                if use_cache {
                    self.content_cache
                        .set(key, result.clone(), self.content_ttl);
                }
                result
            }
            Err(e) => {
                tracing::warn!(
                    %content_type,
                    error = %e,
                    "content validation failed, returning fallback result"
                );
                ValidationResult::fallback()
            }
        }
    }
}
