//! Cache for created segments
//!
//! Creation responses are kept here so follow-up customer and metadata reads
//! do not re-run the pipeline. Entries expire after the configured TTL, and
//! the oldest entry is evicted once the cache grows past capacity.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use aether_config::CacheConfig;
use aether_core::{CustomerProfile, SegmentResponse};

/// A created segment retained for follow-up reads
#[derive(Debug, Clone)]
pub struct CachedSegment {
    pub response: SegmentResponse,
    /// Full customer list; the response itself embeds a capped preview
    pub customers: Vec<CustomerProfile>,
    /// Rendered warehouse query that produced the segment
    pub query: String,
    pub created_at: DateTime<Utc>,
}

/// Concurrent segment cache with TTL and capacity bounds
///
/// Inserting under an existing id replaces the entry atomically; readers see
/// either the old segment or the new one, never a mix. Expired entries are
/// dropped lazily on read.
pub struct SegmentCache {
    segments: DashMap<String, Arc<CachedSegment>>,
    capacity: usize,
    ttl: Duration,
}

impl SegmentCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            segments: DashMap::new(),
            capacity: config.capacity.max(1),
            ttl: Duration::hours(config.ttl_hours as i64),
        }
    }

    /// Publish a segment under its id, evicting the oldest entry when full
    pub fn insert(&self, segment: CachedSegment) {
        let segment_id = segment.response.segment_id.clone();
        self.segments.insert(segment_id.clone(), Arc::new(segment));

        if self.segments.len() > self.capacity {
            if let Some(evicted) = self.evict_oldest() {
                debug!(segment_id = %evicted, "evicted oldest cached segment");
            }
        }
        debug!(segment_id = %segment_id, cached = self.segments.len(), "segment cached");
    }

    /// Look up a live entry; an expired entry is removed and reads as missing
    pub fn get(&self, segment_id: &str) -> Option<Arc<CachedSegment>> {
        let entry = self.segments.get(segment_id)?;
        if Utc::now() - entry.created_at > self.ttl {
            // Release the read guard before removing, DashMap would deadlock
            drop(entry);
            self.segments.remove(segment_id);
            debug!(segment_id, "cached segment expired");
            return None;
        }
        Some(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn evict_oldest(&self) -> Option<String> {
        // Linear scan; capacity stays small enough for this to be cheap
        let oldest = self
            .segments
            .iter()
            .min_by_key(|entry| entry.value().created_at)
            .map(|entry| entry.key().clone())?;
        self.segments.remove(&oldest);
        Some(oldest)
    }
}
