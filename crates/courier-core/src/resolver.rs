use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::join_all;

use courier_persist::StaffDirectory;
use courier_types::Participant;

use crate::telemetry;

struct CachedParticipant {
    participant: Participant,
    expires_at: Instant,
}

/// Address to display identity, cache-aside over the staff directory
///
/// Lookups never fail: a missing profile or a directory error yields an
/// address-only participant, which is not cached.
pub struct ParticipantResolver {
    directory: Arc<dyn StaffDirectory>,
    cache: DashMap<String, CachedParticipant>,
    ttl: Duration,
}

impl ParticipantResolver {
    pub fn new(directory: Arc<dyn StaffDirectory>, ttl: Duration) -> Self {
        Self {
            directory,
            cache: DashMap::new(),
            ttl,
        }
    }

    pub async fn resolve(&self, address: &str) -> Participant {
        let address = address.trim();
        let key = address.to_lowercase();

        if let Some(cached) = self.cache.get(&key) {
            if cached.expires_at > Instant::now() {
                metrics::counter!(telemetry::DIRECTORY_CACHE_HITS_TOTAL).increment(1);
                return Participant {
                    email: address.to_string(),
                    ..cached.participant.clone()
                };
            }
        }
        // Expired entries are dropped before the lookup
        self.cache.remove_if(&key, |_, cached| cached.expires_at <= Instant::now());

        metrics::counter!(telemetry::DIRECTORY_CACHE_MISSES_TOTAL).increment(1);

        match self.directory.find_by_email(&key).await {
            Ok(Some(profile)) => {
                let participant = profile.to_participant(address);
                self.cache.insert(
                    key,
                    CachedParticipant {
                        participant: participant.clone(),
                        expires_at: Instant::now() + self.ttl,
                    },
                );
                participant
            }
            Ok(None) => Participant::address_only(address),
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Staff directory lookup failed");
                Participant::address_only(address)
            }
        }
    }

    /// Resolve several addresses concurrently, keeping input order
    pub async fn resolve_all(&self, addresses: &[String]) -> Vec<Participant> {
        join_all(addresses.iter().map(|address| self.resolve(address))).await
    }

    pub fn invalidate(&self, address: &str) {
        self.cache.remove(&address.trim().to_lowercase());
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}
