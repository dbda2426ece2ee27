use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Table size below which idle slots are never swept.
const MIN_SWEEP_LEN: usize = 64;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    generation: u64,
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<CacheEntry<V>>>>;

struct SlotTable<V> {
    slots: HashMap<String, Slot<V>>,
    sweep_at: usize,
}

/// Per-key cache around a remote call. At most one fetch per key is in
/// flight at any time.
pub struct RemoteFetchCache<V> {
    table: Mutex<SlotTable<V>>,
    generation: AtomicU64,
    serve_stale_on_error: bool,
}

impl<V: Clone + Send> Default for RemoteFetchCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> RemoteFetchCache<V> {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(SlotTable {
                slots: HashMap::new(),
                sweep_at: MIN_SWEEP_LEN,
            }),
            generation: AtomicU64::new(0),
            serve_stale_on_error: false,
        }
    }

    /// When a re-fetch fails, return the expired last-good value instead.
    pub fn with_stale_on_error(mut self, enabled: bool) -> Self {
        self.serve_stale_on_error = enabled;
        self
    }

    fn lock_table(&self) -> std::sync::MutexGuard<'_, SlotTable<V>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &str) -> Slot<V> {
        let mut table = self.lock_table();
        if !table.slots.contains_key(key) && table.slots.len() >= table.sweep_at {
            let generation = self.generation.load(Ordering::SeqCst);
            sweep(&mut table.slots, generation);
            table.sweep_at = (table.slots.len() * 2).max(MIN_SWEEP_LEN);
        }
        table
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }

    /// Returns `(value, from_cache)`. Concurrent callers for the same key wait
    /// on the in-flight fetch and then read its stored result. A failed fetch
    /// leaves the existing entry as it was.
    pub async fn fetch<F, Fut, E>(
        &self,
        key: &str,
        expiry: Duration,
        fetch: F,
    ) -> std::result::Result<(V, bool), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;
        let generation = self.generation.load(Ordering::SeqCst);

        if let Some(cached) = entry.as_ref().filter(|e| e.generation == generation) {
            if cached.expires_at > Instant::now() {
                tracing::debug!("Cache hit for key {}", key);
                return Ok((cached.value.clone(), true));
            }
        }

        match fetch().await {
            Ok(value) => {
                *entry = Some(CacheEntry {
                    value: value.clone(),
                    expires_at: Instant::now() + expiry,
                    generation: self.generation.load(Ordering::SeqCst),
                });
                Ok((value, false))
            }
            Err(e) => match entry.as_ref() {
                Some(stale) if self.serve_stale_on_error && stale.generation == generation => {
                    tracing::warn!("Fetch failed for key {}; serving stale value", key);
                    Ok((stale.value.clone(), true))
                }
                _ => Err(e),
            },
        }
    }

    /// Cache-clear signal for one identity, e.g. after a write on its behalf.
    /// An idle slot is dropped; one with a fetch in flight is emptied once
    /// that fetch completes.
    pub async fn invalidate(&self, key: &str) {
        let busy = {
            let mut table = self.lock_table();
            let in_flight = table.slots.get(key).map(|slot| Arc::strong_count(slot) > 1);
            match in_flight {
                Some(true) => table.slots.get(key).cloned(),
                Some(false) => {
                    table.slots.remove(key);
                    None
                }
                None => None,
            }
        };
        if let Some(slot) = busy {
            *slot.lock().await = None;
        }
        tracing::debug!("Cache invalidated for key {}", key);
    }

    /// Drops every stored value. Fetches already in flight keep their slot,
    /// so same-key callers still share them, and their results stay valid.
    pub fn clear(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut table = self.lock_table();
        sweep(&mut table.slots, generation);
        table.sweep_at = (table.slots.len() * 2).max(MIN_SWEEP_LEN);
    }

    /// Removes idle slots whose value is missing, expired or cleared.
    pub fn prune(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        let mut table = self.lock_table();
        sweep(&mut table.slots, generation);
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.lock_table().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sweep<V>(slots: &mut HashMap<String, Slot<V>>, generation: u64) {
    let now = Instant::now();
    slots.retain(|_, slot| {
        if Arc::strong_count(slot) > 1 {
            return true;
        }
        match slot.try_lock() {
            Ok(entry) => entry
                .as_ref()
                .is_some_and(|e| e.generation == generation && e.expires_at > now),
            Err(_) => true,
        }
    });
}
