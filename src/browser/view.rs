use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use super::controller::QueryController;
use super::entity::EntityConfig;
use crate::db::RecordSource;

/// One mounted browser page. It owns its controller and record store and is
/// discarded once idle for longer than the registry's TTL.
pub struct BrowserView {
    pub id: Uuid,
    pub controller: QueryController,
    last_seen: Mutex<Instant>,
}

impl BrowserView {
    pub fn entity_key(&self) -> &str {
        self.controller.entity().key
    }

    fn touch(&self) {
        if let Ok(mut last_seen) = self.last_seen.lock() {
            *last_seen = Instant::now();
        }
    }

    fn idle_for(&self, now: Instant) -> Duration {
        self.last_seen
            .lock()
            .map(|t| now.saturating_duration_since(*t))
            .unwrap_or_default()
    }
}

pub struct ViewRegistry {
    views: DashMap<Uuid, Arc<BrowserView>>,
    ttl: Duration,
}

impl ViewRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            views: DashMap::new(),
            ttl,
        }
    }

    pub fn mount(&self, entity: Arc<EntityConfig>, source: Arc<dyn RecordSource>) -> Arc<BrowserView> {
        let view = Arc::new(BrowserView {
            id: Uuid::now_v7(),
            controller: QueryController::new(entity, source),
            last_seen: Mutex::new(Instant::now()),
        });
        self.views.insert(view.id, view.clone());
        tracing::debug!(view = %view.id, entity = view.entity_key(), "View mounted");
        view
    }

    /// Look up a live view belonging to `entity_key`.
    pub fn get(&self, id: Uuid, entity_key: &str) -> Option<Arc<BrowserView>> {
        let view = self.views.get(&id)?.value().clone();
        if view.entity_key() != entity_key {
            return None;
        }
        view.touch();
        Some(view)
    }

    /// Drop every view idle for longer than the TTL. Returns how many were dropped.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.views.len();
        self.views.retain(|_, view| view.idle_for(now) < self.ttl);
        before.saturating_sub(self.views.len())
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
