//! Read-only event collaborator interface.
//!
//! The booking core does not own events. It reads the handful of fields
//! admission control needs (`start_at`, `max_attendees`, `price_cents`,
//! publish state) through the narrow [`EventLookup`] trait, so the core can
//! be wired to a real event service in production and to a fake in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::EventId;
use crate::error::BookingError;

/// The slice of an event the booking core needs for admission decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Event identifier.
    pub id: EventId,
    /// Human-readable title.
    pub title: String,
    /// Scheduled start. Bookings close (create, update, cancel) at this
    /// instant.
    pub start_at: DateTime<Utc>,
    /// Capacity ceiling; `None` means unlimited.
    pub max_attendees: Option<u32>,
    /// Per-ticket price in minor units (cents).
    pub price_cents: u64,
}

/// Read-only lookup of published events.
#[async_trait]
pub trait EventLookup: Send + Sync + std::fmt::Debug {
    /// Returns the event if it exists and is published, `None` otherwise.
    ///
    /// Unpublished and absent events are indistinguishable to callers.
    ///
    /// # Errors
    ///
    /// Returns a [`BookingError`] if the lookup backend fails.
    async fn find_published(&self, id: EventId) -> Result<Option<EventDetails>, BookingError>;
}

/// In-process event catalog backing [`EventLookup`].
///
/// Holds published events in a `RwLock<HashMap>`. The composition root
/// feeds it from the externally-owned event service; tests feed it
/// directly.
#[derive(Debug, Default)]
pub struct EventCatalog {
    events: RwLock<HashMap<EventId, CatalogEntry>>,
}

#[derive(Debug)]
struct CatalogEntry {
    details: EventDetails,
    published: bool,
}

impl EventCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an event in the published state.
    pub async fn publish(&self, details: EventDetails) {
        let mut events = self.events.write().await;
        events.insert(
            details.id,
            CatalogEntry {
                details,
                published: true,
            },
        );
    }

    /// Marks an event unpublished without removing it.
    ///
    /// Returns `true` if the event existed.
    pub async fn unpublish(&self, id: EventId) -> bool {
        let mut events = self.events.write().await;
        match events.get_mut(&id) {
            Some(entry) => {
                entry.published = false;
                true
            }
            None => false,
        }
    }

    /// Returns the number of events in the catalog.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns `true` if the catalog holds no events.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventLookup for EventCatalog {
    async fn find_published(&self, id: EventId) -> Result<Option<EventDetails>, BookingError> {
        let events = self.events.read().await;
        Ok(events
            .get(&id)
            .filter(|entry| entry.published)
            .map(|entry| entry.details.clone()))
    }
}
