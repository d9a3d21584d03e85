//! Concurrent booking storage with per-event admission serialization.
//!
//! [`BookingStore`] keeps bookings in per-event shards, each protected by
//! its own [`tokio::sync::RwLock`]. Admission (duplicate check + capacity
//! check + insert) runs under a single shard write lock, so two requests
//! racing for the last seat of the same event are serialized while
//! operations on different events proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::booking::{Booking, BookingFilter};
use super::{BookingId, EventId, UserId};
use crate::error::BookingError;

/// In-process system of record for bookings.
///
/// Two-level locking: an outer map from [`EventId`] to shard, plus a
/// booking-ID index for direct lookups. Capacity accounting is a live
/// recount of active quantities inside the shard; because the recount and
/// the insert happen under the same write lock, the capacity invariant
/// holds under concurrent admission.
///
/// # Concurrency
///
/// - Reads on the same event are concurrent.
/// - Admissions and updates on different events are concurrent.
/// - Admissions and updates on the same event are serialized.
#[derive(Debug, Default)]
pub struct BookingStore {
    shards: RwLock<HashMap<EventId, Arc<RwLock<EventShard>>>>,
    index: RwLock<HashMap<BookingId, EventId>>,
}

/// All bookings for one event.
#[derive(Debug, Default)]
struct EventShard {
    bookings: HashMap<BookingId, Booking>,
}

/// Point-in-time view of an event shard, handed to [`BookingStore::modify`]
/// closures so capacity and uniqueness re-checks run under the same write
/// lock as the mutation.
#[derive(Debug, Clone, Copy)]
pub struct ShardView {
    /// Summed active quantity of the event's bookings, excluding the one
    /// being modified.
    pub others_active: u32,
    /// Whether the modified booking's owner holds another non-cancelled
    /// booking for the same event.
    pub owner_rebooked: bool,
}

impl EventShard {
    /// Sum of quantities across active bookings, optionally excluding one
    /// booking (used when re-checking capacity for a quantity update).
    fn active_quantity(&self, exclude: Option<BookingId>) -> u32 {
        self.bookings
            .values()
            .filter(|b| b.status.is_active() && Some(b.id) != exclude)
            .map(|b| b.quantity)
            .sum()
    }
}

impl BookingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a booking against the given capacity ceiling.
    ///
    /// Runs the duplicate check, the capacity check, and the insert under
    /// one shard write lock. Capacity compares quantity sums, not row
    /// counts; `None` capacity means unlimited.
    ///
    /// # Errors
    ///
    /// - [`BookingError::DuplicateBooking`] if the user already holds a
    ///   non-cancelled booking for the event.
    /// - [`BookingError::CapacityExceeded`] if the quantity does not fit.
    pub async fn admit(
        &self,
        capacity: Option<u32>,
        booking: Booking,
    ) -> Result<Booking, BookingError> {
        let shard_lock = self.shard(booking.event_id).await;
        let mut shard = shard_lock.write().await;

        let duplicate = shard
            .bookings
            .values()
            .any(|b| b.user_id == booking.user_id && b.status != super::BookingStatus::Cancelled);
        if duplicate {
            return Err(BookingError::DuplicateBooking {
                user_id: booking.user_id,
                event_id: booking.event_id,
            });
        }

        if let Some(cap) = capacity {
            let taken = shard.active_quantity(None);
            if taken.saturating_add(booking.quantity) > cap {
                return Err(BookingError::CapacityExceeded {
                    requested: booking.quantity,
                    available: cap.saturating_sub(taken),
                });
            }
        }

        shard.bookings.insert(booking.id, booking.clone());
        drop(shard);

        self.index.write().await.insert(booking.id, booking.event_id);
        Ok(booking)
    }

    /// Returns a clone of the booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BookingNotFound`] if absent.
    pub async fn get(&self, id: BookingId) -> Result<Booking, BookingError> {
        let event_id = self.event_of(id).await?;
        let shard_lock = self.existing_shard(event_id, id).await?;
        let shard = shard_lock.read().await;
        shard
            .bookings
            .get(&id)
            .cloned()
            .ok_or(BookingError::BookingNotFound(id))
    }

    /// Applies a mutation to a booking under its shard write lock.
    ///
    /// The closure receives a working copy of the booking and a
    /// [`ShardView`] of the event's *other* bookings, so capacity and
    /// uniqueness re-checks for quantity or status changes are race-free.
    /// The copy is written back only when the closure succeeds; a rejected
    /// update leaves the stored booking untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BookingNotFound`] if absent, or whatever
    /// the closure returns.
    pub async fn modify<F>(&self, id: BookingId, f: F) -> Result<Booking, BookingError>
    where
        F: FnOnce(&mut Booking, ShardView) -> Result<(), BookingError>,
    {
        let event_id = self.event_of(id).await?;
        let shard_lock = self.existing_shard(event_id, id).await?;
        let mut shard = shard_lock.write().await;

        let mut working = shard
            .bookings
            .get(&id)
            .cloned()
            .ok_or(BookingError::BookingNotFound(id))?;
        let view = ShardView {
            others_active: shard.active_quantity(Some(id)),
            owner_rebooked: shard.bookings.values().any(|b| {
                b.id != id
                    && b.user_id == working.user_id
                    && b.status != super::BookingStatus::Cancelled
            }),
        };
        f(&mut working, view)?;
        shard.bookings.insert(id, working.clone());
        Ok(working)
    }

    /// Hard-deletes a booking, returning the removed record.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BookingNotFound`] if absent.
    pub async fn remove(&self, id: BookingId) -> Result<Booking, BookingError> {
        let event_id = self.event_of(id).await?;
        let shard_lock = self.existing_shard(event_id, id).await?;

        let mut shard = shard_lock.write().await;
        let booking = shard
            .bookings
            .remove(&id)
            .ok_or(BookingError::BookingNotFound(id))?;
        drop(shard);

        self.index.write().await.remove(&id);
        Ok(booking)
    }

    /// Returns all bookings matching the filter.
    ///
    /// With an event filter only that shard is scanned; otherwise every
    /// shard is visited.
    pub async fn list(&self, filter: &BookingFilter) -> Vec<Booking> {
        if let Some(event_id) = filter.event_id {
            let Some(shard_lock) = self.shards.read().await.get(&event_id).cloned() else {
                return Vec::new();
            };
            let shard = shard_lock.read().await;
            return shard
                .bookings
                .values()
                .filter(|b| filter.matches(b))
                .cloned()
                .collect();
        }

        let shards: Vec<_> = self.shards.read().await.values().cloned().collect();
        let mut out = Vec::new();
        for shard_lock in shards {
            let shard = shard_lock.read().await;
            out.extend(
                shard
                    .bookings
                    .values()
                    .filter(|b| filter.matches(b))
                    .cloned(),
            );
        }
        out
    }

    /// Returns the given user's bookings matching the filter.
    pub async fn list_for_user(&self, user_id: UserId, filter: &BookingFilter) -> Vec<Booking> {
        self.list(filter)
            .await
            .into_iter()
            .filter(|b| b.user_id == user_id)
            .collect()
    }

    /// Flips every `Confirmed` booking for the event to `Completed`.
    ///
    /// Returns the number of bookings transitioned. An event with no shard
    /// (no bookings ever) yields zero.
    pub async fn complete_confirmed(&self, event_id: EventId) -> u64 {
        let Some(shard_lock) = self.shards.read().await.get(&event_id).cloned() else {
            return 0;
        };
        let mut shard = shard_lock.write().await;
        let mut completed = 0u64;
        for booking in shard.bookings.values_mut() {
            if booking.status == super::BookingStatus::Confirmed {
                booking.status = super::BookingStatus::Completed;
                completed += 1;
            }
        }
        completed
    }

    /// Returns the number of stored bookings.
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    /// Returns `true` if the store contains no bookings.
    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    /// Returns the event shard for `event_id`, creating it if needed.
    async fn shard(&self, event_id: EventId) -> Arc<RwLock<EventShard>> {
        if let Some(shard) = self.shards.read().await.get(&event_id) {
            return shard.clone();
        }
        let mut shards = self.shards.write().await;
        shards.entry(event_id).or_default().clone()
    }

    /// Returns an existing shard, mapping absence to `BookingNotFound`.
    async fn existing_shard(
        &self,
        event_id: EventId,
        id: BookingId,
    ) -> Result<Arc<RwLock<EventShard>>, BookingError> {
        self.shards
            .read()
            .await
            .get(&event_id)
            .cloned()
            .ok_or(BookingError::BookingNotFound(id))
    }

    /// Resolves a booking ID to its event via the index.
    async fn event_of(&self, id: BookingId) -> Result<EventId, BookingError> {
        self.index
            .read()
            .await
            .get(&id)
            .copied()
            .ok_or(BookingError::BookingNotFound(id))
    }
}
