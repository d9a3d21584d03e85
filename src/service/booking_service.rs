//! Booking service: admission control, lifecycle transitions, and audit
//! emission.

use std::sync::Arc;

use chrono::Utc;

use crate::audit::{AuditAction, AuditEntry, AuditPolicy, AuditSink, EntityType};
use crate::domain::{
    Booking, BookingFilter, BookingId, BookingPatch, BookingStatus, BookingStore, EventDetails,
    EventId, EventLookup, Identity,
};
use crate::error::BookingError;

/// Orchestration layer for all booking operations.
///
/// Owns the [`BookingStore`] for state, the [`EventLookup`] collaborator
/// for event facts, and the [`AuditSink`] for the audit trail. Every
/// mutation follows the pattern: resolve event → authorize → mutate under
/// the store's per-event lock → audit → return.
#[derive(Debug, Clone)]
pub struct BookingService {
    store: Arc<BookingStore>,
    events: Arc<dyn EventLookup>,
    audit: Arc<dyn AuditSink>,
    audit_policy: AuditPolicy,
}

impl BookingService {
    /// Creates a new `BookingService`.
    #[must_use]
    pub fn new(
        store: Arc<BookingStore>,
        events: Arc<dyn EventLookup>,
        audit: Arc<dyn AuditSink>,
        audit_policy: AuditPolicy,
    ) -> Self {
        Self {
            store,
            events,
            audit,
            audit_policy,
        }
    }

    /// Returns a reference to the inner [`BookingStore`].
    #[must_use]
    pub fn store(&self) -> &Arc<BookingStore> {
        &self.store
    }

    /// Creates a booking for the requester against a published event.
    ///
    /// The booking is confirmed immediately; there is no payment-hold
    /// step. `total_price_cents` is `event.price_cents × quantity`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidRequest`] for a zero quantity.
    /// - [`BookingError::EventNotFound`] if the event is absent or
    ///   unpublished.
    /// - [`BookingError::EventStarted`] once the event has started.
    /// - [`BookingError::DuplicateBooking`] if the requester already holds
    ///   a non-cancelled booking for the event.
    /// - [`BookingError::CapacityExceeded`] if the quantity does not fit.
    pub async fn create_booking(
        &self,
        identity: &Identity,
        event_id: EventId,
        quantity: u32,
    ) -> Result<Booking, BookingError> {
        if quantity == 0 {
            return Err(BookingError::InvalidRequest(
                "quantity must be positive".to_string(),
            ));
        }

        let event = self.published_event(event_id).await?;
        if event.start_at <= Utc::now() {
            return Err(BookingError::EventStarted(event_id));
        }

        let booking = Booking::confirmed(identity.user_id, event_id, quantity, event.price_cents);
        let booking = self.store.admit(event.max_attendees, booking).await?;

        self.record(AuditEntry::new(
            AuditAction::Create,
            EntityType::Booking,
            *booking.id.as_uuid(),
            identity.user_id,
            serde_json::json!({ "event_id": event_id, "quantity": quantity }),
        ))
        .await?;

        tracing::info!(booking_id = %booking.id, %event_id, quantity, "booking created");
        Ok(booking)
    }

    /// Lists all bookings. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Forbidden`] for non-admin callers.
    pub async fn list_bookings(
        &self,
        identity: &Identity,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, BookingError> {
        if !identity.is_admin() {
            return Err(BookingError::Forbidden(
                "listing all bookings requires the admin role".to_string(),
            ));
        }
        let mut bookings = self.store.list(filter).await;
        bookings.sort_by_key(|b| b.booking_date);
        Ok(bookings)
    }

    /// Lists the requester's own bookings.
    pub async fn list_my_bookings(
        &self,
        identity: &Identity,
        filter: &BookingFilter,
    ) -> Vec<Booking> {
        let mut bookings = self.store.list_for_user(identity.user_id, filter).await;
        bookings.sort_by_key(|b| b.booking_date);
        bookings
    }

    /// Returns a booking to its owner or an admin.
    ///
    /// # Errors
    ///
    /// [`BookingError::BookingNotFound`] if absent,
    /// [`BookingError::Forbidden`] for non-owner non-admin callers.
    pub async fn get_booking(
        &self,
        id: BookingId,
        identity: &Identity,
    ) -> Result<Booking, BookingError> {
        let booking = self.store.get(id).await?;
        Self::authorize_access(&booking, identity)?;
        Ok(booking)
    }

    /// Applies a status and/or quantity patch to a booking.
    ///
    /// A quantity increase re-runs the capacity check against the event's
    /// other active bookings; any quantity change recomputes the total
    /// price at the event's current per-ticket price. Status transitions
    /// are validated: `Completed` is reachable only through
    /// [`Self::complete_bookings`] and immutable once reached, and moving
    /// an inactive booking back into an active status re-runs both the
    /// capacity and the duplicate check under the shard lock.
    ///
    /// # Errors
    ///
    /// Authorization and not-found errors as [`Self::get_booking`];
    /// [`BookingError::EventStarted`] once the event has started;
    /// [`BookingError::CapacityExceeded`] if the patched quantity does
    /// not fit; [`BookingError::DuplicateBooking`] if a revival would give
    /// the owner a second active booking; [`BookingError::InvalidRequest`]
    /// for a zero quantity or a disallowed status transition.
    pub async fn update_booking(
        &self,
        id: BookingId,
        patch: BookingPatch,
        identity: &Identity,
    ) -> Result<Booking, BookingError> {
        if patch.quantity == Some(0) {
            return Err(BookingError::InvalidRequest(
                "quantity must be positive".to_string(),
            ));
        }

        let booking = self.store.get(id).await?;
        Self::authorize_access(&booking, identity)?;

        let event = self.published_event(booking.event_id).await?;
        if event.start_at <= Utc::now() {
            return Err(BookingError::EventStarted(booking.event_id));
        }

        let capacity = event.max_attendees;
        let price_cents = event.price_cents;
        let updated = self
            .store
            .modify(id, move |b, view| {
                let new_status = patch.status.unwrap_or(b.status);
                let new_quantity = patch.quantity.unwrap_or(b.quantity);

                if new_status != b.status {
                    if b.status == BookingStatus::Completed {
                        return Err(BookingError::InvalidRequest(
                            "completed bookings cannot change status".to_string(),
                        ));
                    }
                    if new_status == BookingStatus::Completed {
                        return Err(BookingError::InvalidRequest(
                            "bookings are completed by the event-level batch operation"
                                .to_string(),
                        ));
                    }
                }

                let was_active = b.status.is_active();
                if new_status.is_active() {
                    if !was_active && view.owner_rebooked {
                        return Err(BookingError::DuplicateBooking {
                            user_id: b.user_id,
                            event_id: b.event_id,
                        });
                    }
                    if (new_quantity > b.quantity || !was_active)
                        && let Some(cap) = capacity
                        && view.others_active.saturating_add(new_quantity) > cap
                    {
                        return Err(BookingError::CapacityExceeded {
                            requested: new_quantity,
                            available: cap.saturating_sub(view.others_active),
                        });
                    }
                }

                if patch.quantity.is_some() {
                    b.reprice(new_quantity, price_cents);
                }
                if b.status == BookingStatus::Cancelled && new_status.is_active() {
                    b.cancellation_date = None;
                } else if new_status == BookingStatus::Cancelled
                    && b.status != BookingStatus::Cancelled
                {
                    b.cancellation_date = Some(Utc::now());
                }
                b.status = new_status;
                Ok(())
            })
            .await?;

        self.record(AuditEntry::new(
            AuditAction::Update,
            EntityType::Booking,
            *id.as_uuid(),
            identity.user_id,
            serde_json::to_value(patch).unwrap_or(serde_json::Value::Null),
        ))
        .await?;

        tracing::info!(booking_id = %id, "booking updated");
        Ok(updated)
    }

    /// Cancels a booking before its event starts.
    ///
    /// Sets `status = CANCELLED` and stamps `cancellation_date`. The freed
    /// quantity no longer counts against event capacity.
    ///
    /// # Errors
    ///
    /// Authorization and not-found errors as [`Self::get_booking`];
    /// [`BookingError::AlreadyCancelled`] on repeat cancellation;
    /// [`BookingError::EventStarted`] once the event has started.
    pub async fn cancel_booking(
        &self,
        id: BookingId,
        identity: &Identity,
    ) -> Result<Booking, BookingError> {
        let booking = self.store.get(id).await?;
        Self::authorize_access(&booking, identity)?;
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled(id));
        }

        let event = self.published_event(booking.event_id).await?;
        if event.start_at <= Utc::now() {
            return Err(BookingError::EventStarted(booking.event_id));
        }

        let previous_status = booking.status;
        let cancelled = self
            .store
            .modify(id, |b, _| {
                if b.status == BookingStatus::Cancelled {
                    return Err(BookingError::AlreadyCancelled(b.id));
                }
                b.status = BookingStatus::Cancelled;
                b.cancellation_date = Some(Utc::now());
                Ok(())
            })
            .await?;

        self.record(AuditEntry::new(
            AuditAction::Cancel,
            EntityType::Booking,
            *id.as_uuid(),
            identity.user_id,
            serde_json::json!({ "previous_status": previous_status }),
        ))
        .await?;

        tracing::info!(booking_id = %id, "booking cancelled");
        Ok(cancelled)
    }

    /// Attaches feedback and a 1–5 rating to a completed booking.
    ///
    /// Strictly owner-only: admins submitting on someone else's booking
    /// get `Forbidden`. Feedback is write-once.
    ///
    /// # Errors
    ///
    /// [`BookingError::BookingNotFound`] if absent;
    /// [`BookingError::Forbidden`] for any non-owner;
    /// [`BookingError::InvalidRequest`] for a rating outside 1–5;
    /// [`BookingError::FeedbackNotOpen`] unless the booking is completed;
    /// [`BookingError::FeedbackAlreadySubmitted`] on a second submission.
    pub async fn submit_feedback(
        &self,
        id: BookingId,
        feedback: String,
        rating: u8,
        identity: &Identity,
    ) -> Result<Booking, BookingError> {
        let booking = self.store.get(id).await?;
        if booking.user_id != identity.user_id {
            return Err(BookingError::Forbidden(
                "only the booking owner may submit feedback".to_string(),
            ));
        }
        if !(1..=5).contains(&rating) {
            return Err(BookingError::InvalidRequest(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let updated = self
            .store
            .modify(id, move |b, _| {
                if b.status != BookingStatus::Completed {
                    return Err(BookingError::FeedbackNotOpen(b.id));
                }
                if b.feedback.is_some() || b.rating.is_some() {
                    return Err(BookingError::FeedbackAlreadySubmitted(b.id));
                }
                b.feedback = Some(feedback);
                b.rating = Some(rating);
                Ok(())
            })
            .await?;

        self.record(AuditEntry::new(
            AuditAction::Feedback,
            EntityType::Booking,
            *id.as_uuid(),
            identity.user_id,
            serde_json::json!({ "rating": rating }),
        ))
        .await?;

        tracing::info!(booking_id = %id, rating, "feedback submitted");
        Ok(updated)
    }

    /// Hard-deletes a booking. Admin only.
    ///
    /// The audit entry captures the deleted booking's event and owner
    /// before removal.
    ///
    /// # Errors
    ///
    /// [`BookingError::Forbidden`] for non-admin callers,
    /// [`BookingError::BookingNotFound`] if absent.
    pub async fn delete_booking(
        &self,
        id: BookingId,
        identity: &Identity,
    ) -> Result<(), BookingError> {
        if !identity.is_admin() {
            return Err(BookingError::Forbidden(
                "deleting bookings requires the admin role".to_string(),
            ));
        }

        let removed = self.store.remove(id).await?;

        self.record(AuditEntry::new(
            AuditAction::Delete,
            EntityType::Booking,
            *id.as_uuid(),
            identity.user_id,
            serde_json::json!({
                "event_id": removed.event_id,
                "user_id": removed.user_id,
            }),
        ))
        .await?;

        tracing::info!(booking_id = %id, "booking deleted");
        Ok(())
    }

    /// Flips every confirmed booking for the event to completed.
    ///
    /// Intended to be invoked by an external scheduler once the event has
    /// ended. Admin only. Emits one batch audit entry per invocation
    /// rather than one per booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Forbidden`] for non-admin callers.
    pub async fn complete_bookings(
        &self,
        event_id: EventId,
        identity: &Identity,
    ) -> Result<u64, BookingError> {
        if !identity.is_admin() {
            return Err(BookingError::Forbidden(
                "completing bookings requires the admin role".to_string(),
            ));
        }

        let completed = self.store.complete_confirmed(event_id).await;

        self.record(AuditEntry::new(
            AuditAction::Complete,
            EntityType::Event,
            *event_id.as_uuid(),
            identity.user_id,
            serde_json::json!({ "event_id": event_id, "completed": completed }),
        ))
        .await?;

        tracing::info!(%event_id, completed, "bookings completed");
        Ok(completed)
    }

    /// Resolves a published event or fails with `EventNotFound`.
    async fn published_event(&self, event_id: EventId) -> Result<EventDetails, BookingError> {
        self.events
            .find_published(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))
    }

    /// Owner-or-admin gate shared by get/update/cancel.
    fn authorize_access(booking: &Booking, identity: &Identity) -> Result<(), BookingError> {
        if identity.can_access(booking.user_id) {
            Ok(())
        } else {
            Err(BookingError::Forbidden(
                "booking belongs to another user".to_string(),
            ))
        }
    }

    /// Sends an entry to the audit sink under the configured policy.
    async fn record(&self, entry: AuditEntry) -> Result<(), BookingError> {
        match self.audit.record(entry).await {
            Ok(()) => Ok(()),
            Err(err) => match self.audit_policy {
                AuditPolicy::Propagate => Err(err),
                AuditPolicy::LogAndContinue => {
                    tracing::warn!(error = %err, "audit write failed; continuing");
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::domain::{EventCatalog, Role, UserId};
    use async_trait::async_trait;

    fn future_event(max_attendees: Option<u32>, price_cents: u64) -> EventDetails {
        EventDetails {
            id: EventId::new(),
            title: "Rust Conf".to_string(),
            start_at: Utc::now() + chrono::Duration::days(7),
            max_attendees,
            price_cents,
        }
    }

    fn past_event() -> EventDetails {
        EventDetails {
            id: EventId::new(),
            title: "Yesterday's Gig".to_string(),
            start_at: Utc::now() - chrono::Duration::hours(1),
            max_attendees: Some(100),
            price_cents: 1000,
        }
    }

    fn user() -> Identity {
        Identity::new(UserId::new(), Role::User)
    }

    fn admin() -> Identity {
        Identity::new(UserId::new(), Role::Admin)
    }

    struct Harness {
        service: BookingService,
        catalog: Arc<EventCatalog>,
        audit: Arc<MemoryAuditSink>,
    }

    fn harness() -> Harness {
        let catalog = Arc::new(EventCatalog::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let service = BookingService::new(
            Arc::new(BookingStore::new()),
            catalog.clone(),
            audit.clone(),
            AuditPolicy::LogAndContinue,
        );
        Harness {
            service,
            catalog,
            audit,
        }
    }

    #[derive(Debug)]
    struct FailingAuditSink;

    #[async_trait]
    impl AuditSink for FailingAuditSink {
        async fn record(&self, _entry: AuditEntry) -> Result<(), BookingError> {
            Err(BookingError::PersistenceError("sink down".to_string()))
        }
    }

    #[tokio::test]
    async fn create_confirms_and_prices_immediately() {
        let h = harness();
        let event = future_event(Some(1), 5000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let result = h.service.create_booking(&user(), event_id, 1).await;
        let Ok(booking) = result else {
            panic!("create failed");
        };
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.total_price_cents, 5000);

        let recorded = h.audit.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].action, AuditAction::Create);
    }

    #[tokio::test]
    async fn create_rejects_unknown_and_unpublished_events() {
        let h = harness();
        let result = h.service.create_booking(&user(), EventId::new(), 1).await;
        assert!(matches!(result, Err(BookingError::EventNotFound(_))));

        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;
        h.catalog.unpublish(event_id).await;
        let result = h.service.create_booking(&user(), event_id, 1).await;
        assert!(matches!(result, Err(BookingError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn create_rejects_past_event() {
        let h = harness();
        let event = past_event();
        let event_id = event.id;
        h.catalog.publish(event).await;

        let result = h.service.create_booking(&user(), event_id, 1).await;
        assert!(matches!(result, Err(BookingError::EventStarted(_))));
    }

    #[tokio::test]
    async fn create_rejects_zero_quantity() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let result = h.service.create_booking(&user(), event_id, 0).await;
        assert!(matches!(result, Err(BookingError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn second_create_for_same_pair_conflicts() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;
        let alice = user();

        assert!(h.service.create_booking(&alice, event_id, 1).await.is_ok());
        let result = h.service.create_booking(&alice, event_id, 1).await;
        assert!(matches!(result, Err(BookingError::DuplicateBooking { .. })));
    }

    #[tokio::test]
    async fn capacity_one_admits_exactly_one() {
        let h = harness();
        let event = future_event(Some(1), 5000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let bob = user();

        let first = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(first) = first else {
            panic!("first booking failed");
        };
        assert_eq!(first.total_price_cents, 5000);

        let second = h.service.create_booking(&bob, event_id, 1).await;
        assert!(matches!(
            second,
            Err(BookingError::CapacityExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn cancellation_frees_the_seat() {
        let h = harness();
        let event = future_event(Some(1), 5000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let bob = user();

        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };
        assert!(h
            .service
            .create_booking(&bob, event_id, 1)
            .await
            .is_err());

        let cancelled = h.service.cancel_booking(booking.id, &alice).await;
        let Ok(cancelled) = cancelled else {
            panic!("cancel failed");
        };
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.cancellation_date.is_some());

        // Bob's retry now succeeds
        assert!(h.service.create_booking(&bob, event_id, 1).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_admission_fills_last_seat_once() {
        let h = harness();
        let event = future_event(Some(1), 5000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let service = Arc::new(h.service);
        let (a, b) = (user(), user());
        let s1 = service.clone();
        let s2 = service.clone();
        let t1 = tokio::spawn(async move { s1.create_booking(&a, event_id, 1).await });
        let t2 = tokio::spawn(async move { s2.create_booking(&b, event_id, 1).await });

        let (r1, r2) = (t1.await, t2.await);
        let (Ok(r1), Ok(r2)) = (r1, r2) else {
            panic!("task panicked");
        };
        let successes = usize::from(r1.is_ok()) + usize::from(r2.is_ok());
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn update_quantity_reprices_and_checks_capacity() {
        // cap=4: other booking of 1 + target raised to 3 fits exactly
        let h = harness();
        let event = future_event(Some(4), 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };
        assert!(h.service.create_booking(&user(), event_id, 1).await.is_ok());

        let patch = BookingPatch {
            status: None,
            quantity: Some(3),
        };
        let updated = h.service.update_booking(booking.id, patch, &alice).await;
        let Ok(updated) = updated else {
            panic!("update failed");
        };
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.total_price_cents, 3000);
    }

    #[tokio::test]
    async fn update_quantity_over_capacity_fails() {
        // cap=3: other booking of 1 + target raised to 3 overflows
        let h = harness();
        let event = future_event(Some(3), 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };
        assert!(h.service.create_booking(&user(), event_id, 1).await.is_ok());

        let patch = BookingPatch {
            status: None,
            quantity: Some(3),
        };
        let result = h.service.update_booking(booking.id, patch, &alice).await;
        assert!(matches!(
            result,
            Err(BookingError::CapacityExceeded { .. })
        ));

        // Rejected update leaves price untouched
        let current = h.service.get_booking(booking.id, &alice).await;
        let Ok(current) = current else {
            panic!("get failed");
        };
        assert_eq!(current.quantity, 1);
        assert_eq!(current.total_price_cents, 1000);
    }

    #[tokio::test]
    async fn revival_into_full_event_is_rejected() {
        let h = harness();
        let event = future_event(Some(1), 5000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };
        assert!(h.service.cancel_booking(booking.id, &alice).await.is_ok());

        // Bob takes the freed seat
        assert!(h.service.create_booking(&user(), event_id, 1).await.is_ok());

        let patch = BookingPatch {
            status: Some(BookingStatus::Confirmed),
            quantity: None,
        };
        let result = h.service.update_booking(booking.id, patch, &alice).await;
        assert!(matches!(
            result,
            Err(BookingError::CapacityExceeded { .. })
        ));

        let current = h.service.get_booking(booking.id, &alice).await;
        let Ok(current) = current else {
            panic!("get failed");
        };
        assert_eq!(current.status, BookingStatus::Cancelled);
        assert!(current.cancellation_date.is_some());
    }

    #[tokio::test]
    async fn revival_cannot_duplicate_owners_active_booking() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let first = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(first) = first else {
            panic!("create failed");
        };
        assert!(h.service.cancel_booking(first.id, &alice).await.is_ok());
        assert!(h.service.create_booking(&alice, event_id, 1).await.is_ok());

        let patch = BookingPatch {
            status: Some(BookingStatus::Confirmed),
            quantity: None,
        };
        let result = h.service.update_booking(first.id, patch, &alice).await;
        assert!(matches!(result, Err(BookingError::DuplicateBooking { .. })));
    }

    #[tokio::test]
    async fn revival_retakes_seat_and_clears_cancellation_date() {
        let h = harness();
        let event = future_event(Some(1), 5000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };
        assert!(h.service.cancel_booking(booking.id, &alice).await.is_ok());

        let patch = BookingPatch {
            status: Some(BookingStatus::Confirmed),
            quantity: None,
        };
        let revived = h.service.update_booking(booking.id, patch, &alice).await;
        let Ok(revived) = revived else {
            panic!("revival failed");
        };
        assert_eq!(revived.status, BookingStatus::Confirmed);
        assert!(revived.cancellation_date.is_none());

        // The seat is taken again
        let result = h.service.create_booking(&user(), event_id, 1).await;
        assert!(matches!(
            result,
            Err(BookingError::CapacityExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn revival_capacity_check_uses_patched_quantity() {
        // cap=3: other booking of 2 + revival at quantity 2 overflows,
        // revival at the original quantity 1 fits
        let h = harness();
        let event = future_event(Some(3), 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };
        assert!(h.service.cancel_booking(booking.id, &alice).await.is_ok());
        assert!(h.service.create_booking(&user(), event_id, 2).await.is_ok());

        let too_big = BookingPatch {
            status: Some(BookingStatus::Confirmed),
            quantity: Some(2),
        };
        let result = h.service.update_booking(booking.id, too_big, &alice).await;
        assert!(matches!(
            result,
            Err(BookingError::CapacityExceeded { .. })
        ));

        let fits = BookingPatch {
            status: Some(BookingStatus::Confirmed),
            quantity: None,
        };
        assert!(h.service.update_booking(booking.id, fits, &alice).await.is_ok());
    }

    #[tokio::test]
    async fn status_patch_cannot_reach_completed() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };

        let patch = BookingPatch {
            status: Some(BookingStatus::Completed),
            quantity: None,
        };
        let result = h.service.update_booking(booking.id, patch, &alice).await;
        assert!(matches!(result, Err(BookingError::InvalidRequest(_))));

        // The feedback window stays closed
        let feedback = h
            .service
            .submit_feedback(booking.id, "nice".to_string(), 5, &alice)
            .await;
        assert!(matches!(feedback, Err(BookingError::FeedbackNotOpen(_))));
    }

    #[tokio::test]
    async fn completed_booking_status_is_immutable() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };
        let _ = h.service.complete_bookings(event_id, &admin()).await;

        let patch = BookingPatch {
            status: Some(BookingStatus::Confirmed),
            quantity: None,
        };
        let result = h.service.update_booking(booking.id, patch, &admin()).await;
        assert!(matches!(result, Err(BookingError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn status_patch_to_cancelled_stamps_cancellation_date() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };

        let patch = BookingPatch {
            status: Some(BookingStatus::Cancelled),
            quantity: None,
        };
        let updated = h.service.update_booking(booking.id, patch, &alice).await;
        let Ok(updated) = updated else {
            panic!("update failed");
        };
        assert_eq!(updated.status, BookingStatus::Cancelled);
        assert!(updated.cancellation_date.is_some());
    }

    #[tokio::test]
    async fn update_after_event_start_fails() {
        let h = harness();
        let mut event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event.clone()).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };

        // Event start slips into the past
        event.start_at = Utc::now() - chrono::Duration::minutes(1);
        h.catalog.publish(event).await;

        let patch = BookingPatch {
            status: None,
            quantity: Some(2),
        };
        let result = h.service.update_booking(booking.id, patch, &alice).await;
        assert!(matches!(result, Err(BookingError::EventStarted(_))));

        let result = h.service.cancel_booking(booking.id, &alice).await;
        assert!(matches!(result, Err(BookingError::EventStarted(_))));
    }

    #[tokio::test]
    async fn non_owner_is_forbidden_admin_is_not() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };

        let stranger = user();
        assert!(matches!(
            h.service.get_booking(booking.id, &stranger).await,
            Err(BookingError::Forbidden(_))
        ));
        assert!(matches!(
            h.service.cancel_booking(booking.id, &stranger).await,
            Err(BookingError::Forbidden(_))
        ));

        assert!(h.service.get_booking(booking.id, &admin()).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_twice_fails() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };

        assert!(h.service.cancel_booking(booking.id, &alice).await.is_ok());
        let result = h.service.cancel_booking(booking.id, &alice).await;
        assert!(matches!(result, Err(BookingError::AlreadyCancelled(_))));
    }

    #[tokio::test]
    async fn complete_then_feedback_round_trip() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let bob = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };
        assert!(h.service.create_booking(&bob, event_id, 2).await.is_ok());

        // Feedback before completion is rejected
        let early = h
            .service
            .submit_feedback(booking.id, "great".to_string(), 5, &alice)
            .await;
        assert!(matches!(early, Err(BookingError::FeedbackNotOpen(_))));

        let completed = h.service.complete_bookings(event_id, &admin()).await;
        assert_eq!(completed.ok(), Some(2));

        let result = h
            .service
            .submit_feedback(booking.id, "great show".to_string(), 5, &alice)
            .await;
        let Ok(updated) = result else {
            panic!("feedback failed");
        };
        assert_eq!(updated.rating, Some(5));
        assert_eq!(updated.feedback.as_deref(), Some("great show"));

        // Write-once
        let again = h
            .service
            .submit_feedback(booking.id, "changed my mind".to_string(), 1, &alice)
            .await;
        assert!(matches!(
            again,
            Err(BookingError::FeedbackAlreadySubmitted(_))
        ));
    }

    #[tokio::test]
    async fn feedback_by_admin_is_forbidden() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };
        let _ = h.service.complete_bookings(event_id, &admin()).await;

        let result = h
            .service
            .submit_feedback(booking.id, "nice".to_string(), 4, &admin())
            .await;
        assert!(matches!(result, Err(BookingError::Forbidden(_))));
    }

    #[tokio::test]
    async fn feedback_rating_out_of_range_is_invalid() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };
        let _ = h.service.complete_bookings(event_id, &admin()).await;

        let result = h
            .service
            .submit_feedback(booking.id, "meh".to_string(), 6, &alice)
            .await;
        assert!(matches!(result, Err(BookingError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn feedback_on_missing_booking_is_not_found_even_with_bad_rating() {
        let h = harness();
        let result = h
            .service
            .submit_feedback(BookingId::new(), "meh".to_string(), 6, &user())
            .await;
        assert!(matches!(result, Err(BookingError::BookingNotFound(_))));
    }

    #[tokio::test]
    async fn list_all_is_admin_only() {
        let h = harness();
        let result = h
            .service
            .list_bookings(&user(), &BookingFilter::default())
            .await;
        assert!(matches!(result, Err(BookingError::Forbidden(_))));

        let result = h
            .service
            .list_bookings(&admin(), &BookingFilter::default())
            .await;
        assert_eq!(result.ok().map(|b| b.len()), Some(0));
    }

    #[tokio::test]
    async fn list_my_bookings_scopes_and_filters() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let _ = h.service.create_booking(&alice, event_id, 1).await;
        let _ = h.service.create_booking(&user(), event_id, 1).await;

        let mine = h
            .service
            .list_my_bookings(&alice, &BookingFilter::default())
            .await;
        assert_eq!(mine.len(), 1);

        let cancelled_only = h
            .service
            .list_my_bookings(
                &alice,
                &BookingFilter {
                    status: Some(BookingStatus::Cancelled),
                    event_id: None,
                },
            )
            .await;
        assert!(cancelled_only.is_empty());
    }

    #[tokio::test]
    async fn delete_is_admin_only_and_audits_ownership() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let alice = user();
        let booking = h.service.create_booking(&alice, event_id, 1).await;
        let Ok(booking) = booking else {
            panic!("create failed");
        };

        assert!(matches!(
            h.service.delete_booking(booking.id, &alice).await,
            Err(BookingError::Forbidden(_))
        ));

        assert!(h.service.delete_booking(booking.id, &admin()).await.is_ok());
        assert!(matches!(
            h.service.get_booking(booking.id, &admin()).await,
            Err(BookingError::BookingNotFound(_))
        ));

        let recorded = h.audit.recorded();
        let Some(delete_entry) = recorded
            .iter()
            .find(|e| e.action == AuditAction::Delete)
        else {
            panic!("no delete audit entry");
        };
        assert_eq!(
            delete_entry.details.get("user_id"),
            Some(&serde_json::json!(alice.user_id))
        );
    }

    #[tokio::test]
    async fn complete_bookings_emits_single_batch_entry() {
        let h = harness();
        let event = future_event(None, 1000);
        let event_id = event.id;
        h.catalog.publish(event).await;

        let _ = h.service.create_booking(&user(), event_id, 1).await;
        let _ = h.service.create_booking(&user(), event_id, 1).await;

        let completed = h.service.complete_bookings(event_id, &admin()).await;
        assert_eq!(completed.ok(), Some(2));

        let batch_entries: Vec<_> = h
            .audit
            .recorded()
            .into_iter()
            .filter(|e| e.action == AuditAction::Complete)
            .collect();
        assert_eq!(batch_entries.len(), 1);
        assert_eq!(
            batch_entries[0].details.get("completed"),
            Some(&serde_json::json!(2))
        );
    }

    #[tokio::test]
    async fn complete_bookings_requires_admin() {
        let h = harness();
        let result = h.service.complete_bookings(EventId::new(), &user()).await;
        assert!(matches!(result, Err(BookingError::Forbidden(_))));
    }

    #[tokio::test]
    async fn audit_failure_continues_under_default_policy() {
        let catalog = Arc::new(EventCatalog::new());
        let service = BookingService::new(
            Arc::new(BookingStore::new()),
            catalog.clone(),
            Arc::new(FailingAuditSink),
            AuditPolicy::LogAndContinue,
        );

        let event = future_event(None, 1000);
        let event_id = event.id;
        catalog.publish(event).await;

        let result = service.create_booking(&user(), event_id, 1).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn audit_failure_propagates_when_configured() {
        let catalog = Arc::new(EventCatalog::new());
        let service = BookingService::new(
            Arc::new(BookingStore::new()),
            catalog.clone(),
            Arc::new(FailingAuditSink),
            AuditPolicy::Propagate,
        );

        let event = future_event(None, 1000);
        let event_id = event.id;
        catalog.publish(event).await;

        let result = service.create_booking(&user(), event_id, 1).await;
        assert!(matches!(result, Err(BookingError::PersistenceError(_))));
    }
}
