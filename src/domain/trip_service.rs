//! Trip service: the aggregate root's lifecycle, its item list, and the
//! role/permission model.
//!
//! Membership and status writes go through an optimistic-concurrency
//! commit: the trip's `updated_at` is checked inside the atomic write and
//! the whole read-guard-write sequence is retried on conflict, so the
//! last-admin guard holds even against interleaved demotions.

use chrono::Utc;
use log::{info, warn};
use serde_json::json;
use std::sync::Arc;

use crate::domain::commands::trips::{
    AddItemCommand, AddItemResult, AddMemberCommand, ChangeRoleCommand, ChangeRoleResult,
    CreateTripCommand, CreateTripResult, MembershipResult, RemoveMemberCommand,
    UpdateTripStatusCommand, UpdateTripStatusResult,
};
use crate::domain::delivery_service::DeliveryService;
use crate::domain::models::{Item, Trip, TripRole, TripStatus};
use crate::domain::MAX_COMMIT_ATTEMPTS;
use crate::error::EngineError;
use crate::notification::{send_or_log, NotificationKind, NotificationSink};
use crate::storage::traits::{Connection, ItemStorage, StoreError, TripStorage, WriteOp};

#[derive(Clone)]
pub struct TripService<C: Connection> {
    connection: Arc<C>,
    trip_repository: C::TripRepository,
    item_repository: C::ItemRepository,
    delivery_service: DeliveryService<C>,
    notifier: Arc<dyn NotificationSink>,
}

impl<C: Connection> TripService<C> {
    pub fn new(connection: Arc<C>, notifier: Arc<dyn NotificationSink>) -> Self {
        let trip_repository = connection.create_trip_repository();
        let item_repository = connection.create_item_repository();
        let delivery_service = DeliveryService::new(connection.clone(), notifier.clone());
        Self {
            connection,
            trip_repository,
            item_repository,
            delivery_service,
            notifier,
        }
    }

    /// Create a trip. The creator becomes the first admin; the shopper
    /// defaults to the creator and is always kept a member.
    pub fn create_trip(&self, command: CreateTripCommand) -> Result<CreateTripResult, EngineError> {
        let now = Utc::now();
        let shopper_id = command.shopper_id.unwrap_or_else(|| command.creator_id.clone());
        let mut trip = Trip {
            id: Trip::generate_id(),
            group_id: command.group_id,
            name: command.name,
            creator_id: command.creator_id.clone(),
            shopper_id: shopper_id.clone(),
            admin_ids: vec![command.creator_id.clone()],
            viewer_ids: Vec::new(),
            status: TripStatus::Planned,
            scheduled_date: command.scheduled_date,
            created_at: now,
            updated_at: now,
        };
        for viewer in command.viewer_ids {
            trip.add_viewer(&viewer);
        }
        trip.add_viewer(&shopper_id);
        self.trip_repository.store_trip(&trip)?;

        info!("trip {} created by {}", trip.id, command.creator_id);
        Ok(CreateTripResult { trip })
    }

    pub fn get_trip(&self, trip_id: &str) -> Result<Trip, EngineError> {
        self.require_trip(trip_id)
    }

    /// All trips the user belongs to. Broad scan, filtered in memory.
    pub fn list_trips_for_user(&self, user_id: &str) -> Result<Vec<Trip>, EngineError> {
        let trips = self.trip_repository.list_trips()?;
        Ok(trips.into_iter().filter(|trip| trip.is_member(user_id)).collect())
    }

    /// Append an item to the trip's list. Editors only; the claim set of a
    /// terminal trip is frozen, so its item list is too.
    pub fn add_item(&self, command: AddItemCommand) -> Result<AddItemResult, EngineError> {
        let trip = self.require_trip(&command.trip_id)?;
        if !trip.is_editor(&command.actor_id) {
            return Err(EngineError::permission_denied(format!(
                "{} may not edit the item list of trip {}",
                command.actor_id, trip.id
            )));
        }
        if trip.status.is_terminal() {
            return Err(EngineError::invalid_transition(format!(
                "cannot add items to a {} trip",
                trip.status
            )));
        }

        let item = Item {
            id: Item::generate_id(),
            trip_id: trip.id.clone(),
            name: command.name,
            category: command.category,
            total_quantity: command.total_quantity,
            notes: command.notes,
            photo_url: command.photo_url,
            version: 0,
            created_at: Utc::now(),
        };
        self.item_repository.store_item(&item)?;

        info!("item {} added to trip {} by {}", item.id, trip.id, command.actor_id);
        Ok(AddItemResult { item })
    }

    pub fn list_items_for_trip(&self, trip_id: &str) -> Result<Vec<Item>, EngineError> {
        Ok(self.item_repository.list_items_for_trip(trip_id)?)
    }

    /// Drive the trip status machine. A same-status update is a no-op,
    /// except that re-marking a completed trip re-runs the (idempotent)
    /// delivery generation. Moving into `Completed` generates deliveries
    /// and notifies every member.
    pub fn update_trip_status(
        &self,
        command: UpdateTripStatusCommand,
    ) -> Result<UpdateTripStatusResult, EngineError> {
        let next = command.status;
        let (trip, changed) = self.commit_trip_mutation(&command.trip_id, &command.actor_id, |trip| {
            if trip.status == next {
                return Ok(false);
            }
            if !trip.status.can_transition_to(next) {
                return Err(EngineError::invalid_transition(format!(
                    "trip status {} cannot change to {}",
                    trip.status, next
                )));
            }
            trip.status = next;
            Ok(true)
        })?;

        let deliveries_created = if trip.status == TripStatus::Completed {
            self.delivery_service.generate_for_completed_trip(&trip)?
        } else {
            Vec::new()
        };

        if changed {
            info!("trip {} moved to {} by {}", trip.id, trip.status, command.actor_id);
            if trip.status == TripStatus::Completed {
                for member in trip.member_ids() {
                    if member == command.actor_id {
                        continue;
                    }
                    send_or_log(
                        self.notifier.as_ref(),
                        &member,
                        NotificationKind::TripCompleted,
                        json!({ "trip_id": trip.id }),
                    );
                }
            }
        }
        Ok(UpdateTripStatusResult { trip, deliveries_created })
    }

    /// Promote or demote a member. The demotion guards (creator immunity,
    /// last-admin) run inside the same atomic commit as the set mutation.
    pub fn change_role(&self, command: ChangeRoleCommand) -> Result<ChangeRoleResult, EngineError> {
        let target = command.target_id.clone();
        let role = command.role;
        let (trip, changed) = self.commit_trip_mutation(&command.trip_id, &command.actor_id, |trip| {
            match role {
                TripRole::Admin => Ok(trip.promote(&target)),
                TripRole::Viewer => trip.demote(&target),
            }
        })?;

        if changed {
            info!(
                "{} set {} to {:?} on trip {}",
                command.actor_id, command.target_id, command.role, trip.id
            );
            send_or_log(
                self.notifier.as_ref(),
                &command.target_id,
                NotificationKind::RoleChanged,
                json!({ "trip_id": trip.id, "role": command.role }),
            );
        }
        Ok(ChangeRoleResult { trip, changed })
    }

    /// Add a viewer. Editors only; no-op for existing members.
    pub fn add_member(&self, command: AddMemberCommand) -> Result<MembershipResult, EngineError> {
        let user_id = command.user_id.clone();
        let (trip, changed) = self
            .commit_trip_mutation(&command.trip_id, &command.actor_id, |trip| {
                Ok(trip.add_viewer(&user_id))
            })?;
        Ok(MembershipResult { trip, changed })
    }

    /// Remove a member. Editors only; removing an admin runs the demotion
    /// guards, so the admin set can never be emptied this way.
    pub fn remove_member(&self, command: RemoveMemberCommand) -> Result<MembershipResult, EngineError> {
        let user_id = command.user_id.clone();
        let (trip, changed) = self
            .commit_trip_mutation(&command.trip_id, &command.actor_id, |trip| {
                trip.remove_member(&user_id)
            })?;
        Ok(MembershipResult { trip, changed })
    }

    /// Read-guard-mutate-commit loop for trip document writes. The closure
    /// runs on a fresh read each attempt and returns whether anything
    /// changed; unchanged trips are not written at all.
    fn commit_trip_mutation<F>(
        &self,
        trip_id: &str,
        actor_id: &str,
        mutate: F,
    ) -> Result<(Trip, bool), EngineError>
    where
        F: Fn(&mut Trip) -> Result<bool, EngineError>,
    {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let trip = self.require_trip(trip_id)?;
            if !trip.is_editor(actor_id) {
                return Err(EngineError::permission_denied(format!(
                    "{} may not manage trip {}",
                    actor_id, trip_id
                )));
            }
            let expected = trip.updated_at;
            let mut updated = trip.clone();
            if !mutate(&mut updated)? {
                return Ok((trip, false));
            }
            updated.updated_at = Utc::now();
            match self.connection.atomic_write(vec![
                WriteOp::CheckTripUpdatedAt {
                    trip_id: trip_id.to_string(),
                    expected,
                },
                WriteOp::PutTrip(updated.clone()),
            ]) {
                Ok(()) => return Ok((updated, true)),
                Err(StoreError::Conflict) => {
                    warn!(
                        "trip {} mutation lost a concurrent race (attempt {}/{})",
                        trip_id, attempt, MAX_COMMIT_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(EngineError::StoreConflict)
    }

    fn require_trip(&self, trip_id: &str) -> Result<Trip, EngineError> {
        self.trip_repository
            .get_trip(trip_id)?
            .ok_or_else(|| EngineError::not_found("trip", trip_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::testing::RecordingNotifier;
    use crate::storage::memory::MemoryConnection;

    fn test_service() -> (TripService<MemoryConnection>, Arc<MemoryConnection>, Arc<RecordingNotifier>) {
        let connection = Arc::new(MemoryConnection::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = TripService::new(connection.clone(), notifier.clone());
        (service, connection, notifier)
    }

    fn create_trip(service: &TripService<MemoryConnection>, viewers: &[&str]) -> Trip {
        service
            .create_trip(CreateTripCommand {
                group_id: "group-1".to_string(),
                name: "Market run".to_string(),
                creator_id: "alice".to_string(),
                shopper_id: None,
                viewer_ids: viewers.iter().map(|s| s.to_string()).collect(),
                scheduled_date: None,
            })
            .unwrap()
            .trip
    }

    #[test]
    fn creator_becomes_first_admin_and_default_shopper() {
        let (service, _, _) = test_service();
        let trip = create_trip(&service, &["bob"]);
        assert_eq!(trip.admin_ids, vec!["alice".to_string()]);
        assert_eq!(trip.shopper_id, "alice");
        assert_eq!(trip.viewer_ids, vec!["bob".to_string()]);
        assert_eq!(trip.status, TripStatus::Planned);
    }

    #[test]
    fn status_machine_rejects_backward_moves() {
        let (service, _, _) = test_service();
        let trip = create_trip(&service, &[]);

        service
            .update_trip_status(UpdateTripStatusCommand {
                trip_id: trip.id.clone(),
                actor_id: "alice".to_string(),
                status: TripStatus::Completed,
            })
            .unwrap();

        let err = service
            .update_trip_status(UpdateTripStatusCommand {
                trip_id: trip.id.clone(),
                actor_id: "alice".to_string(),
                status: TripStatus::InProgress,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
    }

    #[test]
    fn same_status_update_is_a_noop() {
        let (service, _, _) = test_service();
        let trip = create_trip(&service, &[]);
        let before = service.get_trip(&trip.id).unwrap().updated_at;

        let result = service
            .update_trip_status(UpdateTripStatusCommand {
                trip_id: trip.id.clone(),
                actor_id: "alice".to_string(),
                status: TripStatus::Planned,
            })
            .unwrap();
        assert!(result.deliveries_created.is_empty());
        assert_eq!(service.get_trip(&trip.id).unwrap().updated_at, before);
    }

    #[test]
    fn promotion_and_demotion_round_trip() {
        let (service, _, notifier) = test_service();
        let trip = create_trip(&service, &["bob"]);

        let promoted = service
            .change_role(ChangeRoleCommand {
                trip_id: trip.id.clone(),
                actor_id: "alice".to_string(),
                target_id: "bob".to_string(),
                role: TripRole::Admin,
            })
            .unwrap();
        assert!(promoted.changed);
        assert!(promoted.trip.is_editor("bob"));
        assert!(notifier.kinds_for("bob").contains(&NotificationKind::RoleChanged));

        let demoted = service
            .change_role(ChangeRoleCommand {
                trip_id: trip.id.clone(),
                actor_id: "alice".to_string(),
                target_id: "bob".to_string(),
                role: TripRole::Viewer,
            })
            .unwrap();
        assert!(demoted.changed);
        assert!(!demoted.trip.is_editor("bob"));
        assert!(demoted.trip.viewer_ids.contains(&"bob".to_string()));
    }

    #[test]
    fn demoting_the_sole_admin_fails_and_leaves_the_set_intact() {
        let (service, _, _) = test_service();
        let trip = create_trip(&service, &["bob"]);

        let err = service
            .change_role(ChangeRoleCommand {
                trip_id: trip.id.clone(),
                actor_id: "alice".to_string(),
                target_id: "alice".to_string(),
                role: TripRole::Viewer,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::LastAdminViolation));

        let stored = service.get_trip(&trip.id).unwrap();
        assert_eq!(stored.admin_ids, vec!["alice".to_string()]);
    }

    #[test]
    fn concurrent_demotions_cannot_empty_the_admin_set() {
        let (service, connection, _) = test_service();
        // Hand-crafted trip whose creator sits outside the admin set, the
        // one shape where interleaved demotions could drain it.
        let now = Utc::now();
        let trip = Trip {
            id: Trip::generate_id(),
            group_id: "group-1".to_string(),
            name: "Legacy trip".to_string(),
            creator_id: "zed".to_string(),
            shopper_id: "zed".to_string(),
            admin_ids: vec!["alice".to_string(), "bob".to_string()],
            viewer_ids: Vec::new(),
            status: TripStatus::Planned,
            scheduled_date: None,
            created_at: now,
            updated_at: now,
        };
        connection.create_trip_repository().store_trip(&trip).unwrap();

        let mut handles = Vec::new();
        for target in ["alice", "bob"] {
            let service = service.clone();
            let trip_id = trip.id.clone();
            handles.push(std::thread::spawn(move || {
                service.change_role(ChangeRoleCommand {
                    trip_id,
                    actor_id: "zed".to_string(),
                    target_id: target.to_string(),
                    role: TripRole::Viewer,
                })
            }));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let violations = results
            .iter()
            .filter(|r| matches!(r, Err(EngineError::LastAdminViolation)))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(violations, 1);
        assert_eq!(service.get_trip(&trip.id).unwrap().admin_ids.len(), 1);
    }

    #[test]
    fn non_editors_may_not_mutate() {
        let (service, _, _) = test_service();
        let trip = create_trip(&service, &["bob"]);

        let err = service
            .add_item(AddItemCommand {
                trip_id: trip.id.clone(),
                actor_id: "bob".to_string(),
                name: "Sugar".to_string(),
                category: "Pantry".to_string(),
                total_quantity: 4,
                notes: None,
                photo_url: None,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::PermissionDenied(_)));

        let err = service
            .change_role(ChangeRoleCommand {
                trip_id: trip.id.clone(),
                actor_id: "bob".to_string(),
                target_id: "bob".to_string(),
                role: TripRole::Admin,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::PermissionDenied(_)));
    }

    #[test]
    fn membership_add_and_remove() {
        let (service, _, _) = test_service();
        let trip = create_trip(&service, &[]);

        let added = service
            .add_member(AddMemberCommand {
                trip_id: trip.id.clone(),
                actor_id: "alice".to_string(),
                user_id: "dave".to_string(),
            })
            .unwrap();
        assert!(added.changed);
        assert!(added.trip.is_member("dave"));

        // adding again is a no-op
        let again = service
            .add_member(AddMemberCommand {
                trip_id: trip.id.clone(),
                actor_id: "alice".to_string(),
                user_id: "dave".to_string(),
            })
            .unwrap();
        assert!(!again.changed);

        let removed = service
            .remove_member(RemoveMemberCommand {
                trip_id: trip.id.clone(),
                actor_id: "alice".to_string(),
                user_id: "dave".to_string(),
            })
            .unwrap();
        assert!(removed.changed);
        assert!(!removed.trip.is_member("dave"));
    }

    #[test]
    fn list_trips_filters_by_membership() {
        let (service, _, _) = test_service();
        let trip = create_trip(&service, &["bob"]);
        create_trip(&service, &[]); // second trip without bob

        let bobs = service.list_trips_for_user("bob").unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].id, trip.id);
        assert_eq!(service.list_trips_for_user("alice").unwrap().len(), 2);
        assert!(service.list_trips_for_user("mallory").unwrap().is_empty());
    }
}
