//! Item request workflow.
//!
//! Non-editors propose new items; an editor approves or rejects. Approval
//! flips the request and appends the new item in one atomic commit, so the
//! list can never gain an item whose originating request stayed pending.

use chrono::Utc;
use log::info;
use serde_json::json;
use std::sync::Arc;

use crate::domain::commands::requests::{
    ResolveItemRequestCommand, ResolveItemRequestResult, SubmitItemRequestCommand,
    SubmitItemRequestResult,
};
use crate::domain::models::{Item, ItemRequest, RequestStatus, Trip};
use crate::error::EngineError;
use crate::notification::{send_or_log, NotificationKind, NotificationSink};
use crate::storage::traits::{Connection, ItemRequestStorage, TripStorage, WriteOp};

#[derive(Clone)]
pub struct RequestService<C: Connection> {
    connection: Arc<C>,
    trip_repository: C::TripRepository,
    request_repository: C::RequestRepository,
    notifier: Arc<dyn NotificationSink>,
}

impl<C: Connection> RequestService<C> {
    pub fn new(connection: Arc<C>, notifier: Arc<dyn NotificationSink>) -> Self {
        let trip_repository = connection.create_trip_repository();
        let request_repository = connection.create_request_repository();
        Self {
            connection,
            trip_repository,
            request_repository,
            notifier,
        }
    }

    /// Propose a new item for the trip. Any member may submit; editors are
    /// notified so one of them can decide.
    pub fn submit_request(
        &self,
        command: SubmitItemRequestCommand,
    ) -> Result<SubmitItemRequestResult, EngineError> {
        let trip = self.require_trip(&command.trip_id)?;
        if !trip.is_member(&command.requester_id) {
            return Err(EngineError::permission_denied(format!(
                "{} is not a member of trip {}",
                command.requester_id, trip.id
            )));
        }
        if trip.status.is_terminal() {
            return Err(EngineError::invalid_transition(format!(
                "cannot request items on a {} trip",
                trip.status
            )));
        }
        if command.quantity < 1 {
            return Err(EngineError::InvalidQuantity);
        }

        let request = ItemRequest {
            id: ItemRequest::generate_id(),
            trip_id: trip.id.clone(),
            requester_id: command.requester_id.clone(),
            name: command.name,
            category: command.category,
            quantity: command.quantity,
            notes: command.notes,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        };
        self.request_repository.store_request(&request)?;

        info!("item request {} submitted by {}", request.id, command.requester_id);
        for editor in trip.editor_ids() {
            if editor == command.requester_id {
                continue;
            }
            send_or_log(
                self.notifier.as_ref(),
                &editor,
                NotificationKind::ItemRequested,
                json!({
                    "trip_id": trip.id,
                    "request_id": request.id,
                    "name": request.name,
                    "quantity": request.quantity,
                }),
            );
        }
        Ok(SubmitItemRequestResult { request })
    }

    /// Decide a pending request. Approval appends the requested item to
    /// the trip in the same atomic write; rejection only flips the status.
    /// Deciding an already-decided request is an `InvalidTransition`.
    pub fn resolve_request(
        &self,
        command: ResolveItemRequestCommand,
    ) -> Result<ResolveItemRequestResult, EngineError> {
        let mut request = self
            .request_repository
            .get_request(&command.request_id)?
            .ok_or_else(|| EngineError::not_found("request", &command.request_id))?;
        let trip = self.require_trip(&request.trip_id)?;
        if !trip.is_editor(&command.resolver_id) {
            return Err(EngineError::permission_denied(format!(
                "{} may not decide requests on trip {}",
                command.resolver_id, trip.id
            )));
        }
        if request.status != RequestStatus::Pending {
            return Err(EngineError::invalid_transition(format!(
                "request {} is already {}",
                request.id, request.status
            )));
        }

        let now = Utc::now();
        request.resolved_at = Some(now);
        request.resolved_by = Some(command.resolver_id.clone());

        let item = if command.approve {
            request.status = RequestStatus::Approved;
            let item = Item {
                id: Item::generate_id(),
                trip_id: trip.id.clone(),
                name: request.name.clone(),
                category: request.category.clone(),
                total_quantity: request.quantity,
                notes: request.notes.clone(),
                photo_url: None,
                version: 0,
                created_at: now,
            };
            self.connection.atomic_write(vec![
                WriteOp::PutRequest(request.clone()),
                WriteOp::PutItem(item.clone()),
            ])?;
            Some(item)
        } else {
            request.status = RequestStatus::Rejected;
            self.request_repository.store_request(&request)?;
            None
        };

        info!(
            "request {} {} by {}",
            request.id, request.status, command.resolver_id
        );
        let kind = if command.approve {
            NotificationKind::RequestApproved
        } else {
            NotificationKind::RequestRejected
        };
        send_or_log(
            self.notifier.as_ref(),
            &request.requester_id,
            kind,
            json!({ "trip_id": trip.id, "request_id": request.id }),
        );
        Ok(ResolveItemRequestResult { request, item })
    }

    pub fn list_requests_for_trip(&self, trip_id: &str) -> Result<Vec<ItemRequest>, EngineError> {
        Ok(self.request_repository.list_requests_for_trip(trip_id)?)
    }

    fn require_trip(&self, trip_id: &str) -> Result<Trip, EngineError> {
        self.trip_repository
            .get_trip(trip_id)?
            .ok_or_else(|| EngineError::not_found("trip", trip_id))
    }
}
