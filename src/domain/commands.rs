//! Domain-level command and query types.
//! These structs are the service inputs and outputs inside the engine; the
//! calling service is responsible for mapping its own API surface onto
//! them.

pub mod trips {
    use chrono::NaiveDate;

    use crate::domain::models::{Delivery, Item, Trip, TripRole, TripStatus};

    /// Input for creating a new trip. The creator becomes the first admin;
    /// the shopper defaults to the creator when not given.
    #[derive(Debug, Clone)]
    pub struct CreateTripCommand {
        pub group_id: String,
        pub name: String,
        pub creator_id: String,
        pub shopper_id: Option<String>,
        pub viewer_ids: Vec<String>,
        pub scheduled_date: Option<NaiveDate>,
    }

    #[derive(Debug, Clone)]
    pub struct CreateTripResult {
        pub trip: Trip,
    }

    /// Input for moving a trip through its status machine.
    #[derive(Debug, Clone)]
    pub struct UpdateTripStatusCommand {
        pub trip_id: String,
        pub actor_id: String,
        pub status: TripStatus,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateTripStatusResult {
        pub trip: Trip,
        /// Deliveries generated by this call (empty unless the trip moved
        /// into, or was re-marked, completed).
        pub deliveries_created: Vec<Delivery>,
    }

    /// Input for promoting or demoting a member.
    #[derive(Debug, Clone)]
    pub struct ChangeRoleCommand {
        pub trip_id: String,
        pub actor_id: String,
        pub target_id: String,
        pub role: TripRole,
    }

    #[derive(Debug, Clone)]
    pub struct ChangeRoleResult {
        pub trip: Trip,
        pub changed: bool,
    }

    /// Input for adding a viewer to the trip.
    #[derive(Debug, Clone)]
    pub struct AddMemberCommand {
        pub trip_id: String,
        pub actor_id: String,
        pub user_id: String,
    }

    /// Input for removing a member from the trip.
    #[derive(Debug, Clone)]
    pub struct RemoveMemberCommand {
        pub trip_id: String,
        pub actor_id: String,
        pub user_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct MembershipResult {
        pub trip: Trip,
        pub changed: bool,
    }

    /// Input for appending an item to the trip's list.
    #[derive(Debug, Clone)]
    pub struct AddItemCommand {
        pub trip_id: String,
        pub actor_id: String,
        pub name: String,
        pub category: String,
        pub total_quantity: u32,
        pub notes: Option<String>,
        pub photo_url: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct AddItemResult {
        pub item: Item,
    }
}

pub mod claims {
    use crate::domain::models::{Claim, DebtTransaction, Item};

    /// One (item, quantity) entry in a claim batch.
    #[derive(Debug, Clone)]
    pub struct ClaimEntry {
        pub item_id: String,
        pub quantity: u32,
    }

    /// Input for claiming one or more items in a single action. All claims
    /// commit together with exactly one covering debt transaction.
    #[derive(Debug, Clone)]
    pub struct CreateClaimsCommand {
        pub trip_id: String,
        pub claimer_id: String,
        pub entries: Vec<ClaimEntry>,
    }

    #[derive(Debug, Clone)]
    pub struct CreateClaimsResult {
        pub claims: Vec<Claim>,
        pub transaction: DebtTransaction,
    }

    /// Input for an editor's accept/reject decision on a pending claim.
    #[derive(Debug, Clone)]
    pub struct RespondToClaimCommand {
        pub claim_id: String,
        pub responder_id: String,
        pub accept: bool,
    }

    #[derive(Debug, Clone)]
    pub struct RespondToClaimResult {
        pub claim: Claim,
    }

    /// Input for cancelling a claim.
    #[derive(Debug, Clone)]
    pub struct CancelClaimCommand {
        pub claim_id: String,
        pub actor_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct CancelClaimResult {
        pub claim: Claim,
    }

    /// Input for toggling completion on an accepted claim.
    #[derive(Debug, Clone)]
    pub struct SetClaimCompletionCommand {
        pub claim_id: String,
        pub actor_id: String,
        pub completed: bool,
    }

    #[derive(Debug, Clone)]
    pub struct SetClaimCompletionResult {
        pub claim: Claim,
        /// True when every accepted claim on the trip is now completed;
        /// the editor's workflow may use this to prompt delivery.
        pub all_accepted_completed: bool,
    }

    /// Snapshot of an item's claim arithmetic.
    #[derive(Debug, Clone)]
    pub struct ItemAvailability {
        pub item: Item,
        pub claimed_quantity: u32,
        pub remaining_quantity: u32,
    }
}

pub mod transactions {
    use crate::domain::models::{DebtTransaction, UserBalance};

    /// Input for settling a pending debt. Irreversible.
    #[derive(Debug, Clone)]
    pub struct SettleTransactionCommand {
        pub transaction_id: String,
        pub actor_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct SettleTransactionResult {
        pub transaction: DebtTransaction,
    }

    /// Query for a user's derived balance, optionally scoped to one trip.
    #[derive(Debug, Clone)]
    pub struct UserBalanceQuery {
        pub user_id: String,
        pub trip_id: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct UserBalanceResult {
        pub balance: UserBalance,
    }
}

pub mod deliveries {
    use crate::domain::models::Delivery;

    /// Input for marking a delivery handed over or taking that back.
    #[derive(Debug, Clone)]
    pub struct SetDeliveryCommand {
        pub delivery_id: String,
        pub actor_id: String,
        pub delivered: bool,
        pub confirmation_note: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct SetDeliveryResult {
        pub delivery: Delivery,
    }
}

pub mod requests {
    use crate::domain::models::{Item, ItemRequest};

    /// Input for proposing a new item on a trip.
    #[derive(Debug, Clone)]
    pub struct SubmitItemRequestCommand {
        pub trip_id: String,
        pub requester_id: String,
        pub name: String,
        pub category: String,
        pub quantity: u32,
        pub notes: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct SubmitItemRequestResult {
        pub request: ItemRequest,
    }

    /// Input for an editor's decision on a pending request.
    #[derive(Debug, Clone)]
    pub struct ResolveItemRequestCommand {
        pub request_id: String,
        pub resolver_id: String,
        pub approve: bool,
    }

    #[derive(Debug, Clone)]
    pub struct ResolveItemRequestResult {
        pub request: ItemRequest,
        /// The item appended on approval; `None` on rejection.
        pub item: Option<Item>,
    }
}
