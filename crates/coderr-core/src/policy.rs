//! # Authorization Policy
//!
//! One table decides who may do what. Handlers never check roles or ownership
//! themselves; they ask [`authorize`] and act on the [`Decision`].
//!
//! ## Evaluation Order
//! ```text
//! authorize(actor, action, target)
//!     │
//!     ├── 1. rule.authenticated && actor is None ──► Deny(Unauthenticated)
//!     │
//!     ├── 2. rule.role = Some(kind) && actor.kind != kind
//!     │                                          ──► Deny(RoleMismatch)
//!     │
//!     ├── 3. object check against target
//!     │       Owner           actor == owner     ──► else Deny(NotOwner)
//!     │       Counterparty    actor == business  ──► else Deny(NotCounterparty)
//!     │       Admin           actor.is_staff     ──► else Deny(AdminOnly)
//!     │       (target missing or wrong kind: fails closed)
//!     │
//!     └── Allow
//! ```
//!
//! The function is pure: no I/O, no clock, no side effects.

use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::{Actor, ProfileKind};

// =============================================================================
// Actions
// =============================================================================

/// Every guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ProfileRetrieve,
    ProfileUpdate,
    ProfileList,
    OfferList,
    OfferRetrieve,
    OfferCreate,
    OfferUpdate,
    OfferDelete,
    OfferDetailRetrieve,
    OrderList,
    OrderCreate,
    OrderUpdateStatus,
    OrderDelete,
    OrderCount,
    ReviewList,
    ReviewCreate,
    ReviewUpdate,
    ReviewDelete,
    StatsBaseInfo,
}

impl Action {
    pub const ALL: [Action; 19] = [
        Action::ProfileRetrieve,
        Action::ProfileUpdate,
        Action::ProfileList,
        Action::OfferList,
        Action::OfferRetrieve,
        Action::OfferCreate,
        Action::OfferUpdate,
        Action::OfferDelete,
        Action::OfferDetailRetrieve,
        Action::OrderList,
        Action::OrderCreate,
        Action::OrderUpdateStatus,
        Action::OrderDelete,
        Action::OrderCount,
        Action::ReviewList,
        Action::ReviewCreate,
        Action::ReviewUpdate,
        Action::ReviewDelete,
        Action::StatsBaseInfo,
    ];

    /// Stable tag used in logs.
    pub const fn tag(&self) -> &'static str {
        match self {
            Action::ProfileRetrieve => "profile.retrieve",
            Action::ProfileUpdate => "profile.update",
            Action::ProfileList => "profile.list",
            Action::OfferList => "offer.list",
            Action::OfferRetrieve => "offer.retrieve",
            Action::OfferCreate => "offer.create",
            Action::OfferUpdate => "offer.update",
            Action::OfferDelete => "offer.delete",
            Action::OfferDetailRetrieve => "offerdetail.retrieve",
            Action::OrderList => "order.list",
            Action::OrderCreate => "order.create",
            Action::OrderUpdateStatus => "order.update_status",
            Action::OrderDelete => "order.delete",
            Action::OrderCount => "order.count",
            Action::ReviewList => "review.list",
            Action::ReviewCreate => "review.create",
            Action::ReviewUpdate => "review.update",
            Action::ReviewDelete => "review.delete",
            Action::StatsBaseInfo => "stats.base_info",
        }
    }

    /// The policy table row for this action.
    pub const fn rule(&self) -> Rule {
        use ObjectCheck::*;
        use ProfileKind::*;

        match self {
            Action::OfferList | Action::StatsBaseInfo => Rule::public(),

            Action::ProfileRetrieve
            | Action::ProfileList
            | Action::OfferRetrieve
            | Action::OfferDetailRetrieve
            | Action::OrderList
            | Action::OrderCount
            | Action::ReviewList => Rule::authenticated(None, NoCheck),

            Action::ProfileUpdate
            | Action::OfferUpdate
            | Action::OfferDelete
            | Action::ReviewUpdate
            | Action::ReviewDelete => Rule::authenticated(None, Owner),

            Action::OfferCreate => Rule::authenticated(Some(Business), NoCheck),
            Action::OrderCreate | Action::ReviewCreate => {
                Rule::authenticated(Some(Customer), NoCheck)
            }
            Action::OrderUpdateStatus => Rule::authenticated(Some(Business), Counterparty),
            Action::OrderDelete => Rule::authenticated(None, Admin),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Object-level requirement of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectCheck {
    NoCheck,
    /// Actor must own the target (profile user, offer owner, review author).
    Owner,
    /// Actor must be the business party of the target order.
    Counterparty,
    /// Actor must hold the administrative role.
    Admin,
}

/// One row of the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub authenticated: bool,
    pub role: Option<ProfileKind>,
    pub check: ObjectCheck,
}

impl Rule {
    const fn public() -> Self {
        Rule {
            authenticated: false,
            role: None,
            check: ObjectCheck::NoCheck,
        }
    }

    const fn authenticated(role: Option<ProfileKind>, check: ObjectCheck) -> Self {
        Rule {
            authenticated: true,
            role,
            check,
        }
    }
}

// =============================================================================
// Targets
// =============================================================================

/// The ownership facts of the entity an action is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Profile { user_id: i64 },
    Offer { owner_id: i64 },
    Order { customer_id: i64, business_id: i64 },
    Review { reviewer_id: i64 },
}

impl Target {
    fn owner_id(&self) -> Option<i64> {
        match *self {
            Target::Profile { user_id } => Some(user_id),
            Target::Offer { owner_id } => Some(owner_id),
            Target::Review { reviewer_id } => Some(reviewer_id),
            Target::Order { .. } => None,
        }
    }

    fn business_id(&self) -> Option<i64> {
        match *self {
            Target::Order { business_id, .. } => Some(business_id),
            _ => None,
        }
    }
}

// =============================================================================
// Decisions
// =============================================================================

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    RoleMismatch { required: ProfileKind },
    NotOwner,
    NotCounterparty,
    AdminOnly,
}

impl DenyReason {
    /// Machine-readable code surfaced to clients.
    pub const fn code(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "UNAUTHENTICATED",
            DenyReason::RoleMismatch { .. } => "ROLE_MISMATCH",
            DenyReason::NotOwner | DenyReason::NotCounterparty | DenyReason::AdminOnly => {
                "FORBIDDEN"
            }
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Unauthenticated => {
                f.write_str("Authentication credentials were not provided.")
            }
            DenyReason::RoleMismatch { required } => {
                write!(f, "Only {} users can perform this action.", required)
            }
            DenyReason::NotOwner => f.write_str("You are not the owner of this resource."),
            DenyReason::NotCounterparty => {
                f.write_str("Only the business user of this order can change its status.")
            }
            DenyReason::AdminOnly => f.write_str("Only administrators can perform this action."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts a denial into the matching [`CoreError`].
    pub fn into_result(self) -> CoreResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::Unauthenticated) => Err(CoreError::Unauthenticated),
            Decision::Deny(reason) => Err(CoreError::PermissionDenied { reason }),
        }
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Evaluates the policy table.
pub fn authorize(actor: Option<&Actor>, action: Action, target: Option<&Target>) -> Decision {
    let rule = action.rule();

    let actor = match actor {
        Some(actor) => actor,
        None if rule.authenticated => return Decision::Deny(DenyReason::Unauthenticated),
        None => return Decision::Allow,
    };

    if let Some(required) = rule.role {
        if !actor.is(required) {
            return Decision::Deny(DenyReason::RoleMismatch { required });
        }
    }

    match rule.check {
        ObjectCheck::NoCheck => Decision::Allow,
        ObjectCheck::Owner => match target.and_then(Target::owner_id) {
            Some(owner) if owner == actor.user_id => Decision::Allow,
            _ => Decision::Deny(DenyReason::NotOwner),
        },
        ObjectCheck::Counterparty => match target.and_then(Target::business_id) {
            Some(business) if business == actor.user_id => Decision::Allow,
            _ => Decision::Deny(DenyReason::NotCounterparty),
        },
        ObjectCheck::Admin if actor.is_staff => Decision::Allow,
        ObjectCheck::Admin => Decision::Deny(DenyReason::AdminOnly),
    }
}

/// [`authorize`] followed by [`Decision::into_result`].
pub fn ensure(actor: Option<&Actor>, action: Action, target: Option<&Target>) -> CoreResult<()> {
    authorize(actor, action, target).into_result()
}

/// The actor of an authenticated action.
///
/// Call after [`ensure`] allowed an action whose rule requires authentication.
pub fn require_actor(actor: Option<&Actor>) -> CoreResult<&Actor> {
    actor.ok_or(CoreError::Unauthenticated)
}

// =============================================================================
// Unit Tests
// =============================================================================
