//! The access-control guard.
//!
//! [`authorize`] is a pure function over the rule table in
//! [`Action::requirement`]. Rules are evaluated in a fixed order and the
//! first failing rule decides:
//!
//! 1. authentication,
//! 2. claimed-id cross check (independent of role),
//! 3. ownership, with an admin override only where the action allows one,
//! 4. role membership.

use crate::errors::{self, AuthError};
use crate::model::{Action, Actor, Decision, DenyReason, Ownership, Resource};
use crate::observe;
use tracing::warn;

pub fn authorize(actor: Option<&Actor>, action: Action, resource: &Resource) -> Decision {
    let requirement = action.requirement();

    let Some(actor) = actor else {
        return if requirement.authenticated {
            Decision::Deny(DenyReason::Unauthenticated)
        } else {
            Decision::Allow
        };
    };

    if let Some(claimed) = resource.claimed.as_ref() {
        if claimed != &actor.id {
            return Decision::Deny(DenyReason::ClaimedIdMismatch);
        }
    }

    let is_owner = resource.owners.iter().any(|owner| owner == &actor.id);
    let owner_ok = match requirement.ownership {
        Ownership::NotRequired => true,
        Ownership::Owner => is_owner,
        Ownership::OwnerOrAdmin => is_owner || actor.is_admin(),
    };
    if !owner_ok {
        return Decision::Deny(DenyReason::NotOwner);
    }

    if let Some(roles) = requirement.roles {
        if !roles.contains(&actor.role) {
            return Decision::Deny(DenyReason::RoleNotPermitted);
        }
    }

    Decision::Allow
}

/// [`authorize`] turned into a `Result`, with the denial logged and counted.
pub fn enforce(actor: Option<&Actor>, action: Action, resource: &Resource) -> Result<(), AuthError> {
    match authorize(actor, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            warn!(
                action = action.as_str(),
                resource = resource.kind,
                actor = actor.map(|a| a.id.as_str()).unwrap_or("-"),
                reason = reason.as_str(),
                "access denied"
            );
            observe::record_denial(action, reason);
            let msg = format!("{} on {}: {}", action.as_str(), resource.kind, reason.as_str());
            Err(match reason {
                DenyReason::Unauthenticated => errors::unauthenticated(&msg),
                _ => errors::forbidden(&msg),
            })
        }
    }
}
