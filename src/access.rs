//! Thin adapter between the services and `uphone_auth::guard`.

use uphone_auth::prelude::*;

use crate::errors::{MarketError, MarketResult};

/// Runs the guard for an action that needs a signed-in caller and hands the
/// caller back.
pub(crate) fn admit<'a>(
    actor: Option<&'a Actor>,
    action: Action,
    resource: &Resource,
) -> MarketResult<&'a Actor> {
    enforce(actor, action, resource)?;
    actor.ok_or_else(|| MarketError::unauthenticated(action.as_str()))
}
