//! Role directory: principal records, the role lookup behind every
//! authenticated request, and the archive written when a principal leaves.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, instrument};
use uphone_auth::prelude::*;
use uphone_errors::prelude::ErrorKind;
use uphone_storage::prelude::*;
use uphone_tx::{errors::TxError, saga::Saga, saga::SagaStep};
use uphone_types::prelude::*;

use crate::access::admit;
use crate::errors::{MarketError, MarketResult};
use crate::metrics;
use crate::model::{ArchivedPrincipal, Principal, ProfilePatch, PublicProfile, Registration};

#[derive(Clone, Debug, PartialEq)]
pub enum Registered {
    Created(Principal),
    AlreadyExists(Principal),
}

impl Registered {
    pub fn principal(&self) -> &Principal {
        match self {
            Registered::Created(p) | Registered::AlreadyExists(p) => p,
        }
    }
}

pub struct RoleDirectory {
    principals: Arc<dyn Repository<Principal>>,
    archive_saga: Saga<ArchiveContext>,
}

impl RoleDirectory {
    pub fn new(
        principals: Arc<dyn Repository<Principal>>,
        archive: Arc<dyn Repository<ArchivedPrincipal>>,
    ) -> Self {
        let archive_saga = Saga::new("archive_principal")
            .step(CopyToArchive { archive })
            .step(RemovePrincipal {
                principals: principals.clone(),
            });
        Self {
            principals,
            archive_saga,
        }
    }

    #[instrument(name = "directory.register", skip(self, registration), fields(uid = %registration.uid))]
    pub async fn register(&self, registration: Registration) -> MarketResult<Registered> {
        if registration.role.is_admin() {
            return Err(MarketError::role_escalation());
        }
        registration.validate()?;

        if let Some(existing) = self.principals.get(registration.uid.as_str()).await? {
            return Ok(Registered::AlreadyExists(existing));
        }

        let principal = Principal {
            id: registration.uid,
            email: registration.email,
            full_name: registration.full_name,
            role: registration.role,
            profile_photo: registration.profile_photo,
            created_at: Timestamp::now(),
        };
        match self.principals.create(&principal).await {
            Ok(()) => {
                info!(role = %principal.role, "principal registered");
                Ok(Registered::Created(principal))
            }
            Err(err) if err.kind() == ErrorKind::Conflict => {
                // lost an insert race against the same uid
                let existing = self
                    .principals
                    .get(principal.id.as_str())
                    .await?
                    .ok_or_else(|| MarketError::from(err))?;
                Ok(Registered::AlreadyExists(existing))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Maps a verified credential onto the directory role. Principals that
    /// never registered (or were archived) get no role and are refused.
    pub async fn resolve(&self, verified: &VerifiedPrincipal) -> MarketResult<Actor> {
        let principal = self
            .principals
            .get(verified.principal_id.as_str())
            .await?
            .ok_or_else(|| MarketError::forbidden("principal is not registered"))?;
        Ok(Actor::new(principal.id, principal.role))
    }

    pub async fn get(&self, id: &Id) -> MarketResult<Principal> {
        self.principals
            .get(id.as_str())
            .await?
            .ok_or_else(|| MarketError::not_found("user"))
    }

    pub async fn public_profile(&self, id: &Id) -> MarketResult<PublicProfile> {
        self.get(id).await.map(|p| PublicProfile::from(&p))
    }

    /// Profile for joined views; a missing principal is not an error there.
    pub async fn find_profile(&self, id: &Id) -> MarketResult<Option<PublicProfile>> {
        Ok(self
            .principals
            .get(id.as_str())
            .await?
            .map(|p| PublicProfile::from(&p)))
    }

    #[instrument(name = "directory.list", skip(self, actor))]
    pub async fn list(&self, actor: Option<&Actor>) -> MarketResult<Vec<Principal>> {
        admit(actor, Action::ListPrincipals, &Resource::new("principal"))?;
        let principals = self
            .principals
            .select(QueryParams::default().order_by("createdAt", SortOrder::Asc))
            .await?;
        Ok(principals)
    }

    #[instrument(name = "directory.patch_profile", skip(self, actor, patch), fields(id = %id))]
    pub async fn patch_profile(
        &self,
        actor: Option<&Actor>,
        id: &Id,
        patch: ProfilePatch,
    ) -> MarketResult<Principal> {
        let resource = Resource::new("principal").owned_by(id.clone());
        admit(actor, Action::PatchProfile, &resource)?;
        patch.validate()?;
        if patch.is_empty() {
            return self.get(id).await;
        }
        let document = serde_json::to_value(&patch)?;
        Ok(self.principals.update(id.as_str(), document).await?)
    }

    #[instrument(name = "directory.archive", skip(self, actor), fields(id = %id))]
    pub async fn archive(&self, actor: Option<&Actor>, id: &Id) -> MarketResult<ArchivedPrincipal> {
        let principal = self.get(id).await?;
        let resource = Resource::new("principal").owned_by(principal.id.clone());
        let actor = admit(actor, Action::ArchivePrincipal, &resource)?;

        let mut ctx = ArchiveContext {
            record: ArchivedPrincipal {
                id: Id::new_random(),
                principal,
                archived_at: Timestamp::now(),
                archived_by: actor.id.clone(),
            },
        };
        match self.archive_saga.run(&mut ctx).await {
            Ok(_) => {
                info!(archived_by = %actor.id, "principal archived");
                Ok(ctx.record)
            }
            Err(abort) => {
                metrics::record_saga_abort(abort.saga, abort.state);
                Err(abort.into_error().into())
            }
        }
    }
}

struct ArchiveContext {
    record: ArchivedPrincipal,
}

struct CopyToArchive {
    archive: Arc<dyn Repository<ArchivedPrincipal>>,
}

#[async_trait]
impl SagaStep<ArchiveContext> for CopyToArchive {
    fn name(&self) -> &'static str {
        "copy_to_archive"
    }

    async fn execute(&self, ctx: &mut ArchiveContext) -> Result<(), TxError> {
        self.archive
            .create(&ctx.record)
            .await
            .map_err(|err| TxError(err.into_inner()))
    }

    async fn compensate(&self, ctx: &mut ArchiveContext) -> Result<(), TxError> {
        self.archive
            .delete(ctx.record.id.as_str())
            .await
            .map_err(|err| TxError(err.into_inner()))
    }
}

struct RemovePrincipal {
    principals: Arc<dyn Repository<Principal>>,
}

#[async_trait]
impl SagaStep<ArchiveContext> for RemovePrincipal {
    fn name(&self) -> &'static str {
        "remove_principal"
    }

    async fn execute(&self, ctx: &mut ArchiveContext) -> Result<(), TxError> {
        let expected = json!({ "id": ctx.record.principal.id });
        let removed = self
            .principals
            .delete_if(ctx.record.principal.id.as_str(), expected)
            .await
            .map_err(|err| TxError(err.into_inner()))?;
        if removed {
            Ok(())
        } else {
            Err(TxError::not_found("principal disappeared before archiving"))
        }
    }
}
