use serde::{Deserialize, Serialize};
use uphone_storage::Entity;
use uphone_types::prelude::*;

use super::require_text;
use crate::errors::MarketResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: Id,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
    pub created_at: Timestamp,
}

impl Entity for Principal {
    const TABLE: &'static str = "principals";

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// The only view of a principal other principals may see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Id,
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

impl From<&Principal> for PublicProfile {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.clone(),
            full_name: principal.full_name.clone(),
            email: principal.email.clone(),
            profile_photo: principal.profile_photo.clone(),
        }
    }
}

/// Body of `POST /users`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub uid: Id,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub profile_photo: Option<String>,
}

impl Registration {
    pub fn validate(&self) -> MarketResult<()> {
        require_text("uid", self.uid.as_str())?;
        require_text("email", &self.email)?;
        require_text("fullName", &self.full_name)
    }
}

/// Fields a principal may change about themselves. `role` is not one of them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

impl ProfilePatch {
    pub fn validate(&self) -> MarketResult<()> {
        if let Some(name) = self.full_name.as_deref() {
            require_text("fullName", name)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.profile_photo.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedPrincipal {
    pub id: Id,
    pub principal: Principal,
    pub archived_at: Timestamp,
    pub archived_by: Id,
}

impl Entity for ArchivedPrincipal {
    const TABLE: &'static str = "archived-principals";

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_profile_has_no_role() {
        let principal = Principal {
            id: Id::from("u1"),
            email: "u1@example.com".into(),
            full_name: "User One".into(),
            role: Role::Seller,
            profile_photo: None,
            created_at: Timestamp(0),
        };
        let value = serde_json::to_value(PublicProfile::from(&principal)).unwrap();
        assert!(value.get("role").is_none());
        assert_eq!(value["fullName"], "User One");
    }

    #[test]
    fn profile_patch_rejects_role() {
        let parsed: Result<ProfilePatch, _> =
            serde_json::from_value(serde_json::json!({ "role": "admin" }));
        assert!(parsed.is_err());
    }
}
