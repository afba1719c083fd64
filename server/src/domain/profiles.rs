//! User profile assembly
//!
//! A profile is split between two owners: the identity provider keeps the
//! name, email and default picture, the local database keeps an uploaded
//! avatar and a status line. A local avatar always wins over the picture.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::data::DataError;
use crate::data::TransactionalRepository;
use crate::data::identity::{IdentityError, IdentityProvider, IdentityUser};
use crate::data::types::UserRow;
use crate::utils::avatar::data_uri;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// User profile as shown on pages and in search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    /// Image URL or `data:` URI
    pub avatar: Option<String>,
    pub status: Option<String>,
}

impl UserProfile {
    /// Merge the identity record (if it could be loaded) with the local row
    pub fn merge(id: &str, identity: Option<IdentityUser>, local: Option<&UserRow>) -> Self {
        let local_avatar = local.and_then(|row| match (&row.avatar, &row.avatar_mime) {
            (Some(bytes), Some(mime)) if !bytes.is_empty() => Some(data_uri(bytes, mime)),
            _ => None,
        });
        let status = local.and_then(|row| row.status.clone());

        match identity {
            Some(user) => Self {
                id: id.to_string(),
                name: user.name,
                email: user.email,
                avatar: local_avatar.or(user.picture),
                status,
            },
            None => Self {
                id: id.to_string(),
                name: id.to_string(),
                email: None,
                avatar: local_avatar,
                status,
            },
        }
    }
}

/// Load the full profile of one user; identity provider failures propagate
pub async fn load_profile(
    identity: &dyn IdentityProvider,
    repo: &dyn TransactionalRepository,
    id: &str,
) -> Result<UserProfile, ProfileError> {
    let user = identity.get_user(id).await?;
    let local = repo.get_profile(id).await?;
    Ok(UserProfile::merge(id, Some(user), local.as_ref()))
}

/// Load profiles for a list of users, keeping the input order
///
/// Users the identity provider can't return are shown by their ID rather
/// than failing the whole page.
pub async fn load_profiles(
    identity: &dyn IdentityProvider,
    repo: &dyn TransactionalRepository,
    ids: &[String],
) -> Result<Vec<UserProfile>, DataError> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(id.clone());
        }
    }

    let lookups = unique.iter().map(|id| async move {
        match identity.get_user(id).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(user_id = %id, error = %e, "Identity lookup failed, showing user id");
                None
            }
        }
    });
    let identities = futures::future::join_all(lookups).await;

    let locals: HashMap<String, UserRow> = repo
        .get_profiles(&unique)
        .await?
        .into_iter()
        .map(|row| (row.id.clone(), row))
        .collect();

    let by_id: HashMap<&str, UserProfile> = unique
        .iter()
        .zip(identities)
        .map(|(id, user)| {
            (
                id.as_str(),
                UserProfile::merge(id, user, locals.get(id.as_str())),
            )
        })
        .collect();

    Ok(ids
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).cloned())
        .collect())
}

/// Attach local avatars and statuses to identity search results
pub async fn with_local_profiles(
    repo: &dyn TransactionalRepository,
    users: Vec<IdentityUser>,
) -> Result<Vec<UserProfile>, DataError> {
    let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
    let locals: HashMap<String, UserRow> = repo
        .get_profiles(&ids)
        .await?
        .into_iter()
        .map(|row| (row.id.clone(), row))
        .collect();

    Ok(users
        .into_iter()
        .map(|user| {
            let id = user.id.clone();
            UserProfile::merge(&id, Some(user), locals.get(&id))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::data::SqliteService;

    struct StubIdentity;

    #[async_trait]
    impl IdentityProvider for StubIdentity {
        fn authorize_url(&self, _state: &str, _redirect_uri: &str) -> Result<String, IdentityError> {
            Ok(String::new())
        }

        async fn exchange_code(
            &self,
            _code: &str,
            _redirect_uri: &str,
        ) -> Result<IdentityUser, IdentityError> {
            Err(IdentityError::Config("unused".into()))
        }

        fn logout_url(&self, _return_to: &str) -> Result<String, IdentityError> {
            Ok(String::new())
        }

        async fn get_user(&self, id: &str) -> Result<IdentityUser, IdentityError> {
            if id == "ghost" {
                return Err(IdentityError::Status {
                    status: 404,
                    body: "not found".into(),
                });
            }
            Ok(identity_user(id))
        }

        async fn search_users(
            &self,
            _query: &str,
            _page: u32,
        ) -> Result<Vec<IdentityUser>, IdentityError> {
            Ok(Vec::new())
        }

        async fn update_username(&self, _id: &str, _name: &str) -> Result<(), IdentityError> {
            Ok(())
        }

        async fn delete_user(&self, _id: &str) -> Result<(), IdentityError> {
            Ok(())
        }
    }

    fn identity_user(id: &str) -> IdentityUser {
        IdentityUser {
            id: id.to_string(),
            name: format!("{}-name", id),
            email: Some(format!("{}@example.com", id)),
            picture: Some(format!("https://pics.example.com/{}.png", id)),
        }
    }

    #[test]
    fn test_local_avatar_overrides_picture() {
        let row = UserRow {
            id: "alice".into(),
            avatar: Some(vec![1, 2, 3]),
            avatar_mime: Some("image/png".into()),
            status: Some("Busy".into()),
            created_at: 0,
            updated_at: 0,
        };
        let profile = UserProfile::merge("alice", Some(identity_user("alice")), Some(&row));
        assert_eq!(profile.avatar.as_deref(), Some("data:image/png;base64,AQID"));
        assert_eq!(profile.status.as_deref(), Some("Busy"));
        assert_eq!(profile.name, "alice-name");

        let profile = UserProfile::merge("alice", Some(identity_user("alice")), None);
        assert_eq!(
            profile.avatar.as_deref(),
            Some("https://pics.example.com/alice.png")
        );
    }

    #[tokio::test]
    async fn test_load_profiles_degrades_unknown_users() {
        let repo = Arc::new(SqliteService::in_memory().await.unwrap());
        repo.set_status("bob", Some("Fixing things")).await.unwrap();

        let ids = vec!["bob".to_string(), "ghost".to_string(), "bob".to_string()];
        let profiles = load_profiles(&StubIdentity, &repo, &ids).await.unwrap();

        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles[0].name, "bob-name");
        assert_eq!(profiles[0].status.as_deref(), Some("Fixing things"));
        assert_eq!(profiles[1].name, "ghost");
        assert!(profiles[1].email.is_none());
    }

    #[tokio::test]
    async fn test_load_profile_propagates_identity_errors() {
        let repo = Arc::new(SqliteService::in_memory().await.unwrap());
        let err = load_profile(&StubIdentity, &repo, "ghost").await.unwrap_err();
        assert!(matches!(err, ProfileError::Identity(ref e) if e.is_not_found()));
    }
}
