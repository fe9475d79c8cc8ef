//! Request extractors.
//!
//! The auth middleware stores the resolved account in the request
//! extensions; these extractors are the required/optional views onto it.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use snapfeed_common::AppError;
use snapfeed_db::entities::user;

/// Authenticated user. Rejects with [`AppError::Unauthorized`] when no
/// valid credential accompanied the request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user. Absence of a credential is not an
/// error; handlers receive `None`.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn empty_parts() -> Parts {
        axum::http::Request::builder()
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn test_auth_user_rejects_without_credential() {
        let mut parts = empty_parts();

        let result = AuthUser::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_maybe_auth_user_is_none_without_credential() {
        let mut parts = empty_parts();

        let MaybeAuthUser(user) = MaybeAuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert!(user.is_none());
    }
}
