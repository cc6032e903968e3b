use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use contracts::system::auth::{ActorContext, TokenClaims};

use crate::shared::data::db::get_connection;

/// Extractor for getting current user from JWT token
/// Usage in handlers: `async fn handler(CurrentUser(claims): CurrentUser) -> Response`
pub struct CurrentUser(pub TokenClaims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// Claims when the caller sent a token, `None` for anonymous calls
pub struct MaybeUser(pub Option<TokenClaims>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<TokenClaims>().cloned()))
    }
}

/// The acting account with roles and warehouse / client links read from
/// the account directory on every request
pub struct CurrentActor(pub ActorContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(claims) = CurrentUser::from_request_parts(parts, state).await?;
        let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let actor = super::actor::resolve(db, &claims.sub).await.map_err(|e| {
            tracing::error!("Failed to resolve actor {}: {}", claims.sub, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        actor.map(CurrentActor).ok_or(StatusCode::UNAUTHORIZED)
    }
}
