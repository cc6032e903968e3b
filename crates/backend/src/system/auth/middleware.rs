use axum::{body::Body, extract::Request, http::StatusCode, middleware::Next, response::Response};
use contracts::system::auth::TokenClaims;

use crate::shared::data::db::get_connection;

/// Bearer token of the request, copied out so no borrow of the request
/// is held across an await
fn bearer_token(req: &Request<Body>) -> Result<String, StatusCode> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)
}

/// Validate a bearer token
async fn claims_for_token(token: String) -> Result<TokenClaims, StatusCode> {
    let db = get_connection().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    super::jwt::validate_token(db, &token)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

/// Middleware that requires valid JWT authentication
pub async fn require_auth(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let token = bearer_token(&req)?;
    let claims = claims_for_token(token).await?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware that requires the admin role
pub async fn require_admin(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let token = bearer_token(&req)?;
    let claims = claims_for_token(token).await?;
    if !claims.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware that requires an elevated role (admin or logistics)
pub async fn require_elevated(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let token = bearer_token(&req)?;
    let claims = claims_for_token(token).await?;
    if !claims.roles.iter().any(|r| r.is_elevated()) {
        return Err(StatusCode::FORBIDDEN);
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Like `require_auth`, but lets anonymous requests through without claims.
/// Used by user provisioning, which decides itself whether a caller is needed.
pub async fn optional_auth(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    if req.headers().contains_key("Authorization") {
        let token = bearer_token(&req)?;
        let claims = claims_for_token(token).await?;
        req.extensions_mut().insert(claims);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/loads");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&request(Some("Bearer abc.def"))), Ok("abc.def".to_string()));
        assert_eq!(bearer_token(&request(Some("Basic xyz"))), Err(StatusCode::UNAUTHORIZED));
        assert_eq!(bearer_token(&request(None)), Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_token_validation_future_is_send() {
        let token = bearer_token(&request(Some("Bearer t"))).unwrap();
        let validation = claims_for_token(token);
        assert_send(&validation);
    }
}
