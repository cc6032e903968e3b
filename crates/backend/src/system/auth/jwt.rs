use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::{RoleTag, TokenClaims};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24;
const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 90;

/// Generate JWT access token carrying the account roles
pub async fn generate_access_token(
    db: &DatabaseConnection,
    user_id: &str,
    username: &str,
    roles: &[RoleTag],
) -> Result<String> {
    let now = Utc::now();
    let exp = (now + chrono::Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claims = TokenClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        roles: roles.to_vec(),
        exp,
        iat,
    };

    let secret = get_jwt_secret(db).await?;
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")?;

    Ok(token)
}

/// Validate JWT token and extract claims
pub async fn validate_token(db: &DatabaseConnection, token: &str) -> Result<TokenClaims> {
    let secret = get_jwt_secret(db).await?;

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;

    Ok(token_data.claims)
}

/// Generate refresh token (UUID-based)
pub fn generate_refresh_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Get or create JWT secret stored in sys_settings
pub async fn get_jwt_secret(db: &DatabaseConnection) -> Result<String> {
    match get_jwt_secret_from_db(db).await {
        Ok(Some(secret)) => Ok(secret),
        Ok(None) => {
            save_jwt_secret_to_db(db, &generate_jwt_secret()).await?;
            tracing::info!("Generated new JWT secret");
            get_jwt_secret_from_db(db)
                .await?
                .ok_or_else(|| anyhow::anyhow!("JWT secret missing after insert"))
        }
        Err(e) => Err(e.context("Failed to read JWT secret")),
    }
}

/// 256 random bits, base64 encoded
fn generate_jwt_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    general_purpose::STANDARD.encode(&random_bytes)
}

async fn get_jwt_secret_from_db(db: &DatabaseConnection) -> Result<Option<String>> {
    let result = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT value FROM sys_settings WHERE key = ?",
            ["jwt_secret".into()],
        ))
        .await?;

    match result {
        Some(row) => {
            let secret: String = row.try_get("", "value")?;
            Ok(Some(secret))
        }
        None => Ok(None),
    }
}

/// First writer wins; a concurrent loser re-reads the stored value
async fn save_jwt_secret_to_db(db: &DatabaseConnection, secret: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT OR IGNORE INTO sys_settings (key, value, description, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
        [
            "jwt_secret".into(),
            secret.to_string().into(),
            "Auto-generated JWT secret for authentication".into(),
            now.clone().into(),
            now.into(),
        ],
    ))
    .await?;

    Ok(())
}

/// Calculate refresh token expiration timestamp
pub fn calculate_refresh_token_expiration() -> String {
    let exp = Utc::now() + chrono::Duration::days(REFRESH_TOKEN_LIFETIME_DAYS);
    exp.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::open_in_memory;

    #[tokio::test]
    async fn test_token_round_trip_keeps_roles() {
        let db = open_in_memory().await;
        let token = generate_access_token(&db, "u1", "ana", &[RoleTag::Warehouse])
            .await
            .unwrap();
        let claims = validate_token(&db, &token).await.unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.roles, vec![RoleTag::Warehouse]);
        assert!(!claims.is_admin());
    }

    #[tokio::test]
    async fn test_secret_is_stable_once_generated() {
        let db = open_in_memory().await;
        let first = get_jwt_secret(&db).await.unwrap();
        let second = get_jwt_secret(&db).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let db = open_in_memory().await;
        assert!(validate_token(&db, "not-a-jwt").await.is_err());
    }
}
