use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use contracts::system::users::WEAK_PASSWORDS;

/// Hash password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Check password against a stored PHC hash string
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Length 6..=128 and not one of the well-known weak passwords
pub fn validate_password_strength(password: &str) -> Result<()> {
    let len = password.chars().count();
    if !(6..=128).contains(&len) {
        return Err(anyhow::anyhow!(
            "Password must be between 6 and 128 characters"
        ));
    }
    if WEAK_PASSWORDS.contains(&password) {
        return Err(anyhow::anyhow!("Password is too weak"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_invalid_hash_is_an_error() {
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[test]
    fn test_strength_rules() {
        assert!(validate_password_strength("abc").is_err());
        assert!(validate_password_strength("senha123").is_err());
        assert!(validate_password_strength("caminhao-azul").is_ok());
    }
}
