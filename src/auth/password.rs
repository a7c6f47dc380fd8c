//! Employee credential hashing and strength rules.

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 12;

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Compare a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Validate password strength. Returns the list of violated rules,
/// empty when the password is acceptable.
pub fn validate_password(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }
    if !password.chars().any(|c| "!@#$%^&*(),.?\":{}|<>".contains(c)) {
        errors.push("Password must contain at least one special character".to_string());
    }

    errors
}

/// Validate a login username: 3-30 chars, letters/digits/underscore/hyphen.
pub fn validate_username(username: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if username.is_empty() {
        errors.push("Username is required".to_string());
        return errors;
    }
    if username.len() < 3 {
        errors.push("Username must be at least 3 characters long".to_string());
    }
    if username.len() > 30 {
        errors.push("Username must be no more than 30 characters long".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(
            "Username can only contain letters, numbers, underscores, and hyphens".to_string(),
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("Sup3r$ecret").unwrap();
        assert!(verify_password("Sup3r$ecret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn strong_password_passes() {
        assert!(validate_password("Sup3r$ecret").is_empty());
    }

    #[test]
    fn weak_passwords_report_each_missing_rule() {
        let errors = validate_password("abc");
        assert_eq!(errors.len(), 4); // short, no upper, no digit, no special

        assert!(!validate_password("alllowercase1!").is_empty());
        assert!(!validate_password("NOLOWERCASE1!").is_empty());
        assert!(!validate_password("NoDigitsHere!").is_empty());
        assert!(!validate_password("NoSpecials123").is_empty());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("alice_1").is_empty());
        assert!(!validate_username("ab").is_empty());
        assert!(!validate_username("has space").is_empty());
        assert!(!validate_username("").is_empty());
        assert!(!validate_username(&"x".repeat(31)).is_empty());
    }
}
