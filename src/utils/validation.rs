use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;

const REFERRAL_CODE_LEN: usize = 8;

/// Lowercased, trimmed form under which a username is stored.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// 3-20 characters of `a-z`, `0-9` or `_`, checked after normalization.
pub fn validate_username(username: &str) -> bool {
    Regex::new(r"^[a-z0-9_]{3,20}$")
        .map(|re| re.is_match(username))
        .unwrap_or(false)
}

pub fn generate_referral_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LEN)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(validate_username(&normalize_username("  Asha_01 ")));
        assert!(!validate_username("ab"));
        assert!(!validate_username("has space"));
        assert!(!validate_username("dash-name"));
        assert!(!validate_username(&"x".repeat(21)));
    }

    #[test]
    fn referral_codes_are_uppercase_alphanumeric() {
        let code = generate_referral_code();
        assert_eq!(code.len(), REFERRAL_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
