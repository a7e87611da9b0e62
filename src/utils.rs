// Utility modules

use crate::{
    constants::USERNAME_MAX_LEN,
    error::{AppError, Result},
};

/// `0x` followed by exactly 40 hex digits, any case.
pub fn is_wallet_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map(|hex_part| hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Validates a wallet address from a request payload and lower-cases it.
pub fn normalize_address(value: &str, field: &str) -> Result<String> {
    if !is_wallet_address(value) {
        return Err(AppError::BadRequest(format!("Invalid {} address", field)));
    }
    Ok(value.to_ascii_lowercase())
}

pub fn validate_username(username: Option<&str>) -> Result<Option<String>> {
    let Some(raw) = username else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > USERNAME_MAX_LEN {
        return Err(AppError::BadRequest(format!(
            "Username must be between 1 and {} characters",
            USERNAME_MAX_LEN
        )));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_shape() {
        assert!(is_wallet_address("0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"));
        assert!(!is_wallet_address("0X2c7536E3605D9C16a7a3D7b1898e529396a65c23"));
        assert!(!is_wallet_address("2c7536E3605D9C16a7a3D7b1898e529396a65c23"));
        assert!(!is_wallet_address("0x2c7536E3605D9C16a7a3D7b1898e529396a65c2"));
        assert!(!is_wallet_address("0x2c7536E3605D9C16a7a3D7b1898e529396a65c2g"));
    }

    #[test]
    fn normalize_lowercases() {
        assert_eq!(
            normalize_address("0x2c7536E3605D9C16a7a3D7b1898e529396a65c23", "wallet").unwrap(),
            "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"
        );
        match normalize_address("0x12", "referrer") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Invalid referrer address"),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn username_bounds() {
        assert_eq!(validate_username(None).unwrap(), None);
        assert_eq!(
            validate_username(Some("  neo ")).unwrap(),
            Some("neo".to_string())
        );
        assert!(validate_username(Some("   ")).is_err());
        assert!(validate_username(Some(&"x".repeat(51))).is_err());
        assert!(validate_username(Some(&"x".repeat(50))).is_ok());
    }
}
