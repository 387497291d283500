use thiserror::Error;

/// Minimum admin username length.
pub const MIN_USERNAME_LEN: usize = 3;
/// Minimum admin password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Presence and shape failures detected before any store or network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Username must be at least {MIN_USERNAME_LEN} characters long")]
    UsernameTooShort,

    #[error("Username can only contain letters, numbers, and underscores")]
    UsernameInvalidChars,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters long")]
    PasswordTooShort,

    #[error("New passwords do not match")]
    PasswordMismatch,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Invalid value for {field}: {value}")]
    InvalidChoice { field: &'static str, value: String },
}

/// Return the trimmed value, or `MissingField` when it is empty.
pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed)
}

/// At least [`MIN_USERNAME_LEN`] characters, ASCII alphanumerics and `_` only.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// At least [`MIN_PASSWORD_LEN`] characters and identical to `confirmation`.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Loose shape check: `local@domain.tld`, no whitespace.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(name, tld)| !name.is_empty() && !tld.is_empty());
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_username_examples() {
        assert_eq!(
            validate_username("ab"),
            Err(ValidationError::UsernameTooShort)
        );
        assert_eq!(validate_username("admin_2"), Ok(()));
        assert_eq!(
            validate_username("admin!"),
            Err(ValidationError::UsernameInvalidChars)
        );
    }

    #[test]
    fn test_password_examples() {
        assert_eq!(validate_new_password("abcdef", "abcdef"), Ok(()));
        assert_eq!(
            validate_new_password("abcde", "abcde"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_new_password("abcdef", "abcdeg"),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_require_trims() {
        assert_eq!(require("Title", "  Loans  "), Ok("Loans"));
        assert_eq!(
            require("Title", "   "),
            Err(ValidationError::MissingField("Title"))
        );
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("jane@x.com").is_ok());
        assert!(validate_email("jane.doe@mail.example.org").is_ok());
        assert!(validate_email("jane").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("jane@x").is_err());
        assert!(validate_email("jane@.com").is_err());
        assert!(validate_email("ja ne@x.com").is_err());
    }

    proptest! {
        #[test]
        fn prop_valid_usernames_accepted(name in "[A-Za-z0-9_]{3,32}") {
            prop_assert!(validate_username(&name).is_ok());
        }

        #[test]
        fn prop_short_usernames_rejected(name in "[A-Za-z0-9_]{0,2}") {
            prop_assert_eq!(validate_username(&name), Err(ValidationError::UsernameTooShort));
        }

        #[test]
        fn prop_username_with_symbol_rejected(
            prefix in "[a-z]{3,10}",
            symbol in "[!@#$%^&*() .-]",
        ) {
            let name = format!("{prefix}{symbol}");
            prop_assert_eq!(validate_username(&name), Err(ValidationError::UsernameInvalidChars));
        }

        #[test]
        fn prop_password_length_boundary(password in "[ -~]{0,12}") {
            let result = validate_new_password(&password, &password);
            if password.chars().count() >= MIN_PASSWORD_LEN {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result, Err(ValidationError::PasswordTooShort));
            }
        }
    }
}
