//! Contact fields collected at registration and on the profile page.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain exactly one @ symbol")]
    AtSymbol,
    /// One side of the @ is empty.
    #[error("email must have text on both sides of the @")]
    EmptyPart,
}

/// A structurally valid email address.
///
/// Only the shape is checked (one `@`, non-empty local part and domain);
/// deliverability is the backend's concern.
///
/// ```
/// use order_portal_core::Email;
///
/// assert!(Email::parse("buyer@plant.ru").is_ok());
/// assert!(Email::parse("buyer@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or does not split
    /// into a non-empty local part and domain around a single `@`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let mut parts = s.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EmailError::AtSymbol);
        };
        if local.is_empty() || domain.is_empty() {
            return Err(EmailError::EmptyPart);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors that can occur when parsing a [`Phone`].
///
/// Display strings are the messages shown next to the phone input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input contains something other than digits.
    #[error("Телефон должен содержать только цифры")]
    NonDigit,
    /// The digit count is outside the accepted range.
    #[error("Введите корректный номер телефона (10–15 цифр)")]
    Length {
        /// Number of digits supplied.
        len: usize,
    },
}

/// A phone number stored as 10 to 15 digits, without formatting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 10;
    /// Maximum number of digits.
    pub const MAX_DIGITS: usize = 15;

    /// Parse a phone number that must already be digits only.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::NonDigit`] for any non-digit character (including
    /// an empty string) and [`PhoneError::Length`] when the digit count is
    /// outside 10..=15.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }
        let len = s.len();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&len) {
            return Err(PhoneError::Length { len });
        }
        Ok(Self(s.to_owned()))
    }

    /// Parse free-form input such as `+7 (912) 345-67-89` by dropping every
    /// non-digit first.
    ///
    /// # Errors
    ///
    /// Same as [`Phone::parse`] applied to the normalized digits.
    pub fn parse_lenient(s: &str) -> Result<Self, PhoneError> {
        Self::parse(&normalize_phone_input(s))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip everything except ASCII digits from phone input.
#[must_use]
pub fn normalize_phone_input(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("  user+tag@plant.example.ru ").is_ok());
        assert_eq!(
            Email::parse(" a@b.c ").unwrap().as_str(),
            "a@b.c",
            "surrounding whitespace is trimmed"
        );
    }

    #[test]
    fn test_email_invalid() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("a@b@c"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("@plant.ru"), Err(EmailError::EmptyPart));
        assert_eq!(Email::parse("user@"), Err(EmailError::EmptyPart));

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_phone_valid() {
        assert_eq!(Phone::parse("79123456789").unwrap().as_str(), "79123456789");
        assert!(Phone::parse("1234567890").is_ok());
        assert!(Phone::parse("123456789012345").is_ok());
    }

    #[test]
    fn test_phone_rejects_non_digits() {
        assert_eq!(Phone::parse("+79123456789"), Err(PhoneError::NonDigit));
        assert_eq!(Phone::parse(""), Err(PhoneError::NonDigit));
    }

    #[test]
    fn test_phone_length_bounds() {
        assert_eq!(Phone::parse("123456789"), Err(PhoneError::Length { len: 9 }));
        assert_eq!(
            Phone::parse("1234567890123456"),
            Err(PhoneError::Length { len: 16 })
        );
    }

    #[test]
    fn test_phone_lenient() {
        let phone = Phone::parse_lenient("+7 (912) 345-67-89").unwrap();
        assert_eq!(phone.as_str(), "79123456789");
    }

    #[test]
    fn test_phone_error_messages() {
        assert_eq!(
            PhoneError::NonDigit.to_string(),
            "Телефон должен содержать только цифры"
        );
    }

    #[test]
    fn test_normalize_phone_input() {
        assert_eq!(normalize_phone_input("8-800-555-35-35"), "88005553535");
        assert_eq!(normalize_phone_input(""), "");
    }
}
