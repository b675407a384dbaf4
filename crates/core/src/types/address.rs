//! Wallet address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`WalletAddress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The input string is empty (after trimming).
    #[error("wallet address cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("wallet address must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains interior whitespace.
    #[error("wallet address cannot contain whitespace")]
    Whitespace,
}

/// An account address resolved from a wallet provider.
///
/// Providers hand back addresses in several shapes, and the address itself is
/// opaque (usually a hex string). This type only guarantees the address is
/// usable as a storage key and display value.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed
/// - Length: 1-256 characters
/// - No interior whitespace
///
/// ## Examples
///
/// ```
/// use icarus_market_core::WalletAddress;
///
/// assert!(WalletAddress::parse("7a3f2c8e9b1d4a5c").is_ok());
/// assert!(WalletAddress::parse("  0xabc  ").is_ok());
///
/// assert!(WalletAddress::parse("").is_err());
/// assert!(WalletAddress::parse("   ").is_err());
/// assert!(WalletAddress::parse("ab cd").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Maximum length of a wallet address.
    pub const MAX_LENGTH: usize = 256;

    /// Parse a `WalletAddress` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than 256
    /// characters, or contains whitespace.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(AddressError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(char::is_whitespace) {
            return Err(AddressError::Whitespace);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `WalletAddress` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Shortened form for display, e.g. `7a3f2c8e...b1c3d`.
    ///
    /// Addresses short enough to read at a glance are returned unchanged.
    #[must_use]
    pub fn short(&self) -> String {
        shorten(&self.0)
    }
}

/// Shorten an address-like string to its first 8 and last 6 characters.
#[must_use]
pub fn shorten(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 16 {
        return address.to_owned();
    }
    let head: String = chars.iter().take(8).collect();
    let tail: String = chars.iter().skip(chars.len() - 6).collect();
    format!("{head}...{tail}")
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
