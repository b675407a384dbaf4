//! Newtype keys for type-safe entity references.
//!
//! Use the `define_key!` macro to create type-safe string key wrappers that
//! prevent accidentally mixing keys from different entity types.

/// Macro to define a type-safe string key wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>`, and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use icarus_market_core::define_key;
/// define_key!(CollectionKey);
/// define_key!(VendorKey);
///
/// let collection = CollectionKey::new("alerts");
/// let vendor = VendorKey::new("alerts");
///
/// // These are different types, so this won't compile:
/// // let _: CollectionKey = vendor;
/// assert_eq!(collection.as_str(), vendor.as_str());
/// ```
#[macro_export]
macro_rules! define_key {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new key from any string-like value.
            #[must_use]
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Get the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the key and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Catalog product identifier (e.g. "discord", "master").
define_key!(ProductId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_display_and_equality() {
        let id = ProductId::new("discord");
        assert_eq!(id.to_string(), "discord");
        assert_eq!(id, ProductId::from("discord"));
        assert_ne!(id, ProductId::from("slack"));
    }

    #[test]
    fn test_product_id_serializes_transparently() {
        let id = ProductId::new("oncall");
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"oncall\""));
    }
}
