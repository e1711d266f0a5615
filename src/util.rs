//! Collection of utilities.

use indexmap::IndexMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt::Debug;
use std::hash::Hash;

/// Declares a newtype identifier wrapping a `String`.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(
            feature = "serialization",
            derive(serde::Serialize, serde::Deserialize),
            serde(transparent)
        )]
        pub struct $name(String);

        impl $name {
            /// Creates an id from any string.
            pub fn new<S: Into<String>>(id: S) -> Self {
                $name(id.into())
            }

            /// Generates a random id.
            pub fn random() -> Self {
                $name($crate::util::random_id())
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                $name(id)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Length of generated document and bonus ids.
pub const ID_LENGTH: usize = 16;

/// Trait for an object that can provide an Id for itself.
pub trait Id {
    /// Type of the id value.
    type Id: Hash + Eq + Clone + Debug;

    /// Returns a reference to the current id.
    fn id(&self) -> &Self::Id;
}

/// Collects an iterator into an indexmap.
/// Subsequent values with same key are ignored.
pub(crate) fn collect_from_iter<I>(
    it: I,
) -> IndexMap<<<I as Iterator>::Item as Id>::Id, <I as Iterator>::Item>
where
    I: Iterator,
    <I as Iterator>::Item: Id,
{
    let mut map = IndexMap::new();
    for e in it {
        if !map.contains_key(e.id()) {
            map.insert(e.id().clone(), e);
        }
    }
    map
}

/// Generates a random alphanumeric identifier of `ID_LENGTH` characters.
pub fn random_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LENGTH)
        .collect()
}
