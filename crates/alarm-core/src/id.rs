// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! String identifier newtypes.
//!
//! Unlike a worker or job in a task engine, an [`Alarm`](crate::alarm::Alarm)
//! id is client-supplied and unbounded in length (e.g. the xstate-delay
//! composed id `"xstate-{sessionId}.{fsmEventKey}"`). These wrappers are
//! backed by [`SmolStr`] rather than a fixed-size inline buffer, so arbitrary
//! ids are cheap to clone without an allocation for the common short case.

use smol_str::SmolStr;

/// Define a newtype wrapper around [`SmolStr`] with the usual id ergonomics:
/// `Display`, `Deref<Target = str>`, `From<&str>`/`From<String>`, and
/// `Borrow<str>` so the type can key a `HashMap<_, _>` and be looked up by
/// `&str` without allocating.
#[macro_export]
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(smol_str::SmolStr);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(smol_str::SmolStr::new(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

define_string_id! {
    /// Primary key of an `alarms` row. Client-supplied; unique.
    pub struct AlarmId;
}

define_string_id! {
    /// FSM actor session id, as assigned by the FSM library.
    pub struct SessionId;
}

/// Generate a short random suffix for composing ids when the caller has no
/// stable `fsmEventKey` to key off (xstate-delay scheduling without an
/// explicit delay id).
pub fn random_short_id() -> String {
    nanoid::nanoid!(10)
}

/// Returns a string slice truncated to at most `n` bytes, always on a valid
/// UTF-8 char boundary (composed ids are client-supplied and may contain
/// multi-byte characters, so a naive byte slice can panic).
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        return s;
    }
    let mut end = n;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
