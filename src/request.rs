//! # Caller-supplied list of resources to preload.
//!
//! [`PreloadRequest`] is an immutable, ordered list of identifiers. Two requests
//! are equal when they hold the same identifiers in the same order, regardless of
//! where the strings live; this is what the preloader compares to decide whether
//! a new activation is a restart or a no-op.
//!
//! ## Example
//! ```rust
//! use preloadvisor::PreloadRequest;
//!
//! let a = PreloadRequest::from(vec!["v1", "v2"]);
//! let b: PreloadRequest = ["v1".to_string(), "v2".to_string()].into_iter().collect();
//! assert_eq!(a, b);
//! assert_ne!(a, PreloadRequest::from(vec!["v2", "v1"]));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

/// Ordered, immutable sequence of resource identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PreloadRequest {
    ids: Arc<[Arc<str>]>,
}

impl PreloadRequest {
    /// Creates a request from any iterator of string-like identifiers.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Identifiers in caller order, duplicates included.
    pub fn ids(&self) -> &[Arc<str>] {
        &self.ids
    }

    /// Number of identifiers, duplicates included.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in caller order with later duplicates removed.
    ///
    /// The scheduler dispatches each identifier at most once per run, so the
    /// first occurrence decides its queue position.
    pub fn unique_ids(&self) -> Vec<Arc<str>> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.ids.len());
        self.ids
            .iter()
            .filter(|id| seen.insert(&***id))
            .cloned()
            .collect()
    }
}

impl<S: Into<Arc<str>>> From<Vec<S>> for PreloadRequest {
    fn from(ids: Vec<S>) -> Self {
        Self::new(ids)
    }
}

impl<S: Into<Arc<str>>> FromIterator<S> for PreloadRequest {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}
