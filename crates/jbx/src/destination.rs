//! 🧭 Destination — where the documents are going to live.
//!
//! A location looks like `es://myindex/myobj`. Scheme, index, slash, object type.
//! One slash. Exactly one. Not zero, not two. This is not a democracy.

use std::fmt;

use crate::errors::JobError;

/// 🔧 The scheme prefix every location must wear. Five bytes, stripped by length.
pub const LOCATION_SCHEME: &str = "es://";

/// 📍 The (index, object type) pair identifying where converted records are indexed.
///
/// Both halves are non-empty. Derived once from the location string and frozen
/// for the lifetime of the job. No setters. Don't ask.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    index: String,
    object_type: String,
}

impl Destination {
    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", LOCATION_SCHEME, self.index, self.object_type)
    }
}

/// 🔍 Parse `es://<index>/<objectType>` into a [`Destination`].
///
/// Strip the fixed-length scheme, split what's left on `/`, demand exactly two
/// non-empty pieces. Anything else is an [`JobError::InvalidDestination`].
/// No side effects. Call it as many times as you like; it won't remember you.
pub fn resolve(location: &str) -> Result<Destination, JobError> {
    let remainder = location
        .strip_prefix(LOCATION_SCHEME)
        .ok_or_else(|| JobError::invalid_destination(location, "location must start with es://"))?;

    let segments: Vec<&str> = remainder.split('/').collect();
    match segments.as_slice() {
        [index, object_type] if !index.is_empty() && !object_type.is_empty() => Ok(Destination {
            index: (*index).to_string(),
            object_type: (*object_type).to_string(),
        }),
        [_, _] => Err(JobError::invalid_destination(
            location,
            "you must specify both an index and an object type",
        )),
        [_] => Err(JobError::invalid_destination(location, "missing object type")),
        _ => Err(JobError::invalid_destination(
            location,
            format!("expected exactly one '/' separator, found {}", segments.len() - 1),
        )),
    }
}
