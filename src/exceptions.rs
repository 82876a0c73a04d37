//! ## Custom Errors for the geospatial point index
//!
//! This module defines the error type surfaced by the crate's public API. Internal, recoverable
//! conditions (the partition algorithm in [`crate::node`] failing to find a threshold) never
//! reach this type; they are handled privately and the affected node simply remains an
//! overloaded leaf.

use std::error::Error;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors surfaced by the public API of the geospatial point index.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug)]
pub enum GeoIndexError {
    /// A public constructor or query was called with a parameter outside its valid range
    /// (e.g. `bin_size < 1`, a negative radius, or a negative `max_distance`).
    InvalidArgument {
        /// Human-readable description of which argument was invalid and why.
        message: String,
    },
    /// An internal invariant of the node module was violated. Reachable only through a bug in
    /// this crate, never through ordinary use of the public API.
    IllegalState {
        /// Human-readable description of the violated invariant.
        message: String,
    },
}

impl fmt::Display for GeoIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoIndexError::InvalidArgument { message } => {
                write!(f, "Invalid argument: {message}")
            }
            GeoIndexError::IllegalState { message } => {
                write!(f, "Illegal state: {message}")
            }
        }
    }
}

impl Error for GeoIndexError {}

impl GeoIndexError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        GeoIndexError::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        GeoIndexError::IllegalState {
            message: message.into(),
        }
    }
}
