//! Error type shared by every collection in this crate.
//!
//! Absence is never an error: lookups return `Option`. The variants below
//! cover misuse of an update context, mutation through a read-only view and
//! malformed arguments to the fallible constructors.

use thiserror::Error;

/// Errors raised by persistent collections and their update machinery.
///
/// # Examples
///
/// ```
/// use persistent_collections::CollectionError;
///
/// let error = CollectionError::LengthMismatch { keys: 3, values: 2 };
/// assert_eq!(error.to_string(), "key/value length mismatch: 3 keys, 2 values");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// An [`UpdateContext`](crate::persistent::UpdateContext) was used after `commit`.
    #[error("update context has already been committed")]
    ContextCommitted,

    /// A mutating method was called on a read-only view.
    #[error("{operation} is not supported on a read-only view")]
    UnsupportedOperation {
        /// Name of the rejected operation
        operation: &'static str,
    },

    /// Paired key and value sequences had different lengths.
    #[error("key/value length mismatch: {keys} keys, {values} values")]
    LengthMismatch {
        /// Number of keys supplied
        keys: usize,
        /// Number of values supplied
        values: usize,
    },

    /// A positional lookup ran past the end of the collection.
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds {
        /// Requested position
        index: usize,
        /// Number of elements in the collection
        length: usize,
    },

    /// A strict insertion found the key already present.
    #[error("key is already present")]
    DuplicateKey,
}
