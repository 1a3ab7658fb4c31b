//! Selection error types

use rk_core::ObjectKey;
use thiserror::Error;

/// Lookup failures while preparing a selection candidate
///
/// These never escape the public mutators, which report them as `false`,
/// [`Membership::Invalid`](crate::Membership::Invalid) or empty results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Cannot find document: {0}")]
    DocumentNotFound(String),

    #[error("Object not found: {document}#{object}")]
    ObjectNotFound { document: String, object: String },

    #[error("Object is being removed: {0}")]
    ObjectRemoving(ObjectKey),

    #[error("Sub-object {object}.{sub_name} not found")]
    SubObjectNotFound { object: ObjectKey, sub_name: String },
}

/// Result type for selection operations
pub type SelectionResult<T> = Result<T, SelectionError>;
