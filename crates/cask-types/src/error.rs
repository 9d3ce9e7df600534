//! Error type for ref parsing and schema decoding.

/// Errors that can occur while parsing refs or decoding schemas.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A ref string is not `"sha1-"` followed by 40 lowercase hex characters.
    #[error("invalid blob ref: {0:?}")]
    InvalidRef(String),

    /// A wire part carries both a `blobRef` and a `bytesRef`.
    #[error("part carries both blobRef and bytesRef")]
    AmbiguousPart,

    /// A wire part carries neither a `blobRef` nor a `bytesRef`.
    #[error("part carries neither blobRef nor bytesRef")]
    DanglingPart,

    /// Schema has an unsupported version.
    #[error("unsupported schema version {found}, this client supports version {supported}")]
    UnsupportedVersion {
        /// Version found in the schema.
        found: u8,
        /// Version this client supports.
        supported: u8,
    },

    /// A referenced schema has the wrong type for its position.
    #[error("unexpected schema type: {0}")]
    UnexpectedType(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}
