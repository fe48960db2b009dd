use std::fmt;
use std::path::PathBuf;

/// Ingress ingestion error
///
/// Returned while turning raw manifests into [`IngressIntent`](super::IngressIntent)s.
/// None of these abort reconciliation of other resources: the offending
/// document is skipped and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressError {
    /// The `apiVersion`/`kind` pair is not one of the recognised Ingress schemas
    UnsupportedSchemaKind {
        /// Declared `apiVersion` (empty when missing)
        api_version: String,
        /// Declared `kind` (empty when missing)
        kind: String,
    },
    /// The document declares a supported schema but its body does not decode
    Decode {
        /// Declared `apiVersion`
        api_version: String,
        /// Decoder message
        message: String,
    },
    /// The manifest text is not valid YAML/JSON
    Syntax {
        /// Zero-based document index within the manifest
        document: usize,
        /// Parser message
        message: String,
    },
    /// The manifest file could not be read
    Io {
        /// Manifest path
        path: PathBuf,
        /// I/O error message
        message: String,
    },
}

impl fmt::Display for IngressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngressError::UnsupportedSchemaKind { api_version, kind } => {
                write!(
                    f,
                    "unsupported schema kind: apiVersion '{}' kind '{}' is not a recognised Ingress schema",
                    api_version, kind
                )
            }
            IngressError::Decode {
                api_version,
                message,
            } => {
                write!(f, "invalid {} Ingress: {}", api_version, message)
            }
            IngressError::Syntax { document, message } => {
                write!(f, "manifest document {} is not valid YAML/JSON: {}", document, message)
            }
            IngressError::Io { path, message } => {
                write!(f, "failed to read manifest {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for IngressError {}
