use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source unreachable: {0}")]
    SourceUnreachable(String),

    #[error("failed to parse document as JSON ({json}) or YAML ({yaml})")]
    Parse {
        json: serde_json::Error,
        yaml: serde_yaml_ng::Error,
    },

    #[error("document is empty or has no top-level object")]
    EmptyDocument,
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("document declares neither `swagger` nor `openapi`")]
    UnknownSpecVersion,

    #[error("unsupported spec version: {0}")]
    UnsupportedVersion(String),

    #[error("canonical tree does not deserialize: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("dangling reference: {0}")]
    DanglingReference(String),

    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no document loaded")]
    NoDocumentLoaded,

    #[error("operation not found: {0}")]
    OperationNotFound(String),

    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),
}
