/// Failure raised by a generation operation.
///
/// Every variant is recovered at the session boundary and shown to the
/// user as a single message; nothing here is fatal and any operation may
/// be retried.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("nothing to refine here; generate a label or select the front or back view first")]
    NoRefineTarget,
    #[error("generate a label before rendering mockups")]
    MissingLabel,
    #[error("could not read the reference file: {0}")]
    UnreadableFile(String),
    #[error("the generation service returned no image")]
    NoImage,
    #[error("generation request failed: {0}")]
    Service(String),
    #[error("malformed structured response: {0}")]
    Validation(String),
}

/// Coarse classification of a [`GenerationError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A precondition on user input or current state failed; no remote
    /// call was made.
    Input,
    /// The remote call failed or returned no usable payload.
    Service,
    /// The remote returned JSON that does not match the declared shape.
    Validation,
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::NoRefineTarget
            | GenerationError::MissingLabel
            | GenerationError::UnreadableFile(_) => ErrorKind::Input,
            GenerationError::NoImage | GenerationError::Service(_) => ErrorKind::Service,
            GenerationError::Validation(_) => ErrorKind::Validation,
        }
    }
}
