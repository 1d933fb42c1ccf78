use crate::design::ImageData;
use crate::error::GenerationError;
use crate::schema::ResponseSchema;

/// The remote generation backend the session orchestrates.
///
/// Implementations make exactly one attempt per call; there is no retry,
/// backoff or caching at this seam. Swap in a stub for tests.
#[async_trait::async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate a single image from a prompt plus optional reference
    /// images. Fails with [`GenerationError::NoImage`] when the remote
    /// answers without an image part.
    async fn generate_image(
        &self,
        prompt: &str,
        references: &[ImageData],
    ) -> Result<ImageData, GenerationError>;

    /// Generate structured JSON constrained to `schema`. The returned
    /// value has already passed schema validation.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
    ) -> Result<serde_json::Value, GenerationError>;
}
