pub mod config;
pub mod design;
pub mod error;
pub mod gemini;
pub mod history;
pub mod prompts;
pub mod schema;
pub mod service;
pub mod session;

// Re-exports
pub use config::StudioConfig;
pub use design::{
    DesignForm, DesignSnapshot, ImageData, LabelDimensions, LabelField, LabelFields,
    LabelPlacement, MockupImages, MockupView, PackagingForm, PackagingPreset,
};
pub use error::{ErrorKind, GenerationError};
pub use gemini::GeminiClient;
pub use history::VersionedState;
pub use schema::{FieldKind, FieldSpec, ResponseSchema};
pub use service::GenerationService;
pub use session::{DesignSession, OpKind, VARIATION_COUNT};
