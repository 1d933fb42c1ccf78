//! The generation orchestrator: one session object owning the versioned
//! design state and sequencing every user-triggered generation operation
//! against the remote service.
//!
//! All operations share one shape: check the operation lock, set a
//! progress label, make the remote call(s), then either apply the result
//! to the history store or surface a single user-facing error. The lock
//! and progress label are released through a scoped guard, so cleanup
//! happens on every exit path.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::design::{
    DesignForm, DesignSnapshot, ImageData, LabelField, LabelPlacement, MockupImages, MockupView,
    PackagingPreset,
};
use crate::error::GenerationError;
use crate::history::VersionedState;
use crate::prompts;
use crate::schema::{self, FieldKind, FieldSpec, ResponseSchema};
use crate::service::GenerationService;

/// Number of candidate images requested by a variations batch.
pub const VARIATION_COUNT: usize = 3;

/// Which kind of asynchronous operation currently holds the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    Generation,
    Suggestion,
}

#[derive(Default)]
struct OpStatus {
    running: Option<OpKind>,
    progress: String,
}

/// Holds the operation lock for the duration of one operation.
///
/// Dropping the guard clears the lock and the progress label, so a failed
/// or early-returning operation can never leave the session stuck busy.
struct OpGuard<'a> {
    status: &'a mut OpStatus,
}

impl<'a> OpGuard<'a> {
    /// Take the lock, or None when another operation is in flight. A
    /// rejected caller simply drops its intent; nothing is queued.
    fn acquire(status: &'a mut OpStatus, kind: OpKind, label: &str) -> Option<Self> {
        if status.running.is_some() {
            return None;
        }
        status.running = Some(kind);
        status.progress = label.to_string();
        Some(Self { status })
    }

    fn set_progress(&mut self, label: &str) {
        self.status.progress = label.to_string();
    }
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.status.running = None;
        self.status.progress.clear();
    }
}

const PACKAGING_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("preset", FieldKind::String),
    FieldSpec::new("placement", FieldKind::String),
    FieldSpec::new("finish", FieldKind::String),
];

#[derive(Debug, serde::Deserialize)]
struct PackagingSuggestion {
    preset: String,
    placement: String,
    finish: String,
}

/// Which slot of the snapshot a refine call targets.
enum RefineSlot {
    Front,
    Back,
    Label,
}

/// One design session: versioned snapshots, form state, the ephemeral
/// variation and suggestion sets, and the single operation lock.
///
/// Constructed per session and passed to whoever drives it; there is no
/// process-global instance. The `&mut` API makes the one-operation-at-a-
/// time model explicit: a presentation layer dispatches an intent, awaits
/// it, then re-reads the observable state.
pub struct DesignSession {
    id: Uuid,
    service: Arc<dyn GenerationService>,
    history: VersionedState<DesignSnapshot>,
    form: DesignForm,
    view: MockupView,
    variations: Vec<ImageData>,
    suggestions: Vec<String>,
    suggestion_target: Option<LabelField>,
    status: OpStatus,
    last_error: Option<String>,
}

impl DesignSession {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            id: Uuid::new_v4(),
            service,
            history: VersionedState::new(DesignSnapshot::default()),
            form: DesignForm::default(),
            view: MockupView::default(),
            variations: Vec::new(),
            suggestions: Vec::new(),
            suggestion_target: None,
            status: OpStatus::default(),
            last_error: None,
        }
    }

    // ── Observable state ──

    pub fn session_id(&self) -> Uuid {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.status.running.is_some()
    }

    pub fn running_op(&self) -> Option<OpKind> {
        self.status.running
    }

    pub fn progress_label(&self) -> &str {
        &self.status.progress
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current(&self) -> &DesignSnapshot {
        self.history.current()
    }

    pub fn variations(&self) -> &[ImageData] {
        &self.variations
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn suggestion_target(&self) -> Option<LabelField> {
        self.suggestion_target
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn form(&self) -> &DesignForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut DesignForm {
        &mut self.form
    }

    pub fn view(&self) -> MockupView {
        self.view
    }

    pub fn set_view(&mut self, view: MockupView) {
        self.view = view;
    }

    // ── History intents ──

    pub fn undo(&mut self) {
        if self.status.running.is_none() {
            self.history.undo();
        }
    }

    pub fn redo(&mut self) {
        if self.status.running.is_none() {
            self.history.redo();
        }
    }

    // ── Generation operations ──

    /// Generate a fresh label from the current form fields. Starts a new
    /// history line: the previous design is not undoable afterwards.
    pub async fn generate_label(&mut self) {
        let Some(_guard) = OpGuard::acquire(&mut self.status, OpKind::Generation, "Generating label...")
        else {
            return;
        };
        self.last_error = None;
        self.variations.clear();

        let start = Instant::now();
        let prompt = prompts::label_prompt(&self.form);
        let references: Vec<ImageData> = self.form.logo.iter().cloned().collect();
        match self.service.generate_image(&prompt, &references).await {
            Ok(image) => {
                tracing::info!(
                    "label generated ({} bytes, {}ms)",
                    image.data.len(),
                    start.elapsed().as_millis()
                );
                self.history.reset(DesignSnapshot::with_label(image));
            }
            Err(e) => {
                tracing::warn!("label generation failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Request several independent label candidates for the same inputs.
    ///
    /// The batch is all-or-nothing: if any request fails the whole batch
    /// is reported as one failure and no candidates are shown. Every
    /// in-flight sibling is awaited before the outcome is decided; none
    /// are cancelled early.
    pub async fn generate_variations(&mut self) {
        let Some(_guard) =
            OpGuard::acquire(&mut self.status, OpKind::Generation, "Generating variations...")
        else {
            return;
        };
        self.last_error = None;
        self.variations.clear();
        // Variations start a fresh design; they are never undoable
        // alongside whatever came before.
        self.history.reset(DesignSnapshot::default());

        let prompt = prompts::label_prompt(&self.form);
        let references: Vec<ImageData> = self.form.logo.iter().cloned().collect();

        let mut handles = Vec::with_capacity(VARIATION_COUNT);
        for _ in 0..VARIATION_COUNT {
            let service = Arc::clone(&self.service);
            let prompt = prompt.clone();
            let references = references.clone();
            handles.push(tokio::spawn(async move {
                service.generate_image(&prompt, &references).await
            }));
        }

        let mut images = Vec::with_capacity(VARIATION_COUNT);
        let mut first_error: Option<GenerationError> = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(image)) => images.push(image),
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(GenerationError::Service(format!(
                            "variation task failed: {e}"
                        )));
                    }
                }
            }
        }

        match first_error {
            None => {
                tracing::info!("{} variations generated", images.len());
                self.variations = images;
            }
            Some(e) => {
                tracing::warn!("variations batch failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Promote one variation candidate into the design history and drop
    /// the rest.
    pub fn select_variation(&mut self, index: usize) {
        if self.status.running.is_some() {
            return;
        }
        let Some(image) = self.variations.get(index).cloned() else {
            return;
        };
        self.history.write(DesignSnapshot::with_label(image));
        self.variations.clear();
    }

    /// Generate a label in the visual style of a reference image. Always
    /// starts a fresh history line, even over an existing design.
    pub async fn analyze_image(&mut self, bytes: Vec<u8>, mime: &str) {
        let Some(_guard) = OpGuard::acquire(
            &mut self.status,
            OpKind::Generation,
            "Analyzing reference image...",
        ) else {
            return;
        };
        self.last_error = None;

        let reference = ImageData::new(mime, bytes);
        let prompt = prompts::styled_label_prompt(&self.form);
        match self
            .service
            .generate_image(&prompt, std::slice::from_ref(&reference))
            .await
        {
            Ok(image) => {
                tracing::info!("style-conditioned label generated ({} bytes)", image.data.len());
                self.history.reset(DesignSnapshot::with_label(image));
            }
            Err(e) => {
                tracing::warn!("image analysis failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Read a reference image from disk, then run [`Self::analyze_image`].
    pub async fn analyze_image_file(&mut self, path: &Path) {
        if self.status.running.is_some() {
            return;
        }
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let mime = mime_for_path(path);
                self.analyze_image(bytes, mime).await;
            }
            Err(e) => {
                tracing::warn!("reference file unreadable: {e}");
                self.last_error = Some(GenerationError::UnreadableFile(e.to_string()).to_string());
            }
        }
    }

    /// Render packaging mockups for the active view from the current
    /// label. The result is written as a new undoable version; slots not
    /// covered by the view are carried over untouched.
    pub async fn generate_mockups(&mut self) {
        let Some(mut guard) =
            OpGuard::acquire(&mut self.status, OpKind::Generation, "Rendering mockups...")
        else {
            return;
        };
        self.last_error = None;

        let current = self.history.current().clone();
        let Some(label) = current.label.clone() else {
            self.last_error = Some(GenerationError::MissingLabel.to_string());
            return;
        };

        let mut mockups = current.mockups.clone();
        match self.view {
            MockupView::Front => {
                guard.set_progress("Rendering front mockup...");
                let prompt = prompts::mockup_front_prompt(&self.form);
                match self
                    .service
                    .generate_image(&prompt, std::slice::from_ref(&label))
                    .await
                {
                    Ok(front) => mockups.front = Some(front),
                    Err(e) => {
                        tracing::warn!("front mockup failed: {e}");
                        self.last_error = Some(e.to_string());
                        return;
                    }
                }
            }
            MockupView::Back => {
                guard.set_progress("Rendering back mockup...");
                // Keep the back consistent with an already-rendered front
                // when one exists by passing it along as context.
                let (prompt, references) = match current.mockups.front.clone() {
                    Some(front) => (
                        prompts::mockup_back_prompt(&self.form, true),
                        vec![label.clone(), front],
                    ),
                    None => (
                        prompts::mockup_back_prompt(&self.form, false),
                        vec![label.clone()],
                    ),
                };
                match self.service.generate_image(&prompt, &references).await {
                    Ok(back) => mockups.back = Some(back),
                    Err(e) => {
                        tracing::warn!("back mockup failed: {e}");
                        self.last_error = Some(e.to_string());
                        return;
                    }
                }
            }
            MockupView::Both => {
                guard.set_progress("Rendering front mockup...");
                let prompt = prompts::mockup_front_prompt(&self.form);
                let front = match self
                    .service
                    .generate_image(&prompt, std::slice::from_ref(&label))
                    .await
                {
                    Ok(front) => front,
                    Err(e) => {
                        tracing::warn!("front mockup failed: {e}");
                        self.last_error = Some(e.to_string());
                        return;
                    }
                };
                guard.set_progress("Rendering back mockup...");
                let prompt = prompts::mockup_back_prompt(&self.form, true);
                let references = vec![label.clone(), front.clone()];
                match self.service.generate_image(&prompt, &references).await {
                    Ok(back) => {
                        mockups.front = Some(front);
                        mockups.back = Some(back);
                    }
                    Err(e) => {
                        tracing::warn!("back mockup failed: {e}");
                        self.last_error = Some(e.to_string());
                        return;
                    }
                }
            }
        }

        self.history.write(DesignSnapshot {
            label: Some(label),
            mockups,
        });
    }

    /// Revise exactly one image of the current version in place.
    ///
    /// The target is picked from the active view and the current
    /// snapshot: the front mockup in the front view, the back mockup in
    /// the back view, or the label itself in the combined view when no
    /// mockups exist yet. Anything else is rejected before any remote
    /// call. The result lands back in the slot it came from; refining a
    /// mockup never disturbs the other slot or the underlying label.
    pub async fn refine(&mut self, instruction: &str) {
        let Some(mut guard) =
            OpGuard::acquire(&mut self.status, OpKind::Generation, "Refining design...")
        else {
            return;
        };
        self.last_error = None;

        let current = self.history.current().clone();
        let (slot, target, progress) = match (
            self.view,
            &current.mockups.front,
            &current.mockups.back,
            &current.label,
        ) {
            (MockupView::Front, Some(front), _, _) => {
                (RefineSlot::Front, front.clone(), "Refining front mockup...")
            }
            (MockupView::Back, _, Some(back), _) => {
                (RefineSlot::Back, back.clone(), "Refining back mockup...")
            }
            (MockupView::Both, None, None, Some(label)) => {
                (RefineSlot::Label, label.clone(), "Refining label...")
            }
            _ => {
                self.last_error = Some(GenerationError::NoRefineTarget.to_string());
                return;
            }
        };
        guard.set_progress(progress);

        let prompt = prompts::refine_prompt(instruction);
        match self
            .service
            .generate_image(&prompt, std::slice::from_ref(&target))
            .await
        {
            Ok(image) => {
                let next = match slot {
                    RefineSlot::Front => DesignSnapshot {
                        label: current.label.clone(),
                        mockups: MockupImages {
                            front: Some(image),
                            back: current.mockups.back.clone(),
                        },
                    },
                    RefineSlot::Back => DesignSnapshot {
                        label: current.label.clone(),
                        mockups: MockupImages {
                            front: current.mockups.front.clone(),
                            back: Some(image),
                        },
                    },
                    RefineSlot::Label => DesignSnapshot::with_label(image),
                };
                self.history.write(next);
            }
            Err(e) => {
                tracing::warn!("refine failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    // ── Suggestion operations ──

    /// Ask for alternative copy for one form field. Fills the transient
    /// suggestion list; the design history is never touched.
    pub async fn suggest_field(&mut self, field: LabelField) {
        let Some(_guard) =
            OpGuard::acquire(&mut self.status, OpKind::Suggestion, "Suggesting copy...")
        else {
            return;
        };
        self.last_error = None;
        self.suggestions.clear();
        self.suggestion_target = None;

        let prompt = prompts::suggest_field_prompt(field, &self.form);
        match self
            .service
            .generate_structured(&prompt, &ResponseSchema::StringArray)
            .await
        {
            Ok(value) => match schema::as_string_array(&value) {
                Ok(entries) => {
                    self.suggestions = entries;
                    self.suggestion_target = Some(field);
                }
                Err(e) => {
                    tracing::warn!("suggestion response rejected: {e}");
                    self.last_error = Some(e.to_string());
                }
            },
            Err(e) => {
                tracing::warn!("field suggestion failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Copy one pending suggestion into its form field and clear the list.
    pub fn apply_suggestion(&mut self, index: usize) {
        if self.status.running.is_some() {
            return;
        }
        let Some(field) = self.suggestion_target else {
            return;
        };
        let Some(text) = self.suggestions.get(index).cloned() else {
            return;
        };
        match field {
            LabelField::Brand => self.form.label.brand = text,
            LabelField::ProductName => self.form.label.product_name = text,
            LabelField::Tagline => self.form.label.tagline = text,
            LabelField::StyleNotes => self.form.label.style_notes = text,
        }
        self.suggestions.clear();
        self.suggestion_target = None;
    }

    /// Ask for a packaging recommendation and merge it straight into the
    /// packaging form state.
    pub async fn suggest_packaging(&mut self) {
        let Some(_guard) =
            OpGuard::acquire(&mut self.status, OpKind::Suggestion, "Suggesting packaging...")
        else {
            return;
        };
        self.last_error = None;

        let prompt = prompts::suggest_packaging_prompt(&self.form);
        let schema = ResponseSchema::Object(PACKAGING_FIELDS);
        let value = match self.service.generate_structured(&prompt, &schema).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("packaging suggestion failed: {e}");
                self.last_error = Some(e.to_string());
                return;
            }
        };

        let suggestion: PackagingSuggestion = match serde_json::from_value(value) {
            Ok(s) => s,
            Err(e) => {
                self.last_error = Some(GenerationError::Validation(e.to_string()).to_string());
                return;
            }
        };
        let preset = suggestion.preset.parse::<PackagingPreset>();
        let placement = suggestion.placement.parse::<LabelPlacement>();
        match (preset, placement) {
            (Ok(preset), Ok(placement)) => {
                self.form.packaging.preset = preset;
                self.form.packaging.placement = placement;
                self.form.packaging.finish = suggestion.finish;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("packaging suggestion rejected: {e}");
                self.last_error = Some(GenerationError::Validation(e).to_string());
            }
        }
    }
}

/// Mime type guessed from a file extension, for reference uploads.
fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
