//! State types shared between the orchestrator, the service layer and the
//! presentation layer: image handles, versioned design snapshots, and the
//! mutable form state that feeds prompt construction.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};

/// An opaque image handle: raw bytes plus their mime type.
///
/// Compared structurally so a regenerated-but-identical image is detected
/// as the same snapshot.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub mime: String,
    pub data: Vec<u8>,
}

impl ImageData {
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            data,
        }
    }

    /// Encode the bytes for inline wire transfer.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Decode an inline wire payload back into bytes.
    pub fn from_base64(mime: impl Into<String>, encoded: &str) -> Result<Self, base64::DecodeError> {
        let data = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        Ok(Self::new(mime, data))
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime", &self.mime)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Front and back packaging mockups. Either slot may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockupImages {
    pub front: Option<ImageData>,
    pub back: Option<ImageData>,
}

/// One immutable version of the design: the flat label artwork plus any
/// packaging mockups rendered from it. This is what the history store
/// versions; it is produced whole and never mutated in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignSnapshot {
    pub label: Option<ImageData>,
    pub mockups: MockupImages,
}

impl DesignSnapshot {
    /// A snapshot holding only a label image, mockup slots empty.
    pub fn with_label(label: ImageData) -> Self {
        Self {
            label: Some(label),
            mockups: MockupImages::default(),
        }
    }
}

/// Which preview the user is looking at. `Both` is the combined
/// front-and-back view shown before any single mockup is selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockupView {
    Front,
    Back,
    #[default]
    Both,
}

/// Editable label copy. Plain text fields with no cross-field rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelFields {
    pub brand: String,
    pub product_name: String,
    pub tagline: String,
    pub style_notes: String,
}

/// Identifies one text field for the copy-suggestion flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelField {
    Brand,
    ProductName,
    Tagline,
    StyleNotes,
}

impl LabelField {
    /// Human wording used inside suggestion prompts.
    pub fn description(&self) -> &'static str {
        match self {
            LabelField::Brand => "brand name",
            LabelField::ProductName => "product name",
            LabelField::Tagline => "tagline",
            LabelField::StyleNotes => "visual style direction",
        }
    }
}

/// Physical label size in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelDimensions {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl Default for LabelDimensions {
    fn default() -> Self {
        Self {
            width_mm: 90.0,
            height_mm: 120.0,
        }
    }
}

/// Packaging container the label is mocked up on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackagingPreset {
    #[default]
    Bottle,
    Can,
    Jar,
    Pouch,
    Box,
}

impl fmt::Display for PackagingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackagingPreset::Bottle => "bottle",
            PackagingPreset::Can => "can",
            PackagingPreset::Jar => "jar",
            PackagingPreset::Pouch => "pouch",
            PackagingPreset::Box => "box",
        };
        f.write_str(name)
    }
}

impl FromStr for PackagingPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bottle" => Ok(PackagingPreset::Bottle),
            "can" => Ok(PackagingPreset::Can),
            "jar" => Ok(PackagingPreset::Jar),
            "pouch" => Ok(PackagingPreset::Pouch),
            "box" => Ok(PackagingPreset::Box),
            other => Err(format!("unknown packaging preset '{other}'")),
        }
    }
}

/// How the label sits on the container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPlacement {
    #[default]
    Front,
    Wrap,
    Band,
}

impl fmt::Display for LabelPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LabelPlacement::Front => "front",
            LabelPlacement::Wrap => "wrap",
            LabelPlacement::Band => "band",
        };
        f.write_str(name)
    }
}

impl FromStr for LabelPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(LabelPlacement::Front),
            "wrap" => Ok(LabelPlacement::Wrap),
            "band" => Ok(LabelPlacement::Band),
            other => Err(format!("unknown label placement '{other}'")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackagingForm {
    pub preset: PackagingPreset,
    pub placement: LabelPlacement,
    /// Free-text surface finish, e.g. "matte" or "embossed foil".
    pub finish: String,
}

/// The full set of generation inputs. Ordinary mutable state, not
/// versioned; the history store only ever sees the resulting images.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignForm {
    pub label: LabelFields,
    pub dimensions: LabelDimensions,
    pub packaging: PackagingForm,
    /// Optional logo artwork passed as a reference image.
    pub logo: Option<ImageData>,
}
