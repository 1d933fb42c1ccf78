//! Instruction templates for every generation call, filled by substituting
//! the current form fields. One template per operation type; the service
//! layer treats the result as an opaque prompt string.

use crate::design::{DesignForm, LabelField};

/// Prompt for a fresh flat label render from the form fields.
pub fn label_prompt(form: &DesignForm) -> String {
    let mut prompt = format!(
        "Design a flat, print-ready product label exactly {:.0}mm wide by {:.0}mm tall. \
         Brand: \"{}\". Product: \"{}\". Tagline: \"{}\".",
        form.dimensions.width_mm,
        form.dimensions.height_mm,
        form.label.brand,
        form.label.product_name,
        form.label.tagline,
    );
    if !form.label.style_notes.trim().is_empty() {
        prompt.push_str(&format!(" Visual direction: {}.", form.label.style_notes.trim()));
    }
    if form.logo.is_some() {
        prompt.push_str(" Incorporate the attached logo artwork faithfully, without redrawing it.");
    }
    prompt.push_str(
        " Render the artwork edge to edge on a flat canvas: no packaging, no mockup, \
         no perspective, no drop shadows and no surrounding background.",
    );
    prompt
}

/// Prompt for a label render conditioned on the style of a reference image.
pub fn styled_label_prompt(form: &DesignForm) -> String {
    let mut prompt = format!(
        "Study the attached reference image and adopt its visual style: palette, typography \
         feel, texture and overall mood. Then design a new flat product label exactly \
         {:.0}mm wide by {:.0}mm tall in that style. Brand: \"{}\". Product: \"{}\". \
         Tagline: \"{}\".",
        form.dimensions.width_mm,
        form.dimensions.height_mm,
        form.label.brand,
        form.label.product_name,
        form.label.tagline,
    );
    prompt.push_str(
        " Do not copy the reference content itself. Render the artwork edge to edge on a \
         flat canvas with no packaging and no background.",
    );
    prompt
}

/// Prompt for the front packaging mockup. The label artwork is attached as
/// the reference image.
pub fn mockup_front_prompt(form: &DesignForm) -> String {
    format!(
        "Create a photorealistic product mockup. Apply the attached label artwork to a {} \
         with {} placement and a {} finish, shown from the front. Studio lighting, neutral \
         seamless background, the label crisp and fully legible.",
        form.packaging.preset,
        form.packaging.placement,
        finish_or_default(form),
    )
}

/// Prompt for the back packaging mockup.
///
/// With `front_context` the approved front mockup travels along as a second
/// reference and the render must stay consistent with it; without, the back
/// is rendered from the label artwork alone.
pub fn mockup_back_prompt(form: &DesignForm, front_context: bool) -> String {
    if front_context {
        format!(
            "Create a photorealistic product mockup. The first attached image is the label \
             artwork and the second is the approved front view of the packaging. Render the \
             back view of that same {} with a {} finish, keeping container shape, material, \
             lighting and proportions identical to the front view.",
            form.packaging.preset,
            finish_or_default(form),
        )
    } else {
        format!(
            "Create a photorealistic product mockup. Apply the attached label artwork to a {} \
             with {} placement and a {} finish, shown from the back. Studio lighting, neutral \
             seamless background.",
            form.packaging.preset,
            form.packaging.placement,
            finish_or_default(form),
        )
    }
}

/// Prompt for an in-place revision of the attached image.
pub fn refine_prompt(instruction: &str) -> String {
    format!(
        "Revise the attached image. Apply exactly this change and nothing else: {}. \
         Keep composition, framing and every other detail identical, and return the \
         full revised image.",
        instruction.trim(),
    )
}

/// Prompt asking for alternative copy for one text field. The response is
/// constrained to a JSON array of strings.
pub fn suggest_field_prompt(field: LabelField, form: &DesignForm) -> String {
    format!(
        "You are a packaging copywriter. The label brief so far: brand \"{}\", product \
         \"{}\", tagline \"{}\". Propose 5 strong alternatives for the {}. Each entry \
         must be short enough to fit on a label. Respond with a JSON array of strings only.",
        form.label.brand,
        form.label.product_name,
        form.label.tagline,
        field.description(),
    )
}

/// Prompt asking for a packaging recommendation as a typed JSON object.
pub fn suggest_packaging_prompt(form: &DesignForm) -> String {
    format!(
        "Recommend packaging for this product label. Brand \"{}\", product \"{}\", tagline \
         \"{}\", label size {:.0}mm by {:.0}mm. Respond with a JSON object with exactly these \
         keys: \"preset\" (one of: bottle, can, jar, pouch, box), \"placement\" (one of: \
         front, wrap, band) and \"finish\" (a short free-text surface finish).",
        form.label.brand,
        form.label.product_name,
        form.label.tagline,
        form.dimensions.width_mm,
        form.dimensions.height_mm,
    )
}

fn finish_or_default(form: &DesignForm) -> &str {
    let finish = form.packaging.finish.trim();
    if finish.is_empty() { "matte" } else { finish }
}
