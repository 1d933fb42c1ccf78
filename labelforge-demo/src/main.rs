use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use labelforge_core::{DesignSession, GeminiClient, ImageData, MockupView, StudioConfig};

#[derive(Parser)]
struct Args {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY")]
    api_key: Option<String>,

    /// Base URL for the generation API
    #[arg(long)]
    base_url: Option<String>,

    /// Brand name on the label
    #[arg(long, default_value = "Ridgeline")]
    brand: String,

    /// Product name
    #[arg(long, default_value = "Pale Ale")]
    product: String,

    /// Tagline
    #[arg(long, default_value = "Brewed above the clouds")]
    tagline: String,

    /// Free-text visual style direction
    #[arg(long, default_value = "")]
    style: String,

    /// Packaging preset: bottle, can, jar, pouch, box
    #[arg(long, default_value = "bottle")]
    preset: String,

    /// Label placement: front, wrap, band
    #[arg(long, default_value = "front")]
    placement: String,

    /// Label width in millimetres
    #[arg(long, default_value = "90")]
    width_mm: f64,

    /// Label height in millimetres
    #[arg(long, default_value = "120")]
    height_mm: f64,

    /// Optional logo image passed as a reference
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Generate in the style of this reference image instead of from scratch
    #[arg(long)]
    analyze: Option<PathBuf>,

    /// Output directory for the generated images
    #[arg(long, default_value = "out")]
    out: PathBuf,
}

/// Session logger that writes JSONL to ~/.labelforge/sessions/
struct SessionLogger {
    file: std::fs::File,
}

impl SessionLogger {
    fn new(session_id: &str) -> anyhow::Result<Self> {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let dir = PathBuf::from(home).join(".labelforge").join("sessions");
        std::fs::create_dir_all(&dir)?;

        let now = chrono::Local::now();
        let path = dir.join(format!("{}.jsonl", now.format("%Y%m%d_%H%M%S")));
        let file = std::fs::File::create(&path)?;

        let mut logger = Self { file };
        logger.write(&serde_json::json!({
            "type": "session_start",
            "ts": now.to_rfc3339(),
            "session_id": session_id,
        }))?;

        Ok(logger)
    }

    fn write(&mut self, value: &serde_json::Value) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.file, value)?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        Ok(())
    }

    fn log_operation(&mut self, name: &str, session: &DesignSession) {
        let _ = self.write(&serde_json::json!({
            "type": "operation",
            "ts": chrono::Local::now().to_rfc3339(),
            "name": name,
            "ok": session.last_error().is_none(),
            "error": session.last_error(),
        }));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let config = match args.api_key {
        Some(key) => {
            let mut config = StudioConfig::new(key);
            if let Some(url) = args.base_url {
                config.base_url = url;
            }
            config
        }
        None => StudioConfig::load().context(
            "no API key: pass --api-key, set GEMINI_API_KEY, or save ~/.labelforge/config.json",
        )?,
    };

    let client = Arc::new(GeminiClient::from_config(&config));
    let mut session = DesignSession::new(client);
    let mut logger = SessionLogger::new(&session.session_id().to_string())?;

    {
        let form = session.form_mut();
        form.label.brand = args.brand;
        form.label.product_name = args.product;
        form.label.tagline = args.tagline;
        form.label.style_notes = args.style;
        form.dimensions.width_mm = args.width_mm;
        form.dimensions.height_mm = args.height_mm;
        form.packaging.preset = args.preset.parse().map_err(anyhow::Error::msg)?;
        form.packaging.placement = args.placement.parse().map_err(anyhow::Error::msg)?;
        if let Some(path) = &args.logo {
            let bytes = std::fs::read(path)
                .with_context(|| format!("could not read logo {}", path.display()))?;
            form.logo = Some(ImageData::new(guess_mime(path), bytes));
        }
    }

    match &args.analyze {
        Some(path) => {
            session.analyze_image_file(path).await;
            logger.log_operation("analyze_image", &session);
        }
        None => {
            session.generate_label().await;
            logger.log_operation("generate_label", &session);
        }
    }
    if let Some(error) = session.last_error() {
        anyhow::bail!("label generation failed: {error}");
    }

    session.set_view(MockupView::Both);
    session.generate_mockups().await;
    logger.log_operation("generate_mockups", &session);
    if let Some(error) = session.last_error() {
        anyhow::bail!("mockup generation failed: {error}");
    }

    std::fs::create_dir_all(&args.out)?;
    let snapshot = session.current();
    println!("Generated images:");
    if let Some(label) = &snapshot.label {
        write_image(&args.out, "label", label)?;
    }
    if let Some(front) = &snapshot.mockups.front {
        write_image(&args.out, "mockup-front", front)?;
    }
    if let Some(back) = &snapshot.mockups.back {
        write_image(&args.out, "mockup-back", back)?;
    }

    Ok(())
}

fn write_image(dir: &Path, stem: &str, image: &ImageData) -> anyhow::Result<()> {
    let ext = match image.mime.as_str() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "bin",
    };
    let path = dir.join(format!("{stem}.{ext}"));
    std::fs::write(&path, &image.data)?;
    println!("  {}", path.display());
    Ok(())
}

fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}
