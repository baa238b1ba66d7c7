use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _};
use clap::Parser;

use thumbedit::config::{self, EditorConfig};
use thumbedit::filters::{AdjustmentParams, FilterPreset};
use thumbedit::geometry::Color;
use thumbedit::loader::ImageLoader;
use thumbedit::{EditorHost, EncodedImage, ExportFormat, SessionRequest};

#[derive(Parser, Debug)]
#[command(name = "thumbedit", version, about = "Compose text, logos and filters over a thumbnail")]
struct Cli {
    /// Image URL, data URL or local path.
    image: String,

    /// Suggested filename; defaults to the last path segment of the image.
    #[arg(long)]
    filename: Option<String>,

    /// Directory the edited image is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Config file; defaults to $XDG_CONFIG_HOME/thumbedit/config.json.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Original, Vintage, Sepia, BlackWhite, Polaroid or Kodachrome.
    #[arg(long, value_parser = parse_preset, default_value = "Original")]
    preset: FilterPreset,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    brightness: f32,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    contrast: f32,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    saturation: f32,

    /// Blur percentage, 0-100.
    #[arg(long, default_value_t = 0.0)]
    blur: f32,

    /// Text label to add; repeat for several labels.
    #[arg(long = "text")]
    texts: Vec<String>,

    #[arg(long, default_value_t = 40.0)]
    font_size: f32,

    /// Text color as #rrggbb or rgba(r,g,b,a).
    #[arg(long, value_parser = parse_color, default_value = "#ffffff")]
    color: Color,

    /// Add the configured watermark text.
    #[arg(long, default_value_t = false)]
    watermark: bool,

    /// Logo image placed in the top-right corner.
    #[arg(long)]
    logo: Option<PathBuf>,

    /// png or jpeg; defaults to `export_format` from the config file.
    #[arg(long, value_parser = parse_format)]
    format: Option<ExportFormat>,
}

fn parse_preset(value: &str) -> Result<FilterPreset, String> {
    FilterPreset::from_name(value).ok_or_else(|| format!("unknown preset `{value}`"))
}

fn parse_color(value: &str) -> Result<Color, String> {
    Color::parse(value).ok_or_else(|| format!("invalid color `{value}`"))
}

fn parse_format(value: &str) -> Result<ExportFormat, String> {
    ExportFormat::from_name(value).ok_or_else(|| format!("unsupported format `{value}`"))
}

fn default_filename(image: &str) -> String {
    let without_query = image.split(['?', '#']).next().unwrap_or(image);
    without_query
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !image.starts_with("data:"))
        .unwrap_or("thumbnail.png")
        .to_string()
}

/// Writes the saved image into a directory.
struct FileHost {
    out_dir: PathBuf,
    written: Option<std::io::Result<PathBuf>>,
}

impl FileHost {
    fn new(out_dir: PathBuf) -> Self {
        Self {
            out_dir,
            written: None,
        }
    }

    fn write(dir: &Path, image: &EncodedImage, filename: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(filename);
        std::fs::write(&path, &image.bytes)?;
        Ok(path)
    }
}

impl EditorHost for FileHost {
    fn on_save(&mut self, image: EncodedImage, filename: String) {
        self.written = Some(Self::write(&self.out_dir, &image, &filename));
    }

    fn on_close(&mut self) {
        tracing::debug!("editor closed");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    thumbedit::logging::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_editor_config_from(path),
        None => config::load_editor_config(),
    };
    let filename = cli
        .filename
        .clone()
        .unwrap_or_else(|| default_filename(&cli.image));
    let request = SessionRequest::new(cli.image.clone(), filename);
    let host = FileHost::new(cli.out_dir.clone());

    let mut session = thumbedit::open_session(request, &config, host)
        .await
        .context("failed to open editor session")?;

    apply_edits(&mut session, &cli, &config).await?;

    session
        .save(cli.format.unwrap_or(config.export_format))
        .context("failed to export edited image")?;
    let written = session
        .host_mut()
        .written
        .take()
        .ok_or_else(|| anyhow!("editor closed without saving"))?
        .context("failed to write edited image")?;
    println!("{}", written.display());
    Ok(())
}

async fn apply_edits(
    session: &mut thumbedit::EditorSession<FileHost>,
    cli: &Cli,
    config: &EditorConfig,
) -> anyhow::Result<()> {
    session.apply_preset(cli.preset);
    session.set_adjustments(AdjustmentParams::new(
        cli.brightness,
        cli.contrast,
        cli.saturation,
        cli.blur,
    ));

    session.set_text_font_size(cli.font_size);
    session.set_text_color(cli.color);
    for text in &cli.texts {
        if session.add_draft_text(text).is_none() {
            tracing::warn!(%text, "skipping empty text label");
        }
    }
    if cli.watermark {
        session.add_watermark();
    }

    if let Some(logo) = cli.logo.as_deref() {
        let loader = ImageLoader::new(config.loader_limits()).context("failed to build loader")?;
        if session.upload_logo(&loader, Some(logo)).await.is_none() {
            tracing::warn!(path = %logo.display(), "logo could not be loaded; skipping it");
        }
    }
    Ok(())
}
