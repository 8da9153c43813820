//! # Saorsa Deck CLI
//!
//! Command-line host that loads a presentation document and runs one export
//! backend over it.
//!
//! ## Usage
//!
//! ```bash
//! saorsa-deck deck.json --format pdf --out-dir exports
//! saorsa-deck deck.json --format png --slide 2 --pixel-ratio 3
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `ExportConfig` - Built from `CliArgs`, optionally layered over a JSON file
//! - `run` - Loads the document, drives the `ExportManager`, writes through a `FileSink`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use deck_core::{EditorAction, EditorState, ExportFormat, ExportRecord, Presentation};
use deck_renderer::{ExportConfig, ExportManager, FileSink, Orientation, PageFormat, Surface};

/// Output format selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Raster capture of one slide.
    Png,
    /// Fixed-page document, one page per slide.
    Pdf,
    /// Editable slide deck.
    Pptx,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => Self::Png,
            FormatArg::Pdf => Self::Pdf,
            FormatArg::Pptx => Self::Pptx,
        }
    }
}

/// Paper size for the fixed-page document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PageArg {
    /// ISO A4.
    A4,
    /// US Letter.
    Letter,
}

/// Page orientation for the fixed-page document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrientationArg {
    /// Wider than tall.
    Landscape,
    /// Taller than wide.
    Portrait,
}

/// Command-line arguments for saorsa-deck.
#[derive(Debug, Clone, Parser)]
#[command(name = "saorsa-deck")]
#[command(about = "Export a Saorsa Deck presentation to PNG, PDF or PPTX")]
#[command(version)]
pub struct CliArgs {
    /// Presentation JSON document
    pub input: PathBuf,

    /// Output format
    #[arg(long, short, value_enum, default_value = "pdf")]
    pub format: FormatArg,

    /// Directory the artifact is written to
    #[arg(long, short, env = "DECK_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Export settings as JSON; flags given explicitly override it
    #[arg(long, env = "DECK_EXPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Slide to capture for PNG output (1-based)
    #[arg(long, default_value = "1")]
    pub slide: usize,

    /// Output pixels per surface pixel for PNG output
    #[arg(long)]
    pub pixel_ratio: Option<f32>,

    /// Live surface width in pixels for PNG output
    #[arg(long)]
    pub surface_width: Option<f32>,

    /// Paper size for PDF output
    #[arg(long, value_enum)]
    pub page_format: Option<PageArg>,

    /// Page orientation for PDF output
    #[arg(long, value_enum)]
    pub orientation: Option<OrientationArg>,

    /// Skip loading system fonts before rasterizing
    #[arg(long)]
    pub no_system_fonts: bool,

    /// Append the outcome to the document's export history and save it
    #[arg(long)]
    pub record_history: bool,
}

impl CliArgs {
    /// Apply the flags given on the command line over `base`.
    #[must_use]
    pub fn overlay(&self, base: ExportConfig) -> ExportConfig {
        ExportConfig {
            pixel_ratio: self.pixel_ratio.unwrap_or(base.pixel_ratio),
            surface_width: self.surface_width.unwrap_or(base.surface_width),
            page_format: self.page_format.map_or(base.page_format, |p| match p {
                PageArg::A4 => PageFormat::A4,
                PageArg::Letter => PageFormat::Letter,
            }),
            orientation: self.orientation.map_or(base.orientation, |o| match o {
                OrientationArg::Landscape => Orientation::Landscape,
                OrientationArg::Portrait => Orientation::Portrait,
            }),
            load_system_fonts: base.load_system_fonts && !self.no_system_fonts,
        }
    }
}

impl From<CliArgs> for ExportConfig {
    fn from(args: CliArgs) -> Self {
        args.overlay(ExportConfig::default())
    }
}

/// Read an export configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load_config(path: &Path) -> anyhow::Result<ExportConfig> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

/// Read a presentation document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a presentation.
pub async fn load_presentation(path: &Path) -> anyhow::Result<Presentation> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Presentation::from_json(&raw).with_context(|| format!("Invalid presentation {}", path.display()))
}

/// Run one export as described by `args`.
///
/// # Errors
///
/// Returns an error if loading, exporting or writing fails.
pub async fn run(args: CliArgs) -> anyhow::Result<ExportRecord> {
    let base = match &args.config {
        Some(path) => load_config(path).await?,
        None => ExportConfig::default(),
    };
    let config = args.overlay(base);
    let presentation = load_presentation(&args.input).await?;
    tracing::info!(
        title = %presentation.title,
        slides = presentation.slides.len(),
        format = ?args.format,
        "Loaded presentation"
    );

    let manager = ExportManager::new(config);
    let sink = FileSink::new(&args.out_dir);
    let format = ExportFormat::from(args.format);

    let result = match args.format {
        FormatArg::Png => {
            let index = args.slide.checked_sub(1).context("Slides are numbered from 1")?;
            let slide = presentation.slide(index)?;
            let bounds = presentation
                .global_settings
                .aspect_ratio
                .bounds_for_width(manager.config().surface_width);
            let surface = Surface::compose(slide, bounds);
            let name = format!("{}-slide-{}", presentation.file_stem(), args.slide);
            manager.export_raster(&surface, &name, &sink).await
        }
        FormatArg::Pdf => manager.export_document(&presentation, &sink).await,
        FormatArg::Pptx => manager.export_slide_deck(&presentation, &sink).await,
    };

    if args.record_history {
        if let Some(entry) = ExportManager::history_entry(format, &result) {
            save_history(&args.input, presentation, entry).await?;
        }
    }
    Ok(result?)
}

/// Append `entry` to the export history and write the document back.
async fn save_history(
    path: &Path,
    presentation: Presentation,
    entry: ExportRecord,
) -> anyhow::Result<()> {
    let state = EditorState::with_presentation(presentation)
        .apply(EditorAction::RecordExport(entry))
        .apply(EditorAction::MarkSaved);
    let Some(presentation) = state.presentation else {
        anyhow::bail!("Editor state lost the document");
    };
    tokio::fs::write(path, presentation.to_json()?)
        .await
        .with_context(|| format!("Failed to save {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Export history saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use deck_core::{Layer, LayerTemplate, LayerType, Slide};

    fn write_deck(dir: &Path) -> PathBuf {
        let slide = Slide::new("One").with_layer(Layer::create(
            LayerType::Shape,
            &LayerTemplate::at(10.0, 10.0, 50.0, 50.0),
            None,
            0,
        ));
        let deck = Presentation::new("Demo").with_slide(slide);
        let path = dir.join("deck.json");
        std::fs::write(&path, deck.to_json().expect("json")).expect("write deck");
        path
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = CliArgs::try_parse_from([
            "saorsa-deck",
            "deck.json",
            "--pixel-ratio",
            "3",
            "--page-format",
            "letter",
            "--no-system-fonts",
        ])
        .expect("parse");
        let config = ExportConfig::from(args);
        assert!((config.pixel_ratio - 3.0).abs() < f32::EPSILON);
        assert_eq!(config.page_format, PageFormat::Letter);
        assert_eq!(config.orientation, Orientation::Landscape);
        assert!(!config.load_system_fonts);
    }

    #[test]
    fn test_unset_flags_keep_file_values() {
        let args = CliArgs::try_parse_from(["saorsa-deck", "deck.json"]).expect("parse");
        let base = ExportConfig {
            orientation: Orientation::Portrait,
            surface_width: 1280.0,
            ..ExportConfig::default()
        };
        let config = args.overlay(base.clone());
        assert_eq!(config, base);
    }

    #[tokio::test]
    async fn test_run_writes_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_deck(dir.path());
        let args = CliArgs::try_parse_from([
            OsStr::new("saorsa-deck"),
            input.as_os_str(),
            OsStr::new("--out-dir"),
            dir.path().as_os_str(),
            OsStr::new("--format"),
            OsStr::new("pptx"),
        ])
        .expect("parse");

        let record = run(args).await.expect("export");
        assert!(record.success);
        assert!(dir.path().join("Demo.pptx").exists());
    }

    #[tokio::test]
    async fn test_failed_export_is_recorded_in_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_deck(dir.path());
        let args = CliArgs::try_parse_from([
            OsStr::new("saorsa-deck"),
            input.as_os_str(),
            OsStr::new("--out-dir"),
            dir.path().as_os_str(),
            OsStr::new("--format"),
            OsStr::new("png"),
            OsStr::new("--surface-width"),
            OsStr::new("0"),
            OsStr::new("--no-system-fonts"),
            OsStr::new("--record-history"),
        ])
        .expect("parse");

        assert!(run(args).await.is_err());
        let saved = load_presentation(&input).await.expect("reload");
        assert_eq!(saved.export_history.len(), 1);
        let entry = &saved.export_history[0];
        assert!(!entry.success);
        assert_eq!(entry.format, ExportFormat::Png);
    }

    #[tokio::test]
    async fn test_successful_export_is_recorded_in_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_deck(dir.path());
        let args = CliArgs::try_parse_from([
            OsStr::new("saorsa-deck"),
            input.as_os_str(),
            OsStr::new("--out-dir"),
            dir.path().as_os_str(),
            OsStr::new("--format"),
            OsStr::new("pdf"),
            OsStr::new("--record-history"),
        ])
        .expect("parse");

        let record = run(args).await.expect("export");
        let saved = load_presentation(&input).await.expect("reload");
        assert_eq!(saved.export_history, vec![record]);
    }

    #[tokio::test]
    async fn test_run_rejects_slide_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_deck(dir.path());
        let args = CliArgs::try_parse_from([
            OsStr::new("saorsa-deck"),
            input.as_os_str(),
            OsStr::new("--format"),
            OsStr::new("png"),
            OsStr::new("--slide"),
            OsStr::new("0"),
        ])
        .expect("parse");
        assert!(run(args).await.is_err());
    }
}
