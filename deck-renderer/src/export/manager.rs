//! Export invocation and artifact hand-off.
//!
//! Every backend has one in-flight flag. A second call to the same backend
//! while the first is outstanding fails with [`RenderError::ExportInFlight`];
//! different backends run independently. The flag is released on every exit
//! path so a failed export can be retried immediately.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use deck_core::{ExportFormat, ExportRecord, Presentation};

use crate::compositor::Surface;
use crate::error::{RenderError, RenderResult};

use super::{render_pdf, render_png, render_pptx, ExportArtifact, ExportConfig};

/// Receives finished artifacts for persistence or download.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Take ownership of a finished artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be persisted.
    async fn deliver(&self, artifact: ExportArtifact) -> RenderResult<()>;
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Sink writing into `dir`, created on first delivery.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an artifact named `file_name` is written to.
    #[must_use]
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(sanitize_file_name(file_name))
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    async fn deliver(&self, artifact: ExportArtifact) -> RenderResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&artifact.file_name);
        tokio::fs::write(&path, &artifact.bytes).await?;
        tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "Artifact written");
        Ok(())
    }
}

/// Collects artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<ExportArtifact>>,
}

impl MemorySink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything delivered so far.
    pub async fn take(&self) -> Vec<ExportArtifact> {
        std::mem::take(&mut *self.artifacts.lock().await)
    }

    /// Number of artifacts held.
    pub async fn len(&self) -> usize {
        self.artifacts.lock().await.len()
    }

    /// Whether nothing has been delivered.
    pub async fn is_empty(&self) -> bool {
        self.artifacts.lock().await.is_empty()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn deliver(&self, artifact: ExportArtifact) -> RenderResult<()> {
        self.artifacts.lock().await.push(artifact);
        Ok(())
    }
}

/// Replace characters that are unsafe in file names.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "presentation".to_string()
    } else {
        cleaned
    }
}

/// Holds a backend's in-flight flag until dropped.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, format: ExportFormat) -> RenderResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RenderError::ExportInFlight(format))?;
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs exports with per-backend in-flight guards.
#[derive(Debug, Default)]
pub struct ExportManager {
    config: ExportConfig,
    raster: AtomicBool,
    document: AtomicBool,
    deck: AtomicBool,
}

impl ExportManager {
    /// Manager using `config`.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Whether `format` has an export outstanding.
    #[must_use]
    pub fn is_in_flight(&self, format: ExportFormat) -> bool {
        self.flag(format).load(Ordering::Acquire)
    }

    fn flag(&self, format: ExportFormat) -> &AtomicBool {
        match format {
            ExportFormat::Png => &self.raster,
            ExportFormat::Pdf => &self.document,
            ExportFormat::Pptx => &self.deck,
        }
    }

    /// Capture `surface` as `<file_name>.png` and deliver it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExportInFlight`] if a raster export is already
    /// running, or the encoding or delivery error.
    pub async fn export_raster(
        &self,
        surface: &Surface,
        file_name: &str,
        sink: &dyn ArtifactSink,
    ) -> RenderResult<ExportRecord> {
        let file_name = format!("{file_name}.{}", ExportFormat::Png.extension());
        self.run(ExportFormat::Png, sink, || {
            Ok(ExportArtifact {
                file_name,
                format: ExportFormat::Png,
                bytes: render_png(surface, &self.config)?,
            })
        })
        .await
    }

    /// Export the whole presentation as one PDF document.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExportInFlight`] if a document export is
    /// already running, or the encoding or delivery error.
    pub async fn export_document(
        &self,
        presentation: &Presentation,
        sink: &dyn ArtifactSink,
    ) -> RenderResult<ExportRecord> {
        self.run(ExportFormat::Pdf, sink, || {
            Ok(ExportArtifact {
                file_name: format!("{}.pdf", presentation.file_stem()),
                format: ExportFormat::Pdf,
                bytes: render_pdf(presentation, &self.config)?,
            })
        })
        .await
    }

    /// Export the whole presentation as one PPTX deck.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExportInFlight`] if a deck export is already
    /// running, or the encoding or delivery error.
    pub async fn export_slide_deck(
        &self,
        presentation: &Presentation,
        sink: &dyn ArtifactSink,
    ) -> RenderResult<ExportRecord> {
        self.run(ExportFormat::Pptx, sink, || {
            Ok(ExportArtifact {
                file_name: format!("{}.pptx", presentation.file_stem()),
                format: ExportFormat::Pptx,
                bytes: render_pptx(presentation)?,
            })
        })
        .await
    }

    /// History entry for the outcome of an export call.
    ///
    /// Failed exports become a failure record. A call rejected because the
    /// backend was busy never ran and yields `None`.
    #[must_use]
    pub fn history_entry(
        format: ExportFormat,
        result: &RenderResult<ExportRecord>,
    ) -> Option<ExportRecord> {
        match result {
            Ok(record) => Some(record.clone()),
            Err(RenderError::ExportInFlight(_)) => None,
            Err(_) => Some(ExportRecord::failed(format)),
        }
    }

    async fn run<F>(
        &self,
        format: ExportFormat,
        sink: &dyn ArtifactSink,
        encode: F,
    ) -> RenderResult<ExportRecord>
    where
        F: FnOnce() -> RenderResult<ExportArtifact>,
    {
        let _guard = match InFlightGuard::acquire(self.flag(format), format) {
            Ok(guard) => guard,
            Err(e) => {
                tracing::debug!("Rejected export: {e}");
                return Err(e);
            }
        };
        tracing::info!(?format, "Export started");
        tokio::task::yield_now().await;

        let result = match encode() {
            Ok(artifact) => {
                let size = artifact.size();
                sink.deliver(artifact).await.map(|()| size)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(size) => {
                tracing::info!(?format, bytes = size, "Export finished");
                Ok(ExportRecord::succeeded(format, size))
            }
            Err(e) => {
                tracing::error!(?format, "Export failed: {e}");
                Err(e)
            }
        }
    }
}
