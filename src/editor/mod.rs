//! Editing session: routes user intents into scene and filter mutations and
//! keeps the render surface in sync.
//!
//! A session starts in `Loading`, becomes `Ready` once the base image is
//! decoded and ends in `Closed`. Every mutating intent is a silent no-op
//! outside `Ready`; the host is told about the save and the close exactly
//! once.

mod output;
mod state;
mod tabs;

use std::path::Path;

use image::RgbaImage;
use thiserror::Error;

use crate::config::EditorConfig;
use crate::filters::{compute_filter_stack, AdjustmentParams, FilterPreset, FilterStack};
use crate::geometry::{CanvasPoint, CanvasSize, Color, ObjectBounds, ObjectScale};
use crate::loader::{ImageLoader, ImageSource, LoadError, LoadedImage};
use crate::render::{
    EncodedImage, ExportError, ExportFormat, ExportOptions, FontBook, RenderSurface,
};
use crate::scene::{ObjectId, SceneGraph};

pub use output::edited_filename;
pub use state::{SessionEvent, SessionMachine, SessionState, SessionStateError, SessionTransition};
pub use tabs::{TabOptions, ToolTab};

pub const MIN_TEXT_FONT_SIZE: f32 = 12.0;
pub const MAX_TEXT_FONT_SIZE: f32 = 100.0;
pub const DEFAULT_TEXT_FONT_SIZE: f32 = 40.0;
pub const DEFAULT_TEXT_COLOR: Color = Color::WHITE;
pub const JPEG_EXPORT_QUALITY: f32 = 0.92;

/// What the embedding application hands over when opening the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub image_url: String,
    pub filename: String,
}

impl SessionRequest {
    pub fn new(image_url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            filename: filename.into(),
        }
    }
}

/// Receives the session's results.
pub trait EditorHost {
    fn on_save(&mut self, image: EncodedImage, filename: String);
    fn on_close(&mut self);
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("session is {state:?}, not ready for editing")]
    NotReady { state: SessionState },
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Font size and color used for the next text label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextDraft {
    pub font_size: f32,
    pub color: Color,
}

impl Default for TextDraft {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_TEXT_FONT_SIZE,
            color: DEFAULT_TEXT_COLOR,
        }
    }
}

fn clamp_font_size(font_size: f32) -> f32 {
    if font_size.is_finite() {
        font_size.clamp(MIN_TEXT_FONT_SIZE, MAX_TEXT_FONT_SIZE)
    } else {
        DEFAULT_TEXT_FONT_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadKind {
    Base,
    Logo,
}

/// Identifies one in-flight load. Results for stale tickets are dropped.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    id: u64,
    kind: LoadKind,
}

pub struct EditorSession<H: EditorHost> {
    request: SessionRequest,
    host: H,
    machine: SessionMachine,
    scene: SceneGraph,
    surface: RenderSurface,
    preset: FilterPreset,
    adjustments: AdjustmentParams,
    filter_stack: FilterStack,
    active_tab: ToolTab,
    text_draft: TextDraft,
    watermark_text: String,
    export_multiplier: f32,
    next_ticket: u64,
    pending_base: Option<LoadTicket>,
    pending_logos: Vec<LoadTicket>,
    close_notified: bool,
}

impl<H: EditorHost> EditorSession<H> {
    pub fn open(request: SessionRequest, config: &EditorConfig, host: H) -> Self {
        let fonts = FontBook::load(config.font_path.as_deref());
        Self::open_with_fonts(request, config, fonts, host)
    }

    pub fn open_with_fonts(
        request: SessionRequest,
        config: &EditorConfig,
        fonts: FontBook,
        host: H,
    ) -> Self {
        let surface =
            RenderSurface::initialize(config.canvas_size(), config.background_color(), fonts);
        tracing::info!(filename = %request.filename, "editor session opened");
        Self {
            request,
            host,
            machine: SessionMachine::new(),
            scene: SceneGraph::new(),
            surface,
            preset: FilterPreset::Original,
            adjustments: AdjustmentParams::default(),
            filter_stack: FilterStack::default(),
            active_tab: ToolTab::default(),
            text_draft: TextDraft::default(),
            watermark_text: config.watermark_text.clone(),
            export_multiplier: config.export_multiplier(),
            next_ticket: 1,
            pending_base: None,
            pending_logos: Vec::new(),
            close_notified: false,
        }
    }

    pub fn request(&self) -> &SessionRequest {
        &self.request
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    pub fn transitions(&self) -> &[SessionTransition] {
        self.machine.history()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.surface.size()
    }

    /// Most recent raster of the canvas at logical size.
    pub fn frame(&self) -> Option<&RgbaImage> {
        self.surface.frame()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn preset(&self) -> FilterPreset {
        self.preset
    }

    pub fn adjustments(&self) -> AdjustmentParams {
        self.adjustments
    }

    pub fn filter_stack(&self) -> &FilterStack {
        &self.filter_stack
    }

    pub fn active_tab(&self) -> ToolTab {
        self.active_tab
    }

    pub fn text_draft(&self) -> TextDraft {
        self.text_draft
    }

    pub fn select_tab(&mut self, tab: ToolTab) -> bool {
        if self.active_tab == tab {
            return false;
        }
        tracing::debug!(from = %self.active_tab, to = %tab, "tool tab selected");
        self.active_tab = tab;
        true
    }

    /// Clamps to the slider range and returns the stored size.
    pub fn set_text_font_size(&mut self, font_size: f32) -> f32 {
        let clamped = clamp_font_size(font_size);
        self.text_draft.font_size = clamped;
        clamped
    }

    pub fn set_text_color(&mut self, color: Color) {
        self.text_draft.color = color;
    }

    fn allocate_ticket(&mut self, kind: LoadKind) -> LoadTicket {
        let ticket = LoadTicket {
            id: self.next_ticket,
            kind,
        };
        self.next_ticket = self.next_ticket.saturating_add(1);
        ticket
    }

    fn ensure_ready(&self, intent: &'static str) -> bool {
        let ready = self.is_ready();
        if !ready {
            tracing::debug!(intent, state = ?self.state(), "ignoring intent outside ready state");
        }
        ready
    }

    fn rerender(&mut self) {
        if let Err(err) = self.surface.render(&self.scene) {
            tracing::warn!(?err, "failed to render scene");
        }
    }

    /// Recomputes the stack and redraws the base layer from its untouched source.
    fn refresh_filters(&mut self) {
        self.filter_stack = compute_filter_stack(self.preset, self.adjustments);
        let filtered = match self.scene.base_image().and_then(|base| base.kind.as_image()) {
            Some(payload) if !self.filter_stack.is_empty() => {
                Some(self.filter_stack.apply(payload.source()))
            }
            _ => None,
        };
        match filtered {
            Some(image) => self.scene.set_base_rendered(image),
            None => self.scene.restore_base_source(),
        };
        tracing::debug!(
            preset = %self.preset,
            ops = self.filter_stack.len(),
            "filter stack applied"
        );
    }

    pub fn begin_base_load(&mut self) -> LoadTicket {
        let ticket = self.allocate_ticket(LoadKind::Base);
        self.pending_base = Some(ticket);
        ticket
    }

    /// Installs a decoded base image. Returns `false` when the result was
    /// dropped: session closed, stale ticket, or failed load.
    pub fn finish_base_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadedImage, LoadError>,
    ) -> bool {
        if self.state() == SessionState::Closed {
            tracing::debug!(ticket = ticket.id, "dropping base image load after close");
            return false;
        }
        if ticket.kind != LoadKind::Base || self.pending_base != Some(ticket) {
            tracing::debug!(ticket = ticket.id, "dropping stale base image load");
            return false;
        }
        self.pending_base = None;

        let loaded = match result {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::warn!(%err, "base image failed to load");
                return false;
            }
        };

        let canvas = self.surface.size();
        let id = self.scene.set_base_image(loaded.image, canvas);
        self.refresh_filters();
        if let Err(err) = self.machine.transition(SessionEvent::BaseImageLoaded) {
            tracing::warn!(%err, "base image loaded in unexpected state");
            return false;
        }
        self.rerender();
        tracing::info!(%id, mime = loaded.mime_type, "base image ready");
        true
    }

    /// Fetches the session's image URL and installs it as the base layer.
    pub async fn load_base_image(&mut self, loader: &ImageLoader) -> bool {
        if self.state() == SessionState::Closed {
            return false;
        }
        let source = ImageSource::parse(&self.request.image_url);
        let ticket = self.begin_base_load();
        let result = loader.load(&source).await;
        self.finish_base_load(ticket, result)
    }

    pub fn begin_logo_upload(&mut self) -> LoadTicket {
        let ticket = self.allocate_ticket(LoadKind::Logo);
        self.pending_logos.push(ticket);
        ticket
    }

    pub fn finish_logo_upload(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadedImage, LoadError>,
    ) -> Option<ObjectId> {
        if !self.pending_logos.contains(&ticket) {
            tracing::debug!(ticket = ticket.id, "dropping stale logo upload");
            return None;
        }
        self.pending_logos.retain(|pending| *pending != ticket);
        if !self.ensure_ready("upload logo") {
            return None;
        }

        let loaded = match result {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::warn!(%err, "logo upload dropped");
                return None;
            }
        };
        let id = self
            .scene
            .add_overlay_image(loaded.image, self.surface.size());
        self.rerender();
        tracing::debug!(%id, "logo added");
        Some(id)
    }

    /// `None` for `path` means the file picker was dismissed.
    pub async fn upload_logo(
        &mut self,
        loader: &ImageLoader,
        path: Option<&Path>,
    ) -> Option<ObjectId> {
        let path = path?;
        if !self.ensure_ready("upload logo") {
            return None;
        }
        let ticket = self.begin_logo_upload();
        let result = loader
            .load(&ImageSource::FilePath(path.to_path_buf()))
            .await;
        self.finish_logo_upload(ticket, result)
    }

    pub fn add_text(&mut self, content: &str, font_size: f32, color: Color) -> Option<ObjectId> {
        if !self.ensure_ready("add text") {
            return None;
        }
        let id = self
            .scene
            .add_text(content, clamp_font_size(font_size), color)?;
        self.rerender();
        Some(id)
    }

    /// Adds a label with the current draft size and color.
    pub fn add_draft_text(&mut self, content: &str) -> Option<ObjectId> {
        let TextDraft { font_size, color } = self.text_draft;
        self.add_text(content, font_size, color)
    }

    pub fn add_watermark(&mut self) -> Option<ObjectId> {
        if !self.ensure_ready("add watermark") {
            return None;
        }
        let id = self
            .scene
            .add_watermark(&self.watermark_text, self.surface.size());
        self.rerender();
        Some(id)
    }

    pub fn apply_preset(&mut self, preset: FilterPreset) -> bool {
        if !self.ensure_ready("apply preset") || self.preset == preset {
            return false;
        }
        self.preset = preset;
        self.refresh_filters();
        self.rerender();
        true
    }

    pub fn set_brightness(&mut self, value: f32) -> bool {
        self.update_adjustments(|params| params.set_brightness(value))
    }

    pub fn set_contrast(&mut self, value: f32) -> bool {
        self.update_adjustments(|params| params.set_contrast(value))
    }

    pub fn set_saturation(&mut self, value: f32) -> bool {
        self.update_adjustments(|params| params.set_saturation(value))
    }

    /// `value` is a percentage in `[0, 100]`.
    pub fn set_blur(&mut self, value: f32) -> bool {
        self.update_adjustments(|params| params.set_blur(value))
    }

    /// Replaces all four scalars at once with a single recompute.
    pub fn set_adjustments(&mut self, params: AdjustmentParams) -> bool {
        self.update_adjustments(|current| *current = params)
    }

    fn update_adjustments(&mut self, update: impl FnOnce(&mut AdjustmentParams)) -> bool {
        if !self.ensure_ready("adjust filters") {
            return false;
        }
        let mut next = self.adjustments;
        update(&mut next);
        if next == self.adjustments {
            return false;
        }
        self.adjustments = next;
        self.refresh_filters();
        self.rerender();
        true
    }

    pub fn select(&mut self, id: ObjectId) -> bool {
        if !self.ensure_ready("select object") {
            return false;
        }
        match self.scene.select(id) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%id, %err, "selection rejected");
                false
            }
        }
    }

    /// Selects the topmost selectable object under `point`; empty space clears the selection.
    pub fn select_at(&mut self, point: CanvasPoint) -> Option<ObjectId> {
        if !self.ensure_ready("select at point") {
            return None;
        }
        match self.surface.hit_test(&self.scene, point) {
            Some(id) => self.scene.select(id).ok().map(|()| id),
            None => {
                self.scene.clear_selection();
                None
            }
        }
    }

    pub fn clear_selection(&mut self) -> bool {
        self.scene.clear_selection()
    }

    pub fn selected_bounds(&self) -> Option<ObjectBounds> {
        self.scene
            .selected_object()
            .map(|object| self.surface.object_bounds(object))
    }

    pub fn move_selected_by(&mut self, delta_x: f32, delta_y: f32) -> bool {
        self.mutate_selected("move selection", |scene, id| {
            scene.move_object_by(id, delta_x, delta_y)
        })
    }

    pub fn scale_selected(&mut self, scale: ObjectScale) -> bool {
        self.mutate_selected("scale selection", |scene, id| {
            scene.set_object_scale(id, scale)
        })
    }

    pub fn bring_selected_to_front(&mut self) -> bool {
        self.mutate_selected("raise selection", |scene, id| scene.bring_to_front(id))
    }

    fn mutate_selected<F, E>(&mut self, intent: &'static str, mutate: F) -> bool
    where
        F: FnOnce(&mut SceneGraph, ObjectId) -> Result<(), E>,
        E: std::fmt::Display,
    {
        if !self.ensure_ready(intent) {
            return false;
        }
        let Some(id) = self.scene.active_selection() else {
            tracing::debug!(intent, "nothing selected");
            return false;
        };
        if let Err(err) = mutate(&mut self.scene, id) {
            tracing::debug!(intent, %id, %err, "selection mutation rejected");
            return false;
        }
        self.rerender();
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        if !self.ensure_ready("delete selection") {
            return false;
        }
        if self.scene.delete_selected().is_none() {
            return false;
        }
        self.rerender();
        true
    }

    /// Removes everything but the base image and returns filters to defaults.
    pub fn reset(&mut self) -> bool {
        if !self.ensure_ready("reset") {
            return false;
        }
        self.scene.reset();
        self.preset = FilterPreset::Original;
        self.adjustments = AdjustmentParams::default();
        self.refresh_filters();
        self.rerender();
        tracing::debug!("session reset");
        true
    }

    /// Exports the canvas, hands it to the host and closes the session.
    /// On export failure the host is not called and the session stays editable.
    pub fn save(&mut self, format: ExportFormat) -> Result<String, EditorError> {
        if !self.is_ready() {
            return Err(EditorError::NotReady {
                state: self.state(),
            });
        }
        let quality = match format {
            ExportFormat::Png => 1.0,
            ExportFormat::Jpeg => JPEG_EXPORT_QUALITY,
        };
        let options = ExportOptions {
            format,
            quality,
            multiplier: self.export_multiplier,
        };
        let encoded = self
            .surface
            .export_raster(&self.scene, options)
            .inspect_err(|err| tracing::warn!(%err, "export failed; session stays open"))?;

        let filename = edited_filename(&self.request.filename, format);
        tracing::info!(
            %filename,
            width = encoded.width,
            height = encoded.height,
            bytes = encoded.bytes.len(),
            "saving edited image"
        );
        self.host.on_save(encoded, filename.clone());
        self.close();
        Ok(filename)
    }

    /// Ends the session. Only the first call has any effect.
    pub fn close(&mut self) -> bool {
        if self.close_notified {
            return false;
        }
        self.pending_base = None;
        self.pending_logos.clear();
        self.surface.dispose();
        if let Err(err) = self.machine.transition(SessionEvent::Close) {
            tracing::warn!(%err, "close requested in unexpected state");
        }
        self.close_notified = true;
        self.host.on_close();
        tracing::info!(filename = %self.request.filename, "editor session closed");
        true
    }
}

impl<H: EditorHost> Drop for EditorSession<H> {
    fn drop(&mut self) {
        self.close();
    }
}
