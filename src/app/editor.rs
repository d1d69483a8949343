use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread,
};

use eframe::egui::{self, Color32, Pos2, Rect, Vec2};
use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::{
    collection::{EntryId, ImageEntry, NewImage, SourceBytes},
    crop::{default_region, min_size_for_scale, CropHandle, CropRegion},
    error::EditorError,
    i18n::Messages,
    image_utils::{crop_region, decode_image, encode_image, preview_image, OutputFormat},
    ui::{DisplayProjection, LayoutGate, LayoutStatus},
};

const MASK_COLOR: Color32 = Color32::from_rgba_premultiplied(28, 30, 36, 128);
const BOX_COLOR: Color32 = Color32::from_rgb(59, 130, 246);
const EDITOR_MAX_SIZE: Vec2 = egui::vec2(1000.0, 800.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorPhase {
    Closed,
    Loading,
    Ready,
    Saving,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Resize(CropHandle),
}

#[derive(Clone, Copy, Debug)]
struct Gesture {
    kind: GestureKind,
    start_pointer: Pos2,
    start_region: CropRegion,
}

/// Result of a successful save, to be applied through `ImageCollection::replace`.
pub struct SavedCrop {
    pub entry_id: EntryId,
    pub image: NewImage,
}

pub enum EditorEvent {
    Loaded,
    LoadFailed(EditorError),
    Saved(SavedCrop),
    SaveFailed(EditorError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorCommand {
    Save,
    Cancel,
}

enum EditorJob {
    Loaded(Result<(DynamicImage, egui::ColorImage), EditorError>),
    Saved(Result<NewImage, EditorError>),
}

/// Crop session for one entry at a time.
pub struct EditorSession {
    phase: EditorPhase,
    entry_id: Option<EntryId>,
    entry_name: String,
    image: Option<Arc<DynamicImage>>,
    canvas_pixels: Option<egui::ColorImage>,
    texture: Option<egui::TextureHandle>,
    region: CropRegion,
    gesture: Option<Gesture>,
    layout: LayoutGate,
    job_tx: Sender<EditorJob>,
    job_rx: Receiver<EditorJob>,
    /// Failures raised on the UI thread, handed out by the next `poll`.
    pending: Vec<EditorEvent>,
    error: Option<String>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        let (job_tx, job_rx) = mpsc::channel();
        Self {
            phase: EditorPhase::Closed,
            entry_id: None,
            entry_name: String::new(),
            image: None,
            canvas_pixels: None,
            texture: None,
            region: CropRegion::new(0.0, 0.0, 0.0, 0.0),
            gesture: None,
            layout: LayoutGate::new(),
            job_tx,
            job_rx,
            pending: Vec::new(),
            error: None,
        }
    }

    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != EditorPhase::Closed
    }

    pub fn entry_id(&self) -> Option<&EntryId> {
        self.entry_id.as_ref()
    }

    pub fn region(&self) -> CropRegion {
        self.region
    }

    pub fn natural_size(&self) -> Option<Vec2> {
        self.image
            .as_ref()
            .map(|img| egui::vec2(img.width() as f32, img.height() as f32))
    }

    /// Ready and laid out: the crop box may be drawn and manipulated.
    pub fn is_interactive(&self) -> bool {
        self.phase == EditorPhase::Ready && self.layout.is_stable()
    }

    pub fn gesture(&self) -> Option<GestureKind> {
        self.gesture.map(|g| g.kind)
    }

    /// Starts decoding the entry's full-resolution source on a worker thread.
    pub fn open(&mut self, entry: &ImageEntry) -> Result<(), EditorError> {
        if self.phase == EditorPhase::Saving {
            return Err(EditorError::SaveInProgress);
        }
        self.reset_state();
        self.phase = EditorPhase::Loading;
        self.entry_id = Some(entry.id.clone());
        self.entry_name = entry.name.clone();
        // Results from an earlier session must not leak into this one.
        let (job_tx, job_rx) = mpsc::channel();
        self.job_tx = job_tx;
        self.job_rx = job_rx;

        let source = entry.source.clone();
        let tx = self.job_tx.clone();
        thread::spawn(move || {
            let result = decode_image(&source.bytes, &source.mime)
                .map(|image| {
                    let pixels = preview_image(&image);
                    (image, pixels)
                })
                .map_err(|err| EditorError::Decode(err.to_string()));
            let _ = tx.send(EditorJob::Loaded(result));
        });
        info!(id = %entry.id, name = %entry.name, "opened crop editor");
        Ok(())
    }

    /// Opens on an already decoded image. The session still waits for a stable layout.
    pub fn open_decoded(&mut self, entry_id: EntryId, name: impl Into<String>, image: DynamicImage) {
        self.reset_state();
        self.phase = EditorPhase::Loading;
        self.entry_id = Some(entry_id);
        self.entry_name = name.into();
        let pixels = preview_image(&image);
        self.install_image(image, pixels);
    }

    fn install_image(&mut self, image: DynamicImage, pixels: egui::ColorImage) {
        self.region = default_region(image.width() as f32, image.height() as f32);
        self.image = Some(Arc::new(image));
        self.canvas_pixels = Some(pixels);
        self.texture = None;
        self.layout.reset();
    }

    pub fn poll(&mut self) -> Vec<EditorEvent> {
        let mut events = std::mem::take(&mut self.pending);
        while let Ok(job) = self.job_rx.try_recv() {
            match job {
                EditorJob::Loaded(Ok((image, pixels))) => {
                    if self.phase != EditorPhase::Loading {
                        continue;
                    }
                    debug!(width = image.width(), height = image.height(), "editor source decoded");
                    self.install_image(image, pixels);
                    events.push(EditorEvent::Loaded);
                }
                EditorJob::Loaded(Err(err)) => {
                    warn!("editor failed to load source: {err}");
                    self.reset_state();
                    events.push(EditorEvent::LoadFailed(err));
                }
                EditorJob::Saved(Ok(image)) => {
                    let Some(entry_id) = self.entry_id.clone() else {
                        continue;
                    };
                    info!(id = %entry_id, width = image.width, height = image.height, "crop saved");
                    if let Some(size) = self.natural_size() {
                        self.region = default_region(size.x, size.y);
                    }
                    self.reset_state();
                    events.push(EditorEvent::Saved(SavedCrop { entry_id, image }));
                }
                EditorJob::Saved(Err(err)) => {
                    warn!("crop save failed: {err}");
                    self.phase = EditorPhase::Ready;
                    self.error = Some(err.to_string());
                    events.push(EditorEvent::SaveFailed(err));
                }
            }
        }
        events
    }

    /// Feeds the viewport size seen this frame. Ready is only entered once the image is
    /// decoded and the size has settled; a resize suspends interaction until it settles again.
    pub fn observe_layout(&mut self, size: Vec2) -> Result<LayoutStatus, EditorError> {
        if self.image.is_none() || !matches!(self.phase, EditorPhase::Loading | EditorPhase::Ready) {
            return Ok(LayoutStatus::Settling);
        }
        let status = self.layout.observe(size);
        match status {
            LayoutStatus::Stable(_) => {
                if self.phase == EditorPhase::Loading {
                    debug!(?size, "editor layout stable");
                    self.phase = EditorPhase::Ready;
                }
            }
            LayoutStatus::Settling => {
                self.gesture = None;
            }
            LayoutStatus::TimedOut => {
                warn!("editor viewport never reported a usable size");
                self.reset_state();
                self.pending.push(EditorEvent::LoadFailed(EditorError::LayoutTimeout));
                return Err(EditorError::LayoutTimeout);
            }
        }
        Ok(status)
    }

    pub fn projection(&self, viewport: Vec2) -> Option<DisplayProjection> {
        DisplayProjection::compute(self.natural_size()?, viewport)
    }

    pub fn hit_test(&self, pointer: Pos2, origin: Pos2, projection: &DisplayProjection) -> Option<GestureKind> {
        let crop_box = projection.region_rect(origin, &self.region);
        CropHandle::ALL
            .into_iter()
            .find(|handle| handle.handle_rect(crop_box).contains(pointer))
            .map(GestureKind::Resize)
            .or_else(|| crop_box.contains(pointer).then_some(GestureKind::Move))
    }

    /// Starts a gesture. Ignored while another gesture is active or the session is not interactive.
    pub fn pointer_down(&mut self, pointer: Pos2, kind: GestureKind) -> bool {
        if !self.is_interactive() || self.gesture.is_some() {
            return false;
        }
        self.gesture = Some(Gesture {
            kind,
            start_pointer: pointer,
            start_region: self.region,
        });
        true
    }

    /// Applies the total pointer travel since the gesture began to the region it began with.
    pub fn pointer_move(&mut self, pointer: Pos2, projection: &DisplayProjection) {
        let Some(gesture) = self.gesture else { return };
        let delta = projection.delta_to_natural(pointer - gesture.start_pointer);
        let bounds = projection.natural_size;
        self.region = match gesture.kind {
            GestureKind::Move => gesture.start_region.dragged(delta, bounds),
            GestureKind::Resize(handle) => gesture.start_region.resized(
                handle,
                delta,
                bounds,
                min_size_for_scale(projection.scale),
            ),
        };
    }

    pub fn pointer_up(&mut self) {
        self.gesture = None;
    }

    pub fn reset_region(&mut self) {
        if let Some(size) = self.natural_size() {
            self.region = default_region(size.x, size.y);
            self.gesture = None;
        }
    }

    /// Crops and encodes on a worker thread. The session stays open until the result arrives.
    pub fn begin_save(&mut self, format: OutputFormat, quality: u8) -> Result<(), EditorError> {
        match self.phase {
            EditorPhase::Ready => {}
            EditorPhase::Saving => return Err(EditorError::SaveInProgress),
            _ => return Err(EditorError::NotReady),
        }
        let (Some(image), Some(entry_id)) = (self.image.clone(), self.entry_id.clone()) else {
            return Err(EditorError::NotReady);
        };
        self.gesture = None;
        self.error = None;
        self.phase = EditorPhase::Saving;

        let region = self.region;
        let name = edited_name(&entry_id, &self.entry_name);
        let tx = self.job_tx.clone();
        thread::spawn(move || {
            let result = render_crop(&image, &region, name, format, quality);
            let _ = tx.send(EditorJob::Saved(result));
        });
        Ok(())
    }

    /// Cancels the session. Refused while a save is being encoded.
    pub fn close(&mut self) -> Result<(), EditorError> {
        if self.phase == EditorPhase::Saving {
            return Err(EditorError::SaveInProgress);
        }
        if self.phase != EditorPhase::Closed {
            debug!("closing crop editor");
        }
        self.reset_state();
        Ok(())
    }

    fn reset_state(&mut self) {
        self.phase = EditorPhase::Closed;
        self.entry_id = None;
        self.entry_name.clear();
        self.image = None;
        self.canvas_pixels = None;
        self.texture = None;
        self.gesture = None;
        self.layout.reset();
        self.error = None;
    }

    pub fn show(&mut self, ctx: &egui::Context, messages: &Messages) -> Option<EditorCommand> {
        if !self.is_open() {
            return None;
        }
        let mut command = None;
        let screen = ctx.screen_rect().size();
        let size = (screen * 0.9).min(EDITOR_MAX_SIZE);

        let response = egui::Modal::new(egui::Id::new("crop-editor")).show(ctx, |ui| {
            ui.set_width(size.x);
            ui.set_height(size.y);
            command = self.header_ui(ui, messages);
            if let Some(error) = &self.error {
                ui.colored_label(Color32::from_rgb(220, 38, 38), error);
            }
            ui.separator();
            self.viewport_ui(ui, messages);
        });

        if response.should_close() && command.is_none() {
            command = Some(EditorCommand::Cancel);
        }
        if self.is_interactive() && ctx.input(|i| i.key_pressed(egui::Key::Enter)) {
            command = Some(EditorCommand::Save);
        }
        command
    }

    fn header_ui(&mut self, ui: &mut egui::Ui, messages: &Messages) -> Option<EditorCommand> {
        let mut command = None;
        ui.horizontal(|ui| {
            ui.heading(messages.editor_heading(&self.entry_name));
            ui.add_space(16.0);
            if ui
                .add_enabled(self.is_interactive(), egui::Button::new(messages.reset_button))
                .on_hover_text(messages.reset_description)
                .clicked()
            {
                self.reset_region();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let saving = self.phase == EditorPhase::Saving;
                if ui.add_enabled(!saving, egui::Button::new("✕")).clicked() {
                    command = Some(EditorCommand::Cancel);
                }
                let label = if saving { messages.saving } else { messages.save_button };
                let save = egui::Button::new(egui::RichText::new(label).color(Color32::WHITE)).fill(BOX_COLOR);
                if ui.add_enabled(self.phase == EditorPhase::Ready, save).clicked() {
                    command = Some(EditorCommand::Save);
                }
                if ui.add_enabled(!saving, egui::Button::new(messages.cancel_button)).clicked() {
                    command = Some(EditorCommand::Cancel);
                }
            });
        });
        command
    }

    fn viewport_ui(&mut self, ui: &mut egui::Ui, messages: &Messages) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let viewport = response.rect;
        painter.rect_filled(viewport, 8.0, Color32::from_gray(243));

        if self.image.is_none() {
            painter.text(
                viewport.center(),
                egui::Align2::CENTER_CENTER,
                messages.loading,
                egui::FontId::proportional(20.0),
                Color32::DARK_GRAY,
            );
            return;
        }

        // A timeout closes the session and is reported through `poll`.
        if self.observe_layout(viewport.size()).is_err() {
            return;
        }
        let Some(projection) = self.projection(viewport.size()) else {
            ui.ctx().request_repaint();
            return;
        };

        if self.texture.is_none() {
            if let Some(pixels) = self.canvas_pixels.take() {
                self.texture = Some(ui.ctx().load_texture("crop-editor", pixels, egui::TextureOptions::LINEAR));
            }
        }
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                projection.image_rect(viewport.min),
                Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        if !self.is_interactive() {
            // Re-check next frame until the layout settles.
            ui.ctx().request_repaint();
            return;
        }

        self.handle_pointer(ui.ctx(), viewport, &projection);
        self.draw_crop_box(&painter, viewport, &projection);
    }

    fn handle_pointer(&mut self, ctx: &egui::Context, viewport: Rect, projection: &DisplayProjection) {
        let (pointer, pressed, released) = ctx.input(|i| {
            (
                i.pointer.latest_pos(),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
            )
        });
        let Some(pointer) = pointer else { return };

        if self.gesture.is_none() {
            let hovered = viewport
                .contains(pointer)
                .then(|| self.hit_test(pointer, viewport.min, projection))
                .flatten();
            if let Some(kind) = hovered {
                ctx.set_cursor_icon(match kind {
                    GestureKind::Move => egui::CursorIcon::Move,
                    GestureKind::Resize(handle) => handle.cursor(),
                });
                if pressed {
                    self.pointer_down(pointer, kind);
                }
            }
        }

        // Tracked through the context rather than the viewport response so that
        // the gesture keeps following the pointer outside the image area.
        if let Some(gesture) = self.gesture {
            self.pointer_move(pointer, projection);
            ctx.set_cursor_icon(match gesture.kind {
                GestureKind::Move => egui::CursorIcon::Grabbing,
                GestureKind::Resize(handle) => handle.cursor(),
            });
            if released {
                self.pointer_up();
            }
        }
    }

    fn draw_crop_box(&self, painter: &egui::Painter, viewport: Rect, projection: &DisplayProjection) {
        let crop_box = projection.region_rect(viewport.min, &self.region);

        let top = Rect::from_min_max(viewport.min, egui::pos2(viewport.max.x, crop_box.min.y));
        let bottom = Rect::from_min_max(egui::pos2(viewport.min.x, crop_box.max.y), viewport.max);
        let left = Rect::from_min_max(
            egui::pos2(viewport.min.x, crop_box.min.y),
            egui::pos2(crop_box.min.x, crop_box.max.y),
        );
        let right = Rect::from_min_max(
            egui::pos2(crop_box.max.x, crop_box.min.y),
            egui::pos2(viewport.max.x, crop_box.max.y),
        );
        for mask in [top, bottom, left, right] {
            if mask.is_positive() {
                painter.rect_filled(mask, 0.0, MASK_COLOR);
            }
        }

        painter.rect_stroke(crop_box, 0.0, (2.0, BOX_COLOR), egui::StrokeKind::Inside);
        for handle in CropHandle::ALL {
            let rect = handle.handle_rect(crop_box);
            painter.rect_filled(rect, 0.0, BOX_COLOR);
            painter.rect_stroke(rect, 0.0, (1.0, Color32::WHITE), egui::StrokeKind::Inside);
        }
    }
}

/// Name given to an edited entry. Re-editing does not stack the prefix.
pub fn edited_name(id: &EntryId, name: &str) -> String {
    let prefix = format!("Edited_{id}_");
    if name.starts_with(&prefix) {
        name.to_string()
    } else {
        format!("{prefix}{name}")
    }
}

fn render_crop(
    image: &DynamicImage,
    region: &CropRegion,
    name: String,
    format: OutputFormat,
    quality: u8,
) -> Result<NewImage, EditorError> {
    let cropped = crop_region(image, region).ok_or_else(|| EditorError::Encode("empty crop region".into()))?;
    let bytes = encode_image(&cropped, format, quality).map_err(|err| EditorError::Encode(err.to_string()))?;
    Ok(NewImage {
        name,
        source: SourceBytes::new(bytes, format.mime()),
        width: cropped.width(),
        height: cropped.height(),
        preview: preview_image(&cropped),
    })
}
