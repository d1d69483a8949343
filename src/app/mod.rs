pub mod editor;
pub mod intake;
pub mod submission;

use std::{path::PathBuf, sync::Arc, time::Duration};

use eframe::{
    egui::{self, Color32},
    App, Frame,
};
use tracing::{debug, info, warn};

use crate::{
    collection::{EntryId, ImageCollection, ImageStatus, MAX_IMAGES},
    config::PortalConfig,
    error::{CollectionError, IntakeError, SubmitError},
    fs_utils::SUPPORTED_EXTENSIONS,
    i18n::Messages,
    previews::PreviewRegistry,
    services::{IdentityProvider, RemovalService, StorageService},
    ui::fit_within,
};

use self::{
    editor::{EditorCommand, EditorEvent, EditorPhase, EditorSession},
    intake::{image_drops, Intake, IntakeCandidate, IntakeEvent},
    submission::Submission,
};

const CARD_SIZE: egui::Vec2 = egui::vec2(200.0, 250.0);
const THUMBNAIL_SIZE: egui::Vec2 = egui::vec2(184.0, 160.0);
const ACCENT: Color32 = Color32::from_rgb(59, 130, 246);

/// External collaborators, injected so the app never constructs its own backends.
pub struct Services {
    pub removal: Arc<dyn RemovalService>,
    pub storage: Option<Arc<dyn StorageService>>,
    pub identity: Arc<dyn IdentityProvider>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    fn color(&self) -> Color32 {
        match self.kind {
            StatusKind::Success => Color32::from_rgb(22, 163, 74),
            StatusKind::Warning => Color32::from_rgb(217, 119, 6),
            StatusKind::Error => Color32::from_rgb(220, 38, 38),
        }
    }
}

pub struct CutoutApp {
    config: PortalConfig,
    messages: &'static Messages,
    collection: ImageCollection,
    previews: PreviewRegistry,
    intake: Intake,
    editor: EditorSession,
    submission: Submission,
    identity: Arc<dyn IdentityProvider>,
    status: Option<StatusMessage>,
    pending_delete: Option<EntryId>,
    clipboard: Option<arboard::Clipboard>,
}

impl CutoutApp {
    pub fn new(config: PortalConfig, services: Services) -> Self {
        let messages = config.locale.messages();
        let intake = Intake::new(config.parallel);
        let submission = Submission::new(services.removal, services.storage);
        let clipboard = arboard::Clipboard::new()
            .inspect_err(|err| warn!("clipboard unavailable: {err}"))
            .ok();

        let mut app = Self {
            messages,
            collection: ImageCollection::new(),
            previews: PreviewRegistry::new(),
            intake,
            editor: EditorSession::new(),
            submission,
            identity: services.identity,
            status: None,
            pending_delete: None,
            clipboard,
            config,
        };
        let initial = app.config.initial_files.clone();
        app.ingest_paths(&initial);
        app
    }

    pub fn collection(&self) -> &ImageCollection {
        &self.collection
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn editor(&self) -> &EditorSession {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorSession {
        &mut self.editor
    }

    pub fn pending_delete(&self) -> Option<&EntryId> {
        self.pending_delete.as_ref()
    }

    /// Work still running in the background: decodes, an editor save or batches.
    pub fn is_busy(&self) -> bool {
        self.intake.in_flight() > 0
            || self.editor.phase() == EditorPhase::Saving
            || self.submission.in_flight() > 0
    }

    fn notify(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            kind,
            text: text.into(),
        });
    }

    pub fn ingest_paths(&mut self, paths: &[PathBuf]) {
        let candidates = paths.iter().map(|p| IntakeCandidate::from_path(p)).collect();
        self.ingest(candidates);
    }

    pub fn ingest(&mut self, candidates: Vec<IntakeCandidate>) {
        match self.intake.ingest(candidates, self.collection.len()) {
            Ok(report) => {
                if report.over_quota > 0 {
                    self.notify(StatusKind::Warning, self.messages.dropped_over_limit(report.over_quota));
                }
                if let Some(IntakeError::NotAnImage { name, .. }) = report.rejected.first() {
                    self.notify(StatusKind::Warning, self.messages.skipped_not_image(name));
                }
            }
            Err(IntakeError::CapacityExceeded { max }) => {
                self.notify(StatusKind::Warning, self.messages.limit_reached(max));
            }
            Err(err) => self.notify(StatusKind::Error, err.to_string()),
        }
    }

    pub fn paste_from_clipboard(&mut self) {
        let Some(clipboard) = self.clipboard.as_mut() else { return };
        let image = match clipboard.get_image() {
            Ok(image) => image,
            Err(err) => {
                debug!("clipboard holds no image: {err}");
                return;
            }
        };
        let candidate = IntakeCandidate::from_clipboard_rgba(
            image.width as u32,
            image.height as u32,
            image.bytes.into_owned(),
        );
        match candidate {
            Some(candidate) => self.ingest(vec![candidate]),
            None => warn!("clipboard image could not be converted"),
        }
    }

    fn pick_files(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("images", SUPPORTED_EXTENSIONS)
            .pick_files();
        if let Some(paths) = picked {
            self.ingest_paths(&paths);
        }
    }

    /// Drains every background channel and applies the results to the collection.
    pub fn poll_workers(&mut self) {
        for event in self.intake.poll() {
            match event {
                IntakeEvent::Decoded(image) => {
                    if let Err(CollectionError::Full { max }) = self.collection.admit(image, &mut self.previews) {
                        self.notify(StatusKind::Warning, self.messages.limit_reached(max));
                    }
                }
                IntakeEvent::Failed(IntakeError::Decode { name, .. } | IntakeError::Read { name, .. }) => {
                    self.notify(StatusKind::Error, self.messages.decode_failed(&name));
                }
                IntakeEvent::Failed(err) => self.notify(StatusKind::Error, err.to_string()),
            }
        }

        for event in self.editor.poll() {
            match event {
                EditorEvent::Loaded => {}
                EditorEvent::Saved(saved) => {
                    let name = saved.image.name.clone();
                    match self.collection.replace(&saved.entry_id, saved.image, &mut self.previews) {
                        Ok(()) => self.notify(StatusKind::Success, self.messages.edit_saved(&name)),
                        Err(err) => {
                            warn!(id = %saved.entry_id, "edited entry vanished: {err}");
                            self.notify(StatusKind::Error, self.messages.edit_failed(&err.to_string()));
                        }
                    }
                }
                EditorEvent::LoadFailed(err) | EditorEvent::SaveFailed(err) => {
                    self.notify(StatusKind::Error, self.messages.edit_failed(&err.to_string()));
                }
            }
        }

        for report in self.submission.poll(&mut self.collection) {
            match report.outcome {
                Ok(()) => match report.upload_failures.first() {
                    Some(name) => self.notify(StatusKind::Warning, self.messages.upload_failed(name)),
                    None => self.notify(StatusKind::Success, self.messages.batch_done),
                },
                Err(err) => self.notify(StatusKind::Error, self.messages.batch_failed(&err.to_string())),
            }
        }
    }

    pub fn start_processing(&mut self) {
        match self.submission.submit(&mut self.collection) {
            Ok(ticket) => {
                self.notify(StatusKind::Success, self.messages.batch_started(ticket.entries.len()));
            }
            Err(SubmitError::NothingPending) => {
                self.notify(StatusKind::Warning, self.messages.nothing_pending);
            }
        }
    }

    pub fn open_editor(&mut self, id: &EntryId) {
        let Some(entry) = self.collection.get(id) else { return };
        if let Err(err) = self.editor.open(entry) {
            debug!("editor not opened: {err}");
        }
    }

    pub fn request_delete(&mut self, id: EntryId) {
        self.pending_delete = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn confirm_delete(&mut self) {
        let Some(id) = self.pending_delete.take() else { return };
        if self.editor.entry_id() == Some(&id) && self.editor.close().is_err() {
            self.notify(StatusKind::Warning, self.messages.saving);
            return;
        }
        match self.collection.remove(&id, &mut self.previews) {
            Ok(entry) => {
                info!(id = %entry.id, name = %entry.name, "image removed");
                self.notify(StatusKind::Success, self.messages.image_removed);
            }
            Err(err) => warn!("delete failed: {err}"),
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let (dropped, paste) = ctx.input(|i| {
            let paste = i.events.iter().any(|e| matches!(e, egui::Event::Paste(_)))
                || (i.key_pressed(egui::Key::V) && i.modifiers.command);
            (i.raw.dropped_files.clone(), paste)
        });
        if self.editor.is_open() || self.pending_delete.is_some() {
            return;
        }
        if !dropped.is_empty() {
            let candidates = image_drops(&dropped);
            if candidates.is_empty() {
                if let Some(file) = dropped.first() {
                    self.notify(StatusKind::Warning, self.messages.skipped_not_image(&file.name));
                }
            } else {
                self.ingest(candidates);
            }
        }
        if paste {
            self.paste_from_clipboard();
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(egui::RichText::new(self.messages.title).color(ACCENT).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match self.identity.current_user() {
                        Some(user) => {
                            if ui.button(self.messages.logout_button).clicked() {
                                if let Err(err) = self.identity.end_session() {
                                    self.notify(StatusKind::Error, err.to_string());
                                }
                            }
                            ui.label(self.messages.signed_in_as(&user.name));
                        }
                        None => {
                            for label in [self.messages.register_button, self.messages.login_button] {
                                ui.menu_button(label, |ui| {
                                    for provider in crate::services::AuthProvider::ALL {
                                        if ui.button(provider.label()).clicked() {
                                            if let Err(err) = self.identity.begin_sign_in(provider) {
                                                self.notify(StatusKind::Warning, err.to_string());
                                            }
                                            ui.close();
                                        }
                                    }
                                });
                            }
                        }
                    }
                });
            });
        });
    }

    fn banner(&mut self, ui: &mut egui::Ui) {
        let Some(status) = &self.status else { return };
        let color = status.color();
        let mut dismissed = false;
        egui::Frame::new()
            .fill(color.gamma_multiply(0.15))
            .stroke((1.0, color))
            .corner_radius(6.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(color, status.text.as_str());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        dismissed = ui.small_button("✕").clicked();
                    });
                });
            });
        if dismissed {
            self.status = None;
        }
        ui.add_space(8.0);
    }

    fn drop_zone(&mut self, ui: &mut egui::Ui, hovering: bool) {
        let stroke = if hovering { ACCENT } else { Color32::from_gray(190) };
        egui::Frame::new()
            .stroke((2.0, stroke))
            .corner_radius(12.0)
            .inner_margin(48.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    let button = egui::Button::new(
                        egui::RichText::new(self.messages.select_image).size(20.0).color(Color32::WHITE),
                    )
                    .fill(ACCENT)
                    .min_size(egui::vec2(220.0, 56.0));
                    if ui.add(button).clicked() {
                        self.pick_files();
                    }
                    ui.add_space(12.0);
                    ui.label(self.messages.drag_drop_hint);
                    ui.weak(self.messages.max_image_limit(MAX_IMAGES));
                });
            });
    }

    fn image_grid(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(format!("{} ({}/{MAX_IMAGES})", self.messages.selected_images, self.collection.len()));
        });
        ui.add_space(8.0);

        let mut crop = None;
        let mut delete = None;
        let mut add = false;
        let ctx = ui.ctx().clone();

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(12.0, 12.0);
            for entry in self.collection.entries() {
                ui.allocate_ui(CARD_SIZE, |ui| {
                    egui::Frame::group(ui.style()).corner_radius(8.0).show(ui, |ui| {
                        ui.set_width(THUMBNAIL_SIZE.x);
                        if let (Some(texture), Some(size)) = (
                            self.previews.texture(&ctx, entry.preview),
                            self.previews.size(entry.preview),
                        ) {
                            let size = fit_within(size, THUMBNAIL_SIZE);
                            ui.vertical_centered(|ui| {
                                ui.add(egui::Image::new(egui::load::SizedTexture::new(texture, size)));
                            });
                        }
                        ui.add(egui::Label::new(entry.name.as_str()).truncate());
                        ui.horizontal(|ui| {
                            let badge = match entry.status {
                                ImageStatus::Pending => Color32::from_gray(120),
                                ImageStatus::Processing => Color32::from_rgb(217, 119, 6),
                                ImageStatus::Done => Color32::from_rgb(22, 163, 74),
                            };
                            ui.label(egui::RichText::new(self.messages.status(entry.status)).color(badge).small());
                            ui.weak(format!("{}×{} px", entry.width, entry.height));
                        });
                        if entry.status != ImageStatus::Processing {
                            ui.horizontal(|ui| {
                                if ui.button(self.messages.crop_button).clicked() {
                                    crop = Some(entry.id.clone());
                                }
                                if ui.button(self.messages.delete_button).clicked() {
                                    delete = Some(entry.id.clone());
                                }
                            });
                        }
                    });
                });
            }
            if self.collection.remaining_capacity() > 0 {
                let tile = egui::Button::new(format!("+\n{}", self.messages.add_images))
                    .min_size(egui::vec2(THUMBNAIL_SIZE.x, CARD_SIZE.y * 0.8));
                add = ui.add(tile).clicked();
            }
        });

        if let Some(id) = crop {
            self.open_editor(&id);
        }
        if let Some(id) = delete {
            self.request_delete(id);
        }
        if add {
            self.pick_files();
        }

        ui.add_space(16.0);
        ui.vertical_centered(|ui| {
            let processing = self.submission.in_flight() > 0;
            let label = if processing {
                self.messages.is_processing
            } else {
                self.messages.start_processing
            };
            let button = egui::Button::new(egui::RichText::new(label).size(18.0).color(Color32::WHITE))
                .fill(ACCENT)
                .min_size(egui::vec2(200.0, 48.0));
            if ui.add_enabled(self.collection.pending_count() > 0, button).clicked() {
                self.start_processing();
            }
        });
    }

    fn delete_dialog(&mut self, ctx: &egui::Context) {
        let Some(id) = self.pending_delete.clone() else { return };
        let name = self.collection.get(&id).map(|e| e.name.clone()).unwrap_or_default();
        let mut choice = None;
        let response = egui::Modal::new(egui::Id::new("confirm-delete")).show(ctx, |ui| {
            ui.set_width(360.0);
            ui.heading(self.messages.confirm_delete_title);
            ui.add_space(8.0);
            ui.label(self.messages.confirm_delete_message(&name));
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.button(self.messages.cancel_button).clicked() {
                    choice = Some(false);
                }
                let confirm = egui::Button::new(
                    egui::RichText::new(self.messages.confirm_button).color(Color32::WHITE),
                )
                .fill(Color32::from_rgb(220, 38, 38));
                if ui.add(confirm).clicked() {
                    choice = Some(true);
                }
            });
        });
        if response.should_close() && choice.is_none() {
            choice = Some(false);
        }
        match choice {
            Some(true) => self.confirm_delete(),
            Some(false) => self.cancel_delete(),
            None => {}
        }
    }

    fn editor_modal(&mut self, ctx: &egui::Context) {
        match self.editor.show(ctx, self.messages) {
            Some(EditorCommand::Save) => {
                if let Err(err) = self.editor.begin_save(self.config.edit_format, self.config.quality) {
                    debug!("save ignored: {err}");
                }
            }
            Some(EditorCommand::Cancel) => {
                if let Err(err) = self.editor.close() {
                    debug!("close ignored: {err}");
                }
            }
            None => {}
        }
    }
}

impl App for CutoutApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut Frame) {
        let _ = frame;

        self.poll_workers();
        self.handle_input(ctx);

        self.top_bar(ctx);
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading(egui::RichText::new(self.messages.headline).size(32.0).strong());
                    ui.label(self.messages.description);
                });
                ui.add_space(16.0);
                self.banner(ui);
                if self.collection.is_empty() {
                    self.drop_zone(ui, hovering);
                } else {
                    self.image_grid(ui);
                }
            });
        });

        self.delete_dialog(ctx);
        self.editor_modal(ctx);

        if self.editor.is_open() {
            ctx.request_repaint();
        } else if self.is_busy() || self.collection.has_active_work() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl Drop for CutoutApp {
    fn drop(&mut self) {
        let revoked = self.collection.clear(&mut self.previews);
        debug!(revoked, live = self.previews.live_count(), "released previews");
    }
}
