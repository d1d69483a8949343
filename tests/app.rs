use std::sync::Arc;
use std::time::Duration;

use cutout::app::intake::IntakeCandidate;
use cutout::app::{CutoutApp, Services, StatusKind};
use cutout::collection::{ImageStatus, MAX_IMAGES};
use cutout::config::PortalConfig;
use cutout::image_utils::OutputFormat;
use cutout::ui::MAX_LAYOUT_ATTEMPTS;
use eframe::egui;
use cutout::services::{OfflineIdentity, SimulatedRemoval};
use tempfile::tempdir;

mod common;
use common::{png_bytes, solid_image, wait_until, write_image};

fn services() -> Services {
    Services {
        removal: Arc::new(SimulatedRemoval::new(Duration::from_millis(20))),
        storage: None,
        identity: Arc::new(OfflineIdentity),
    }
}

fn settle(app: &mut CutoutApp, mut check: impl FnMut(&CutoutApp) -> bool) -> bool {
    wait_until(Duration::from_secs(5), || {
        app.poll_workers();
        check(app)
    })
}

#[test]
fn start_up_files_are_ingested() {
    let tmp = tempdir().unwrap();
    let mut files = Vec::new();
    for i in 0..3 {
        let path = tmp.path().join(format!("{i}.png"));
        write_image(&path, &solid_image(20, 10, [i as u8, 0, 0, 255]));
        files.push(path);
    }
    let config = PortalConfig {
        initial_files: files,
        ..Default::default()
    };
    let mut app = CutoutApp::new(config, services());
    assert!(settle(&mut app, |app| app.collection().len() == 3));
    assert!(app.collection().entries().iter().all(|e| e.status == ImageStatus::Pending));
    assert_eq!(app.previews().live_count(), 3);
}

#[test]
fn quota_holds_across_batches() {
    let mut app = CutoutApp::new(PortalConfig::default(), services());
    for batch in 0..3 {
        let candidates = (0..5)
            .map(|i| IntakeCandidate::from_bytes(format!("{batch}-{i}.png"), "image/png", png_bytes(4, 4)))
            .collect();
        app.ingest(candidates);
    }
    assert_eq!(app.status().map(|s| s.kind), Some(StatusKind::Warning));
    assert!(settle(&mut app, |app| !app.is_busy()));
    assert_eq!(app.collection().len(), MAX_IMAGES);
    assert_eq!(app.previews().allocated(), MAX_IMAGES);
}

#[test]
fn delete_requires_confirmation() {
    let mut app = CutoutApp::new(PortalConfig::default(), services());
    app.ingest(vec![IntakeCandidate::from_bytes("a.png", "image/png", png_bytes(4, 4))]);
    assert!(settle(&mut app, |app| app.collection().len() == 1));
    let id = app.collection().entries()[0].id.clone();

    app.request_delete(id.clone());
    app.cancel_delete();
    assert_eq!(app.collection().len(), 1);

    app.request_delete(id.clone());
    assert_eq!(app.pending_delete(), Some(&id));
    app.confirm_delete();
    assert!(app.collection().is_empty());
    assert_eq!(app.previews().live_count(), 0);
    assert_eq!(app.status().map(|s| s.kind), Some(StatusKind::Success));
}

#[test]
fn processing_runs_through_to_done() {
    let mut app = CutoutApp::new(PortalConfig::default(), services());
    app.start_processing();
    assert_eq!(app.status().map(|s| s.kind), Some(StatusKind::Warning));

    let candidates = (0..3)
        .map(|i| IntakeCandidate::from_bytes(format!("{i}.png"), "image/png", png_bytes(4, 4)))
        .collect();
    app.ingest(candidates);
    assert!(settle(&mut app, |app| app.collection().len() == 3));

    app.start_processing();
    assert_eq!(app.collection().count_with(ImageStatus::Processing), 3);
    assert!(settle(&mut app, |app| app.collection().count_with(ImageStatus::Done) == 3));
    assert!(!app.is_busy());
}

fn app_with_open_editor() -> CutoutApp {
    let mut app = CutoutApp::new(PortalConfig::default(), services());
    app.ingest(vec![IntakeCandidate::from_bytes("a.png", "image/png", png_bytes(80, 60))]);
    assert!(settle(&mut app, |app| app.collection().len() == 1));
    let id = app.collection().entries()[0].id.clone();
    app.open_editor(&id);
    assert!(settle(&mut app, |app| app.editor().natural_size().is_some()));
    app
}

#[test]
fn editor_save_counts_as_background_work() {
    let mut app = app_with_open_editor();
    let viewport = egui::vec2(400.0, 300.0);
    app.editor_mut().observe_layout(viewport).unwrap();
    app.editor_mut().observe_layout(viewport).unwrap();
    app.editor_mut().begin_save(OutputFormat::Png, 90).unwrap();
    assert!(app.is_busy());

    assert!(settle(&mut app, |app| !app.is_busy()));
    assert!(!app.editor().is_open());
    assert!(app.collection().entries()[0].name.starts_with("Edited_"));
    assert_eq!(app.status().map(|s| s.kind), Some(StatusKind::Success));
}

#[test]
fn editor_layout_timeout_reaches_the_banner() {
    let mut app = app_with_open_editor();
    for _ in 0..MAX_LAYOUT_ATTEMPTS {
        let _ = app.editor_mut().observe_layout(egui::Vec2::ZERO);
    }
    assert!(!app.editor().is_open());
    app.poll_workers();
    assert_eq!(app.status().map(|s| s.kind), Some(StatusKind::Error));
}
