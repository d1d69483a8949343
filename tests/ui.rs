use cutout::crop::CropRegion;
use cutout::ui::{fit_within, DisplayProjection, LayoutGate, LayoutStatus, MAX_LAYOUT_ATTEMPTS};
use eframe::egui;

#[test]
fn projection_letterboxes_wide_image() {
    let projection = DisplayProjection::compute(egui::vec2(1000.0, 500.0), egui::vec2(400.0, 400.0)).unwrap();
    assert_eq!(projection.render_size, egui::vec2(400.0, 200.0));
    assert_eq!(projection.offset, egui::vec2(0.0, 100.0));
    assert!((projection.scale - 0.4).abs() < 1e-6);
}

#[test]
fn projection_pillarboxes_tall_image() {
    let projection = DisplayProjection::compute(egui::vec2(300.0, 600.0), egui::vec2(400.0, 300.0)).unwrap();
    assert_eq!(projection.render_size, egui::vec2(150.0, 300.0));
    assert_eq!(projection.offset, egui::vec2(125.0, 0.0));
    assert!((projection.scale - 0.5).abs() < 1e-6);
}

#[test]
fn projection_rejects_zero_sizes() {
    assert!(DisplayProjection::compute(egui::vec2(100.0, 100.0), egui::vec2(0.0, 300.0)).is_none());
    assert!(DisplayProjection::compute(egui::vec2(0.0, 100.0), egui::vec2(300.0, 300.0)).is_none());
}

#[test]
fn natural_and_display_coordinates_round_trip() {
    let projection = DisplayProjection::compute(egui::vec2(1000.0, 500.0), egui::vec2(400.0, 400.0)).unwrap();
    let origin = egui::pos2(20.0, 10.0);
    let display = projection.natural_to_display(origin, egui::pos2(500.0, 250.0));
    assert_eq!(display, egui::pos2(220.0, 210.0));
    let natural = projection.display_to_natural(origin, display);
    assert!((natural.x - 500.0).abs() < 1e-3 && (natural.y - 250.0).abs() < 1e-3);

    let rect = projection.region_rect(origin, &CropRegion::new(0.0, 0.0, 1000.0, 500.0));
    assert_eq!(rect, projection.image_rect(origin));
    let delta = projection.delta_to_natural(egui::vec2(4.0, -2.0));
    assert!((delta - egui::vec2(10.0, -5.0)).length() < 1e-3);
}

#[test]
fn fit_within_preserves_aspect() {
    let size = fit_within(egui::vec2(400.0, 200.0), egui::vec2(100.0, 100.0));
    assert_eq!(size, egui::vec2(100.0, 50.0));
}

#[test]
fn layout_gate_needs_two_equal_frames() {
    let mut gate = LayoutGate::new();
    let size = egui::vec2(800.0, 600.0);
    assert_eq!(gate.observe(size), LayoutStatus::Settling);
    assert!(!gate.is_stable());
    assert_eq!(gate.observe(size), LayoutStatus::Stable(size));
    assert!(gate.is_stable());

    // A resize suspends stability until the new size repeats.
    let resized = egui::vec2(900.0, 600.0);
    assert_eq!(gate.observe(resized), LayoutStatus::Settling);
    assert!(!gate.is_stable());
    assert_eq!(gate.observe(resized), LayoutStatus::Stable(resized));
}

#[test]
fn layout_gate_times_out_on_zero_size() {
    let mut gate = LayoutGate::new();
    for _ in 1..MAX_LAYOUT_ATTEMPTS {
        assert_eq!(gate.observe(egui::Vec2::ZERO), LayoutStatus::Settling);
    }
    assert_eq!(gate.observe(egui::Vec2::ZERO), LayoutStatus::TimedOut);

    gate.reset();
    for _ in 0..MAX_LAYOUT_ATTEMPTS - 1 {
        gate.observe(egui::Vec2::ZERO);
    }
    // A real size resets the count.
    gate.observe(egui::vec2(10.0, 10.0));
    assert_eq!(gate.observe(egui::Vec2::ZERO), LayoutStatus::Settling);
}
