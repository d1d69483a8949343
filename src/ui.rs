use eframe::egui::{self, Pos2, Rect, Vec2};

use crate::crop::CropRegion;

/// Consecutive zero-size frames tolerated before the editor gives up on its viewport.
pub const MAX_LAYOUT_ATTEMPTS: u32 = 120;

/// "Contain" fit of an image inside a viewport, recomputed every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayProjection {
    pub render_size: Vec2,
    pub offset: Vec2,
    pub scale: f32,
    pub natural_size: Vec2,
}

impl DisplayProjection {
    pub fn compute(natural_size: Vec2, viewport: Vec2) -> Option<Self> {
        if natural_size.x <= 0.0 || natural_size.y <= 0.0 || viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let natural_aspect = natural_size.x / natural_size.y;
        let viewport_aspect = viewport.x / viewport.y;
        let (render_size, offset) = if natural_aspect > viewport_aspect {
            let height = viewport.x / natural_aspect;
            (
                egui::vec2(viewport.x, height),
                egui::vec2(0.0, (viewport.y - height) / 2.0),
            )
        } else {
            let width = viewport.y * natural_aspect;
            (
                egui::vec2(width, viewport.y),
                egui::vec2((viewport.x - width) / 2.0, 0.0),
            )
        };
        Some(Self {
            render_size,
            offset,
            scale: render_size.x / natural_size.x,
            natural_size,
        })
    }

    /// Screen rectangle the image occupies when the viewport starts at `origin`.
    pub fn image_rect(&self, origin: Pos2) -> Rect {
        Rect::from_min_size(origin + self.offset, self.render_size)
    }

    pub fn display_to_natural(&self, origin: Pos2, pos: Pos2) -> Pos2 {
        let rel = pos - (origin + self.offset);
        egui::pos2(rel.x / self.scale, rel.y / self.scale)
    }

    pub fn natural_to_display(&self, origin: Pos2, pos: Pos2) -> Pos2 {
        origin + self.offset + egui::vec2(pos.x * self.scale, pos.y * self.scale)
    }

    /// Converts a pointer delta in display pixels to natural pixels.
    pub fn delta_to_natural(&self, delta: Vec2) -> Vec2 {
        delta / self.scale
    }

    pub fn region_rect(&self, origin: Pos2, region: &CropRegion) -> Rect {
        let min = self.natural_to_display(origin, egui::pos2(region.x, region.y));
        let max = self.natural_to_display(origin, egui::pos2(region.right(), region.bottom()));
        Rect::from_min_max(min, max)
    }
}

/// Fits a thumbnail into a square card without upscaling beyond the card size.
pub fn fit_within(image_size: Vec2, available: Vec2) -> Vec2 {
    let safe = egui::vec2(image_size.x.max(1.0), image_size.y.max(1.0));
    let scale = (available.x / safe.x).min(available.y / safe.y);
    safe * scale
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayoutStatus {
    Settling,
    Stable(Vec2),
    TimedOut,
}

/// Tracks whether the editor viewport has a usable size.
///
/// A size counts as stable once it is non-zero and unchanged across two frames;
/// any change (a window resize) drops back to settling.
#[derive(Clone, Debug, Default)]
pub struct LayoutGate {
    last: Option<Vec2>,
    stable: bool,
    empty_frames: u32,
}

impl LayoutGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn observe(&mut self, size: Vec2) -> LayoutStatus {
        if size.x <= 0.0 || size.y <= 0.0 {
            self.last = None;
            self.stable = false;
            self.empty_frames += 1;
            if self.empty_frames >= MAX_LAYOUT_ATTEMPTS {
                return LayoutStatus::TimedOut;
            }
            return LayoutStatus::Settling;
        }
        self.empty_frames = 0;
        if self.last == Some(size) {
            self.stable = true;
            LayoutStatus::Stable(size)
        } else {
            self.last = Some(size);
            self.stable = false;
            LayoutStatus::Settling
        }
    }
}
