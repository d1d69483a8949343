use eframe::egui::{self, CursorIcon, Rect, Vec2};

/// Inset applied to every edge of a freshly opened crop region, in natural pixels.
pub const INITIAL_MARGIN: f32 = 30.0;
/// Smallest crop box the user can produce, in display pixels.
pub const MIN_CROP_SIZE: f32 = 50.0;

pub const CORNER_HANDLE_SIZE: f32 = 20.0;
pub const EDGE_HANDLE_LENGTH: f32 = 40.0;

/// Crop rectangle in the image's natural pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full(bounds: Vec2) -> Self {
        Self::new(0.0, 0.0, bounds.x, bounds.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Moves the region by `delta` without changing its size, keeping it inside `bounds`.
    pub fn dragged(self, delta: Vec2, bounds: Vec2) -> Self {
        let max_x = (bounds.x - self.width).max(0.0);
        let max_y = (bounds.y - self.height).max(0.0);
        Self {
            x: (self.x + delta.x).min(max_x).max(0.0),
            y: (self.y + delta.y).min(max_y).max(0.0),
            ..self
        }
    }

    /// Moves the edges attached to `handle` by `delta`.
    ///
    /// The opposite edges stay put. A moved edge never comes closer than `min_size`
    /// to its fixed counterpart and never leaves `bounds`.
    pub fn resized(self, handle: CropHandle, delta: Vec2, bounds: Vec2, min_size: f32) -> Self {
        let min_w = min_size.min(bounds.x);
        let min_h = min_size.min(bounds.y);
        let mut next = self;
        match handle {
            CropHandle::N => next.move_top(self, delta.y, min_h),
            CropHandle::S => next.move_bottom(self, delta.y, bounds.y, min_h),
            CropHandle::W => next.move_left(self, delta.x, min_w),
            CropHandle::E => next.move_right(self, delta.x, bounds.x, min_w),
            CropHandle::NE => {
                next.move_top(self, delta.y, min_h);
                next.move_right(self, delta.x, bounds.x, min_w);
            }
            CropHandle::NW => {
                next.move_left(self, delta.x, min_w);
                next.move_top(self, delta.y, min_h);
            }
            CropHandle::SE => {
                next.move_right(self, delta.x, bounds.x, min_w);
                next.move_bottom(self, delta.y, bounds.y, min_h);
            }
            CropHandle::SW => {
                next.move_left(self, delta.x, min_w);
                next.move_bottom(self, delta.y, bounds.y, min_h);
            }
        }
        next
    }

    // y in [0, bottom - min]
    fn move_top(&mut self, start: Self, dy: f32, min_h: f32) {
        let bottom = start.bottom();
        self.y = (start.y + dy).min(bottom - min_h).max(0.0);
        self.height = bottom - self.y;
    }

    // height in [min, bounds - y]
    fn move_bottom(&mut self, start: Self, dy: f32, bound: f32, min_h: f32) {
        self.height = (start.height + dy).max(min_h).min(bound - start.y);
    }

    // x in [0, right - min]
    fn move_left(&mut self, start: Self, dx: f32, min_w: f32) {
        let right = start.right();
        self.x = (start.x + dx).min(right - min_w).max(0.0);
        self.width = right - self.x;
    }

    // width in [min, bounds - x]
    fn move_right(&mut self, start: Self, dx: f32, bound: f32, min_w: f32) {
        self.width = (start.width + dx).max(min_w).min(bound - start.x);
    }

    /// Integer pixel box of exactly `round(width) x round(height)`, shifted back inside
    /// the image if rounding pushed it past an edge.
    pub fn to_pixel_bounds(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        if image_width == 0 || image_height == 0 {
            return None;
        }
        let width = (self.width.round().max(1.0) as u32).min(image_width);
        let height = (self.height.round().max(1.0) as u32).min(image_height);
        let x = (self.x.max(0.0).round() as u32).min(image_width - width);
        let y = (self.y.max(0.0).round() as u32).min(image_height - height);
        Some((x, y, width, height))
    }
}

/// Initial region for an image: every edge inset by [`INITIAL_MARGIN`], or the whole
/// image when it is too small for the inset.
pub fn default_region(natural_width: f32, natural_height: f32) -> CropRegion {
    let width = natural_width - 2.0 * INITIAL_MARGIN;
    let height = natural_height - 2.0 * INITIAL_MARGIN;
    if width <= 0.0 || height <= 0.0 {
        return CropRegion::new(0.0, 0.0, natural_width, natural_height);
    }
    CropRegion::new(INITIAL_MARGIN, INITIAL_MARGIN, width, height)
}

/// Converts the display-space minimum into natural pixels for the current scale.
pub fn min_size_for_scale(scale: f32) -> f32 {
    if scale > 0.0 {
        MIN_CROP_SIZE / scale
    } else {
        MIN_CROP_SIZE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CropHandle {
    N,
    S,
    W,
    E,
    NE,
    NW,
    SE,
    SW,
}

impl CropHandle {
    /// Corners first so they win hit tests where they overlap an edge handle.
    pub const ALL: [Self; 8] = [
        Self::NW, Self::NE, Self::SW, Self::SE,
        Self::N, Self::S, Self::W, Self::E,
    ];

    pub fn cursor(self) -> CursorIcon {
        match self {
            Self::N | Self::S => CursorIcon::ResizeVertical,
            Self::W | Self::E => CursorIcon::ResizeHorizontal,
            Self::NW | Self::SE => CursorIcon::ResizeNwSe,
            Self::NE | Self::SW => CursorIcon::ResizeNeSw,
        }
    }

    /// Hit/draw rectangle for this handle around a crop box given in display space.
    pub fn handle_rect(self, crop_box: Rect) -> Rect {
        let corner = egui::vec2(CORNER_HANDLE_SIZE, CORNER_HANDLE_SIZE);
        let horizontal = egui::vec2(EDGE_HANDLE_LENGTH, CORNER_HANDLE_SIZE);
        let vertical = egui::vec2(CORNER_HANDLE_SIZE, EDGE_HANDLE_LENGTH);
        match self {
            Self::N => Rect::from_center_size(crop_box.center_top(), horizontal),
            Self::S => Rect::from_center_size(crop_box.center_bottom(), horizontal),
            Self::W => Rect::from_center_size(crop_box.left_center(), vertical),
            Self::E => Rect::from_center_size(crop_box.right_center(), vertical),
            Self::NW => Rect::from_center_size(crop_box.left_top(), corner),
            Self::NE => Rect::from_center_size(crop_box.right_top(), corner),
            Self::SW => Rect::from_center_size(crop_box.left_bottom(), corner),
            Self::SE => Rect::from_center_size(crop_box.right_bottom(), corner),
        }
    }
}
