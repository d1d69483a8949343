//! Process-local preview resources.
//!
//! Every image shown on screen is referenced through a [`PreviewHandle`]. A handle owns
//! decoded preview pixels and, once drawn, a GPU texture. Neither is released until the
//! handle is revoked, so each handle must be revoked exactly once by its owner.

use std::collections::{HashMap, HashSet};
use std::fmt;

use eframe::egui;
use tracing::{debug, error};

use crate::error::PreviewError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewHandle(u64);

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview-{}", self.0)
    }
}

struct PreviewResource {
    pixels: Option<egui::ColorImage>,
    size: [usize; 2],
    texture: Option<egui::TextureHandle>,
}

#[derive(Default)]
pub struct PreviewRegistry {
    next_id: u64,
    live: HashMap<PreviewHandle, PreviewResource>,
    revoked_handles: HashSet<PreviewHandle>,
    allocated: usize,
    revoked: usize,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers preview pixels and returns a fresh handle. Every call yields a new handle.
    pub fn allocate(&mut self, pixels: egui::ColorImage) -> PreviewHandle {
        let handle = PreviewHandle(self.next_id);
        self.next_id += 1;
        self.allocated += 1;
        let size = pixels.size;
        self.live.insert(
            handle,
            PreviewResource {
                pixels: Some(pixels),
                size,
                texture: None,
            },
        );
        debug!(%handle, width = size[0], height = size[1], "allocated preview");
        handle
    }

    pub fn revoke(&mut self, handle: PreviewHandle) -> Result<(), PreviewError> {
        if self.live.remove(&handle).is_some() {
            self.revoked += 1;
            self.revoked_handles.insert(handle);
            debug!(%handle, "revoked preview");
            return Ok(());
        }
        let err = if self.revoked_handles.contains(&handle) {
            PreviewError::AlreadyRevoked(handle)
        } else {
            PreviewError::Unknown(handle)
        };
        error!("{err}");
        Err(err)
    }

    pub fn is_live(&self, handle: PreviewHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn size(&self, handle: PreviewHandle) -> Option<egui::Vec2> {
        self.live
            .get(&handle)
            .map(|res| egui::vec2(res.size[0] as f32, res.size[1] as f32))
    }

    /// Texture for rendering, uploaded on first use. `None` once the handle is revoked.
    pub fn texture(&mut self, ctx: &egui::Context, handle: PreviewHandle) -> Option<egui::TextureId> {
        let resource = self.live.get_mut(&handle)?;
        if resource.texture.is_none() {
            let pixels = resource.pixels.take()?;
            resource.texture = Some(ctx.load_texture(
                handle.to_string(),
                pixels,
                egui::TextureOptions::LINEAR,
            ));
        }
        resource.texture.as_ref().map(|t| t.id())
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn revoked(&self) -> usize {
        self.revoked
    }
}
