use std::{path::PathBuf, time::Duration};

use crate::{i18n::Locale, image_utils::OutputFormat};

pub const DEFAULT_REMOVAL_DELAY: Duration = Duration::from_millis(3000);

/// Settings resolved by the binary and handed to the app at construction.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub initial_files: Vec<PathBuf>,
    pub parallel: usize,
    pub edit_format: OutputFormat,
    pub quality: u8,
    pub locale: Locale,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            initial_files: Vec::new(),
            parallel: 4,
            edit_format: OutputFormat::Png,
            quality: 90,
            locale: Locale::default(),
        }
    }
}
