pub mod app;
pub mod collection;
pub mod config;
pub mod crop;
pub mod error;
pub mod fs_utils;
pub mod i18n;
pub mod image_utils;
pub mod previews;
pub mod services;
pub mod ui;
