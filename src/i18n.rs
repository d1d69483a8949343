//! Localized UI strings.
//!
//! Each supported locale has one static [`Messages`] table. Status text is only ever
//! obtained through [`Messages::status`], never by comparing display strings.

use std::env;

use crate::collection::ImageStatus;

/// English is the fallback: egui's bundled fonts carry no CJK glyphs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Locale {
    #[value(name = "zh-cn")]
    ZhCn,
    #[default]
    En,
}

impl Locale {
    /// Best-effort match of a language tag such as `en_US.UTF-8` or `zh-CN`.
    pub fn detect(tag: &str) -> Option<Self> {
        let tag = tag
            .split('.')
            .next()
            .unwrap_or_default()
            .replace('_', "-")
            .to_ascii_lowercase();
        match tag.as_str() {
            "zh-cn" | "zh-sg" | "zh-hans" => Some(Locale::ZhCn),
            "en" => Some(Locale::En),
            _ => match tag.split('-').next() {
                Some("zh") => Some(Locale::ZhCn),
                Some("en") => Some(Locale::En),
                _ => None,
            },
        }
    }

    /// Reads the usual POSIX locale variables, falling back to the default locale.
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .filter(|value| !value.is_empty())
            .find_map(|value| Self::detect(&value))
            .unwrap_or_default()
    }

    pub fn messages(self) -> &'static Messages {
        match self {
            Locale::ZhCn => &ZH_CN,
            Locale::En => &EN,
        }
    }
}

pub struct Messages {
    pub locale: Locale,
    pub title: &'static str,
    pub headline: &'static str,
    pub description: &'static str,
    pub login_button: &'static str,
    pub register_button: &'static str,
    pub logout_button: &'static str,
    pub select_image: &'static str,
    pub selected_images: &'static str,
    pub drag_drop_hint: &'static str,
    pub add_images: &'static str,
    pub start_processing: &'static str,
    pub is_processing: &'static str,
    pub confirm_delete_title: &'static str,
    pub cancel_button: &'static str,
    pub confirm_button: &'static str,
    pub crop_button: &'static str,
    pub delete_button: &'static str,
    pub editor_title: &'static str,
    pub reset_button: &'static str,
    pub reset_description: &'static str,
    pub saving: &'static str,
    pub save_button: &'static str,
    pub loading: &'static str,
    pub nothing_pending: &'static str,
    pub batch_done: &'static str,
    pub image_removed: &'static str,
    pub status_pending: &'static str,
    pub status_processing: &'static str,
    pub status_done: &'static str,
}

impl Messages {
    pub fn status(&self, status: ImageStatus) -> &'static str {
        match status {
            ImageStatus::Pending => self.status_pending,
            ImageStatus::Processing => self.status_processing,
            ImageStatus::Done => self.status_done,
        }
    }

    pub fn max_image_limit(&self, max: usize) -> String {
        match self.locale {
            Locale::ZhCn => format!("一次最多 {max} 张图片。"),
            Locale::En => format!("Maximum {max} images allowed at once."),
        }
    }

    pub fn limit_reached(&self, max: usize) -> String {
        match self.locale {
            Locale::ZhCn => format!("已达到 {max} 张图片上限，无法继续添加。"),
            Locale::En => format!("The limit of {max} images has been reached."),
        }
    }

    pub fn skipped_not_image(&self, name: &str) -> String {
        match self.locale {
            Locale::ZhCn => format!("文件 {name} 不是图片类型，已跳过。"),
            Locale::En => format!("{name} is not an image and was skipped."),
        }
    }

    pub fn decode_failed(&self, name: &str) -> String {
        match self.locale {
            Locale::ZhCn => format!("图片 {name} 格式错误或加载失败。"),
            Locale::En => format!("{name} could not be loaded."),
        }
    }

    pub fn dropped_over_limit(&self, count: usize) -> String {
        match self.locale {
            Locale::ZhCn => format!("超出上限，{count} 张图片未添加。"),
            Locale::En => format!("{count} image(s) were not added because of the limit."),
        }
    }

    pub fn confirm_delete_message(&self, name: &str) -> String {
        match self.locale {
            Locale::ZhCn => format!("您确定要删除图片 {name} 吗？此操作不可撤销。"),
            Locale::En => format!("Are you sure you want to delete {name}? This action cannot be undone."),
        }
    }

    pub fn batch_started(&self, count: usize) -> String {
        match self.locale {
            Locale::ZhCn => format!("开始 {count} 个抠图任务..."),
            Locale::En => format!("Started {count} background removal task(s)..."),
        }
    }

    pub fn batch_failed(&self, reason: &str) -> String {
        match self.locale {
            Locale::ZhCn => format!("抠图任务失败：{reason}"),
            Locale::En => format!("Background removal failed: {reason}"),
        }
    }

    pub fn upload_failed(&self, name: &str) -> String {
        match self.locale {
            Locale::ZhCn => format!("图片 {name} 上传失败，仅保留在本地。"),
            Locale::En => format!("{name} could not be uploaded and stays local only."),
        }
    }

    pub fn editor_heading(&self, name: &str) -> String {
        match self.locale {
            Locale::ZhCn => format!("{}：{name}", self.editor_title),
            Locale::En => format!("{}: {name}", self.editor_title),
        }
    }

    pub fn edit_saved(&self, name: &str) -> String {
        match self.locale {
            Locale::ZhCn => format!("图片 {name} 已编辑并保存。"),
            Locale::En => format!("{name} was edited and saved."),
        }
    }

    pub fn edit_failed(&self, reason: &str) -> String {
        match self.locale {
            Locale::ZhCn => format!("保存失败，无法创建新的图片文件：{reason}"),
            Locale::En => format!("Saving failed, the new image could not be created: {reason}"),
        }
    }

    pub fn signed_in_as(&self, name: &str) -> String {
        match self.locale {
            Locale::ZhCn => format!("已登录：{name}"),
            Locale::En => format!("Signed in as {name}"),
        }
    }
}

static ZH_CN: Messages = Messages {
    locale: Locale::ZhCn,
    title: "抠图快手",
    headline: "全自动智能抠图",
    description: "在线抠图，支持所有场景的图片抠图，全程自动3秒即可抠好一张图。",
    login_button: "登录",
    register_button: "注册",
    logout_button: "退出登录",
    select_image: "选择图片",
    selected_images: "已选图片",
    drag_drop_hint: "Ctrl+V 粘贴图片，或者把图片拖拽到这里！",
    add_images: "添加图片",
    start_processing: "开始抠图",
    is_processing: "任务处理中...",
    confirm_delete_title: "确认删除",
    cancel_button: "取消",
    confirm_button: "确定删除",
    crop_button: "裁剪图片",
    delete_button: "删除图片",
    editor_title: "图片裁剪",
    reset_button: "重置",
    reset_description: "重置裁剪区域 (恢复初始边距)",
    saving: "保存中...",
    save_button: "保存",
    loading: "加载中...",
    nothing_pending: "没有可开始抠图的任务。",
    batch_done: "所有抠图任务已完成！",
    image_removed: "图片已从列表中移除。",
    status_pending: "待抠图",
    status_processing: "抠图中",
    status_done: "抠图完毕",
};

static EN: Messages = Messages {
    locale: Locale::En,
    title: "Remove bg Fast",
    headline: "Start Your Batch Processing Journey",
    description: "Online background removal for every kind of picture, fully automatic and fast.",
    login_button: "Log in",
    register_button: "Sign up",
    logout_button: "Log out",
    select_image: "Select Images",
    selected_images: "Selected Images",
    drag_drop_hint: "Paste images with Ctrl+V or drag and drop them here!",
    add_images: "Add Images",
    start_processing: "Start Processing",
    is_processing: "Processing...",
    confirm_delete_title: "Confirm Deletion",
    cancel_button: "Cancel",
    confirm_button: "Confirm Delete",
    crop_button: "Crop Image",
    delete_button: "Delete Image",
    editor_title: "Crop Image",
    reset_button: "Reset",
    reset_description: "Reset crop area (restore initial margins)",
    saving: "Saving...",
    save_button: "Save",
    loading: "Loading...",
    nothing_pending: "There are no pending images to process.",
    batch_done: "All background removal tasks are complete!",
    image_removed: "The image was removed from the list.",
    status_pending: "Pending",
    status_processing: "Processing",
    status_done: "Completed",
};
