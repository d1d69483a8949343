use cutout::collection::ImageStatus;
use cutout::i18n::Locale;

#[test]
fn detects_common_locale_tags() {
    assert_eq!(Locale::detect("zh_CN.UTF-8"), Some(Locale::ZhCn));
    assert_eq!(Locale::detect("zh-Hans"), Some(Locale::ZhCn));
    assert_eq!(Locale::detect("zh_TW"), Some(Locale::ZhCn));
    assert_eq!(Locale::detect("en_US.UTF-8"), Some(Locale::En));
    assert_eq!(Locale::detect("de_DE"), None);
    assert_eq!(Locale::detect(""), None);
    assert_eq!(Locale::default(), Locale::En);
}

#[test]
fn status_labels_come_from_the_table() {
    let en = Locale::En.messages();
    assert_eq!(en.status(ImageStatus::Pending), en.status_pending);
    assert_eq!(en.status(ImageStatus::Processing), en.status_processing);
    assert_eq!(en.status(ImageStatus::Done), en.status_done);

    let zh = Locale::ZhCn.messages();
    assert_eq!(zh.locale, Locale::ZhCn);
    assert_ne!(zh.status(ImageStatus::Done), en.status(ImageStatus::Done));
}

#[test]
fn formatted_messages_include_their_arguments() {
    for locale in [Locale::En, Locale::ZhCn] {
        let messages = locale.messages();
        assert!(messages.max_image_limit(12).contains("12"));
        assert!(messages.skipped_not_image("notes.txt").contains("notes.txt"));
        assert!(messages.confirm_delete_message("cat.png").contains("cat.png"));
        assert!(messages.batch_started(3).contains('3'));
        assert!(messages.edit_saved("Edited_1_a.png").contains("Edited_1_a.png"));
    }
}

#[test]
fn editor_heading_uses_locale_punctuation() {
    assert_eq!(Locale::En.messages().editor_heading("photo.png"), "Crop Image: photo.png");
    assert_eq!(Locale::ZhCn.messages().editor_heading("photo.png"), "图片裁剪：photo.png");
}
