use cutout::error::StorageError;
use cutout::services::storage::SlotResponse;
use cutout::services::{PresignedStorage, UploadSlot};
use reqwest::Url;

fn parse(json: &str) -> Result<UploadSlot, StorageError> {
    serde_json::from_str::<SlotResponse>(json).unwrap().into_slot()
}

#[test]
fn slot_response_accepts_both_url_field_names() {
    let slot = parse(r#"{"uploadUrl":"https://s3/put?sig","publicUrl":"https://cdn/a/b.png","key":"a/b.png"}"#).unwrap();
    assert_eq!(slot.upload_url, "https://s3/put?sig");
    assert_eq!(slot.storage_key(), "a/b.png");

    let slot = parse(r#"{"success":true,"uploadUrl":"https://s3/put","imageUrl":"https://cdn.example/uploads/c.png"}"#).unwrap();
    assert_eq!(slot.public_url, "https://cdn.example/uploads/c.png");
    assert_eq!(slot.storage_key(), "uploads/c.png");
}

#[test]
fn rejected_or_incomplete_slots_are_errors() {
    let err = parse(r#"{"success":false,"message":"quota exceeded"}"#).unwrap_err();
    assert!(matches!(err, StorageError::SlotRejected(msg) if msg == "quota exceeded"));

    let err = parse(r#"{"uploadUrl":"https://s3/put"}"#).unwrap_err();
    assert!(matches!(err, StorageError::SlotRejected(_)));
}

#[test]
fn client_builds_for_any_endpoint() {
    let endpoint = Url::parse("http://127.0.0.1:9/api/upload-url").unwrap();
    assert!(PresignedStorage::new(endpoint).is_ok());
}
