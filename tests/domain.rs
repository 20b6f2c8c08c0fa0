use assert_matches::assert_matches;

use hubmap_catalog::domain::{DatasetUuid, extract_dataset_uuid};
use hubmap_catalog::error::CatalogError;

#[test]
fn extract_uuid_from_portal_url() {
    let uuid =
        extract_dataset_uuid("https://portal.hubmapconsortium.org/0123456789abcdef0123456789abcdef")
            .unwrap();
    assert_eq!(uuid, "0123456789abcdef0123456789abcdef");
}

#[test]
fn extract_uuid_from_asset_url() {
    let uuid = extract_dataset_uuid(
        "https://assets.hubmapconsortium.org/0123456789abcdef0123456789abcdef/out.h5ad",
    )
    .unwrap();
    assert_eq!(uuid, "0123456789abcdef0123456789abcdef");
}

#[test]
fn extract_uuid_rejects_urls_without_pattern() {
    let err = extract_dataset_uuid("https://portal.hubmapconsortium.org/browse/HBM123.ABCD.456")
        .unwrap_err();
    assert_matches!(err, CatalogError::InvalidDatasetUrl(_));

    let err = extract_dataset_uuid("https://example.org/0123456789abcdef0123456789abcdef")
        .unwrap_err();
    assert_matches!(err, CatalogError::InvalidDatasetUrl(_));
}

#[test]
fn bare_uuid_or_url_both_parse() {
    let bare = DatasetUuid::from_str_or_url("0123456789abcdef0123456789abcdef").unwrap();
    let url = DatasetUuid::from_str_or_url(
        "https://portal.hubmapconsortium.org/0123456789abcdef0123456789abcdef",
    )
    .unwrap();
    assert_eq!(bare, url);

    let err = DatasetUuid::from_str_or_url("HBM123.ABCD.456").unwrap_err();
    assert_matches!(err, CatalogError::InvalidUuid(_));
}

#[test]
fn uuid_deserializes_with_validation() {
    let uuid: DatasetUuid =
        serde_json::from_str("\"0123456789abcdef0123456789abcdef\"").unwrap();
    assert_eq!(uuid.as_str(), "0123456789abcdef0123456789abcdef");
    assert!(serde_json::from_str::<DatasetUuid>("\"nope\"").is_err());
}
