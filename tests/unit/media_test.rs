//! Unit tests for data URL and image handling

use selfie_booth::media::{data_url, DataUrl, ImageBytes, ImageFormat};

#[test]
fn test_decode_data_url() {
    let url = DataUrl::parse("data:image/png;base64,SGVsbG8sIFdvcmxkIQ==");
    assert_eq!(url.mime_type, Some("image/png"));
    assert_eq!(url.decode().unwrap(), b"Hello, World!");
}

#[test]
fn test_bare_payload_decodes() {
    assert_eq!(
        DataUrl::parse("SGVsbG8sIFdvcmxkIQ==").decode().unwrap(),
        b"Hello, World!"
    );
}

#[test]
fn test_invalid_base64_is_bad_request() {
    let err = DataUrl::parse("data:image/png;base64,not valid!!!")
        .decode()
        .unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[test]
fn test_jpeg_rewrap() {
    assert_eq!(
        data_url::as_jpeg_data_url("data:image/png;base64,QUJD").unwrap(),
        "data:image/jpeg;base64,QUJD"
    );
    assert!(data_url::as_jpeg_data_url("data:image/png;base64,").is_err());
}

#[test]
fn test_url_kinds() {
    assert!(data_url::is_remote_url("https://replicate.delivery/a.webp"));
    assert!(!data_url::is_remote_url("data:image/png;base64,QUJD"));
    assert!(data_url::is_image_data_url("data:image/jpeg;base64,QUJD"));
    assert!(!data_url::is_image_data_url("data:text/plain;base64,QUJD"));
}

#[test]
fn test_create_data_url_decodes_back() {
    let url = data_url::create_data_url(b"test data", "image/png");
    assert!(url.starts_with("data:image/png;base64,"));
    assert_eq!(DataUrl::parse(&url).decode().unwrap(), b"test data");
}

#[test]
fn test_image_bytes_types() {
    let webp = ImageBytes::new(b"RIFF\0\0\0\0WEBPVP8 ".to_vec());
    assert_eq!(webp.format, Some(ImageFormat::Webp));
    assert_eq!(webp.mime_type_or("image/jpeg"), "image/webp");

    let unknown = ImageBytes::new(b"plain".to_vec());
    assert_eq!(unknown.format, None);
    assert_eq!(unknown.extension_or("jpg"), "jpg");
}
