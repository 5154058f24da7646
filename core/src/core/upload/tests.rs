use super::*;
use crate::types::StorageConfig;
use std::io::Cursor;

fn test_config(max_upload_bytes: u64) -> StorageConfig {
    StorageConfig {
        max_upload_bytes,
        ..StorageConfig::default()
    }
}

fn candidate(
    filename: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> UploadCandidate<Cursor<Vec<u8>>> {
    UploadCandidate {
        filename: filename.to_string(),
        content_type: content_type.to_string(),
        source: Cursor::new(bytes),
    }
}

fn encode_image(format: image::ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

mod metadata_checks {
    use super::*;

    #[test]
    fn test_rejects_empty_filename() {
        let result = validate(candidate("", "image/jpeg", vec![1, 2, 3]), &test_config(1024));
        assert!(matches!(result, Err(ValidationError::MissingFilename)));
    }

    #[test]
    fn test_rejects_whitespace_filename() {
        let result = validate(
            candidate("   ", "image/jpeg", vec![1, 2, 3]),
            &test_config(1024),
        );
        assert!(matches!(result, Err(ValidationError::MissingFilename)));
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let result = validate(
            candidate("notes.txt", "image/jpeg", vec![1, 2, 3]),
            &test_config(1024),
        );
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedExtension(ext)) if ext == ".txt"
        ));
    }

    #[test]
    fn test_rejects_missing_extension() {
        let result = validate(
            candidate("photo", "image/jpeg", vec![1, 2, 3]),
            &test_config(1024),
        );
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedExtension(ext)) if ext.is_empty()
        ));
    }

    #[test]
    fn test_rejects_unsupported_content_type() {
        let result = validate(
            candidate("photo.jpg", "application/pdf", vec![1, 2, 3]),
            &test_config(1024),
        );
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedContentType(ct)) if ct == "application/pdf"
        ));
    }

    #[test]
    fn test_extension_check_runs_before_content_type() {
        let result = validate(
            candidate("evil.exe", "application/octet-stream", vec![1, 2, 3]),
            &test_config(1024),
        );
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedExtension(_))
        ));
    }
}

mod size_checks {
    use super::*;

    #[test]
    fn test_rejects_empty_file() {
        let result = validate(candidate("photo.jpg", "image/jpeg", vec![]), &test_config(1024));
        assert!(matches!(result, Err(ValidationError::EmptyFile)));
    }

    #[test]
    fn test_rejects_oversize_payload() {
        let jpeg = encode_image(image::ImageFormat::Jpeg, 5, 5);
        assert!(jpeg.len() > 10);

        let result = validate(candidate("photo.jpg", "image/jpeg", jpeg), &test_config(10));
        assert!(matches!(result, Err(ValidationError::TooLarge { max: 10 })));
    }

    #[test]
    fn test_accepts_payload_exactly_at_limit() {
        let jpeg = encode_image(image::ImageFormat::Jpeg, 5, 5);
        let max = jpeg.len() as u64;

        let upload = validate(candidate("photo.jpg", "image/jpeg", jpeg.clone()), &test_config(max))
            .unwrap();
        assert_eq!(upload.bytes, jpeg);
    }

    #[test]
    fn test_rejects_payload_one_byte_over_limit() {
        let jpeg = encode_image(image::ImageFormat::Jpeg, 5, 5);
        let max = jpeg.len() as u64 - 1;

        let result = validate(candidate("photo.jpg", "image/jpeg", jpeg), &test_config(max));
        assert!(matches!(result, Err(ValidationError::TooLarge { .. })));
    }
}

mod content_checks {
    use super::*;

    #[test]
    fn test_rejects_non_image_bytes() {
        let result = validate(
            candidate("evil.jpg", "image/jpeg", b"definitely not an image".to_vec()),
            &test_config(1024),
        );
        assert!(matches!(result, Err(ValidationError::InvalidImageContent)));
    }

    #[test]
    fn test_rejects_truncated_image() {
        let mut jpeg = encode_image(image::ImageFormat::Jpeg, 32, 32);
        jpeg.truncate(jpeg.len() / 2);

        let result = validate(
            candidate("photo.jpg", "image/jpeg", jpeg),
            &test_config(200_000),
        );
        assert!(matches!(result, Err(ValidationError::InvalidImageContent)));
    }

    #[test]
    fn test_rejects_png_renamed_to_jpg() {
        let png = encode_image(image::ImageFormat::Png, 5, 5);

        let result = validate(
            candidate("photo.jpg", "image/jpeg", png),
            &test_config(200_000),
        );
        assert!(matches!(
            result,
            Err(ValidationError::FormatMismatch { expected, declared })
                if expected == ".png" && declared == ".jpg"
        ));
    }

    #[test]
    fn test_rejects_decodable_format_outside_mapping() {
        // GIF decodes fine but has no canonical extension in this system.
        let gif = encode_image(image::ImageFormat::Gif, 5, 5);

        let result = validate(
            candidate("photo.png", "image/png", gif),
            &test_config(200_000),
        );
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedImageFormat(_))
        ));
    }
}

mod accept {
    use super::*;

    #[test]
    fn test_accepts_jpeg_and_returns_exact_bytes() {
        let jpeg = encode_image(image::ImageFormat::Jpeg, 5, 5);

        let upload = validate(
            candidate("photo.jpg", "image/jpeg", jpeg.clone()),
            &test_config(200_000),
        )
        .unwrap();

        assert_eq!(upload.bytes, jpeg);
        assert_eq!(upload.extension, ".jpg");
    }

    #[test]
    fn test_normalizes_jpeg_extension() {
        let jpeg = encode_image(image::ImageFormat::Jpeg, 5, 5);

        let upload = validate(
            candidate("photo.JPEG", "image/jpeg", jpeg),
            &test_config(200_000),
        )
        .unwrap();

        assert_eq!(upload.extension, ".jpg");
    }

    #[test]
    fn test_accepts_png() {
        let png = encode_image(image::ImageFormat::Png, 5, 5);

        let upload = validate(
            candidate("avatar.png", "image/png", png.clone()),
            &test_config(200_000),
        )
        .unwrap();

        assert_eq!(upload.bytes, png);
        assert_eq!(upload.extension, ".png");
    }

    #[test]
    fn test_accepts_webp() {
        let webp = encode_image(image::ImageFormat::WebP, 5, 5);

        let upload = validate(
            candidate("avatar.webp", "image/webp", webp),
            &test_config(200_000),
        )
        .unwrap();

        assert_eq!(upload.extension, ".webp");
    }
}
