use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Pattern every stored media filename must match: a UUID v4 staged name
    /// plus a short lowercase alphanumeric extension. Anything else never
    /// came out of the upload stager and must not reach a filesystem path.
    pub static ref MEDIA_FILENAME_REGEX: Regex = Regex::new(
        r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\.[a-z0-9]{1,8}$"
    )
    .unwrap();
}

pub fn valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

pub fn valid_longitude(lng: f64) -> bool {
    lng.is_finite() && (-180.0..=180.0).contains(&lng)
}

pub fn valid_detail(detail: &str) -> bool {
    !detail.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_range() {
        assert!(valid_latitude(13.7));
        assert!(valid_latitude(-90.0));
        assert!(valid_latitude(90.0));
        assert!(!valid_latitude(90.01));
        assert!(!valid_latitude(-120.5));
        assert!(!valid_latitude(f64::NAN));
    }

    #[test]
    fn test_longitude_range() {
        assert!(valid_longitude(100.5));
        assert!(valid_longitude(-180.0));
        assert!(valid_longitude(180.0));
        assert!(!valid_longitude(180.1));
        assert!(!valid_longitude(f64::INFINITY));
    }

    #[test]
    fn test_detail_rejects_blank() {
        assert!(valid_detail("pothole"));
        assert!(!valid_detail(""));
        assert!(!valid_detail("   "));
    }

    #[test]
    fn test_media_filename_pattern() {
        assert!(MEDIA_FILENAME_REGEX.is_match("550e8400-e29b-41d4-a716-446655440000.jpg"));
        assert!(MEDIA_FILENAME_REGEX.is_match("550e8400-e29b-41d4-a716-446655440000.webp"));
        assert!(!MEDIA_FILENAME_REGEX.is_match("../../etc/passwd"));
        assert!(!MEDIA_FILENAME_REGEX.is_match("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!MEDIA_FILENAME_REGEX.is_match("550e8400-e29b-41d4-a716-446655440000.JPG"));
        assert!(!MEDIA_FILENAME_REGEX.is_match("photo.jpg"));
    }
}
