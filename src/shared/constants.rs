/// Allowed upload content types mapped to the extension used when the
/// client-declared filename carries none.
pub const ALLOWED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

/// Extension used when neither the declared filename nor the content type
/// yields one.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Status code whose ledger entry marks terminal resolution.
pub const STATUS_CODE_RESOLVED: &str = "resolved";

/// Reports subdirectory under the uploads root. Staged files live directly
/// in it; promoted files live in a per-report directory below it.
pub const REPORTS_MEDIA_DIR: &str = "reports";
