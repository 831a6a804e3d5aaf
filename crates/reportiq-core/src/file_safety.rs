//! Upload validation for report files.
//!
//! Layered checks:
//! 1. Size limit
//! 2. Extension allow-list (pdf, csv, xlsx, xls by default)
//! 3. Magic byte sniffing — a mismatch between content and extension is
//!    logged but does not reject, since csv/xls files routinely lack
//!    reliable signatures.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::defaults;

/// MIME types accepted for report uploads.
static KNOWN_REPORT_MIMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "application/pdf",
        "text/csv",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-excel",
    ]
    .into_iter()
    .collect()
});

/// Why an upload was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    NoFile,
    TooLarge { size: u64, limit: u64 },
    DisallowedType { extension: String },
}

impl UploadRejection {
    /// Client-facing message for the error envelope.
    pub fn message(&self, allowed: &[String]) -> String {
        match self {
            Self::NoFile => "No file uploaded. Please select a file to upload.".to_string(),
            Self::TooLarge { limit, .. } => format!(
                "File too large. Maximum allowed size is {}MB.",
                limit / (1024 * 1024)
            ),
            Self::DisallowedType { .. } => format!(
                "Invalid file type. Allowed types: {}",
                allowed.join(", ")
            ),
        }
    }
}

/// Upload acceptance rules, built from configuration.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: defaults::MAX_FILE_SIZE_BYTES,
            allowed_extensions: defaults::ALLOWED_FILE_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl UploadPolicy {
    /// Check a candidate upload. `Ok(())` means the file may be written to
    /// disk and forwarded upstream.
    pub fn validate(&self, filename: &str, data: &[u8]) -> Result<(), UploadRejection> {
        if data.len() as u64 > self.max_size_bytes {
            return Err(UploadRejection::TooLarge {
                size: data.len() as u64,
                limit: self.max_size_bytes,
            });
        }

        let extension = extension_of(filename);
        let by_extension = self
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&extension));

        // Sniff when the extension alone does not decide; a recognised
        // report MIME admits a file with a mangled name.
        let sniffed = infer::get(data).map(|kind| kind.mime_type());
        let by_content = sniffed
            .map(|mime| KNOWN_REPORT_MIMES.contains(mime))
            .unwrap_or(false);

        if !by_extension && !by_content {
            return Err(UploadRejection::DisallowedType { extension });
        }

        if by_extension {
            if let Some(mime) = sniffed {
                if !KNOWN_REPORT_MIMES.contains(mime) {
                    tracing::warn!(
                        filename = %filename,
                        detected = %mime,
                        "Upload content does not match its extension"
                    );
                }
            }
        }

        Ok(())
    }
}

fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Longest stored filename, in bytes (common filesystem limit).
const MAX_NAME_BYTES: usize = 255;

/// Sanitize a client-supplied filename for safe storage and display.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    if sanitized.len() > MAX_NAME_BYTES {
        // Keep the extension when there is one and it fits; a leading dot
        // is part of the name, not an extension.
        let (stem, ext) = match sanitized.rfind('.') {
            Some(pos) if pos > 0 && sanitized.len() - pos < MAX_NAME_BYTES => {
                sanitized.split_at(pos)
            }
            _ => (sanitized, ""),
        };
        let budget = MAX_NAME_BYTES - ext.len();
        let mut cut = 0;
        for (idx, c) in stem.char_indices() {
            let end = idx + c.len_utf8();
            if end > budget {
                break;
            }
            cut = end;
        }
        return format!("{}{}", &stem[..cut], ext);
    }

    sanitized.to_string()
}

/// Collision-free on-disk name: `<uuid>_<epoch-ms>.<ext>`.
pub fn stored_file_name(original: &str) -> String {
    let ext = extension_of(original);
    let millis = chrono::Utc::now().timestamp_millis();
    if ext.is_empty() {
        format!("{}_{}", Uuid::new_v4(), millis)
    } else {
        format!("{}_{}.{}", Uuid::new_v4(), millis, ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_pdf_by_content_and_extension() {
        let policy = UploadPolicy::default();
        assert!(policy.validate("report.pdf", b"%PDF-1.4 fake content").is_ok());
    }

    #[test]
    fn test_allows_csv_by_extension_without_magic_bytes() {
        let policy = UploadPolicy::default();
        assert!(policy.validate("sales.csv", b"region,revenue\nEMEA,10").is_ok());
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let policy = UploadPolicy::default();
        assert!(policy.validate("REPORT.XLSX", b"PK\x03\x04rest").is_ok());
    }

    #[test]
    fn test_rejects_disallowed_extension() {
        let policy = UploadPolicy::default();
        let err = policy.validate("notes.txt", b"plain text").unwrap_err();
        assert_eq!(
            err,
            UploadRejection::DisallowedType {
                extension: "txt".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_executable_masquerading_without_extension() {
        let policy = UploadPolicy::default();
        let err = policy.validate("payload", b"MZ\x90\x00").unwrap_err();
        assert!(matches!(err, UploadRejection::DisallowedType { .. }));
    }

    #[test]
    fn test_accepts_pdf_content_with_wrong_name() {
        // Content sniffing admits a real PDF whose name lost its extension.
        let policy = UploadPolicy::default();
        assert!(policy.validate("download", b"%PDF-1.7 body").is_ok());
    }

    #[test]
    fn test_size_boundary() {
        let policy = UploadPolicy {
            max_size_bytes: 100,
            ..UploadPolicy::default()
        };
        let at_limit = vec![b'a'; 100];
        assert!(policy.validate("data.csv", &at_limit).is_ok());

        let over_limit = vec![b'a'; 101];
        let err = policy.validate("data.csv", &over_limit).unwrap_err();
        assert_eq!(
            err,
            UploadRejection::TooLarge {
                size: 101,
                limit: 100
            }
        );
    }

    #[test]
    fn test_rejection_messages() {
        let allowed: Vec<String> = ["pdf", "csv"].iter().map(|s| s.to_string()).collect();
        assert!(UploadRejection::NoFile.message(&allowed).contains("No file"));
        let msg = UploadRejection::TooLarge {
            size: 60 * 1024 * 1024,
            limit: 50 * 1024 * 1024,
        }
        .message(&allowed);
        assert!(msg.contains("50MB"));
        let msg = UploadRejection::DisallowedType {
            extension: "txt".to_string(),
        }
        .message(&allowed);
        assert!(msg.contains("pdf, csv"));
    }

    #[test]
    fn test_sanitize_removes_path_components() {
        assert_eq!(sanitize_filename("/etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\reports\\q3.xlsx"), "q3.xlsx");
    }

    #[test]
    fn test_sanitize_replaces_dangerous_chars() {
        assert_eq!(sanitize_filename("q3<final>:v2.pdf"), "q3_final__v2.pdf");
    }

    #[test]
    fn test_sanitize_handles_empty() {
        assert_eq!(sanitize_filename(""), "unnamed_file");
        assert_eq!(sanitize_filename("   "), "unnamed_file");
    }

    #[test]
    fn test_sanitize_truncates_long_name_keeping_extension() {
        let long = format!("{}.pdf", "x".repeat(300));
        let out = sanitize_filename(&long);
        assert_eq!(out.len(), 255);
        assert!(out.ends_with(".pdf"));
    }

    #[test]
    fn test_sanitize_truncates_long_dotfile_name() {
        // A leading dot is not an extension; the whole name is truncated.
        let long = format!(".{}", "x".repeat(300));
        let out = sanitize_filename(&long);
        assert_eq!(out.len(), 255);
        assert!(out.starts_with('.'));
    }

    #[test]
    fn test_sanitize_truncates_multibyte_name_on_char_boundary() {
        let long = format!("{}.pdf", "é".repeat(200));
        let out = sanitize_filename(&long);
        assert!(out.len() <= 255);
        assert!(out.ends_with(".pdf"));
        assert!(out.chars().all(|c| c == 'é' || c == '.' || c.is_ascii()));

        let no_ext = "日".repeat(100);
        let out = sanitize_filename(&no_ext);
        assert!(out.len() <= 255);
        assert!(out.chars().all(|c| c == '日'));
    }

    #[test]
    fn test_stored_name_keeps_extension_and_is_unique() {
        let a = stored_file_name("report.PDF");
        let b = stored_file_name("report.PDF");
        assert!(a.ends_with(".pdf"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_stored_name_without_extension() {
        let name = stored_file_name("report");
        assert!(!name.contains('.'));
    }
}
