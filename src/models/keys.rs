//! Object store key layout.
//!
//! Originals live under `uploads/<name>` and extracted text under
//! `text/<stem>.txt`. Keys are derived from the file name alone, so two
//! files with the same name overwrite each other (last writer wins).

pub const UPLOAD_PREFIX: &str = "uploads";
pub const TEXT_PREFIX: &str = "text";
pub const TEXT_EXTENSION: &str = "txt";

pub fn upload_key(filename: &str) -> String {
    format!("{}/{}", UPLOAD_PREFIX, filename)
}

pub fn text_key(filename: &str) -> String {
    format!("{}/{}.{}", TEXT_PREFIX, base_name(filename), TEXT_EXTENSION)
}

/// File name with its final extension removed. Leading dots are kept.
pub fn base_name(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[..idx],
        _ => filename,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_key() {
        assert_eq!(upload_key("a.pdf"), "uploads/a.pdf");
        assert_eq!(upload_key("My Report.PDF"), "uploads/My Report.PDF");
    }

    #[test]
    fn test_text_key() {
        assert_eq!(text_key("a.pdf"), "text/a.txt");
        assert_eq!(text_key("scan.2024.pdf"), "text/scan.2024.txt");
        assert_eq!(text_key("README"), "text/README.txt");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("invoice.pdf"), "invoice");
        assert_eq!(base_name(".pdf"), ".pdf");
        assert_eq!(base_name("noext"), "noext");
        assert_eq!(base_name("trailing."), "trailing");
    }
}
