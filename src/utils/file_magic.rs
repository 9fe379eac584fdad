/// 验证文件内容的魔术字节是否与扩展名匹配
///
/// # Arguments
/// * `data` - 文件内容的前几个字节
/// * `extension` - 文件扩展名（包含点号，如 ".png"）
///
/// # Returns
/// * `true` - 魔术字节匹配或该类型不需要验证
/// * `false` - 魔术字节不匹配
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match extension.to_lowercase().as_str() {
        // 图片格式
        ".png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        ".jpg" | ".jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        ".gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),

        // 文档格式
        ".pdf" => data.starts_with(b"%PDF"),
        ".doc" => data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]),
        // OOXML 基于 ZIP
        ".docx" => data.starts_with(&[0x50, 0x4B, 0x03, 0x04]),

        // 文本格式不检查魔术字节，但拒绝二进制内容
        ".txt" | ".csv" => !data.contains(&0),

        // 未知格式 - 默认拒绝
        _ => false,
    }
}

/// 扩展名对应的 MIME 类型
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".gif" => "image/gif",
        ".pdf" => "application/pdf",
        ".doc" => "application/msword",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".txt" => "text/plain; charset=utf-8",
        ".csv" => "text/csv; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_magic() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(validate_magic_bytes(&png_header, ".png"));
        assert!(validate_magic_bytes(&png_header, ".PNG"));
        assert!(!validate_magic_bytes(&png_header, ".jpg"));
    }

    #[test]
    fn test_pdf_magic() {
        let pdf_header = b"%PDF-1.7";
        assert!(validate_magic_bytes(pdf_header, ".pdf"));
        assert!(!validate_magic_bytes(pdf_header, ".docx"));
    }

    #[test]
    fn test_docx_magic() {
        let zip_header = [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00];
        assert!(validate_magic_bytes(&zip_header, ".docx"));
        assert!(!validate_magic_bytes(&zip_header, ".pdf"));
    }

    #[test]
    fn test_text_files() {
        assert!(validate_magic_bytes(b"Bring a packed lunch.", ".txt"));
        assert!(!validate_magic_bytes(&[0x41, 0x00, 0x42], ".txt"));
    }

    #[test]
    fn test_empty_data_and_unknown_extension() {
        assert!(!validate_magic_bytes(&[], ".png"));
        assert!(!validate_magic_bytes(&[0x4D, 0x5A], ".exe"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for(".PDF"), "application/pdf");
        assert_eq!(content_type_for(".bin"), "application/octet-stream");
    }
}
