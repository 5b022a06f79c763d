use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// 附件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Pdf,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Pdf => "pdf",
        }
    }
}

/// 发送给抽取服务的文件内容
#[derive(Debug, Clone)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    /// 根据扩展名判断附件类型
    ///
    /// `.pdf` → pdf；其余按文件名猜测 mime，猜不到时为 `image/jpeg`
    pub fn classify(path: &Path, data: Vec<u8>) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let is_pdf = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            return Self {
                kind: AttachmentKind::Pdf,
                filename,
                mime_type: "application/pdf".to_string(),
                data,
            };
        }

        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("image/jpeg")
            .to_string();

        Self {
            kind: AttachmentKind::Image,
            filename,
            mime_type,
            data,
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_is_classified_case_insensitively() {
        let att = Attachment::classify(Path::new("in/Albaran.PDF"), vec![1, 2]);
        assert_eq!(att.kind, AttachmentKind::Pdf);
        assert_eq!(att.mime_type, "application/pdf");
        assert_eq!(att.filename, "Albaran.PDF");
    }

    #[test]
    fn test_image_mime_is_guessed() {
        let png = Attachment::classify(Path::new("a/scan.png"), vec![]);
        assert_eq!(png.kind, AttachmentKind::Image);
        assert_eq!(png.mime_type, "image/png");

        let webp = Attachment::classify(Path::new("a/scan.webp"), vec![]);
        assert_eq!(webp.mime_type, "image/webp");
    }

    #[test]
    fn test_unknown_mime_defaults_to_jpeg() {
        let att = Attachment::classify(Path::new("a/scan"), vec![]);
        assert_eq!(att.kind, AttachmentKind::Image);
        assert_eq!(att.mime_type, "image/jpeg");
    }

    #[test]
    fn test_data_url() {
        let att = Attachment::classify(Path::new("x.pdf"), b"hi".to_vec());
        assert_eq!(att.to_data_url(), "data:application/pdf;base64,aGk=");
    }
}
