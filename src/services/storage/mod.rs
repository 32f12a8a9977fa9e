pub mod supabase;

use async_trait::async_trait;

use crate::errors::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Lowercased extension of the original file name, `bin` when absent.
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| "bin".to_string())
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores (or overwrites) `path` and returns its public URL.
    async fn upload(&self, path: &str, file: &UploadFile) -> Result<String, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![],
        }
    }

    #[test]
    fn test_extension() {
        assert_eq!(file("Avatar.PNG").extension(), "png");
        assert_eq!(file("photo.final.jpeg").extension(), "jpeg");
        assert_eq!(file("noext").extension(), "bin");
    }
}
