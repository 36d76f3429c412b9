use std::path::PathBuf;

use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::entities::stored_file;
use crate::error::{AppError, AppResult};

/// Extensions accepted for upload, matched case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "pdf", "txt"];

/// Uploaded-file metadata plus the files themselves under `upload_dir`.
#[derive(Clone)]
pub struct FileRegistry {
    db: DatabaseConnection,
    upload_dir: PathBuf,
}

impl FileRegistry {
    pub fn new(db: DatabaseConnection, upload_dir: PathBuf) -> Self {
        Self { db, upload_dir }
    }

    /// Writes the file under the upload dir, prefixed with the uploader's
    /// username to avoid collisions, and records its metadata. The caller
    /// has already checked the extension.
    pub async fn store(
        &self,
        username: &str,
        original_name: &str,
        data: &[u8],
    ) -> AppResult<stored_file::Model> {
        let safe_name = sanitize_filename(original_name)?;
        let stored_name = format!("{username}_{safe_name}");
        let path = self.upload_dir.join(&stored_name);

        tokio::fs::write(&path, data).await?;

        let record = stored_file::ActiveModel {
            username: Set(username.to_string()),
            filename: Set(safe_name),
            filepath: Set(path.to_string_lossy().into_owned()),
            uploaded_at: Set(jiff::Timestamp::now().as_second()),
            ..Default::default()
        };

        Ok(record.insert(&self.db).await?)
    }
}

/// Whether the filename carries an extension from the allowed set.
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Reduces a client-supplied filename to a safe flat name: path components
/// are dropped, leading dots stripped, and anything outside
/// `[A-Za-z0-9._-]` replaced with `_`.
pub fn sanitize_filename(filename: &str) -> AppResult<String> {
    if filename.contains('\0') || filename.chars().any(|c| c.is_ascii_control()) {
        return Err(AppError::Validation("Invalid filename".into()));
    }

    let flat = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = flat
        .trim()
        .trim_start_matches('.')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    if cleaned.is_empty() {
        return Err(AppError::Validation("Invalid filename".into()));
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn allowed_file_checks_extension_set() {
        assert!(allowed_file("photo.jpg"));
        assert!(allowed_file("photo.JPEG"));
        assert!(allowed_file("scan.pdf"));
        assert!(allowed_file("notes.txt"));
        assert!(allowed_file("pic.PNG"));

        assert!(!allowed_file("archive.zip"));
        assert!(!allowed_file("script.sh"));
        assert!(!allowed_file("noextension"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn sanitize_flattens_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("photo.jpg").unwrap(), "photo.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd.txt").unwrap(), "passwd.txt");
        assert_eq!(sanitize_filename("dir\\file.png").unwrap(), "file.png");
        assert_eq!(sanitize_filename("my photo (1).jpg").unwrap(), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename(".hidden.txt").unwrap(), "hidden.txt");
    }

    #[test]
    fn sanitize_rejects_unusable_names() {
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("...").is_err());
        assert!(sanitize_filename("name\r\n.txt").is_err());
        assert!(sanitize_filename("name\0.txt").is_err());
    }

    #[tokio::test]
    async fn store_prefixes_username_and_records_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileRegistry::new(test_db().await, dir.path().to_path_buf());

        let record = registry.store("alice", "notes.txt", b"hello").await.unwrap();

        assert_eq!(record.username, "alice");
        assert_eq!(record.filename, "notes.txt");

        let written = dir.path().join("alice_notes.txt");
        assert_eq!(std::fs::read(&written).unwrap(), b"hello");
        assert_eq!(record.filepath, written.to_string_lossy());
    }
}
