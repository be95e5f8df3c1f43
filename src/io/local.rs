use crate::io::{ContentFile, ContentSource, verify_relative_path};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Reads posts from a directory on disk laid out like the remote repository.
pub struct LocalContentSource {
    pub root_path: PathBuf,
}

impl LocalContentSource {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }
}

#[async_trait]
impl ContentSource for LocalContentSource {
    async fn list_markdown_files(&self, folder: &str) -> Result<Vec<ContentFile>> {
        let folder_path = verify_relative_path(&self.root_path, folder)?;
        if !folder_path.is_dir() {
            anyhow::bail!("Content folder {} does not exist", folder_path.display());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&folder_path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|s| s.to_str()) != Some("md")
            {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root_path)
                .with_context(|| format!("{} is outside of the content root", entry.path().display()))?;

            entries.push(ContentFile {
                path: relative.to_string_lossy().replace("\\", "/"),
            });
        }

        Ok(entries)
    }

    async fn read_to_string(&self, path: &str) -> Result<String> {
        let verified = verify_relative_path(&self.root_path, path)?;
        tokio::fs::read_to_string(&verified)
            .await
            .with_context(|| format!("Failed to read markdown file: {}", verified.display()))
    }
}
