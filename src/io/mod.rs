use anyhow::{Result, bail};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

pub mod github;
pub mod local;

/// A markdown file found in the content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    // path relative to the store root, always '/' separated
    pub path: String,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Lists the markdown files directly or transitively under `folder`.
    async fn list_markdown_files(&self, folder: &str) -> Result<Vec<ContentFile>>;
    async fn read_to_string(&self, path: &str) -> Result<String>;
}

// joins a store-relative path onto `root`, refusing anything that climbs out of it
pub fn verify_relative_path(root: &Path, relative: &str) -> Result<PathBuf> {
    let mut verified = root.to_path_buf();
    let mut depth: usize = 0;

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => {
                verified.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    bail!("Path {} escapes the content root", relative);
                }
                verified.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                bail!("Path {} must be relative to the content root", relative);
            }
        }
    }

    Ok(verified)
}
