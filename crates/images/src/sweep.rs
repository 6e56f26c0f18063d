//! Orphan-image filesystem sweep, invoked by the Cleanup Scheduler.

use std::collections::HashSet;
use std::path::Path;

use crate::error::ImageError;

/// Enumerates `images_dir` and deletes any file whose name is not present
/// in `referenced` (the union of every live issue's `screenshots`).
/// Returns the filenames that were removed.
///
/// Callers must build `referenced` from a Store scan taken *before*
/// enumerating the directory, so a file written by an admission that is
/// still in flight is never mistaken for an orphan (see the Cleanup
/// Scheduler's shared-resource note).
pub async fn sweep_orphans(
    images_dir: &Path,
    referenced: &HashSet<String>,
) -> Result<Vec<String>, ImageError> {
    let mut removed = Vec::new();
    let mut entries = tokio::fs::read_dir(images_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if referenced.contains(&name) {
            continue;
        }
        if !entry.file_type().await?.is_file() {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed.push(name),
            Err(err) => {
                tracing::warn!(file = %name, error = %err, "failed to remove orphaned image");
            },
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn removes_unreferenced_files_and_keeps_referenced_ones() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("orphan.png"), b"x").await.unwrap();
        tokio::fs::write(dir.path().join("kept.png"), b"x").await.unwrap();

        let mut referenced = HashSet::new();
        referenced.insert("kept.png".to_owned());

        let removed = sweep_orphans(dir.path(), &referenced).await.unwrap();
        assert_eq!(removed, vec!["orphan.png".to_owned()]);
        assert!(!dir.path().join("orphan.png").exists());
        assert!(dir.path().join("kept.png").exists());
    }
}
