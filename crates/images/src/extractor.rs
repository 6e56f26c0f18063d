//! Recursive data-URI image extraction.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use base64::Engine;
use serde_json::Value as Json;
use uuid::Uuid;

use crate::error::ImageError;

type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

const TOO_LARGE: &str = "[Image too large]";
const TYPE_NOT_ALLOWED: &str = "[Image type not allowed]";
const SAVE_FAILED: &str = "[Image save failed]";

/// Walks a JSON context tree, persisting inline `data:image/...;base64,...`
/// strings to disk and rewriting the field to the resulting filename.
pub struct ImageExtractor {
    images_dir: PathBuf,
    max_size_bytes: usize,
    allowed_types: HashSet<String>,
}

impl ImageExtractor {
    /// Creates an extractor rooted at `images_dir`, creating the directory
    /// if it does not already exist.
    pub async fn new(
        images_dir: impl Into<PathBuf>,
        max_size_bytes: usize,
        allowed_types: impl IntoIterator<Item = String>,
    ) -> Result<Self, ImageError> {
        let images_dir = images_dir.into();
        tokio::fs::create_dir_all(&images_dir).await?;
        Ok(Self {
            images_dir,
            max_size_bytes,
            allowed_types: allowed_types.into_iter().map(|s| s.to_lowercase()).collect(),
        })
    }

    /// Returns the directory images are persisted to, for the Cleanup
    /// Scheduler's orphan sweep.
    #[must_use]
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Recursively rewrites `context` in place, returning the filenames
    /// successfully written. Rejected or failed images are replaced with
    /// sentinel strings rather than surfaced as errors — admission
    /// continues regardless of image outcomes.
    pub async fn extract(
        &self,
        application_id: &str,
        issue_id: Uuid,
        context: &mut Json,
    ) -> Vec<String> {
        let mut counter: u32 = 0;
        let mut written = Vec::new();
        self.walk(context, application_id, issue_id, &mut counter, &mut written).await;
        written
    }

    fn walk<'a>(
        &'a self,
        value: &'a mut Json,
        application_id: &'a str,
        issue_id: Uuid,
        counter: &'a mut u32,
        written: &'a mut Vec<String>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            match value {
                Json::Object(map) => {
                    for v in map.values_mut() {
                        self.walk(v, application_id, issue_id, counter, written).await;
                    }
                },
                Json::Array(items) => {
                    for v in items.iter_mut() {
                        self.walk(v, application_id, issue_id, counter, written).await;
                    }
                },
                Json::String(s) => {
                    if let Some((ext, payload)) = parse_data_uri(s) {
                        *counter = counter.saturating_add(1);
                        let outcome = self
                            .persist_one(application_id, issue_id, *counter, &ext, payload)
                            .await;
                        if let Ok(filename) = &outcome {
                            written.push(filename.clone());
                        }
                        *s = outcome.unwrap_or_else(|sentinel| sentinel.to_owned());
                    }
                },
                Json::Null | Json::Bool(_) | Json::Number(_) => {},
            }
        })
    }

    async fn persist_one(
        &self,
        application_id: &str,
        issue_id: Uuid,
        n: u32,
        ext: &str,
        payload: &str,
    ) -> Result<String, &'static str> {
        if !self.allowed_types.contains(ext) {
            return Err(TYPE_NOT_ALLOWED);
        }
        let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(payload) else {
            return Err(SAVE_FAILED);
        };
        if decoded.len() > self.max_size_bytes {
            return Err(TOO_LARGE);
        }

        let filename = format!("{application_id}-img-{issue_id}-{n}.{ext}");
        let path = self.images_dir.join(&filename);
        match tokio::fs::write(&path, &decoded).await {
            Ok(()) => Ok(filename),
            Err(err) => {
                tracing::warn!(error = %err, filename, "failed to persist extracted image");
                Err(SAVE_FAILED)
            },
        }
    }
}

fn parse_data_uri(s: &str) -> Option<(String, &str)> {
    let rest = s.strip_prefix("data:image/")?;
    let (ext, rest) = rest.split_once(';')?;
    let payload = rest.strip_prefix("base64,")?;
    Some((ext.to_lowercase(), payload))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn extractor(max_size: usize) -> (ImageExtractor, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let extractor = ImageExtractor::new(
            dir.path(),
            max_size,
            ["png".to_owned(), "jpg".to_owned()],
        )
        .await
        .unwrap();
        (extractor, dir)
    }

    fn tiny_png_data_uri() -> String {
        let bytes = b"\x89PNG\r\n\x1a\nfakepngbytes";
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        format!("data:image/png;base64,{encoded}")
    }

    #[tokio::test]
    async fn persists_valid_image_and_rewrites_field() {
        let (extractor, dir) = extractor(1024).await;
        let mut context = json!({"screenshot": tiny_png_data_uri()});
        let written = extractor.extract("app-1", Uuid::nil(), &mut context).await;
        assert_eq!(written.len(), 1);
        let filename = context["screenshot"].as_str().unwrap();
        assert!(filename.starts_with("app-1-img-"));
        assert!(dir.path().join(filename).exists());
    }

    #[tokio::test]
    async fn rejects_disallowed_type() {
        let (extractor, _dir) = extractor(1024).await;
        let mut context = json!({"f": "data:image/bmp;base64,AAAA"});
        let written = extractor.extract("app-1", Uuid::nil(), &mut context).await;
        assert!(written.is_empty());
        assert_eq!(context["f"], "[Image type not allowed]");
    }

    #[tokio::test]
    async fn rejects_oversized_image() {
        let (extractor, _dir) = extractor(4).await;
        let mut context = json!({"f": tiny_png_data_uri()});
        let written = extractor.extract("app-1", Uuid::nil(), &mut context).await;
        assert!(written.is_empty());
        assert_eq!(context["f"], "[Image too large]");
    }

    #[tokio::test]
    async fn leaves_non_image_strings_untouched() {
        let (extractor, _dir) = extractor(1024).await;
        let mut context = json!({"message": "plain text", "nested": {"again": "still plain"}});
        let written = extractor.extract("app-1", Uuid::nil(), &mut context).await;
        assert!(written.is_empty());
        assert_eq!(context["message"], "plain text");
        assert_eq!(context["nested"]["again"], "still plain");
    }

    #[tokio::test]
    async fn walks_arrays_and_assigns_sequential_counters() {
        let (extractor, _dir) = extractor(1024).await;
        let mut context = json!({"shots": [tiny_png_data_uri(), tiny_png_data_uri()]});
        let written = extractor.extract("app-1", Uuid::nil(), &mut context).await;
        assert_eq!(written.len(), 2);
        assert_ne!(written[0], written[1]);
    }
}
