use anyhow::{anyhow, Context, Result};
use axum::extract::multipart::Field;
use bytes::Bytes;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error};

// Buffered writer capacity for incoming chunks.
const WRITE_BUFFER: usize = 1024 * 1024;

/// Whether an uploaded part looks like a video.
///
/// An explicit `video/*` content type wins; a missing or generic one falls
/// back to guessing from the file name.
pub fn is_video_upload(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    match content_type.and_then(|ct| ct.parse::<mime::Mime>().ok()) {
        Some(m) if m.type_() == mime::VIDEO => true,
        Some(m) if m != mime::APPLICATION_OCTET_STREAM => false,
        _ => file_name
            .map(|name| mime_guess::from_path(name).first_or_octet_stream().type_() == mime::VIDEO)
            .unwrap_or(false),
    }
}

pub struct FileUploader {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl FileUploader {
    pub async fn new(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::with_capacity(WRITE_BUFFER, file),
            written: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: Bytes) -> Result<()> {
        self.writer.write_all(&chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<u64> {
        self.writer.flush().await?;
        self.writer.get_mut().sync_all().await?;
        debug!("Wrote {} bytes to {}", self.written, self.path.display());
        Ok(self.written)
    }

    pub async fn abort(self) -> Result<()> {
        drop(self.writer);
        fs::remove_file(&self.path)
            .await
            .map_err(|e| anyhow!("Failed to remove partial upload {}: {}", self.path.display(), e))
    }
}

/// Stream a multipart field to `path`, removing the partial file on failure.
///
/// A broken body surfaces as the underlying `MultipartError`.
pub async fn stream_to_file(mut field: Field<'_>, path: &Path) -> Result<u64> {
    let mut uploader = FileUploader::new(path).await?;

    while let Some(chunk) = field.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                error!("Stream error: {}", e);
                uploader.abort().await?;
                return Err(e.into());
            }
        };

        if let Err(e) = uploader.write_chunk(chunk).await {
            error!("Upload error: {}", e);
            uploader.abort().await?;
            return Err(e);
        }
    }

    let written = uploader.finish().await?;
    if written == 0 {
        fs::remove_file(path).await.ok();
        return Err(anyhow!("Uploaded file is empty"));
    }
    Ok(written)
}
