use std::io;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

pub const INPUT_FILE_NAME: &str = "input_video.mp4";
pub const OUTPUT_FILE_NAME: &str = "output_video.mp4";

/// Per-job directories under a local media root.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub async fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        info!("✅ Media root ready at {}", root.display());
        Ok(Self { root })
    }

    pub fn job_dir(&self, id: Uuid) -> PathBuf {
        self.root.join(id.to_string())
    }

    pub fn input_path(&self, id: Uuid) -> PathBuf {
        self.job_dir(id).join(INPUT_FILE_NAME)
    }

    pub fn output_path(&self, id: Uuid) -> PathBuf {
        self.job_dir(id).join(OUTPUT_FILE_NAME)
    }

    pub async fn create_job_dir(&self, id: Uuid) -> io::Result<PathBuf> {
        let dir = self.job_dir(id);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Drop everything stored for a job that never made it into the database.
    pub async fn discard_job(&self, id: Uuid) -> io::Result<()> {
        match fs::remove_dir_all(self.job_dir(id)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
