//! Frame output: one PNG per rendered frame plus a JSON manifest.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use renderer::RedrawStats;
use serde::Serialize;
use tracing::{debug, info};

/// Manifest file written next to the frames.
pub const MANIFEST_FILE: &str = "frames.json";

/// One written frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    /// Route point index, if a route was attached
    pub index: Option<usize>,
    /// Time the forecast was sampled for
    pub epoch: Option<DateTime<Utc>>,
    pub file: String,
    pub stats: RedrawStats,
}

/// Writes numbered frames into a directory.
pub struct FrameWriter {
    dir: PathBuf,
    records: Vec<FrameRecord>,
}

impl FrameWriter {
    /// Create the output directory if needed.
    pub async fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self {
            dir,
            records: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub async fn write(
        &mut self,
        index: Option<usize>,
        epoch: Option<DateTime<Utc>>,
        png: &[u8],
        stats: RedrawStats,
    ) -> Result<PathBuf> {
        let file = format!("frame_{:04}.png", self.records.len());
        let path = self.dir.join(&file);
        tokio::fs::write(&path, png)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(file = %file, index = ?index, bytes = png.len(), "Wrote frame");
        self.records.push(FrameRecord {
            index,
            epoch,
            file,
            stats,
        });
        Ok(path)
    }

    /// Write the manifest and return the records.
    pub async fn finish(self) -> Result<Vec<FrameRecord>> {
        let path = self.dir.join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(&self.records)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(frames = self.records.len(), dir = %self.dir.display(), "Frames written");
        Ok(self.records)
    }
}
