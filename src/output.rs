//! Persistence for search results and tiers.
//!
//! Everything is pretty-printed JSON under one output directory:
//!
//! ```text
//! out.json                                  canonical merged dataset
//! archive/<stamp>-page-<n>.json             raw page responses
//! archive/<stamp>-final.json                merged dataset snapshot
//! archive/filter/<stamp>-<t> rating.json    tier archive
//! <t> rating.json                           latest tier
//! Failed ratings.json                       businesses below every threshold
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::model::{Dataset, ScoredBusiness};
use crate::tier::Tier;

pub const CANONICAL_FILE: &str = "out.json";
pub const FAILED_FILE: &str = "Failed ratings.json";

/// Serializes `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;

    debug!(path = %path.display(), "Wrote JSON");
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// File layout for one run, keyed by its stamp.
pub struct Archive {
    root: PathBuf,
    stamp: String,
}

impl Archive {
    pub fn new(root: impl Into<PathBuf>, stamp: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            stamp: stamp.into(),
        }
    }

    pub fn canonical_path(&self) -> PathBuf {
        self.root.join(CANONICAL_FILE)
    }

    pub fn page_path(&self, page: u32) -> PathBuf {
        self.root
            .join("archive")
            .join(format!("{}-page-{}.json", self.stamp, page))
    }

    pub fn final_path(&self) -> PathBuf {
        self.root
            .join("archive")
            .join(format!("{}-final.json", self.stamp))
    }

    pub fn tier_archive_path(&self, threshold: f64) -> PathBuf {
        self.root
            .join("archive")
            .join("filter")
            .join(format!("{}-{} rating.json", self.stamp, threshold))
    }

    pub fn tier_path(&self, threshold: f64) -> PathBuf {
        self.root.join(format!("{} rating.json", threshold))
    }

    pub fn failed_path(&self) -> PathBuf {
        self.root.join(FAILED_FILE)
    }

    /// Raw page response, exactly as received.
    pub fn write_page(&self, page: u32, body: &serde_json::Value) -> Result<()> {
        write_json(&self.page_path(page), body)
    }

    /// Snapshot in the archive plus the canonical `out.json`.
    pub fn write_dataset(&self, dataset: &Dataset) -> Result<()> {
        write_json(&self.final_path(), dataset)?;
        write_json(&self.canonical_path(), dataset)?;
        info!(path = %self.canonical_path().display(), total = dataset.total, "Dataset saved");
        Ok(())
    }

    /// Previously saved dataset, if `out.json` exists.
    pub fn load_dataset(&self) -> Result<Option<Dataset>> {
        let path = self.canonical_path();
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    pub fn write_tier(&self, tier: &Tier) -> Result<()> {
        write_json(&self.tier_archive_path(tier.threshold), tier)?;
        write_json(&self.tier_path(tier.threshold), tier)
    }

    pub fn write_failed(&self, remainder: &[ScoredBusiness]) -> Result<()> {
        write_json(&self.failed_path(), &remainder)
    }
}
