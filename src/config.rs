use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
/// 10 MiB, the multipart upload cap.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 << 20;
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 8;
/// 100 megapixels of requested output.
pub const DEFAULT_MAX_OUTPUT_PIXELS: u64 = 100_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerCfg {
    pub bind: String,
    pub max_upload_bytes: usize,
    /// Decode/resize/encode jobs allowed to run at once; extra requests wait.
    pub max_concurrent_jobs: usize,
    /// Largest `width * height` a request may ask for.
    pub max_output_pixels: u64,
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            max_output_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "resize-api", version, about = "Resize and re-encode uploaded images over HTTP")]
pub struct Cli {
    /// YAML file with server settings; flags given on the command line win.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    pub bind: Option<String>,

    /// Maximum multipart body size, in MiB.
    #[arg(long)]
    pub max_upload_mb: Option<usize>,

    #[arg(long)]
    pub max_concurrent_jobs: Option<usize>,

    /// Largest output width * height accepted.
    #[arg(long)]
    pub max_output_pixels: Option<u64>,
}

impl Cli {
    pub async fn resolve(&self) -> Result<ServerCfg> {
        let base = match &self.config {
            Some(path) => load_file(path).await?,
            None => ServerCfg::default(),
        };
        Ok(self.apply_overrides(base))
    }

    fn apply_overrides(&self, mut cfg: ServerCfg) -> ServerCfg {
        if let Some(bind) = &self.bind {
            cfg.bind = bind.clone();
        }
        if let Some(mb) = self.max_upload_mb {
            cfg.max_upload_bytes = mb.saturating_mul(1 << 20);
        }
        if let Some(n) = self.max_concurrent_jobs {
            cfg.max_concurrent_jobs = n;
        }
        if let Some(px) = self.max_output_pixels {
            cfg.max_output_pixels = px;
        }
        cfg
    }
}

pub async fn load_file(path: &Path) -> Result<ServerCfg> {
    let txt = tokio::fs::read_to_string(path)
        .await
        .context(format!("Failed to read config file: {}", path.display()))?;
    let cfg: ServerCfg = serde_yaml::from_str(&txt).context("Failed to parse config YAML")?;
    Ok(cfg)
}
