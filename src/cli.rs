//! Flags shared by the `load_and_plot`, `preprocess`, `erp` and `tfr`
//! binaries.
use std::path::PathBuf;
use anyhow::Result;
use clap::Args;

use crate::config::{AnalysisConfig, DataConfig};
use crate::render::{renderer_for, Renderer};

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Raw .fif recording (default: the MNE sample recording)
    #[arg(long)]
    pub raw: Option<PathBuf>,

    /// JSON file overriding analysis defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Root of the MNE sample dataset (overrides ERPKIT_DATA / MNE_DATA)
    #[arg(long)]
    pub data_root: Option<PathBuf>,

    /// Write plots as PNG files here instead of only logging them
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CommonArgs {
    /// Set up `env_logger` at the requested verbosity.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::new()
            .filter_level(level)
            .format_timestamp(None)
            .init();
    }

    pub fn data_config(&self) -> DataConfig {
        DataConfig { sample_root: self.data_root.clone() }
    }

    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        AnalysisConfig::load(self.config.as_deref())
    }

    pub fn renderer(&self) -> Result<Box<dyn Renderer>> {
        renderer_for(self.plot_dir.as_deref())
    }
}
