pub mod config;
pub mod core;
pub mod domain;
pub mod export;
pub mod extract;
pub mod step;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig, RunConfig};

pub use core::{
    engine::{ExtractionEngine, RunOutcome},
    pipeline::StepPipeline,
};
pub use domain::model::{Column, ExtractionReport, OutputFormat, Summary, ToleranceRow};
pub use step::StepFile;
pub use utils::error::{GdtError, Result};
