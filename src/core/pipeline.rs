use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::ExtractionReport;
use crate::export;
use crate::extract::{extract_rows, ExtractOptions};
use crate::step::StepFile;
use crate::utils::error::{GdtError, Result};
use std::path::Path;

/// Extract/transform/load for a single STEP file.
pub struct StepPipeline<S: Storage, C: ConfigProvider> {
    input: String,
    source: S,
    sink: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> StepPipeline<S, C> {
    /// `source` resolves `input`, `sink` receives the rendered files.
    pub fn new(input: impl Into<String>, source: S, sink: S, config: C) -> Self {
        Self {
            input: input.into(),
            source,
            sink,
            config,
        }
    }

    /// Base name shared by every output of this input.
    pub fn output_stem(&self) -> String {
        let stem = Path::new(&self.input)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "step".to_string());
        format!("{}_tolerances", stem)
    }

    /// File names `load` will write, in order.
    pub fn planned_outputs(&self) -> Vec<String> {
        let stem = self.output_stem();
        if self.config.bundle() {
            vec![format!("{}.zip", stem)]
        } else {
            self.config
                .formats()
                .iter()
                .map(|f| format!("{}.{}", stem, f.extension()))
                .collect()
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for StepPipeline<S, C> {
    async fn extract(&self) -> Result<StepFile> {
        tracing::debug!("Reading STEP file: {}", self.source.resolve(&self.input));
        let data = self.source.read_file(&self.input).await?;
        let text = String::from_utf8_lossy(&data);

        let file = StepFile::parse(&text)?;
        if file.skipped > 0 {
            tracing::warn!(
                "Skipped {} malformed instances in {}",
                file.skipped,
                self.input
            );
        }
        Ok(file)
    }

    async fn transform(&self, file: StepFile) -> Result<ExtractionReport> {
        let options = ExtractOptions {
            geometric_limits: self.config.geometric_limits(),
        };
        let rows = extract_rows(&file, options);

        let mut report = ExtractionReport::new(self.input.clone(), file.header.schemas, rows);
        if let Some(column) = self.config.sort_by() {
            tracing::debug!("Sorting rows by {:?}", column);
            report.sort_by(column);
        }
        Ok(report)
    }

    async fn load(&self, report: &ExtractionReport) -> Result<Vec<String>> {
        if self.config.formats().is_empty() {
            return Err(GdtError::ProcessingError {
                message: format!("no output format configured for {}", self.input),
            });
        }

        let stem = self.output_stem();
        let mut rendered = Vec::with_capacity(self.config.formats().len());
        for format in self.config.formats() {
            let name = format!("{}.{}", stem, format.extension());
            rendered.push((name, export::render(*format, report)?));
        }

        if self.config.bundle() {
            let name = format!("{}.zip", stem);
            let archive = export::bundle(&rendered)?;
            self.sink.write_file(&name, &archive).await?;
            tracing::debug!("Bundled {} files into {}", rendered.len(), name);
            return Ok(vec![self.sink.resolve(&name)]);
        }

        let mut written = Vec::with_capacity(rendered.len());
        for (name, data) in &rendered {
            self.sink.write_file(name, data).await?;
            written.push(self.sink.resolve(name));
        }
        Ok(written)
    }
}
