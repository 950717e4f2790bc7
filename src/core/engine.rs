use crate::core::Pipeline;
use crate::domain::model::ExtractionReport;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: ExtractionReport,
    pub outputs: Vec<String>,
}

pub struct ExtractionEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ExtractionEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        self.monitor.log_phase("Start", "no input read");

        tracing::info!("📥 Parsing STEP data...");
        let file = self.pipeline.extract().await?;
        tracing::info!("Parsed {} entities", file.len());
        if file.is_empty() {
            tracing::warn!("No entity instances found in input");
        }
        self.monitor
            .log_phase("Extract", &format!("{} entities", file.len()));

        tracing::info!("🔄 Extracting tolerances...");
        let report = self.pipeline.transform(file).await?;
        tracing::info!(
            "Found {} geometric, {} dimensional, {} datums",
            report.summary.geometric,
            report.summary.dimensional,
            report.summary.datums
        );
        self.monitor
            .log_phase("Transform", &format!("{} rows", report.rows.len()));

        tracing::info!("💾 Writing outputs...");
        let outputs = self.pipeline.load(&report).await?;
        for path in &outputs {
            tracing::info!("📁 Output saved to: {}", path);
        }
        self.monitor
            .log_phase("Load", &format!("{} files", outputs.len()));

        if self.monitor.is_enabled() {
            self.monitor.log_final_stats();
        }
        tracing::debug!("Run finished in {:?}", self.monitor.elapsed());

        Ok(RunOutcome { report, outputs })
    }
}
