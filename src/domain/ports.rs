use crate::domain::model::{Column, ExtractionReport, OutputFormat};
use crate::step::StepFile;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Location a relative path resolves to, for reporting.
    fn resolve(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn formats(&self) -> &[OutputFormat];
    fn bundle(&self) -> bool;
    fn sort_by(&self) -> Option<Column>;
    fn geometric_limits(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<StepFile>;
    async fn transform(&self, file: StepFile) -> Result<ExtractionReport>;
    async fn load(&self, report: &ExtractionReport) -> Result<Vec<String>>;
}
