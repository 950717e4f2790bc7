use clap::Parser;
use gdt_extract::core::pipeline::StepPipeline;
use gdt_extract::core::Storage;
use gdt_extract::export::render_table;
use gdt_extract::utils::error::{ErrorSeverity, GdtError};
use gdt_extract::utils::{logger, validation::Validate};
use gdt_extract::{CliConfig, ExtractionEngine, LocalStorage, RunConfig, RunOutcome};

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_error(context: &str, e: &GdtError) {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
}

fn display_config_summary(config: &RunConfig) {
    let formats: Vec<String> = config.formats.iter().map(|f| f.to_string()).collect();
    tracing::info!("📋 Inputs: {}", config.inputs.len());
    tracing::info!("📁 Output path: {}", config.output_path);
    tracing::info!(
        "📄 Formats: {}{}",
        formats.join(", "),
        if config.bundle { " (zip bundle)" } else { "" }
    );
    if let Some(column) = config.sort_by {
        tracing::info!("↕️ Sort by: {:?}", column);
    }
    tracing::info!("📐 Geometric limits: {}", config.geometric_limits);
}

fn pipeline_for(input: &str, config: &RunConfig) -> StepPipeline<LocalStorage, RunConfig> {
    StepPipeline::new(
        input,
        LocalStorage::new("."),
        LocalStorage::new(config.output_path.clone()),
        config.clone(),
    )
}

fn print_outcome(input: &str, outcome: &RunOutcome, show_table: bool) {
    let summary = &outcome.report.summary;
    if show_table {
        println!("\n{}", input);
        print!("{}", render_table(&outcome.report.rows));
    }
    println!(
        "✅ {}: {} geometric, {} dimensional ({} with datums), {} datums, {} total",
        input,
        summary.geometric,
        summary.dimensional,
        summary.dimensional_with_datum,
        summary.datums,
        summary.total
    );
    for path in &outcome.outputs {
        println!("📁 Output saved to: {}", path);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting gdt-extract");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.resolve().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            report_error("Configuration validation failed", &e);
            std::process::exit(exit_code(e.severity()));
        }
    };

    display_config_summary(&config);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be read or written");
        let sink = LocalStorage::new(config.output_path.clone());
        for input in &config.inputs {
            for name in pipeline_for(input, &config).planned_outputs() {
                println!("{} -> {}", input, sink.resolve(&name));
            }
        }
        return Ok(());
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let mut worst: Option<ErrorSeverity> = None;
    for input in &config.inputs {
        let engine =
            ExtractionEngine::new_with_monitoring(pipeline_for(input, &config), config.monitor);

        match engine.run().await {
            Ok(outcome) => print_outcome(input, &outcome, config.show_table),
            Err(e) => {
                report_error(&format!("Processing {} failed", input), &e);
                worst = worst.max(Some(e.severity()));
            }
        }
    }

    if let Some(severity) = worst {
        let code = exit_code(severity);
        if code > 0 {
            std::process::exit(code);
        }
    }

    Ok(())
}
