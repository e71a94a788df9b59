use anyhow::{Context, Result};
use shared::{EngineConfig, GenerationMetrics, MetricsLine};
use sim::{Observer, Simulation};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Load the engine configuration, falling back to defaults without a file
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        tracing::info!("No EVO_CONFIG set, using default configuration");
        return Ok(EngineConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Observer appending one JSON line per generation
pub struct MetricsWriter {
    run_id: Uuid,
    out: BufWriter<File>,
    error: Option<std::io::Error>,
}

impl MetricsWriter {
    pub fn create(path: &Path, run_id: Uuid) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open metrics file {}", path.display()))?;

        Ok(Self {
            run_id,
            out: BufWriter::new(file),
            error: None,
        })
    }

    fn write(&mut self, metrics: &GenerationMetrics) -> std::io::Result<()> {
        let line = MetricsLine::new(self.run_id.to_string(), metrics.clone()).to_json_line()?;
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    /// Surface the first write error, if any
    pub fn finish(mut self) -> Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e).context("Failed to write metrics");
        }
        self.out.flush().context("Failed to flush metrics")
    }
}

impl Observer for MetricsWriter {
    fn on_generation(&mut self, metrics: &GenerationMetrics) {
        tracing::info!(
            "Generation {}: best {:.2}, mean {:.2}, {} survivors",
            metrics.generation,
            metrics.fitness.max,
            metrics.fitness.mean,
            metrics.survivors
        );

        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write(metrics) {
            tracing::error!("Failed to write metrics line: {}", e);
            self.error = Some(e);
        }
    }
}

pub struct Runner {
    run_id: Uuid,
    config: EngineConfig,
    metrics_path: PathBuf,
    checkpoint_path: Option<PathBuf>,
}

impl Runner {
    pub fn new(config: EngineConfig, metrics_path: PathBuf, checkpoint_path: Option<PathBuf>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config,
            metrics_path,
            checkpoint_path,
        }
    }

    /// Run the whole simulation, then write the best genome if asked to
    pub fn run(self) -> Result<sim::RunSummary> {
        tracing::info!("Run ID: {}", self.run_id);
        tracing::info!("Metrics: {}", self.metrics_path.display());

        let mut simulation = Simulation::new(self.config).context("Invalid configuration")?;
        let mut writer = MetricsWriter::create(&self.metrics_path, self.run_id)?;

        let summary = simulation.run(&mut writer).context("Simulation failed")?;
        writer.finish()?;

        if summary.termination.win {
            tracing::info!(
                "Chest opened after {} generations",
                summary.termination.generations
            );
        } else {
            tracing::info!(
                "Finished {} generations without opening the chest",
                summary.termination.generations
            );
        }

        if let (Some(path), Some(genome)) = (&self.checkpoint_path, &summary.best_genome) {
            let json = serde_json::to_string_pretty(genome).context("Failed to encode genome")?;
            fs::write(path, json)
                .with_context(|| format!("Failed to write checkpoint {}", path.display()))?;
            tracing::info!("Best genome written to {}", path.display());
        }

        Ok(summary)
    }
}
