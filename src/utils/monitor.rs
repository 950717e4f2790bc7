use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Process usage at one point of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSample {
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub memory_percent: f32,
    pub peak_memory_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl Sampler {
    fn sample(&mut self, elapsed: Duration) -> Option<ResourceSample> {
        self.system.refresh_memory();
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        let process = self.system.process(self.pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let total_mb = self.system.total_memory() / 1024 / 1024;
        self.peak_memory_mb = self.peak_memory_mb.max(memory_mb);

        Some(ResourceSample {
            cpu_usage: process.cpu_usage(),
            memory_mb,
            memory_percent: if total_mb > 0 {
                memory_mb as f32 / total_mb as f32 * 100.0
            } else {
                0.0
            },
            peak_memory_mb: self.peak_memory_mb,
            elapsed,
        })
    }
}

/// Logs this process's CPU and memory next to what each run phase produced.
/// Disabled monitors, and builds without the `cli` feature, log nothing.
pub struct SystemMonitor {
    #[cfg(feature = "cli")]
    sampler: Option<Mutex<Sampler>>,
    start_time: Instant,
}

impl SystemMonitor {
    #[cfg(feature = "cli")]
    pub fn new(enabled: bool) -> Self {
        let sampler = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some(Mutex::new(Sampler {
                    system: System::new(),
                    pid,
                    peak_memory_mb: 0,
                })),
                Err(e) => {
                    tracing::warn!("Resource monitoring unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            sampler,
            start_time: Instant::now(),
        }
    }

    #[cfg(not(feature = "cli"))]
    pub fn new(_enabled: bool) -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    #[cfg(feature = "cli")]
    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }

    #[cfg(not(feature = "cli"))]
    pub fn is_enabled(&self) -> bool {
        false
    }

    #[cfg(feature = "cli")]
    pub fn sample(&self) -> Option<ResourceSample> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        sampler.sample(self.start_time.elapsed())
    }

    #[cfg(not(feature = "cli"))]
    pub fn sample(&self) -> Option<ResourceSample> {
        None
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// One line per phase, e.g. `Extract (1342 entities) - CPU: ...`.
    pub fn log_phase(&self, phase: &str, produced: &str) {
        if let Some(s) = self.sample() {
            tracing::info!(
                "📊 {} ({}) - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB, Time: {:?}",
                phase,
                produced,
                s.cpu_usage,
                s.memory_mb,
                s.memory_percent,
                s.peak_memory_mb,
                s.elapsed
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(s) = self.sample() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                s.elapsed,
                s.peak_memory_mb
            );
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
