use std::{
    fs::{File, OpenOptions},
    path::Path,
    sync::Mutex,
};

use tracing::Level;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Target used by every scheduled or manually triggered job.
pub const JOB_LOG_TARGET: &str = "scheduled_jobs";

const BACKEND_LOG: &str = "backend.log";
const JOBS_LOG: &str = "scheduled-jobs.log";

fn append(dir: &Path, name: &str) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(dir.join(name))
}

/// Events that belong in the jobs log.
fn job_events() -> Targets {
    Targets::new().with_target(JOB_LOG_TARGET, Level::TRACE)
}

/// Installs the global subscriber: compact stdout plus, when `log_dir` is set,
/// plain-text copies appended to `<log_dir>/backend.log` (everything) and
/// `<log_dir>/scheduled-jobs.log` (job runs only).
pub fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer().with_target(false).compact();

    let (backend_layer, jobs_layer) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let backend = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(append(dir, BACKEND_LOG)?));
            let jobs = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(append(dir, JOBS_LOG)?))
                .with_filter(job_events());
            (Some(backend), Some(jobs))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(backend_layer)
        .with(jobs_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_log_only_takes_job_events() {
        let targets = job_events();
        assert!(targets.would_enable(JOB_LOG_TARGET, &Level::INFO));
        assert!(targets.would_enable(JOB_LOG_TARGET, &Level::ERROR));
        assert!(!targets.would_enable("retail_backend::services::sales_service", &Level::INFO));
    }
}
