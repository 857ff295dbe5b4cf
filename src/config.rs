use crate::pipeline::moderation::DEFAULT_MAX_UPLOAD_BYTES;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Concurrency ceiling for CPU-bound image analysis.
    pub analysis_workers: usize,
    /// Hard ceiling on accepted uploads, in bytes.
    pub max_upload_bytes: usize,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let cfg = Config {
        port: std::env::var("MODGATE_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/modgate".into()),
        analysis_workers: std::env::var("MODGATE_ANALYSIS_WORKERS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4),
        max_upload_bytes: std::env::var("MODGATE_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
    };

    if cfg.analysis_workers == 0 {
        anyhow::bail!("MODGATE_ANALYSIS_WORKERS must be at least 1");
    }

    Ok(cfg)
}
