//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure expected directories exist; warn on missing optional ones.
///
/// `frontend_dir` holds the built signup UI and is optional. `data_dir`
/// receives progress snapshots, resume tokens and the mail outbox, so it is
/// created when missing.
pub async fn ensure_env(frontend_dir: &str, data_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(frontend_dir).await.is_err() {
        warn!(%frontend_dir, "frontend assets directory not found; static assets may 404");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_env_creates_data_dir() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let data = tmp.path().join("nested/data");
        let data = data.to_string_lossy().to_string();
        ensure_env("does-not-exist-dist", &data).await?;
        assert!(tokio::fs::metadata(&data).await?.is_dir());
        Ok(())
    }
}
