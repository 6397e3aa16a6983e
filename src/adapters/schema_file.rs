use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use eyre::{Context, Result};
use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::{
    config::{loader::load_config, models::HydratorConfig},
    ports::SchemaProvider,
};

/// Schema provider that loads a local file and watches it for changes.
pub struct FileSchemaProvider {
    path: PathBuf,
    // Kept alive for as long as the provider lives
    _watcher: Option<notify::RecommendedWatcher>,
    update_tx: mpsc::Sender<()>,
    // Taken once by `watch()`
    update_rx: Mutex<Option<mpsc::Receiver<()>>>,
}

impl FileSchemaProvider {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let (tx, rx) = mpsc::channel(1);

        let mut provider = Self {
            path: path.into(),
            _watcher: None,
            update_tx: tx,
            update_rx: Mutex::new(Some(rx)),
        };

        provider.init_watcher()?;
        Ok(provider)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn init_watcher(&mut self) -> Result<()> {
        let tx = self.update_tx.clone();
        let schema_filename = self
            .path
            .file_name()
            .ok_or_else(|| eyre::eyre!("Invalid schema path: {}", self.path.display()))?
            .to_owned();

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                match res {
                    Ok(event) => {
                        if (event.kind.is_modify()
                            || event.kind.is_create()
                            || event.kind.is_remove())
                            && event
                                .paths
                                .iter()
                                .any(|p| p.file_name() == Some(&schema_filename))
                        {
                            tracing::debug!(kind = ?event.kind, "Schema file changed");
                            // A pending signal already covers this change
                            let _ = tx.try_send(());
                        }
                    }
                    Err(e) => tracing::error!("Schema watch error: {:?}", e),
                }
            })?;

        let watch_dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        watcher
            .watch(watch_dir, RecursiveMode::NonRecursive)
            .wrap_err("Failed to watch schema directory")?;

        self._watcher = Some(watcher);
        Ok(())
    }
}

#[async_trait]
impl SchemaProvider for FileSchemaProvider {
    async fn load_config(&self) -> Result<HydratorConfig> {
        let path_str = self
            .path
            .to_str()
            .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", self.path.display()))?;
        load_config(path_str).await
    }

    fn watch(&self) -> mpsc::Receiver<()> {
        let taken = self.update_rx.lock().ok().and_then(|mut rx| rx.take());

        taken.unwrap_or_else(|| {
            tracing::warn!("Schema watch channel already taken; returning a closed channel");
            let (_tx, rx) = mpsc::channel(1);
            rx
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Write};

    use tempfile::tempdir;
    use tokio::time::{Duration, sleep};

    use super::*;

    const INITIAL: &str = r#"
listen_addr: "127.0.0.1:8080"
dtos:
  - name: Ping
    fields:
      - name: id
        source: "parameter:id"
        type: string
"#;

    #[tokio::test]
    async fn test_file_schema_provider() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("schema.yaml");

        {
            let mut file = File::create(&file_path)?;
            file.write_all(INITIAL.as_bytes())?;
        }

        let provider = FileSchemaProvider::new(&file_path)?;
        let config = provider.load_config().await?;
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.dtos.len(), 1);

        let mut rx = provider.watch();

        sleep(Duration::from_millis(100)).await;

        {
            let mut file = File::create(&file_path)?;
            file.write_all(INITIAL.replace("8080", "9090").as_bytes())?;
        }

        let notification = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(notification.is_ok(), "Timed out waiting for schema update");
        assert!(
            notification.unwrap().is_some(),
            "Channel closed unexpectedly"
        );

        let config = provider.load_config().await?;
        assert_eq!(config.listen_addr, "127.0.0.1:9090");

        Ok(())
    }

    #[tokio::test]
    async fn test_watch_twice_returns_closed_channel() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("schema.yaml");
        File::create(&file_path)?.write_all(INITIAL.as_bytes())?;

        let provider = FileSchemaProvider::new(&file_path)?;
        let _first = provider.watch();
        let mut second = provider.watch();

        assert!(second.recv().await.is_none());
        Ok(())
    }
}
