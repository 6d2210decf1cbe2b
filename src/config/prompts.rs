use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_yaml_bw::{Mapping, Value};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{OutreachError, Result};

/// Default agent definitions written by `init`.
pub const DEFAULT_AGENTS_YAML: &str = include_str!("defaults/agents.yaml");
/// Default task definitions written by `init`.
pub const DEFAULT_TASKS_YAML: &str = include_str!("defaults/tasks.yaml");

/// One prompt document: a YAML mapping from entity name (agent or task) to a
/// mapping of named text fields. Held as a raw ordered mapping so a
/// load-edit-save round trip preserves key order and any fields this tool
/// does not know about.
#[derive(Debug, Clone)]
pub struct PromptDoc {
    root: Mapping,
}

impl PromptDoc {
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_yaml_bw::from_str(text)?;
        let root = value.as_mapping().cloned().ok_or_else(|| {
            OutreachError::PromptStore(
                "document root must be a mapping of entity names".to_string(),
            )
        })?;
        Ok(Self { root })
    }

    pub fn names(&self) -> Vec<String> {
        self.root
            .iter()
            .filter_map(|(k, _)| k.as_str().map(str::to_string))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.root.iter().any(|(k, _)| k.as_str() == Some(name))
    }

    /// Text of one field of one entity, when both exist and the field holds
    /// a string.
    pub fn field(&self, name: &str, field: &str) -> Option<&str> {
        self.root
            .iter()
            .find(|(k, _)| k.as_str() == Some(name))
            .and_then(|(_, v)| v.as_mapping())
            .and_then(|entity| {
                entity
                    .iter()
                    .find(|(k, _)| k.as_str() == Some(field))
                    .map(|(_, v)| v)
            })
            .and_then(Value::as_str)
    }

    /// Overwrite one field of the named entity, inserting the field when the
    /// entity exists but the field does not. Unknown entities are an error:
    /// an improvement naming a nonexistent target must not grow the document.
    pub fn set_field(&mut self, name: &str, field: &str, text: &str) -> Result<()> {
        let entity = self
            .root
            .iter_mut()
            .find(|(k, _)| k.as_str() == Some(name))
            .map(|(_, v)| v)
            .ok_or_else(|| OutreachError::PromptTarget {
                target: "entity".to_string(),
                name: name.to_string(),
            })?;

        let mapping = entity.as_mapping_mut().ok_or_else(|| {
            OutreachError::PromptStore(format!("entity '{}' is not a mapping", name))
        })?;

        let text_value = serde_yaml_bw::to_value(text)?;
        if let Some((_, value)) = mapping.iter_mut().find(|(k, _)| k.as_str() == Some(field)) {
            *value = text_value;
        } else {
            mapping.insert(serde_yaml_bw::to_value(field)?, text_value);
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_bw::to_string(&self.root)?)
    }
}

/// Filesystem-backed store for the two prompt documents. Reads are whole-
/// document, writes are whole-document and atomic (temp file + rename).
///
/// Assumes a single writer: two orchestrator processes mutating the same
/// documents will race, last write wins.
pub struct PromptStore {
    agents_path: PathBuf,
    tasks_path: PathBuf,
}

impl PromptStore {
    pub fn new(agents_path: impl Into<PathBuf>, tasks_path: impl Into<PathBuf>) -> Self {
        Self {
            agents_path: agents_path.into(),
            tasks_path: tasks_path.into(),
        }
    }

    pub fn agents_path(&self) -> &Path {
        &self.agents_path
    }

    pub fn tasks_path(&self) -> &Path {
        &self.tasks_path
    }

    pub async fn load_agents(&self) -> Result<PromptDoc> {
        PromptDoc::parse(&self.read(&self.agents_path).await?)
    }

    pub async fn load_tasks(&self) -> Result<PromptDoc> {
        PromptDoc::parse(&self.read(&self.tasks_path).await?)
    }

    /// Raw document texts, for embedding into analysis prompts.
    pub async fn raw_documents(&self) -> Result<(String, String)> {
        Ok((
            self.read(&self.agents_path).await?,
            self.read(&self.tasks_path).await?,
        ))
    }

    pub async fn save_agents(&self, doc: &PromptDoc) -> Result<()> {
        self.write_atomic(&self.agents_path, &doc.to_yaml()?).await
    }

    pub async fn save_tasks(&self, doc: &PromptDoc) -> Result<()> {
        self.write_atomic(&self.tasks_path, &doc.to_yaml()?).await
    }

    /// Copy both documents into a timestamped directory under `backups_dir`.
    pub async fn backup(&self, backups_dir: &Path) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let dir = backups_dir.join(stamp.to_string());
        fs::create_dir_all(&dir).await?;

        for path in [&self.agents_path, &self.tasks_path] {
            let name = path
                .file_name()
                .ok_or_else(|| OutreachError::PromptStore(format!("bad path: {}", path.display())))?;
            fs::copy(path, dir.join(name)).await?;
        }

        info!(dir = %dir.display(), "Backed up prompt documents");
        Ok(dir)
    }

    /// Write the default documents for any that do not exist yet.
    pub async fn scaffold(&self) -> Result<bool> {
        let mut created = false;
        for (path, content) in [
            (&self.agents_path, DEFAULT_AGENTS_YAML),
            (&self.tasks_path, DEFAULT_TASKS_YAML),
        ] {
            if !path.exists() {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).await?;
                }
                self.write_atomic(path, content).await?;
                created = true;
            }
        }
        Ok(created)
    }

    async fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).await.map_err(|e| {
            OutreachError::PromptStore(format!("{}: {}", path.display(), e))
        })
    }

    async fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let tmp_path = path.with_extension("yaml.tmp");
        fs::write(&tmp_path, content).await?;

        let tmp_for_sync = tmp_path.clone();
        let sync_result = tokio::task::spawn_blocking(move || {
            std::fs::File::open(&tmp_for_sync).and_then(|file| file.sync_all())
        })
        .await;
        match sync_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Failed to sync temp file"),
            Err(e) => tracing::warn!(error = %e, "Sync task failed"),
        }

        fs::rename(&tmp_path, path).await?;
        debug!(path = %path.display(), "Wrote prompt document");
        Ok(())
    }
}
