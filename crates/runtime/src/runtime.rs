//! High-level runtime orchestrator.
//!
//! The runtime owns the content provider, the character repository and the
//! resolver, and exposes a builder-based API for hosts that resolve sheets
//! and record player choices. Resolution is CPU-bound and runs on the
//! blocking pool; at most `max_parallel` passes run at once.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Semaphore, broadcast};

use rules_content::ContentFactory;
use rules_core::{
    Character, ContentProvider, Operation, OperationData, OperationId, Resolution, Resolver,
    ResolverConfig, list_pending_selections, validate_selection,
};

use crate::api::{Result, RuntimeError};
use crate::events::{EventBus, ResolutionSummary, RuntimeEvent};
use crate::repository::CharacterRepository;

/// Runtime configuration shared across the orchestrator and its tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
    /// Upper bound on concurrent resolution passes.
    pub max_parallel: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 100,
            max_parallel: 4,
        }
    }
}

impl RuntimeConfig {
    /// Reads `SHEET_EVENT_BUFFER` and `SHEET_MAX_PARALLEL`, keeping the
    /// defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(capacity) = read_env::<usize>("SHEET_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(parallel) = read_env::<usize>("SHEET_MAX_PARALLEL") {
            config.max_parallel = parallel.max(1);
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

/// Main runtime that resolves stored characters.
///
/// Cloning is cheap; clones share the provider, repository, event bus and
/// the parallelism limit.
#[derive(Clone)]
pub struct Runtime {
    config: RuntimeConfig,
    resolver: Arc<Resolver>,
    provider: Arc<dyn ContentProvider>,
    repository: Arc<dyn CharacterRepository>,
    events: EventBus,
    limiter: Arc<Semaphore>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn repository(&self) -> &Arc<dyn CharacterRepository> {
        &self.repository
    }

    /// Subscribe to resolution events
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.events.subscribe()
    }

    /// Load a stored character without resolving it.
    pub fn character(&self, id: &str) -> Result<Character> {
        Ok(self.repository.load(id)?)
    }

    pub fn save_character(&self, character: &Character) -> Result<()> {
        Ok(self.repository.save(character)?)
    }

    /// Resolve a stored character.
    pub async fn resolve(&self, id: &str) -> Result<Resolution> {
        let character = self.repository.load(id)?;
        let resolution = self.resolve_character(character).await?;
        self.events
            .publish(RuntimeEvent::Resolved(ResolutionSummary::new(id, &resolution)));
        Ok(resolution)
    }

    /// Resolve several characters in parallel.
    ///
    /// Results come back in the order of `ids`; one character failing does
    /// not affect the others.
    pub async fn resolve_many(&self, ids: &[String]) -> Vec<(String, Result<Resolution>)> {
        let tasks: Vec<_> = ids
            .iter()
            .map(|id| {
                let runtime = self.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let result = runtime.resolve(&id).await;
                    (id, result)
                })
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (id, task) in ids.iter().zip(tasks) {
            match task.await {
                Ok(outcome) => results.push(outcome),
                Err(err) => results.push((id.clone(), Err(RuntimeError::ResolverJoin(err)))),
            }
        }
        results
    }

    /// `select` operations the character still has to answer.
    pub async fn pending_selections(&self, id: &str) -> Result<Vec<Operation>> {
        let resolution = self.resolve(id).await?;
        Ok(list_pending_selections(&resolution))
    }

    /// Validate and store a choice, then return the re-resolved character.
    ///
    /// The stored record is untouched when validation fails.
    pub async fn record_selection(
        &self,
        id: &str,
        operation: OperationId,
        option: OperationId,
    ) -> Result<Resolution> {
        let character = self.repository.load(id)?;
        let current = self.resolve_character(character).await?;
        validate_selection(&current, operation, option)?;

        let updated = self.repository.update_operation_data(
            id,
            Box::new(move |data: &mut OperationData| data.record_selection(operation, option)),
        )?;
        tracing::info!(character = id, %operation, %option, "selection recorded");

        let resolution = self.resolve_character(updated).await?;
        self.events.publish(RuntimeEvent::SelectionRecorded {
            character: id.to_string(),
            operation,
            option,
            summary: ResolutionSummary::new(id, &resolution),
        });
        Ok(resolution)
    }

    /// Remove a stored choice and return the re-resolved character.
    pub async fn clear_selection(&self, id: &str, operation: OperationId) -> Result<Resolution> {
        let updated = self.repository.update_operation_data(
            id,
            Box::new(move |data: &mut OperationData| {
                data.clear_selection(operation);
            }),
        )?;
        tracing::info!(character = id, %operation, "selection cleared");

        let resolution = self.resolve_character(updated).await?;
        self.events.publish(RuntimeEvent::SelectionCleared {
            character: id.to_string(),
            operation,
            summary: ResolutionSummary::new(id, &resolution),
        });
        Ok(resolution)
    }

    /// Attach a note to an operation. Notes never change resolution.
    pub fn set_note(&self, id: &str, operation: OperationId, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.repository.update_operation_data(
            id,
            Box::new(move |data: &mut OperationData| data.set_note(operation, text)),
        )?;
        Ok(())
    }

    pub fn clear_note(&self, id: &str, operation: OperationId) -> Result<()> {
        self.repository.update_operation_data(
            id,
            Box::new(move |data: &mut OperationData| {
                data.clear_note(operation);
            }),
        )?;
        Ok(())
    }

    async fn resolve_character(&self, character: Character) -> Result<Resolution> {
        let _permit = Arc::clone(&self.limiter)
            .acquire_owned()
            .await
            .map_err(|_| RuntimeError::PoolClosed)?;

        let resolver = Arc::clone(&self.resolver);
        let provider = Arc::clone(&self.provider);
        let resolution =
            tokio::task::spawn_blocking(move || resolver.resolve(&character, &*provider))
                .await
                .map_err(RuntimeError::ResolverJoin)??;
        Ok(resolution)
    }
}

/// Builder for [`Runtime`].
///
/// Content comes either from an explicit provider or from a content
/// directory; in the latter case the directory's `config.toml` also supplies
/// the resolver configuration unless one was set explicitly.
#[derive(Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    resolver_config: Option<ResolverConfig>,
    provider: Option<Arc<dyn ContentProvider>>,
    content_dir: Option<PathBuf>,
    repository: Option<Arc<dyn CharacterRepository>>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver_config = Some(config);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn ContentProvider>) -> Self {
        self.provider = Some(provider);
        self.content_dir = None;
        self
    }

    /// Load content from a directory at build time.
    pub fn content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content_dir = Some(dir.into());
        self.provider = None;
        self
    }

    pub fn repository(mut self, repository: Arc<dyn CharacterRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<Runtime> {
        let repository = self.repository.ok_or(RuntimeError::MissingRepository)?;

        let (provider, resolver_config) = match (self.provider, self.content_dir) {
            (Some(provider), _) => (provider, self.resolver_config.unwrap_or_default()),
            (None, Some(dir)) => {
                let factory = ContentFactory::new(dir);
                let catalog = factory
                    .load_catalog()
                    .map_err(|err| RuntimeError::Content(err.into()))?;
                let resolver_config = match self.resolver_config {
                    Some(config) => config,
                    None => factory
                        .load_config()
                        .map_err(|err| RuntimeError::Content(err.into()))?,
                };
                let provider: Arc<dyn ContentProvider> = Arc::new(catalog);
                (provider, resolver_config)
            }
            (None, None) => return Err(RuntimeError::MissingProvider),
        };

        tracing::debug!(
            max_parallel = self.config.max_parallel,
            event_buffer = self.config.event_buffer_size,
            "runtime built"
        );

        Ok(Runtime {
            resolver: Arc::new(Resolver::new(resolver_config)),
            provider,
            repository,
            events: EventBus::with_capacity(self.config.event_buffer_size),
            limiter: Arc::new(Semaphore::new(self.config.max_parallel.max(1))),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCharacterRepo;

    #[test]
    fn builder_requires_repository_and_content() {
        let err = Runtime::builder().build().err().unwrap();
        assert!(matches!(err, RuntimeError::MissingRepository));

        let err = Runtime::builder()
            .repository(Arc::new(InMemoryCharacterRepo::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RuntimeError::MissingProvider));
    }

    #[test]
    fn default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.event_buffer_size, 100);
        assert_eq!(config.max_parallel, 4);
    }
}
