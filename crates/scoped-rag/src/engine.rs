//! Query orchestration
//!
//! Each query moves through `Ready -> Retrieving -> Generating -> Responded`,
//! skipping generation when nothing meets the relevance threshold. Queries
//! hold no state across calls and read a shared registry snapshot, so any
//! number may run concurrently with each other and with a refresh.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::access::{AccessPolicy, AccessRouter, Route};
use crate::config::{EmbeddingBackend, RagConfig};
use crate::error::{Error, Result};
use crate::generation::{ContextAssembler, OllamaClient, PromptBuilder};
use crate::index::{IndexPartitionManager, IndexRegistry, RegistryStats};
use crate::ingestion::{IngestPipeline, IngestReport};
use crate::providers::{
    EmbeddingProvider, GenerationOracle, HashingEmbedder, IndexBackend, MemoryBackend,
    OllamaEmbedder, OllamaOracle,
};
use crate::retrieval::RetrievalEngine;
use crate::types::{Query, QueryResponse, RetrievalResult};

/// Engine lifecycle as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No registry published yet; queries fail
    Uninitialized,
    /// A registry is published; queries are served
    Ready,
}

/// Per-query phase, logged with the correlation id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryPhase {
    Retrieving,
    Generating,
    Responded,
}

impl QueryPhase {
    fn as_str(self) -> &'static str {
        match self {
            QueryPhase::Retrieving => "retrieving",
            QueryPhase::Generating => "generating",
            QueryPhase::Responded => "responded",
        }
    }
}

/// Result of one ingestion and index build pass
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    /// Ingestion report
    pub ingest: IngestReport,
    /// Published registry
    pub indexes: RegistryStats,
    /// Wall time of the whole pass
    pub duration_ms: u64,
}

/// Role-scoped question answering engine
pub struct QueryEngine {
    data_dir: PathBuf,
    pipeline: IngestPipeline,
    indexes: IndexPartitionManager,
    router: AccessRouter,
    retrieval: RetrievalEngine,
    assembler: ContextAssembler,
    oracle: Arc<dyn GenerationOracle>,
    generation_timeout: Duration,
}

impl QueryEngine {
    /// Create an engine with injected collaborators
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        backend: Arc<dyn IndexBackend>,
        oracle: Arc<dyn GenerationOracle>,
    ) -> Result<Self> {
        config.validate()?;
        let policy = Arc::new(AccessPolicy::from_config(&config.access)?);
        tracing::debug!(
            "Access roles: {} (fallback '{}')",
            policy.roles().collect::<Vec<_>>().join(", "),
            policy.fallback_role()
        );

        Ok(Self {
            data_dir: config.ingestion.data_dir.clone(),
            pipeline: IngestPipeline::new(&config.ingestion)?,
            indexes: IndexPartitionManager::new(
                backend,
                Arc::clone(&embedder),
                config.embeddings.batch_size,
            ),
            router: AccessRouter::new(policy),
            retrieval: RetrievalEngine::from_config(embedder, &config.retrieval),
            assembler: ContextAssembler::new(config.retrieval.preview_chars),
            oracle,
            generation_timeout: Duration::from_secs(config.llm.timeout_secs),
        })
    }

    /// Create an engine with the configured embedding provider, the in-memory
    /// index backend and the Ollama oracle
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let client = Arc::new(OllamaClient::new(&config.llm)?);

        let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.provider {
            EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embeddings.dimensions)?),
            EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(
                Arc::clone(&client),
                config.embeddings.dimensions,
            )),
        };
        let oracle = Arc::new(OllamaOracle::new(client));

        tracing::info!(
            "Engine providers: embeddings={}, oracle={} ({})",
            embedder.name(),
            oracle.name(),
            oracle.model()
        );

        Self::new(config, embedder, Arc::new(MemoryBackend::new()), oracle)
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        if self.indexes.current().is_some() {
            EngineState::Ready
        } else {
            EngineState::Uninitialized
        }
    }

    /// Whether queries are served
    pub fn is_ready(&self) -> bool {
        self.state() == EngineState::Ready
    }

    /// Whether a refresh is running
    pub fn is_building(&self) -> bool {
        self.indexes.is_building()
    }

    /// Access policy in force
    pub fn policy(&self) -> &AccessPolicy {
        self.router.policy()
    }

    /// Published registry, if any
    pub fn registry(&self) -> Option<Arc<IndexRegistry>> {
        self.indexes.current()
    }

    /// Generation oracle
    pub fn oracle(&self) -> &Arc<dyn GenerationOracle> {
        &self.oracle
    }

    /// Configured document root
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Rebuild from the configured document root
    pub async fn refresh(&self) -> Result<RefreshSummary> {
        let root = self.data_dir.clone();
        self.refresh_from(&root).await
    }

    /// Ingest `root`, build every store and publish the new registry.
    ///
    /// Fails with [`Error::BuildInProgress`] if another refresh is running. If
    /// ingestion fails the previous registry stays published.
    pub async fn refresh_from(&self, root: &Path) -> Result<RefreshSummary> {
        let started = Instant::now();
        let _guard = self.indexes.begin_build()?;
        tracing::info!("Refreshing indexes from {}", root.display());

        let (chunks, ingest) = self.pipeline.run_blocking(root.to_path_buf()).await?;
        if !ingest.failures.is_empty() {
            tracing::warn!("{} files failed to ingest", ingest.failures.len());
        }

        let registry = self.indexes.build(&chunks).await;
        let registry = self.indexes.publish(registry);

        let summary = RefreshSummary {
            ingest,
            indexes: registry.stats(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Refresh complete: generation {}, {} chunks in {} ms",
            summary.indexes.generation,
            summary.ingest.total_chunks(),
            summary.duration_ms
        );
        Ok(summary)
    }

    /// Resolve the role and search, without generating
    pub async fn retrieve(&self, query: &Query) -> Result<(Route, RetrievalResult)> {
        let registry = self.indexes.current().ok_or(Error::Uninitialized)?;
        let route = self.router.resolve(&query.role, &registry);
        let result = self.retrieval.search(&query.text, &route).await;
        Ok((route, result))
    }

    /// Answer a question under the query's role
    pub async fn answer(&self, query: &Query) -> Result<QueryResponse> {
        let correlation_id = Uuid::new_v4();
        let started = Instant::now();
        let user = query.username.as_deref().unwrap_or("anonymous");

        tracing::info!(
            target: "audit",
            %correlation_id,
            user,
            role = %query.role,
            "Query received: {}",
            query.text
        );

        let registry = match self.indexes.current() {
            Some(registry) => registry,
            None => {
                tracing::error!(target: "audit", %correlation_id, user, "Query failed: {}", Error::Uninitialized);
                return Err(Error::Uninitialized);
            }
        };

        log_phase(correlation_id, QueryPhase::Retrieving);
        let route = self.router.resolve(&query.role, &registry);
        let result = self.retrieval.search(&query.text, &route).await;
        tracing::debug!(
            %correlation_id,
            route = %route.label(),
            matches = result.len(),
            "Retrieval finished"
        );

        if result.is_empty() {
            log_phase(correlation_id, QueryPhase::Responded);
            let response = QueryResponse::not_found(correlation_id, elapsed_ms(started));
            tracing::info!(
                target: "audit",
                %correlation_id,
                user,
                "Query succeeded in {} ms with 0 sources",
                response.processing_time_ms
            );
            return Ok(response);
        }

        log_phase(correlation_id, QueryPhase::Generating);
        let assembled = self.assembler.assemble(&result);
        let prompt = PromptBuilder::build_role_prompt(&query.role, &query.text, &assembled.context);

        let generated = match tokio::time::timeout(self.generation_timeout, self.oracle.generate(&prompt)).await {
            Ok(generated) => generated,
            Err(_) => Err(Error::generation(format!(
                "{} timed out after {:?}",
                self.oracle.name(),
                self.generation_timeout
            ))),
        };

        log_phase(correlation_id, QueryPhase::Responded);
        match generated {
            Ok(answer) => {
                let response = QueryResponse::answered(
                    answer,
                    assembled.citations,
                    correlation_id,
                    elapsed_ms(started),
                );
                tracing::info!(
                    target: "audit",
                    %correlation_id,
                    user,
                    "Query succeeded in {} ms with {} sources",
                    response.processing_time_ms,
                    response.citations.len()
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(%correlation_id, "Generation failed, returning degraded answer: {}", e);
                tracing::error!(target: "audit", %correlation_id, user, "Query failed: {}", e);
                Ok(QueryResponse::degraded(correlation_id, elapsed_ms(started)))
            }
        }
    }
}

fn log_phase(correlation_id: Uuid, phase: QueryPhase) {
    tracing::debug!(%correlation_id, phase = phase.as_str(), "Query phase");
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryOutcome;
    use async_trait::async_trait;
    use std::fs;

    struct EchoOracle;

    #[async_trait]
    impl GenerationOracle for EchoOracle {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(format!("answered from {} bytes of prompt", prompt.len()))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl GenerationOracle for FailingOracle {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(Error::generation("service unavailable"))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn model(&self) -> &str {
            "none"
        }
    }

    struct SlowOracle;

    #[async_trait]
    impl GenerationOracle for SlowOracle {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "slow"
        }

        fn model(&self) -> &str {
            "slow"
        }
    }

    fn engine(oracle: Arc<dyn GenerationOracle>) -> QueryEngine {
        let mut config = RagConfig::default();
        config.llm.timeout_secs = 5;
        QueryEngine::new(
            &config,
            Arc::new(HashingEmbedder::new(256).unwrap()),
            Arc::new(MemoryBackend::new()),
            oracle,
        )
        .unwrap()
    }

    fn data_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (dept, file, text) in [
            ("finance", "budget.md", "Quarterly revenue grew twelve percent."),
            ("hr", "leave.md", "Employees receive twenty days annual leave."),
        ] {
            fs::create_dir_all(dir.path().join(dept)).unwrap();
            fs::write(dir.path().join(dept).join(file), text).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_query_before_refresh_is_uninitialized() {
        let engine = engine(Arc::new(EchoOracle));
        assert_eq!(engine.state(), EngineState::Uninitialized);
        let err = engine.answer(&Query::new("revenue", "finance")).await.unwrap_err();
        assert!(matches!(err, Error::Uninitialized));
        assert!(matches!(
            engine.retrieve(&Query::new("revenue", "finance")).await,
            Err(Error::Uninitialized)
        ));
    }

    #[tokio::test]
    async fn test_answer_with_citations() {
        let engine = engine(Arc::new(EchoOracle));
        let dir = data_tree();
        let summary = engine.refresh_from(dir.path()).await.unwrap();
        assert_eq!(summary.indexes.generation, 1);
        assert!(engine.is_ready());

        let response = engine
            .answer(&Query::new("quarterly revenue", "finance").with_username("alice"))
            .await
            .unwrap();
        assert_eq!(response.outcome, QueryOutcome::Answered);
        assert!(response.answer.starts_with("answered from"));
        assert_eq!(response.citations.len(), 1);
        assert_eq!(response.citations[0].filename, "budget.md");
    }

    #[tokio::test]
    async fn test_no_match_skips_generation() {
        let engine = engine(Arc::new(FailingOracle));
        let dir = data_tree();
        engine.refresh_from(dir.path()).await.unwrap();

        let response = engine.answer(&Query::new("annual leave", "finance")).await.unwrap();
        assert_eq!(response.outcome, QueryOutcome::NoMatches);
        assert!(response.citations.is_empty());
    }

    #[tokio::test]
    async fn test_oracle_failure_degrades() {
        let engine = engine(Arc::new(FailingOracle));
        let dir = data_tree();
        engine.refresh_from(dir.path()).await.unwrap();

        let response = engine.answer(&Query::new("annual leave", "hr")).await.unwrap();
        assert_eq!(response.outcome, QueryOutcome::Degraded);
        assert_eq!(response.answer, crate::types::response::DEGRADED_ANSWER);
        assert!(response.citations.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_timeout_degrades() {
        let engine = engine(Arc::new(SlowOracle));
        let dir = data_tree();
        engine.refresh_from(dir.path()).await.unwrap();

        let response = engine.answer(&Query::new("annual leave", "hr")).await.unwrap();
        assert_eq!(response.outcome, QueryOutcome::Degraded);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_registry() {
        let engine = engine(Arc::new(EchoOracle));
        let dir = data_tree();
        engine.refresh_from(dir.path()).await.unwrap();

        let missing = dir.path().join("missing");
        assert!(engine.refresh_from(&missing).await.is_err());
        assert_eq!(engine.registry().unwrap().generation(), 1);
        assert!(!engine.is_building());
    }
}
