use crate::config::config::AppConfig;
use crate::error::Result;
use crate::generation::{TextGenerator, create_text_generator};
use crate::observability::AppMetrics;
use crate::services::advisor::{HexagramAdvisor, create_hexagram_advisor};
use crate::services::functions::{FunctionExecutor, FunctionRegistry};
use crate::services::hexagram::{HexagramService, create_hexagram_service};
use crate::services::memo::{MemoService, create_memo_service};
use crate::services::memorize::{MemorizeService, create_memorize_service};
use crate::services::orchestrator::FunctionCallingOrchestrator;
use crate::services::perspective::PerspectiveService;
use crate::services::progress::{ProgressService, create_progress_service};
use crate::storage::Repositories;
use std::sync::Arc;

/// Application state containing all shared services
#[derive(Clone)]
pub struct AppState {
    /// Repositories for the configured storage backend
    pub repositories: Repositories,
    /// Request and generation counters
    pub metrics: Arc<AppMetrics>,
    /// Hexagram catalog operations
    pub hexagram_service: Arc<dyn HexagramService>,
    /// User memo operations
    pub memo_service: Arc<dyn MemoService>,
    /// Memorize subjects and cards
    pub memorize_service: Arc<dyn MemorizeService>,
    /// Flashcard progress operations
    pub progress_service: Arc<dyn ProgressService>,
    /// Six-perspective generation
    pub perspective_service: Arc<PerspectiveService>,
    /// Local function handlers exposed to the model
    pub function_executor: Arc<dyn FunctionExecutor>,
    /// Two-round function calling
    pub orchestrator: Arc<FunctionCallingOrchestrator>,
    /// Hexagram recommendation
    pub advisor: Arc<dyn HexagramAdvisor>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("repositories", &"Repositories")
            .field("hexagram_service", &"Arc<dyn HexagramService>")
            .field("memo_service", &"Arc<dyn MemoService>")
            .field("memorize_service", &"Arc<dyn MemorizeService>")
            .field("progress_service", &"Arc<dyn ProgressService>")
            .field("perspective_service", &"Arc<PerspectiveService>")
            .field("function_executor", &"Arc<dyn FunctionExecutor>")
            .field("orchestrator", &"Arc<FunctionCallingOrchestrator>")
            .field("advisor", &"Arc<dyn HexagramAdvisor>")
            .finish()
    }
}

impl AppState {
    /// Create application state around an existing generator
    pub fn new(
        config: &AppConfig,
        repositories: Repositories,
        generator: Arc<dyn TextGenerator>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        let function_executor: Arc<dyn FunctionExecutor> =
            Arc::new(FunctionRegistry::new(repositories.hexagrams.clone()));

        Self {
            hexagram_service: create_hexagram_service(repositories.hexagrams.clone()),
            memo_service: create_memo_service(repositories.memos.clone()),
            memorize_service: create_memorize_service(
                repositories.subjects.clone(),
                repositories.cards.clone(),
            ),
            progress_service: create_progress_service(repositories.progress.clone()),
            perspective_service: Arc::new(PerspectiveService::new(
                generator.clone(),
                repositories.hexagrams.clone(),
                metrics.clone(),
                &config.ai,
            )),
            orchestrator: Arc::new(FunctionCallingOrchestrator::new(
                generator.clone(),
                function_executor.clone(),
                metrics.clone(),
                &config.ai,
            )),
            advisor: create_hexagram_advisor(
                generator,
                repositories.hexagrams.clone(),
                metrics.clone(),
                &config.ai,
            ),
            function_executor,
            repositories,
            metrics,
        }
    }

    /// Create application state with the Gemini client from configuration
    pub fn build(config: &AppConfig, repositories: Repositories, metrics: Arc<AppMetrics>) -> Result<Self> {
        let generator = create_text_generator(&config.ai)?;
        Ok(Self::new(config, repositories, generator, metrics))
    }
}
