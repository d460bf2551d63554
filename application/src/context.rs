//! Explicit wiring of the resolution core.
//!
//! [`ResolutionContext`] owns one instance of every engine and hands out
//! use cases built on them. There is no global registry: callers build a
//! context once and pass it where it is needed.

use crate::config::ResolverConfig;
use crate::ports::category_repository::{
    CategoryError, CategoryRepository, InMemoryCategoryRepository,
};
use crate::ports::event_logger::{NoEventLogger, ResolutionEventLogger};
use crate::ports::strategy_source::StrategySource;
use crate::ports::worktree_backend::WorktreeBackend;
use crate::use_cases::builtin_rules::builtin_rules;
use crate::use_cases::compliance_engine::{ComplianceEngine, RuleRegistration};
use crate::use_cases::generate_strategies::{GenerateStrategiesUseCase, RuleBasedStrategySource};
use crate::use_cases::parallel_coordinator::ParallelCoordinator;
use crate::use_cases::resolve_conflict::ResolveConflictUseCase;
use crate::use_cases::rollback::RollbackUseCase;
use crate::use_cases::task_graph::TaskGraphManager;
use crate::use_cases::validation::ValidationPipeline;
use crate::use_cases::worktree_allocator::WorktreeAllocator;
use resolver_domain::category::resolve_category_id;
use resolver_domain::{ConstitutionalRule, CoordinationStrategy};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ResolutionContext {
    pub config: ResolverConfig,
    pub engine: Arc<ComplianceEngine>,
    pub generator: Arc<GenerateStrategiesUseCase>,
    pub pipeline: Arc<ValidationPipeline>,
    pub tasks: Arc<TaskGraphManager>,
    pub allocator: Option<Arc<WorktreeAllocator>>,
    pub coordinator: Arc<ParallelCoordinator>,
    pub categories: Arc<dyn CategoryRepository>,
    pub logger: Arc<dyn ResolutionEventLogger>,
    /// Outcome of registering the built-in and extra rules.
    pub rule_registration: RuleRegistration,
}

impl ResolutionContext {
    pub fn builder(config: ResolverConfig) -> ResolutionContextBuilder {
        ResolutionContextBuilder::new(config)
    }

    pub fn resolver(&self, strategy: CoordinationStrategy) -> ResolveConflictUseCase {
        ResolveConflictUseCase::new(
            Arc::clone(&self.generator),
            Arc::clone(&self.pipeline),
            Arc::clone(&self.coordinator),
        )
        .with_strategy(strategy)
    }

    pub fn rollback(&self) -> RollbackUseCase {
        RollbackUseCase::new(Arc::clone(&self.tasks)).with_event_logger(Arc::clone(&self.logger))
    }

    /// Resolve a human-readable category name through the category backend.
    pub async fn category_id(&self, name: &str) -> Result<Option<i64>, CategoryError> {
        let categories = self.categories.get_all_categories().await?;
        Ok(resolve_category_id(&categories, name))
    }
}

pub struct ResolutionContextBuilder {
    config: ResolverConfig,
    source: Option<Arc<dyn StrategySource>>,
    worktree_backend: Option<Arc<dyn WorktreeBackend>>,
    categories: Option<Arc<dyn CategoryRepository>>,
    logger: Arc<dyn ResolutionEventLogger>,
    rules: Vec<ConstitutionalRule>,
}

impl ResolutionContextBuilder {
    fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            source: None,
            worktree_backend: None,
            categories: None,
            logger: Arc::new(NoEventLogger),
            rules: Vec::new(),
        }
    }

    /// Draft strategies through `source` instead of the rule-based default.
    pub fn with_strategy_source(mut self, source: Arc<dyn StrategySource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Run tasks in worktrees created by `backend`.
    pub fn with_worktree_backend(mut self, backend: Arc<dyn WorktreeBackend>) -> Self {
        self.worktree_backend = Some(backend);
        self
    }

    pub fn with_categories(mut self, categories: Arc<dyn CategoryRepository>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn ResolutionEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Register rules on top of (or instead of) the built-in set.
    pub fn with_rules(mut self, rules: Vec<ConstitutionalRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn build(self) -> ResolutionContext {
        let config = self.config;
        let logger = self.logger;

        let engine = ComplianceEngine::new(config.compliance.history_capacity)
            .with_event_logger(Arc::clone(&logger));
        let mut rules = if config.compliance.include_builtin_rules {
            builtin_rules()
        } else {
            Vec::new()
        };
        rules.extend(self.rules);
        let rule_registration = engine.register_rules(rules);
        for (rule_id, reason) in &rule_registration.rejected {
            warn!("Rule {} rejected: {}", rule_id, reason);
        }
        let engine = Arc::new(engine);

        let source = self
            .source
            .unwrap_or_else(|| Arc::new(RuleBasedStrategySource));
        let generator = Arc::new(
            GenerateStrategiesUseCase::new(source)
                .with_params(config.generation.clone())
                .with_event_logger(Arc::clone(&logger)),
        );
        let pipeline = Arc::new(
            ValidationPipeline::new(Arc::clone(&engine)).with_thresholds(config.validation.clone()),
        );
        let tasks = Arc::new(
            TaskGraphManager::new()
                .with_compliance(Arc::clone(&engine))
                .with_event_logger(Arc::clone(&logger)),
        );
        let allocator = self.worktree_backend.map(|backend| {
            Arc::new(WorktreeAllocator::new(
                backend,
                config.coordination.worktree_root.clone(),
            ))
        });

        let mut coordinator = ParallelCoordinator::new(Arc::clone(&tasks))
            .with_params(config.coordination.clone())
            .with_event_logger(Arc::clone(&logger));
        if let Some(allocator) = &allocator {
            coordinator = coordinator.with_allocator(Arc::clone(allocator));
        }

        info!(
            "Resolution context ready: {} rule(s), worktrees {}",
            rule_registration.registered,
            if allocator.is_some() { "enabled" } else { "disabled" }
        );

        ResolutionContext {
            config,
            engine,
            generator,
            pipeline,
            tasks,
            allocator,
            coordinator: Arc::new(coordinator),
            categories: self
                .categories
                .unwrap_or_else(|| Arc::new(InMemoryCategoryRepository::default())),
            logger,
            rule_registration,
        }
    }
}
