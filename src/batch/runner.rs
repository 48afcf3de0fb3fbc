//! Sequential batch runner.

use std::collections::HashMap;
use std::time::Duration;

use super::{BatchEntry, BatchReport};
use crate::compare::Comparator;
use crate::executors::SearchExecutor;
use crate::types::requests::{Provider, QueryRequest};
use crate::types::responses::QueryResult;

/// Runs every query against every executor (and model), one call at a time.
pub struct BatchRunner {
    executors: Vec<Box<dyn SearchExecutor>>,
    delay: Duration,
    models: HashMap<Provider, Vec<String>>,
}

impl BatchRunner {
    /// Creates a runner with no delay and each executor's default model.
    pub fn new(executors: Vec<Box<dyn SearchExecutor>>) -> Self {
        Self {
            executors,
            delay: Duration::ZERO,
            models: HashMap::new(),
        }
    }

    /// Sets the pause between consecutive calls.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sweeps these models on `provider` instead of its default one.
    ///
    /// Other providers keep their default model.
    #[must_use]
    pub fn with_models(mut self, provider: Provider, models: Vec<String>) -> Self {
        if models.is_empty() {
            self.models.remove(&provider);
        } else {
            self.models.insert(provider, models);
        }
        self
    }

    /// Number of provider calls a run over `queries` queries will make.
    pub fn total_calls(&self, queries: usize) -> usize {
        let per_query: usize = self
            .executors
            .iter()
            .map(|executor| self.models.get(&executor.provider()).map_or(1, Vec::len))
            .sum();
        queries * per_query
    }

    /// Runs the batch.
    pub async fn run(&self, queries: &[String]) -> BatchReport {
        self.run_with_progress(queries, |_| {}).await
    }

    /// Runs the batch, calling `on_result` after every provider call.
    pub async fn run_with_progress<F>(&self, queries: &[String], mut on_result: F) -> BatchReport
    where
        F: FnMut(&QueryResult) + Send,
    {
        let mut report = BatchReport::start(self.delay);
        let mut first_call = true;

        for query in queries {
            let mut results = Vec::new();

            for executor in &self.executors {
                for request in self.requests_for(executor.provider(), query) {
                    if !first_call && !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    first_call = false;

                    let result = executor.search(&request).await;
                    on_result(&result);
                    results.push(result);
                }
            }

            let comparison = match results.as_slice() {
                [first, second] if first.provider != second.provider => {
                    Some(Comparator::compare(first, second))
                }
                _ => None,
            };

            tracing::info!(query = %query, calls = results.len(), "Batch query finished");

            report.entries.push(BatchEntry {
                query: query.clone(),
                results,
                comparison,
            });
        }

        report.finish();
        report
    }

    fn requests_for(&self, provider: Provider, query: &str) -> Vec<QueryRequest> {
        match self.models.get(&provider) {
            Some(models) => models
                .iter()
                .map(|model| QueryRequest::new(query).with_model(model))
                .collect(),
            None => vec![QueryRequest::new(query)],
        }
    }
}
