//! Ordered fallback chains.
//!
//! A chain is a list of named steps tried strictly in order. The first step
//! that yields `Ok(Some(_))` wins; `Ok(None)` and `Err(_)` both advance to the
//! next step. Step futures are lazy, so steps after the winner never run.

use crate::errors::FetchError;
use crate::metrics_defs::FALLBACK_RESOLVED;
use shared::counter;
use std::future::Future;
use std::pin::Pin;

pub type StepFuture<'a, T> = Pin<Box<dyn Future<Output = Result<Option<T>, FetchError>> + Send + 'a>>;

/// Value produced by a chain together with the tag of the step that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved<T> {
    pub source: &'static str,
    pub value: T,
}

pub struct FallbackChain<'a, T> {
    name: &'static str,
    steps: Vec<(&'static str, StepFuture<'a, T>)>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new(name: &'static str) -> Self {
        FallbackChain {
            name,
            steps: Vec::new(),
        }
    }

    pub fn step<F>(mut self, source: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<Option<T>, FetchError>> + Send + 'a,
    {
        self.steps.push((source, Box::pin(future)));
        self
    }

    /// Runs the steps in order and returns the first result.
    pub async fn resolve(self) -> Option<Resolved<T>> {
        let chain = self.name;

        for (source, step) in self.steps {
            match step.await {
                Ok(Some(value)) => {
                    tracing::debug!(chain, source, "fallback chain resolved");
                    counter!(FALLBACK_RESOLVED, "chain" => chain, "source" => source).increment(1);
                    return Some(Resolved { source, value });
                }
                Ok(None) => {
                    tracing::debug!(chain, source, "fallback step returned no result");
                }
                Err(error) => {
                    tracing::warn!(chain, source, %error, "fallback step failed");
                }
            }
        }

        tracing::info!(chain, "fallback chain exhausted");
        counter!(FALLBACK_RESOLVED, "chain" => chain, "source" => "none").increment(1);
        None
    }
}

/// Maps an empty list to `None` so list steps advance the chain.
pub fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}
