use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use weft_core::{Result, WeftError};

use crate::result::{normalize_value, ExecutionResult};
use crate::{ExecutionStrategy, InvokeOptions};

/// Extra keyword-style options forwarded to options-aware callables.
pub type ExtraOptions = serde_json::Map<String, Value>;

/// A callable with its accepted signature fixed at construction time.
///
/// Extras handed to a query-only callable are dropped rather than
/// rejected, so fixed-signature functions keep working when callers
/// attach options.
#[derive(Clone)]
enum Callable {
    Query(Arc<dyn Fn(&str) -> Result<Value> + Send + Sync>),
    WithOptions(Arc<dyn Fn(&str, &ExtraOptions) -> Result<Value> + Send + Sync>),
}

impl Callable {
    fn call(&self, query: &str, extra: &ExtraOptions) -> Result<Value> {
        match self {
            Self::Query(f) => f(query),
            Self::WithOptions(f) => f(query, extra),
        }
    }
}

/// Strategy wrapping a plain function.
#[derive(Clone)]
pub struct FunctionStrategy {
    callable: Callable,
}

impl FunctionStrategy {
    /// Wrap a single-argument callable. Extra options are not passed to it.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&str) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            callable: Callable::Query(Arc::new(func)),
        }
    }

    /// Wrap a callable that also accepts extra options.
    pub fn with_options<F>(func: F) -> Self
    where
        F: Fn(&str, &ExtraOptions) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            callable: Callable::WithOptions(Arc::new(func)),
        }
    }
}

impl ExecutionStrategy for FunctionStrategy {
    fn invoke(&self, query: &str, opts: &InvokeOptions) -> Result<ExecutionResult> {
        let value = self.callable.call(query, &opts.extra)?;
        Ok(normalize_value(value))
    }

    fn ainvoke<'a>(
        &'a self,
        query: &'a str,
        opts: &'a InvokeOptions,
    ) -> BoxFuture<'a, Result<ExecutionResult>> {
        // The wrapped function is synchronous; run it on a blocking worker
        // so it cannot starve concurrently-served requests.
        let callable = self.callable.clone();
        let query = query.to_string();
        let extra = opts.extra.clone();
        Box::pin(async move {
            let value = tokio::task::spawn_blocking(move || callable.call(&query, &extra))
                .await
                .map_err(|e| WeftError::Strategy(format!("callable panicked: {e}")))??;
            Ok(normalize_value(value))
        })
    }
}
