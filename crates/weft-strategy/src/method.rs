use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use weft_core::{Result, WeftError};

use crate::result::{normalize_value, ExecutionResult};
use crate::{ExecutionStrategy, InvokeOptions};

/// Strategy wrapping a bound method: an object instance plus one of its
/// methods, resolved once at construction time. Result normalization is
/// shared with [`crate::FunctionStrategy`].
pub struct MethodStrategy<T: Send + Sync + 'static> {
    instance: Arc<T>,
    method: fn(&T, &str) -> Result<Value>,
}

impl<T: Send + Sync + 'static> MethodStrategy<T> {
    pub fn new(instance: Arc<T>, method: fn(&T, &str) -> Result<Value>) -> Self {
        Self { instance, method }
    }
}

impl<T: Send + Sync + 'static> ExecutionStrategy for MethodStrategy<T> {
    fn invoke(&self, query: &str, _opts: &InvokeOptions) -> Result<ExecutionResult> {
        let value = (self.method)(&self.instance, query)?;
        Ok(normalize_value(value))
    }

    fn ainvoke<'a>(
        &'a self,
        query: &'a str,
        _opts: &'a InvokeOptions,
    ) -> BoxFuture<'a, Result<ExecutionResult>> {
        let instance = self.instance.clone();
        let method = self.method;
        let query = query.to_string();
        Box::pin(async move {
            let value = tokio::task::spawn_blocking(move || method(&instance, &query))
                .await
                .map_err(|e| WeftError::Strategy(format!("method panicked: {e}")))??;
            Ok(normalize_value(value))
        })
    }
}
