//! Option extender chain: async transforms over the outbound request.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};

use super::request::RequestDescription;
use crate::error::ProxyResult;

/// One async transform over a [`RequestDescription`].
pub type OptionExtender<B> = Arc<
    dyn Fn(RequestDescription<B>) -> BoxFuture<'static, ProxyResult<RequestDescription<B>>>
        + Send
        + Sync,
>;

/// Wrap an async closure as an [`OptionExtender`].
pub fn option_extender<B, F, Fut>(f: F) -> OptionExtender<B>
where
    F: Fn(RequestDescription<B>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ProxyResult<RequestDescription<B>>> + Send + 'static,
{
    Arc::new(move |options| f(options).boxed())
}

/// Extenders in registration order. Empty is the identity.
pub struct ExtenderChain<B> {
    stages: Vec<OptionExtender<B>>,
}

impl<B> ExtenderChain<B> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// New chain with `extender` appended; the receiver is untouched.
    pub fn appended(&self, extender: OptionExtender<B>) -> Self {
        let mut stages = self.stages.clone();
        stages.push(extender);
        Self { stages }
    }

    /// Run every extender in order, each on the previous one's output.
    pub async fn apply(&self, mut options: RequestDescription<B>) -> ProxyResult<RequestDescription<B>> {
        for stage in &self.stages {
            options = stage(options).await?;
        }
        Ok(options)
    }
}

impl<B> ExtenderChain<B>
where
    B: Serialize + DeserializeOwned + Send + 'static,
{
    /// Re-target the chain at a new body type.
    ///
    /// Each existing extender sees the body as JSON and its output body is
    /// decoded back into `C`.
    pub fn rebind<C>(&self) -> ExtenderChain<C>
    where
        C: Serialize + DeserializeOwned + Send + 'static,
    {
        let stages = self
            .stages
            .iter()
            .cloned()
            .map(|stage| {
                option_extender(move |options: RequestDescription<C>| {
                    let stage = Arc::clone(&stage);
                    async move {
                        let options = options.try_map_body(convert_body::<C, B>)?;
                        let extended = stage(options).await?;
                        extended.try_map_body(convert_body::<B, C>)
                    }
                })
            })
            .collect();

        ExtenderChain { stages }
    }
}

fn convert_body<F, T>(body: Option<F>) -> ProxyResult<Option<T>>
where
    F: Serialize,
    T: DeserializeOwned,
{
    body.map(|b| serde_json::to_value(b).and_then(serde_json::from_value))
        .transpose()
        .map_err(Into::into)
}

impl<B> Default for ExtenderChain<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Clone for ExtenderChain<B> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
        }
    }
}
