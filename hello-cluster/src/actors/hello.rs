//! The demo grain: persists and returns a greeting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::grain::{encode, Grain, GrainContext};
use super::state::PersistentState;
use crate::client::{ActorInvoker, ClusterClient, GrainRef};
use crate::{GrainError, InvokeError};

/// Method name of [`HelloWorldRef::say_hello_world`].
pub const SAY_HELLO_WORLD: &str = "say_hello_world";

/// Greeting every HelloWorld grain answers with.
pub const GREETING: &str = "Hello World";

/// Persisted state of a HelloWorld grain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloState {
    /// Last greeting returned.
    pub greeting: String,
}

/// HelloWorld grain.
pub struct HelloWorld {
    key: String,
    state: PersistentState<HelloState>,
}

impl HelloWorld {
    async fn say_hello_world(&mut self) -> Result<String, GrainError> {
        let greeting = GREETING.to_string();
        self.state.get_mut().greeting = greeting.clone();
        let version = self.state.save().await?;
        tracing::debug!(key = %self.key, version, "greeting persisted");
        Ok(greeting)
    }
}

#[async_trait(?Send)]
impl Grain for HelloWorld {
    const GRAIN_TYPE: &'static str = "HelloWorld";

    async fn activate(ctx: GrainContext) -> Result<Self, GrainError> {
        let state = ctx.load_state(Self::GRAIN_TYPE).await?;
        tracing::debug!(key = %ctx.key, "HelloWorld activated");
        Ok(Self {
            key: ctx.key,
            state,
        })
    }

    async fn dispatch(&mut self, method: &str, _body: &[u8]) -> Result<Vec<u8>, GrainError> {
        match method {
            SAY_HELLO_WORLD => encode(&self.say_hello_world().await?),
            other => Err(GrainError::UnknownMethod {
                grain_type: Self::GRAIN_TYPE.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Typed client-side reference to a HelloWorld grain.
pub struct HelloWorldRef<C> {
    key: String,
    invoker: ActorInvoker<C>,
}

impl<C: ClusterClient> GrainRef<C> for HelloWorldRef<C> {
    fn from_invoker(key: impl Into<String>, invoker: &ActorInvoker<C>) -> Self {
        Self {
            key: key.into(),
            invoker: invoker.clone(),
        }
    }
}

impl<C: ClusterClient> HelloWorldRef<C> {
    /// Grain key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Store the greeting in the grain's state and return it.
    pub async fn say_hello_world(&self) -> Result<String, InvokeError> {
        self.invoker
            .invoke(HelloWorld::GRAIN_TYPE, &self.key, SAY_HELLO_WORLD, &())
            .await
    }
}
