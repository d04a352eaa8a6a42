//! Grain definition and type-erased activations.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::state::{GrainId, GrainStateError, GrainStorage, PersistentState};
use crate::GrainError;

/// What a grain receives when it is activated.
#[derive(Debug, Clone)]
pub struct GrainContext {
    /// Grain key within its type.
    pub key: String,
    /// Storage configured for grain state.
    pub storage: Rc<dyn GrainStorage>,
}

impl GrainContext {
    /// Load this grain's typed state.
    pub async fn load_state<T>(
        &self,
        grain_type: &str,
    ) -> Result<PersistentState<T>, GrainStateError>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let grain = GrainId::new(grain_type, self.key.as_str());
        PersistentState::load(self.storage.clone(), grain).await
    }
}

/// A virtual actor type hosted by a node.
///
/// Activated on the first call for a key and kept until the node closes.
/// Calls to one activation run one at a time.
#[async_trait(?Send)]
pub trait Grain: Sized + 'static {
    /// Type name callers address the grain by.
    const GRAIN_TYPE: &'static str;

    /// Create the activation for `ctx.key`, loading any persisted state.
    async fn activate(ctx: GrainContext) -> Result<Self, GrainError>;

    /// Handle one method call with a JSON body, returning a JSON body.
    async fn dispatch(&mut self, method: &str, body: &[u8]) -> Result<Vec<u8>, GrainError>;
}

/// Object-safe view of an activated grain.
#[async_trait(?Send)]
pub(crate) trait Activation {
    async fn handle(&mut self, method: &str, body: &[u8]) -> Result<Vec<u8>, GrainError>;
}

#[async_trait(?Send)]
impl<G: Grain> Activation for G {
    async fn handle(&mut self, method: &str, body: &[u8]) -> Result<Vec<u8>, GrainError> {
        self.dispatch(method, body).await
    }
}

pub(crate) type ActivationFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn Activation>, GrainError>>>>;

/// Creates activations of one grain type.
pub(crate) type Activator = Rc<dyn Fn(GrainContext) -> ActivationFuture>;

pub(crate) fn activator<G: Grain>() -> Activator {
    Rc::new(|ctx| {
        Box::pin(async move {
            let grain = G::activate(ctx).await?;
            Ok(Box::new(grain) as Box<dyn Activation>)
        })
    })
}

/// Decode a JSON request body.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, GrainError> {
    serde_json::from_slice(body).map_err(|e| GrainError::Payload(e.to_string()))
}

/// Encode a JSON response body.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, GrainError> {
    serde_json::to_vec(value).map_err(|e| GrainError::Payload(e.to_string()))
}
