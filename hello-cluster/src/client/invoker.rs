//! Grain invocation capability.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::cluster::{ActorCall, ClusterClient};
use super::manager::ConnectionState;
use crate::InvokeError;

/// Calls grains by type and string key over the manager's link.
///
/// Cheap to clone. Holds no lifecycle rights: calls fail with
/// [`InvokeError::NotConnected`] unless the owning manager is connected.
pub struct ActorInvoker<C> {
    client: Rc<C>,
    state: Rc<Cell<ConnectionState>>,
}

impl<C> Clone for ActorInvoker<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            state: self.state.clone(),
        }
    }
}

impl<C> fmt::Debug for ActorInvoker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorInvoker")
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

impl<C: ClusterClient> ActorInvoker<C> {
    pub(crate) fn new(client: Rc<C>, state: Rc<Cell<ConnectionState>>) -> Self {
        Self { client, state }
    }

    /// Call `method` on the grain `grain_type/key`.
    ///
    /// Request and response travel as JSON.
    ///
    /// # Errors
    ///
    /// Fails when not connected, when a payload does not (de)serialize, or
    /// when the cluster rejects the call.
    pub async fn invoke<Req, Resp>(
        &self,
        grain_type: &str,
        key: &str,
        method: &str,
        request: &Req,
    ) -> Result<Resp, InvokeError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let state = self.state.get();
        if state != ConnectionState::Connected {
            return Err(InvokeError::NotConnected(state));
        }

        let body = serde_json::to_vec(request)?;
        tracing::debug!(grain_type, key, method, "invoking grain");
        let response = self
            .client
            .invoke(ActorCall {
                grain_type: grain_type.to_string(),
                key: key.to_string(),
                method: method.to_string(),
                body,
            })
            .await?;
        Ok(serde_json::from_slice(&response)?)
    }

    /// Typed reference to the grain with `key`.
    ///
    /// ```rust,ignore
    /// let alice: HelloWorldRef<_> = invoker.get_grain("alice");
    /// let greeting = alice.say_hello_world().await?;
    /// ```
    pub fn get_grain<R: GrainRef<C>>(&self, key: impl Into<String>) -> R {
        R::from_invoker(key, self)
    }
}

/// Typed grain reference constructed from an [`ActorInvoker`].
pub trait GrainRef<C: ClusterClient>: Sized {
    /// Reference to the grain with `key`.
    fn from_invoker(key: impl Into<String>, invoker: &ActorInvoker<C>) -> Self;
}
