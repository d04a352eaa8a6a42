//! Grains and the in-process cluster that hosts them.
//!
//! The actor runtime proper (placement, membership, remote hosting) lives
//! outside this crate. What lives here is the application side of it: the
//! grain contract, grain state storage, the demo `HelloWorld` grain, and
//! [`LocalCluster`], which serves the localhost clustering profile in-process.

mod grain;
mod hello;
mod local;
mod state;

pub use grain::{decode, encode, Grain, GrainContext};
pub use hello::{HelloState, HelloWorld, HelloWorldRef, GREETING, SAY_HELLO_WORLD};
pub use local::{LocalCluster, LocalClusterBuilder};
pub use state::{
    GrainId, GrainStateError, GrainStorage, MemoryGrainStorage, PersistentState, StateRecord,
};
