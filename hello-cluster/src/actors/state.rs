//! Grain state storage.
//!
//! Each grain owns at most one record, addressed by [`GrainId`]. Records carry
//! a version that starts at 1 and grows by one per save. A save names the
//! version it was based on (`None` for a grain never saved) and is rejected if
//! the record has moved on since, so two activations of the same grain cannot
//! silently overwrite each other.
//!
//! [`MemoryGrainStorage`] backs the in-memory storage plan. Grains use the
//! typed [`PersistentState`] view rather than the raw records.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::StoragePlan;

/// Address of a grain's state record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GrainId {
    /// Grain type name.
    pub grain_type: String,
    /// Grain key within the type.
    pub key: String,
}

impl GrainId {
    /// Id of grain `grain_type/key`.
    pub fn new(grain_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            grain_type: grain_type.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for GrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.grain_type, self.key)
    }
}

/// Stored bytes of one grain plus their version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRecord {
    /// Version of this record, 1 after the first save.
    pub version: u64,
    /// JSON-encoded state.
    pub payload: Vec<u8>,
}

/// Grain state failures.
#[derive(Debug, thiserror::Error)]
pub enum GrainStateError {
    /// The record changed since the state was loaded.
    #[error("stale save of {grain}: based on version {expected:?}, stored version is {found:?}")]
    Conflict {
        /// Grain whose save was rejected.
        grain: GrainId,
        /// Version the save was based on.
        expected: Option<u64>,
        /// Version currently stored.
        found: Option<u64>,
    },

    /// State does not round-trip through JSON.
    #[error("state of {grain} is not valid JSON: {source}")]
    Codec {
        /// Grain whose state failed to (de)serialize.
        grain: GrainId,
        /// Underlying codec error.
        #[source]
        source: serde_json::Error,
    },
}

/// Backend holding grain state records.
#[async_trait(?Send)]
pub trait GrainStorage: fmt::Debug {
    /// Storage name grains refer to.
    fn name(&self) -> &str;

    /// Current record of `grain`, if it was ever saved.
    async fn load(&self, grain: &GrainId) -> Result<Option<StateRecord>, GrainStateError>;

    /// Replace the record of `grain` and return its new version.
    ///
    /// # Errors
    ///
    /// [`GrainStateError::Conflict`] unless the stored version equals
    /// `based_on`.
    async fn save(
        &self,
        grain: &GrainId,
        payload: Vec<u8>,
        based_on: Option<u64>,
    ) -> Result<u64, GrainStateError>;
}

/// Grain state kept in process memory.
///
/// Lives as long as the storage value; nothing survives a restart.
#[derive(Debug)]
pub struct MemoryGrainStorage {
    name: String,
    table: String,
    records: RefCell<BTreeMap<GrainId, StateRecord>>,
}

impl MemoryGrainStorage {
    /// Storage named and scoped after `plan`.
    pub fn for_plan(plan: &StoragePlan) -> Self {
        Self {
            name: plan.storage_name.clone(),
            table: plan.database_names.grain_state.clone(),
            records: RefCell::new(BTreeMap::new()),
        }
    }

    /// Grain-state table the records belong to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of grains with a saved record.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Whether no grain has saved state yet.
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl GrainStorage for MemoryGrainStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, grain: &GrainId) -> Result<Option<StateRecord>, GrainStateError> {
        Ok(self.records.borrow().get(grain).cloned())
    }

    async fn save(
        &self,
        grain: &GrainId,
        payload: Vec<u8>,
        based_on: Option<u64>,
    ) -> Result<u64, GrainStateError> {
        let mut records = self.records.borrow_mut();
        let found = records.get(grain).map(|record| record.version);
        if found != based_on {
            return Err(GrainStateError::Conflict {
                grain: grain.clone(),
                expected: based_on,
                found,
            });
        }

        let version = found.map_or(1, |v| v + 1);
        records.insert(grain.clone(), StateRecord { version, payload });
        tracing::trace!(
            storage = %self.name,
            table = %self.table,
            %grain,
            version,
            "grain state saved"
        );
        Ok(version)
    }
}

/// Typed state of one grain, loaded at activation.
///
/// ```rust,ignore
/// async fn activate(ctx: GrainContext) -> Result<Self, GrainError> {
///     let state = ctx.load_state::<HelloState>(Self::GRAIN_TYPE).await?;
///     Ok(Self { state })
/// }
/// ```
pub struct PersistentState<T> {
    grain: GrainId,
    value: T,
    version: Option<u64>,
    storage: Rc<dyn GrainStorage>,
}

impl<T: Serialize + DeserializeOwned + Default> PersistentState<T> {
    /// Load the state of `grain`, or `T::default()` if it was never saved.
    pub async fn load(
        storage: Rc<dyn GrainStorage>,
        grain: GrainId,
    ) -> Result<Self, GrainStateError> {
        let (value, version) = match storage.load(&grain).await? {
            Some(record) => {
                let value = serde_json::from_slice(&record.payload).map_err(|source| {
                    GrainStateError::Codec {
                        grain: grain.clone(),
                        source,
                    }
                })?;
                (value, Some(record.version))
            }
            None => (T::default(), None),
        };
        Ok(Self {
            grain,
            value,
            version,
            storage,
        })
    }

    /// Current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Mutable value; changes reach storage on [`save`](Self::save).
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Version this value was loaded or last saved at.
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// Save the current value on top of the tracked version.
    pub async fn save(&mut self) -> Result<u64, GrainStateError> {
        let payload = serde_json::to_vec(&self.value).map_err(|source| GrainStateError::Codec {
            grain: self.grain.clone(),
            source,
        })?;
        let version = self.storage.save(&self.grain, payload, self.version).await?;
        self.version = Some(version);
        Ok(version)
    }
}
