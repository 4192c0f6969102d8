//! Persistence bridge: autosave and rehydration of the application draft.
//!
//! The draft and the current step are written as strings into a durable
//! [`KeyValueStore`] under a per-owner namespace. Binary attachments are
//! never serialized, so a resumed session always needs the photo again.
//!
//! Loading reconciles the stored JSON against the canonical default shape
//! (see [`reconcile`]). Anything unparsable is treated as absent: the keys
//! are removed and `load` returns `None`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::draft::ApplicationDraft;
use crate::wizard::FormStep;

pub const DRAFT_KEY: &str = "application_draft";
pub const STEP_KEY: &str = "application_step";
pub const CONSENT_KEY: &str = "consent";

const CONSENT_GRANTED: &str = "granted";

// ---------------------------------------------------------------------------
// Key-value collaborator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Draft store error: {0}")]
pub struct StoreError(pub String);

/// Durable string store with no transactional guarantees.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store for tests and single-node development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl std::fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceBridge")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{name}", self.namespace)
    }

    /// Write the draft (without attachments) and the current step.
    pub async fn save(&self, draft: &ApplicationDraft, step: FormStep) -> Result<(), StoreError> {
        let json = serde_json::to_string(draft)
            .map_err(|e| StoreError(format!("draft serialization failed: {e}")))?;
        self.store.set(&self.key(DRAFT_KEY), &json).await?;
        self.store
            .set(&self.key(STEP_KEY), &step.number().to_string())
            .await?;
        tracing::debug!(namespace = %self.namespace, step = step.number(), "Draft autosaved");
        Ok(())
    }

    /// Rehydrate the stored draft and step.
    ///
    /// Returns `Ok(None)` when nothing is stored or the stored state is
    /// corrupt; in the latter case the keys are removed. Only failures of the
    /// store itself are errors.
    pub async fn load(&self) -> Result<Option<(ApplicationDraft, FormStep)>, StoreError> {
        let Some(raw) = self.store.get(&self.key(DRAFT_KEY)).await? else {
            return Ok(None);
        };
        let raw_step = self.store.get(&self.key(STEP_KEY)).await?;

        match decode(&raw, raw_step.as_deref()) {
            Ok(loaded) => Ok(Some(loaded)),
            Err(reason) => {
                tracing::warn!(
                    namespace = %self.namespace,
                    reason = %reason,
                    "Discarding corrupt stored draft",
                );
                self.clear().await?;
                Ok(None)
            }
        }
    }

    /// Remove every key this bridge owns.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key(DRAFT_KEY)).await?;
        self.store.remove(&self.key(STEP_KEY)).await?;
        self.store.remove(&self.key(CONSENT_KEY)).await?;
        Ok(())
    }

    pub async fn remember_consent(&self) -> Result<(), StoreError> {
        self.store
            .set(&self.key(CONSENT_KEY), CONSENT_GRANTED)
            .await
    }

    pub async fn has_remembered_consent(&self) -> Result<bool, StoreError> {
        Ok(self
            .store
            .get(&self.key(CONSENT_KEY))
            .await?
            .is_some_and(|v| v == CONSENT_GRANTED))
    }
}

fn decode(raw: &str, raw_step: Option<&str>) -> Result<(ApplicationDraft, FormStep), String> {
    let parsed: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;
    if !parsed.is_object() {
        return Err("stored draft is not an object".to_string());
    }
    let merged = reconcile(&parsed, &ApplicationDraft::canonical_json());
    let draft: ApplicationDraft =
        serde_json::from_value(merged).map_err(|e| format!("draft shape mismatch: {e}"))?;

    let step = match raw_step {
        None => FormStep::FIRST,
        Some(s) => {
            let n: u8 = s
                .trim()
                .parse()
                .map_err(|_| format!("invalid step '{s}'"))?;
            let step = FormStep::from_number(n).map_err(|e| e.to_string())?;
            if step == FormStep::Success {
                return Err("stored step is terminal".to_string());
            }
            step
        }
    };
    Ok((draft, step))
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Merge a loaded draft against the default shape.
///
/// - Every top-level key of `default` is present in the result; unknown
///   loaded keys are carried through.
/// - Objects are shallow-merged: loaded keys override default keys one by one.
/// - Arrays are replaced wholesale, but only by an array.
/// - Any other value is taken from `loaded` only when its JSON type matches
///   the default's.
///
/// The function is pure and idempotent:
/// `reconcile(&reconcile(d, def), def) == reconcile(d, def)`.
pub fn reconcile(loaded: &Value, default: &Value) -> Value {
    let (Some(loaded), Some(default)) = (loaded.as_object(), default.as_object()) else {
        return default.clone();
    };

    let mut out = loaded.clone();
    for (key, default_value) in default {
        out.insert(key.clone(), merge_value(loaded.get(key), default_value));
    }
    Value::Object(out)
}

fn merge_value(loaded: Option<&Value>, default: &Value) -> Value {
    match (loaded, default) {
        (Some(Value::Object(l)), Value::Object(d)) => Value::Object(shallow_merge(l, d)),
        (Some(l), d) if same_kind(l, d) => l.clone(),
        (_, d) => d.clone(),
    }
}

fn shallow_merge(loaded: &Map<String, Value>, default: &Map<String, Value>) -> Map<String, Value> {
    let mut out = default.clone();
    for (key, value) in loaded {
        match default.get(key) {
            Some(d) if !same_kind(value, d) => {}
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    out
}

fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
