//! Score Cache (spec §4.H): memoizes `(function, district)` and
//! `(function, plan, version)` computations behind a compute-on-miss API.
//!
//! The score-function pipeline itself (what a "function_id" names, how its
//! arguments are typed) is out of scope per spec §1 — this module only
//! specifies the cache contract: how results are stored, looked up, and
//! invalidated.

use ahash::AHashMap;
use serde::{de::DeserializeOwned, Serialize};

use crate::catalog::RowId;
use crate::error::{EngineError, Result};

#[repr(u8)]
enum Tag {
    Json = 1,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(value).map_err(|e| EngineError::StoreError(format!("score cache encode failed: {e}")))?;
    let mut bytes = Vec::with_capacity(5 + payload.len());
    bytes.push(Tag::Json as u8);
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes a tagged envelope. Returns `None` on an unknown tag, a truncated
/// length prefix, or a payload that fails to deserialize as `T` — any of
/// which spec §4.H treats identically: recompute and overwrite.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
    let tag = *bytes.first()?;
    if tag != Tag::Json as u8 {
        return None;
    }
    let len = u32::from_le_bytes(bytes.get(1..5)?.try_into().ok()?) as usize;
    let payload = bytes.get(5..5 + len)?;
    serde_json::from_slice(payload).ok()
}

/// Two memoization tables, keyed exactly as spec §4.H names them.
#[derive(Default)]
pub struct ScoreCache {
    district_scores: AHashMap<(String, RowId), Vec<u8>>,
    plan_scores: AHashMap<(String, u64, u64), Vec<u8>>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `(function_id, row_id)`; on miss or decode failure, calls
    /// `compute` and stores the tagged result. A district row never
    /// mutates after it is superseded, so a hit here is eternally valid
    /// (spec §4.H).
    pub fn district_score<T, F>(&mut self, function_id: &str, row_id: RowId, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let key = (function_id.to_string(), row_id);
        if let Some(bytes) = self.district_scores.get(&key) {
            if let Some(value) = decode(bytes) {
                return Ok(value);
            }
        }
        let value = compute()?;
        self.district_scores.insert(key, encode(&value)?);
        Ok(value)
    }

    /// Looks up `(function_id, plan_id, version)`; version is part of the
    /// key, so a stale entry is simply never hit again once the plan
    /// advances (spec §4.H, "upsert semantics ... idempotent because
    /// inputs are versioned").
    pub fn plan_score<T, F>(&mut self, function_id: &str, plan_id: u64, version: u64, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let key = (function_id.to_string(), plan_id, version);
        if let Some(bytes) = self.plan_scores.get(&key) {
            if let Some(value) = decode(bytes) {
                return Ok(value);
            }
        }
        let value = compute()?;
        self.plan_scores.insert(key, encode(&value)?);
        Ok(value)
    }

    /// Evicts every district-score entry for `row_id` (cascaded from a
    /// [`crate::plan::PlanStore`] row deletion).
    pub fn evict_district_row(&mut self, row_id: RowId) {
        self.district_scores.retain(|(_, r), _| *r != row_id);
    }

    /// Evicts every plan-score entry for `plan_id`, optionally restricted
    /// to a single `version` (pass `None` to invalidate the whole plan,
    /// e.g. on purge).
    pub fn evict_plan(&mut self, plan_id: u64, version: Option<u64>) {
        self.plan_scores.retain(|(_, p, v), _| *p != plan_id || version.is_some_and(|target| *v != target));
    }
}
