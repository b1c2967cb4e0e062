//! Policy store
//!
//! Administrative CRUD over flag definitions and risk triggers. Edits
//! build a new snapshot and swap it in; runs already holding the old
//! `Arc<PolicySnapshot>` keep seeing it unchanged.

use crate::flags::FlagDefinition;
use crate::policy::snapshot::{PolicyError, PolicySnapshot};
use crate::policy::validation::{validate_flag, validate_trigger};
use crate::risk::RiskTrigger;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Shared, swappable policy configuration
#[derive(Debug, Default)]
pub struct PolicyStore {
    current: RwLock<Arc<PolicySnapshot>>,
}

impl PolicyStore {
    pub fn new(snapshot: PolicySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot; stays valid for the caller regardless of later edits
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the whole policy
    pub fn replace(&self, snapshot: PolicySnapshot) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(snapshot);
        info!(fingerprint = %guard.fingerprint(), "Policy replaced");
    }

    fn modify<T>(&self, edit: impl FnOnce(&mut PolicySnapshot) -> Result<T, PolicyError>) -> Result<T, PolicyError> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = PolicySnapshot::clone(&guard);
        let out = edit(&mut next)?;
        *guard = Arc::new(next);
        Ok(out)
    }

    // ========================================================================
    // Flag definitions
    // ========================================================================

    pub fn list_flags(&self) -> Vec<FlagDefinition> {
        self.snapshot().flags.clone()
    }

    pub fn get_flag(&self, name: &str) -> Option<FlagDefinition> {
        self.snapshot().flag(name).cloned()
    }

    /// Add a flag definition; names must be unique
    pub fn create_flag(&self, def: FlagDefinition) -> Result<(), PolicyError> {
        validate_flag(&def).map_err(PolicyError::Invalid)?;
        self.modify(|policy| {
            if policy.flag(&def.name).is_some() {
                return Err(PolicyError::DuplicateFlag(def.name));
            }
            info!(flag = %def.name, "Flag definition created");
            policy.flags.push(def);
            Ok(())
        })
    }

    /// Replace the definition with the same name, keeping its position
    pub fn update_flag(&self, def: FlagDefinition) -> Result<(), PolicyError> {
        validate_flag(&def).map_err(PolicyError::Invalid)?;
        self.modify(|policy| {
            let slot = policy
                .flags
                .iter_mut()
                .find(|f| f.name == def.name)
                .ok_or_else(|| PolicyError::FlagNotFound(def.name.clone()))?;
            info!(flag = %def.name, "Flag definition updated");
            *slot = def;
            Ok(())
        })
    }

    pub fn delete_flag(&self, name: &str) -> Result<FlagDefinition, PolicyError> {
        self.modify(|policy| {
            let idx = policy
                .flags
                .iter()
                .position(|f| f.name == name)
                .ok_or_else(|| PolicyError::FlagNotFound(name.to_string()))?;
            info!(flag = %name, "Flag definition deleted");
            Ok(policy.flags.remove(idx))
        })
    }

    // ========================================================================
    // Risk triggers
    // ========================================================================

    pub fn list_triggers(&self) -> Vec<RiskTrigger> {
        self.snapshot().triggers.clone()
    }

    /// Triggers the engine would consider
    pub fn list_active_triggers(&self) -> Vec<RiskTrigger> {
        self.snapshot()
            .triggers
            .iter()
            .filter(|t| t.is_active)
            .cloned()
            .collect()
    }

    pub fn get_trigger(&self, name: &str) -> Option<RiskTrigger> {
        self.snapshot().trigger(name).cloned()
    }

    pub fn create_trigger(&self, trigger: RiskTrigger) -> Result<(), PolicyError> {
        validate_trigger(&trigger).map_err(PolicyError::Invalid)?;
        self.modify(|policy| {
            if policy.trigger(&trigger.name).is_some() {
                return Err(PolicyError::DuplicateTrigger(trigger.name));
            }
            info!(trigger = %trigger.name, "Risk trigger created");
            policy.triggers.push(trigger);
            Ok(())
        })
    }

    pub fn update_trigger(&self, trigger: RiskTrigger) -> Result<(), PolicyError> {
        validate_trigger(&trigger).map_err(PolicyError::Invalid)?;
        self.modify(|policy| {
            let slot = policy
                .triggers
                .iter_mut()
                .find(|t| t.name == trigger.name)
                .ok_or_else(|| PolicyError::TriggerNotFound(trigger.name.clone()))?;
            info!(trigger = %trigger.name, "Risk trigger updated");
            *slot = trigger;
            Ok(())
        })
    }

    pub fn delete_trigger(&self, name: &str) -> Result<RiskTrigger, PolicyError> {
        self.modify(|policy| {
            let idx = policy
                .triggers
                .iter()
                .position(|t| t.name == name)
                .ok_or_else(|| PolicyError::TriggerNotFound(name.to_string()))?;
            info!(trigger = %name, "Risk trigger deleted");
            Ok(policy.triggers.remove(idx))
        })
    }
}
