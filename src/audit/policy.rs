//! Privilege boundary policy.
//!
//! A branch landing inside the privileged region must hit a function entry,
//! and that function must be an approved entry point.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{AuditError, Result};
use crate::image::{PrivilegedRegion, SymbolTable};
use crate::thumb::BranchInstruction;

/// Kernel entry points an unprivileged task may call directly (FreeRTOS-MPU).
pub const DEFAULT_SECURE_APIS: &[&str] = &[
    "xTaskCreateRestricted",
    "vTaskFinishInit",
    "vTaskDelete",
    "vTaskDelayUntil",
    "vTaskDelay",
    "vTaskPrioritySet",
    "vTaskSuspend",
    "vTaskResume",
    "vTaskAllocateMPURegions",
    "ulTaskNotifyTake",
    "xTaskNotifyWait",
    "xTaskGenericNotify",
    "xTaskNotifyStateClear",
    // Scheduler internals reached through kernel objects
    "vTaskMissedYield",
    "xTaskPriorityInherit",
    "xTaskPriorityDisinherit",
    "xTaskPriorityDisinheritAfterTimeout",
    "pvTaskIncrementMutexHeldCount",
    "vTaskSuspendAll",
    "xTaskResumeAll",
    "vTaskPlaceOnEventList",
    "vTaskPlaceOnEventListRestricted",
    "vTaskPlaceOnUnorderedEventList",
    "xTaskRemoveFromEventList",
    "vTaskRemoveFromUnorderedEventList",
    // ISR variants
    "xTaskResumeFromISR",
    "xTaskGenericNotifyFromISR",
    "vTaskNotifyGiveFromISR",
    "vPortEnterCritical",
    "vPortExitCritical",
];

/// Immutable set of approved privileged entry points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(BTreeSet<String>);

impl AllowList {
    pub fn secure_apis() -> Self {
        DEFAULT_SECURE_APIS.iter().copied().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        AllowList(iter.into_iter().map(Into::into).collect())
    }
}

/// Outcome of checking one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Target is not privileged code
    Outside,
    /// Target is an approved entry point
    Allowed(String),
    /// Target is a privileged function missing from the allow-list
    Unauthorized(String),
}

/// Stateless checker over the immutable audit inputs.
#[derive(Debug, Clone, Copy)]
pub struct PolicyEngine<'a> {
    region: PrivilegedRegion,
    symbols: &'a SymbolTable,
    allow_list: &'a AllowList,
}

impl<'a> PolicyEngine<'a> {
    pub fn new(
        region: PrivilegedRegion,
        symbols: &'a SymbolTable,
        allow_list: &'a AllowList,
    ) -> Self {
        Self {
            region,
            symbols,
            allow_list,
        }
    }

    pub fn region(&self) -> PrivilegedRegion {
        self.region
    }

    /// Check one branch taken from `section`.
    ///
    /// When several symbols share the target address, the one defined last in
    /// the symbol table names the function.
    pub fn evaluate(&self, section: &str, branch: &BranchInstruction) -> Result<Verdict> {
        if !self.region.contains(branch.target) {
            return Ok(Verdict::Outside);
        }
        let entry = self
            .symbols
            .at(branch.target)
            .and_then(<[_]>::last)
            .ok_or_else(|| AuditError::Integrity {
                section: section.to_string(),
                address: branch.address,
                target: branch.target,
                message: "branch into middle of trusted function".to_string(),
            })?;

        if self.allow_list.contains(&entry.name) {
            Ok(Verdict::Allowed(entry.name.clone()))
        } else {
            Ok(Verdict::Unauthorized(entry.name.clone()))
        }
    }
}
