//! Native resource diagnostics
//!
//! `ResourceRegistry` counts live native handles per allocation site. Handles
//! are released explicitly by their owner's `dispose()`; a handle dropped
//! without release stays counted, which is exactly what the post-close leak
//! check reports.
//!
//! The registry is injected into the engine (and through it into container
//! openers and block buffers) instead of living in a global.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Shared counter table keyed by allocation-site tag
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    counts: Arc<Mutex<BTreeMap<String, usize>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one live resource allocated at `site`
    pub fn track(&self, site: impl Into<String>) -> ResourceHandle {
        let site = site.into();
        {
            let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
            *counts.entry(site.clone()).or_insert(0) += 1;
        }
        ResourceHandle {
            registry: self.clone(),
            site,
            released: false,
        }
    }

    fn untrack(&self, site: &str) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = counts.get_mut(site) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                counts.remove(site);
            }
        }
    }

    /// Live resource count per allocation site (sites with zero are omitted)
    pub fn outstanding(&self) -> BTreeMap<String, usize> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Live resource count for one allocation site
    pub fn outstanding_for(&self, site: &str) -> usize {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(site)
            .copied()
            .unwrap_or(0)
    }

    /// Total live resources across all sites
    pub fn total_outstanding(&self) -> usize {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner).values().sum()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// Registration of one live native resource
pub struct ResourceHandle {
    registry: ResourceRegistry,
    site: String,
    released: bool,
}

impl ResourceHandle {
    /// Allocation site this handle was registered under
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Mark the resource as freed
    pub fn release(mut self) {
        self.registry.untrack(&self.site);
        self.released = true;
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        if !self.released {
            debug!("Resource handle for {} dropped without release", self.site);
        }
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("site", &self.site)
            .field("released", &self.released)
            .finish()
    }
}

/// Format the outstanding resources as a `{site: count}` table
///
/// Returns `None` when nothing is outstanding.
pub fn leak_report(registry: &ResourceRegistry) -> Option<String> {
    let outstanding = registry.outstanding();
    if outstanding.is_empty() {
        return None;
    }

    let width = outstanding
        .keys()
        .map(|site| site.len())
        .max()
        .unwrap_or(0)
        .max("allocation site".len());

    let mut report = String::from("Outstanding native resources:\n");
    report.push_str(&format!("  {:<width$}  {:>5}\n", "allocation site", "count", width = width));
    for (site, count) in &outstanding {
        report.push_str(&format!("  {:<width$}  {:>5}\n", site, count, width = width));
    }
    Some(report)
}

/// Log the leak table for an engine, if anything is outstanding
///
/// Purely diagnostic: never fails, only logs.
pub fn check_for_leaks(registry: &ResourceRegistry, engine_id: Uuid) -> bool {
    match leak_report(registry) {
        Some(report) => {
            warn!("Engine {} closed with live native resources\n{}", engine_id, report);
            true
        }
        None => {
            debug!("Engine {} closed with no live native resources", engine_id);
            false
        }
    }
}
