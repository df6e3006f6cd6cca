//! Template registry: the loaded set of respawn templates, keyed by their
//! unique identifier and drawn by spawn weight.

use crate::error::{RespawnError, Result};
use crate::selector::WeightedSelector;
use crate::template::{Template, TemplateSource};
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Reload report
// ---------------------------------------------------------------------------

/// Outcome of [`TemplateRegistry::reload`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReloadReport {
    /// Identifiers registered, in load order.
    pub loaded: Vec<String>,
    /// Human-readable reason for every definition that was skipped.
    pub skipped: Vec<String>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds every template available to the respawn sequence.
pub struct TemplateRegistry {
    templates: WeightedSelector<Arc<Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self {
            templates: WeightedSelector::new(),
        }
    }

    /// Register `template` with its spawn weight.
    ///
    /// Fails without touching the registry if the identifier is taken or the
    /// weight is not positive.
    pub fn register(&mut self, template: Template) -> Result<()> {
        if self.get(&template.id).is_some() {
            return Err(RespawnError::DuplicateIdentifier(template.id));
        }
        let weight = template.spawn_weight;
        self.templates.add(weight, Arc::new(template))
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, id: &str) -> Option<Arc<Template>> {
        self.templates.values().find(|t| t.id == id).cloned()
    }

    pub fn draw_random(&self) -> Option<Arc<Template>> {
        self.templates.draw().cloned()
    }

    pub fn draw_random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<Template>> {
        self.templates.draw_with(rng).cloned()
    }

    pub fn list(&self) -> Vec<Arc<Template>> {
        self.templates.values().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.templates.clear();
    }

    /// Replace the whole set with what `source` currently defines.
    ///
    /// Malformed and duplicate definitions are logged and skipped; the reload
    /// itself never fails.
    pub fn reload(&mut self, source: &dyn TemplateSource) -> ReloadReport {
        self.clear();

        let mut report = ReloadReport::default();
        for entry in source.load_templates() {
            let template = match entry {
                Ok(t) => t,
                Err(e) => {
                    warn!("Skipping malformed template: {}", e);
                    report.skipped.push(e.to_string());
                    continue;
                }
            };

            let id = template.id.clone();
            match self.register(template) {
                Ok(()) => report.loaded.push(id),
                Err(e) => {
                    warn!("Skipping template '{}': {}", id, e);
                    report.skipped.push(e.to_string());
                }
            }
        }

        info!(
            "Reloaded templates: {} loaded, {} skipped",
            report.loaded.len(),
            report.skipped.len()
        );
        report
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
