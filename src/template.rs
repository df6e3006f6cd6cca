//! Respawn templates: weighted boss profiles, their loot tables and the
//! sources they are loaded from.

use crate::error::TemplateError;
use crate::selector::WeightedSelector;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// One weighted boss profile. Immutable once loaded into a registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    /// Unique, case-sensitive identifier. Defaults to the file stem when
    /// loaded from a directory.
    #[serde(default)]
    pub id: String,
    pub display_name: String,
    #[serde(default = "default_spawn_weight")]
    pub spawn_weight: f64,
    #[serde(default)]
    pub boss: BossTuning,
    #[serde(default)]
    pub loot: LootTable,
}

fn default_spawn_weight() -> f64 {
    1.0
}

impl Template {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, spawn_weight: f64) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            spawn_weight,
            boss: BossTuning::default(),
            loot: LootTable::default(),
        }
    }

    /// Parse a JSON definition. `fallback_id` fills in a missing `id`.
    pub fn from_json(
        origin: &str,
        json: &str,
        fallback_id: Option<&str>,
    ) -> Result<Self, TemplateError> {
        let mut template: Template =
            serde_json::from_str(json).map_err(|source| TemplateError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        if template.id.is_empty() {
            if let Some(id) = fallback_id {
                template.id = id.to_string();
            }
        }
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        let invalid = |reason: String| TemplateError::Invalid {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("identifier must not be empty".into()));
        }
        if !self.spawn_weight.is_finite() || self.spawn_weight <= 0.0 {
            return Err(invalid(format!(
                "spawn_weight must be positive, got {}",
                self.spawn_weight
            )));
        }
        if !self.boss.max_health.is_finite() || self.boss.max_health <= 0.0 {
            return Err(invalid(format!(
                "boss.max_health must be positive, got {}",
                self.boss.max_health
            )));
        }
        self.loot.validate().map_err(invalid)
    }
}

// ---------------------------------------------------------------------------
// Boss tuning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BossTuning {
    pub max_health: f64,
    /// Named abilities the host enables on the spawned boss.
    pub abilities: Vec<String>,
    pub bar_color: String,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            max_health: 200.0,
            abilities: Vec::new(),
            bar_color: "pink".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LootItem {
    pub item: String,
    pub weight: f64,
    #[serde(default = "one")]
    pub min_amount: u32,
    #[serde(default = "one")]
    pub max_amount: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LootTable {
    /// Chance in `[0, 1]` of an extra egg on top of the first-kill egg.
    pub egg_chance: f64,
    /// Chance in `[0, 1]` that a chest of item rolls is placed.
    pub chest_chance: f64,
    pub chest_name: Option<String>,
    pub min_rolls: u32,
    pub max_rolls: u32,
    pub items: Vec<LootItem>,
}

impl Default for LootTable {
    fn default() -> Self {
        Self {
            egg_chance: 1.0,
            chest_chance: 0.0,
            chest_name: None,
            min_rolls: 1,
            max_rolls: 3,
            items: Vec::new(),
        }
    }
}

/// What a single loot roll produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LootDrop {
    pub egg: bool,
    pub chest: Option<LootChest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LootChest {
    pub name: Option<String>,
    pub items: Vec<ItemStack>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemStack {
    pub item: String,
    pub amount: u32,
}

impl LootTable {
    fn validate(&self) -> Result<(), String> {
        for (name, chance) in [("egg_chance", self.egg_chance), ("chest_chance", self.chest_chance)] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(format!("{} must be within [0, 1], got {}", name, chance));
            }
        }
        if self.min_rolls > self.max_rolls {
            return Err(format!(
                "min_rolls ({}) exceeds max_rolls ({})",
                self.min_rolls, self.max_rolls
            ));
        }
        for item in &self.items {
            if !item.weight.is_finite() || item.weight <= 0.0 {
                return Err(format!("loot item '{}' has non-positive weight", item.item));
            }
            if item.min_amount > item.max_amount {
                return Err(format!(
                    "loot item '{}' has min_amount above max_amount",
                    item.item
                ));
            }
        }
        Ok(())
    }

    /// Roll this table once. `egg_allowed` is false while the host's own
    /// first-kill egg is still pending.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R, egg_allowed: bool) -> LootDrop {
        let egg = egg_allowed && chance(rng, self.egg_chance);

        let chest = if chance(rng, self.chest_chance) {
            Some(LootChest {
                name: self.chest_name.clone(),
                items: self.roll_items(rng),
            })
        } else {
            None
        };

        LootDrop { egg, chest }
    }

    fn roll_items<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ItemStack> {
        let mut selector = WeightedSelector::new();
        for item in &self.items {
            if let Err(e) = selector.add(item.weight, item) {
                debug!("Skipping loot item {}: {}", item.item, e);
            }
        }
        if selector.is_empty() {
            return Vec::new();
        }

        let rolls = rng.gen_range(self.min_rolls.min(self.max_rolls)..=self.max_rolls);
        let mut stacks = Vec::with_capacity(rolls as usize);
        for _ in 0..rolls {
            let Some(item) = selector.draw_with(rng) else {
                break;
            };
            stacks.push(ItemStack {
                item: item.item.clone(),
                amount: rng.gen_range(item.min_amount.min(item.max_amount)..=item.max_amount),
            });
        }
        stacks
    }
}

fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    p > 0.0 && rng.gen::<f64>() < p
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Supplies the full set of template definitions on demand.
///
/// Each entry is either a parsed template or the reason that definition was
/// rejected; the registry skips the failures.
pub trait TemplateSource {
    fn load_templates(&self) -> Vec<Result<Template, TemplateError>>;
}

/// Reads every `*.json` file in a directory, one template per file.
pub struct DirectoryTemplateSource {
    dir: PathBuf,
}

impl DirectoryTemplateSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_file(path: &Path) -> Result<Template, TemplateError> {
        let json = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stem = path.file_stem().and_then(|s| s.to_str());
        Template::from_json(&path.display().to_string(), &json, stem)
    }
}

impl TemplateSource for DirectoryTemplateSource {
    fn load_templates(&self) -> Vec<Result<Template, TemplateError>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(source) => {
                return vec![Err(TemplateError::Io {
                    path: self.dir.clone(),
                    source,
                })]
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::load_file(p)).collect()
    }
}

enum StaticEntry {
    Parsed(Template),
    Raw { origin: String, json: String },
}

/// In-memory definitions, parsed at load time like any other source.
#[derive(Default)]
pub struct StaticTemplateSource {
    entries: Vec<StaticEntry>,
}

impl StaticTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.entries.push(StaticEntry::Parsed(template));
        self
    }

    pub fn with_json(mut self, origin: impl Into<String>, json: impl Into<String>) -> Self {
        self.entries.push(StaticEntry::Raw {
            origin: origin.into(),
            json: json.into(),
        });
        self
    }
}

impl TemplateSource for StaticTemplateSource {
    fn load_templates(&self) -> Vec<Result<Template, TemplateError>> {
        self.entries
            .iter()
            .map(|entry| match entry {
                StaticEntry::Parsed(t) => t.validate().map(|_| t.clone()),
                StaticEntry::Raw { origin, json } => Template::from_json(origin, json, None),
            })
            .collect()
    }
}
