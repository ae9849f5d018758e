//! Light anim storage and the trigger table mapping trigger names to anims.

use std::sync::Arc;

use hashbrown::HashMap;
use log::{error, info, warn};
use serde::Deserialize;

use crate::error::LightLoadError;
use crate::pattern::{LightAnim, LightPattern};

/// Where schedulers look up anims by trigger.
pub trait LightAnimSource {
    /// Anim name and anim for a trigger, or `None` when the trigger is unknown
    /// or points at an anim that does not exist.
    fn resolve(&self, trigger: &str) -> Option<(&str, Arc<LightAnim>)>;
}

#[derive(Debug, Default)]
pub struct LightLoadReport {
    pub anims_loaded: Vec<String>,
    pub triggers_loaded: Vec<String>,
    pub failed: Vec<LightLoadError>,
}

#[derive(Debug, Deserialize)]
struct RawLibrary {
    #[serde(default)]
    anims: HashMap<String, serde_json::Value>,
    #[serde(default)]
    triggers: HashMap<String, String>,
}

#[derive(Debug, Default, Clone)]
pub struct LightAnimLibrary {
    anims: HashMap<String, Arc<LightAnim>>,
    triggers: HashMap<String, String>,
}

impl LightAnimLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any anim with the same name.
    pub fn insert(&mut self, anim: LightAnim) {
        self.anims.insert(anim.name.clone(), Arc::new(anim));
    }

    pub fn add_trigger(&mut self, trigger: impl Into<String>, anim_name: impl Into<String>) {
        self.triggers.insert(trigger.into(), anim_name.into());
    }

    pub fn anim(&self, name: &str) -> Option<&Arc<LightAnim>> {
        self.anims.get(name)
    }

    pub fn anim_count(&self) -> usize {
        self.anims.len()
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// Load `{"anims": {name: [pattern...]}, "triggers": {trigger: anim}}`.
    ///
    /// Anims that fail to parse are skipped and reported; the rest still load.
    /// A trigger naming a missing anim is kept but warned about, so playing it
    /// fails the same way an unknown trigger does.
    pub fn load_json(&mut self, json: &str) -> Result<LightLoadReport, LightLoadError> {
        let raw: RawLibrary = serde_json::from_str(json)?;
        let mut report = LightLoadReport::default();

        let mut names: Vec<String> = raw.anims.keys().cloned().collect();
        names.sort();
        for name in names {
            let Some(value) = raw.anims.get(&name) else {
                continue;
            };
            match parse_anim(&name, value) {
                Ok(anim) => {
                    self.insert(anim);
                    report.anims_loaded.push(name);
                }
                Err(err) => {
                    error!("light anim '{name}' skipped: {err}");
                    report.failed.push(err);
                }
            }
        }

        let mut triggers: Vec<(String, String)> = raw.triggers.into_iter().collect();
        triggers.sort();
        for (trigger, anim_name) in triggers {
            if !self.anims.contains_key(&anim_name) {
                warn!("light trigger '{trigger}' refers to missing anim '{anim_name}'");
            }
            report.triggers_loaded.push(trigger.clone());
            self.add_trigger(trigger, anim_name);
        }

        info!(
            "light library: {} anims, {} triggers, {} failed",
            report.anims_loaded.len(),
            report.triggers_loaded.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

fn parse_anim(name: &str, value: &serde_json::Value) -> Result<LightAnim, LightLoadError> {
    let patterns: Vec<LightPattern> =
        serde_json::from_value(value.clone()).map_err(|e| LightLoadError::Malformed {
            anim: name.to_string(),
            reason: e.to_string(),
        })?;
    if patterns.is_empty() {
        return Err(LightLoadError::Malformed {
            anim: name.to_string(),
            reason: "no patterns".into(),
        });
    }
    Ok(LightAnim::new(name, patterns))
}

impl LightAnimSource for LightAnimLibrary {
    fn resolve(&self, trigger: &str) -> Option<(&str, Arc<LightAnim>)> {
        let name = self.triggers.get(trigger)?;
        let anim = self.anims.get(name)?;
        Some((name.as_str(), anim.clone()))
    }
}
