//! Light patterns and light anims, plus the two ways of deriving a variant:
//! recoloring with a modifier and blending over what is currently shown.

use serde::{Deserialize, Serialize};

use animstream_api_core::{MakeRelativeMode, ObjectLights, CUBE_LED_COUNT};

/// One timed LED configuration. A zero duration plays until stopped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightPattern {
    pub name: String,
    pub lights: ObjectLights,
    #[serde(rename = "durationTime_ms", default)]
    pub duration_ms: u32,
    #[serde(rename = "canBeOverridden", default = "default_true")]
    pub can_be_overridden: bool,
}

fn default_true() -> bool {
    true
}

/// Ordered patterns. Cursors into an anim are plain indices.
#[derive(Clone, Debug, PartialEq)]
pub struct LightAnim {
    pub name: String,
    pub patterns: Vec<LightPattern>,
}

impl LightAnim {
    pub fn new(name: impl Into<String>, patterns: Vec<LightPattern>) -> Self {
        Self {
            name: name.into(),
            patterns,
        }
    }

    /// Sum of pattern durations. Patterns that play forever contribute 0.
    pub fn duration_ms(&self) -> u64 {
        self.patterns.iter().map(|p| p.duration_ms as u64).sum()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Taken from the last pattern.
    pub fn can_be_overridden(&self) -> bool {
        self.patterns.last().map_or(true, |p| p.can_be_overridden)
    }

    /// Copy with every pattern recolored by `modifier`. Durations are untouched.
    pub fn with_modifier(&self, modifier: &ObjectLights) -> LightAnim {
        LightAnim {
            name: self.name.clone(),
            patterns: self
                .patterns
                .iter()
                .map(|p| LightPattern {
                    lights: apply_modifier(&p.lights, modifier),
                    ..p.clone()
                })
                .collect(),
        }
    }

    /// Copy where unset (zero) colors inherit what `shown` displays, or `None`
    /// when there was nothing to inherit.
    pub fn blended_over(&self, shown: &ObjectLights, prev_name: &str) -> Option<LightAnim> {
        let mut changed = false;
        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                let mut lights = p.lights.clone();
                for i in 0..CUBE_LED_COUNT {
                    if lights.on_colors[i].is_zero() && !shown.on_colors[i].is_zero() {
                        lights.on_colors[i] = shown.on_colors[i];
                        changed = true;
                    }
                    if lights.off_colors[i].is_zero() && !shown.off_colors[i].is_zero() {
                        lights.off_colors[i] = shown.off_colors[i];
                        changed = true;
                    }
                }
                LightPattern { lights, ..p.clone() }
            })
            .collect();
        changed.then(|| LightAnim {
            name: format!("{prev_name}+{}", self.name),
            patterns,
        })
    }
}

fn overwrite<T: Copy + PartialEq + Default>(base: &mut [T], modifier: &[T]) {
    for (b, m) in base.iter_mut().zip(modifier.iter()) {
        if *m != T::default() {
            *b = *m;
        }
    }
}

/// Overwrite only the fields the modifier sets (non-zero); everything else passes through.
pub fn apply_modifier(base: &ObjectLights, modifier: &ObjectLights) -> ObjectLights {
    let mut out = base.clone();
    overwrite(&mut out.on_colors, &modifier.on_colors);
    overwrite(&mut out.off_colors, &modifier.off_colors);
    overwrite(&mut out.on_period_ms, &modifier.on_period_ms);
    overwrite(&mut out.off_period_ms, &modifier.off_period_ms);
    overwrite(&mut out.transition_on_period_ms, &modifier.transition_on_period_ms);
    overwrite(&mut out.transition_off_period_ms, &modifier.transition_off_period_ms);
    overwrite(&mut out.offset_ms, &modifier.offset_ms);
    if modifier.rotation_period_ms != 0 {
        out.rotation_period_ms = modifier.rotation_period_ms;
    }
    if modifier.make_relative != MakeRelativeMode::Off {
        out.make_relative = modifier.make_relative;
        out.relative_point = modifier.relative_point;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use animstream_api_core::Rgba;

    fn pattern(name: &str, color: Rgba, duration_ms: u32) -> LightPattern {
        let mut lights = ObjectLights::off();
        lights.on_colors = [color, Rgba::OFF, color, Rgba::OFF];
        lights.on_period_ms = [100; CUBE_LED_COUNT];
        LightPattern {
            name: name.into(),
            lights,
            duration_ms,
            can_be_overridden: true,
        }
    }

    #[test]
    fn modifier_never_changes_durations() {
        let anim = LightAnim::new(
            "a",
            vec![pattern("p0", Rgba::RED, 100), pattern("p1", Rgba::BLUE, 0), pattern("p2", Rgba::GREEN, 7)],
        );
        let mut modifier = ObjectLights::solid(Rgba::WHITE);
        modifier.off_period_ms = [9999; CUBE_LED_COUNT];
        let modified = anim.with_modifier(&modifier);
        let before: Vec<u32> = anim.patterns.iter().map(|p| p.duration_ms).collect();
        let after: Vec<u32> = modified.patterns.iter().map(|p| p.duration_ms).collect();
        assert_eq!(before, after);
        assert_eq!(modified.patterns[0].lights.on_colors, [Rgba::WHITE; CUBE_LED_COUNT]);
        assert_eq!(modified.patterns[0].lights.off_period_ms, [9999; CUBE_LED_COUNT]);
    }

    #[test]
    fn unset_modifier_fields_pass_through() {
        let p = pattern("p", Rgba::RED, 100);
        let mut modifier = ObjectLights::off();
        modifier.on_colors[1] = Rgba::BLUE;
        let out = apply_modifier(&p.lights, &modifier);
        assert_eq!(out.on_colors, [Rgba::RED, Rgba::BLUE, Rgba::RED, Rgba::OFF]);
        assert_eq!(out.on_period_ms, p.lights.on_period_ms);
        assert_eq!(out.make_relative, MakeRelativeMode::Off);
    }

    #[test]
    fn blending_fills_zero_colors_from_shown_state() {
        let anim = LightAnim::new("spin", vec![pattern("p", Rgba::RED, 100)]);
        let shown = ObjectLights::solid(Rgba::GREEN);
        let blended = anim.blended_over(&shown, "connected").expect("something inherited");
        assert_eq!(blended.name, "connected+spin");
        assert_eq!(
            blended.patterns[0].lights.on_colors,
            [Rgba::RED, Rgba::GREEN, Rgba::RED, Rgba::GREEN]
        );
        assert_eq!(blended.patterns[0].lights.off_colors, [Rgba::GREEN; CUBE_LED_COUNT]);
        assert!(anim.blended_over(&ObjectLights::off(), "dark").is_none());
    }

    #[test]
    fn duration_is_the_sum_of_patterns() {
        let anim = LightAnim::new("a", vec![pattern("p0", Rgba::RED, 100), pattern("p1", Rgba::RED, 250)]);
        assert_eq!(anim.duration_ms(), 350);
    }
}
