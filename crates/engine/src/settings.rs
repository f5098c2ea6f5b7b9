use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::hotspot::IconId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum InteractionMethod {
    #[default]
    ContextSensitive,
    ChooseInteractionThenHotspot,
    ChooseHotspotThenInteraction,
    CustomScript,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SelectInteractions {
    #[default]
    ClickingMenu,
    CyclingMenuAndClickingHotspot,
    CyclingCursorAndClickingHotspot,
}

impl SelectInteractions {
    pub fn is_cycling(self) -> bool {
        !matches!(self, Self::ClickingMenu)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SeeInteractions {
    #[default]
    ClickOnHotspot,
    CursorOverHotspot,
    ViaScriptOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum InputMethod {
    #[default]
    MouseAndKeyboard,
    KeyboardOrController,
    TouchScreen,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum HotspotDetection {
    #[default]
    MouseOver,
    PlayerVicinity,
    CustomScript,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum HotspotsInVicinity {
    #[default]
    NearestOnly,
    CycleMultiple,
    ShowAll,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SceneMode {
    #[default]
    TwoD,
    ThreeD,
}

/// How overlapping 2D colliders are ordered when several sit under the pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum OverlapTieBreak {
    #[default]
    Nearest,
    Lowest,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CursorIcon {
    pub id: IconId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    pub interaction_method: InteractionMethod,
    pub select_interactions: SelectInteractions,
    pub see_interactions: SeeInteractions,
    pub input_method: InputMethod,
    pub touch_two_taps: bool,
    pub hotspot_detection: HotspotDetection,
    pub hotspots_in_vicinity: HotspotsInVicinity,
    pub vicinity_requires_pointer: bool,
    pub vicinity_radius: f32,
    pub scene_mode: SceneMode,
    pub act_in_screen_space: bool,
    pub overlap_tie_break: OverlapTieBreak,
    pub pointer_pick_radius: f32,
    pub ray_length: f32,
    pub left_click_examine: bool,
    pub right_click_examine: bool,
    pub right_click_cycles_cursor: bool,
    pub right_click_deselects_item: bool,
    pub empty_click_deselects_item: bool,
    pub allow_walk_cursor: bool,
    pub disable_unhandled_hotspots: bool,
    pub deselect_item_on_unhandled: bool,
    pub clear_selection_before_unhandled: bool,
    pub close_menu_after_dispatch: bool,
    pub preserve_interaction_index: bool,
    pub default_proximity: f32,
    pub marker_arrival_threshold: f32,
    pub turn_before_walking: bool,
    pub cursor_icons: Vec<CursorIcon>,
    pub examine_icon: Option<IconId>,
    pub examine_label: String,
    pub walk_label: String,
    pub use_item_label: String,
    pub item_preposition: String,
    pub label_during_dialogue_options: bool,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            interaction_method: InteractionMethod::ContextSensitive,
            select_interactions: SelectInteractions::ClickingMenu,
            see_interactions: SeeInteractions::ClickOnHotspot,
            input_method: InputMethod::MouseAndKeyboard,
            touch_two_taps: false,
            hotspot_detection: HotspotDetection::MouseOver,
            hotspots_in_vicinity: HotspotsInVicinity::NearestOnly,
            vicinity_requires_pointer: false,
            vicinity_radius: 1.5,
            scene_mode: SceneMode::TwoD,
            act_in_screen_space: true,
            overlap_tie_break: OverlapTieBreak::Nearest,
            pointer_pick_radius: 0.05,
            ray_length: 30.0,
            left_click_examine: true,
            right_click_examine: true,
            right_click_cycles_cursor: false,
            right_click_deselects_item: true,
            empty_click_deselects_item: false,
            allow_walk_cursor: true,
            disable_unhandled_hotspots: false,
            deselect_item_on_unhandled: false,
            clear_selection_before_unhandled: false,
            close_menu_after_dispatch: true,
            preserve_interaction_index: false,
            default_proximity: 1.0,
            marker_arrival_threshold: 0.05,
            turn_before_walking: false,
            cursor_icons: Vec::new(),
            examine_icon: None,
            examine_label: "Examine".to_string(),
            walk_label: "Walk to".to_string(),
            use_item_label: "Use".to_string(),
            item_preposition: "on".to_string(),
            label_during_dialogue_options: false,
        }
    }
}

impl InteractionSettings {
    pub fn icon_label(&self, icon: IconId) -> Option<&str> {
        self.cursor_icons
            .iter()
            .find(|entry| entry.id == icon)
            .map(|entry| entry.label.as_str())
    }

    pub fn uses_two_tap_touch(&self) -> bool {
        self.input_method == InputMethod::TouchScreen && self.touch_two_taps
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Replaces unusable values with their defaults, warning for each one.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.ray_length.is_finite() && self.ray_length > 0.0) {
            warn!(value = self.ray_length, "settings_ray_length_invalid");
            self.ray_length = defaults.ray_length;
        }
        replace_negative(&mut self.vicinity_radius, defaults.vicinity_radius, "vicinity_radius");
        replace_negative(
            &mut self.pointer_pick_radius,
            defaults.pointer_pick_radius,
            "pointer_pick_radius",
        );
        replace_negative(
            &mut self.default_proximity,
            defaults.default_proximity,
            "default_proximity",
        );
        replace_negative(
            &mut self.marker_arrival_threshold,
            defaults.marker_arrival_threshold,
            "marker_arrival_threshold",
        );
        if self.touch_two_taps && self.input_method != InputMethod::TouchScreen {
            warn!(input_method = ?self.input_method, "settings_two_taps_without_touch");
        }
        let mut seen = Vec::with_capacity(self.cursor_icons.len());
        self.cursor_icons.retain(|entry| {
            if seen.contains(&entry.id) {
                warn!(icon = entry.id.0, "settings_duplicate_cursor_icon");
                return false;
            }
            seen.push(entry.id);
            true
        });
        self
    }
}

fn replace_negative(value: &mut f32, default: f32, field: &'static str) {
    if !(value.is_finite() && *value >= 0.0) {
        warn!(field, value = *value, "settings_value_replaced_with_default");
        *value = default;
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load_settings(path: &Path) -> Result<InteractionSettings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    InteractionSettings::from_json_str(&raw)
        .map(InteractionSettings::sanitized)
        .map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings = InteractionSettings::from_json_str(
            r#"{ "interaction_method": "ChooseHotspotThenInteraction", "touch_two_taps": true }"#,
        )
        .expect("settings");
        assert_eq!(
            settings.interaction_method,
            InteractionMethod::ChooseHotspotThenInteraction
        );
        assert!(settings.touch_two_taps);
        assert_eq!(settings.default_proximity, 1.0);
        assert_eq!(settings.overlap_tie_break, OverlapTieBreak::Nearest);
    }

    #[test]
    fn icon_labels_resolve_by_id() {
        let settings = InteractionSettings::from_json_str(
            r#"{ "cursor_icons": [ { "id": 1, "label": "Use" }, { "id": 2, "label": "Talk to" } ] }"#,
        )
        .expect("settings");
        assert_eq!(settings.icon_label(IconId(2)), Some("Talk to"));
        assert_eq!(settings.icon_label(IconId(9)), None);
    }

    #[test]
    fn two_tap_only_applies_to_touch_input() {
        let mut settings = InteractionSettings {
            touch_two_taps: true,
            ..InteractionSettings::default()
        };
        assert!(!settings.uses_two_tap_touch());
        settings.input_method = InputMethod::TouchScreen;
        assert!(settings.uses_two_tap_touch());
    }

    #[test]
    fn load_settings_reports_parse_errors_with_path() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("settings.json");
        fs::write(&path, "{ not json").expect("write");
        let err = load_settings(&path).expect_err("parse error");
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("settings.json"));
    }

    #[test]
    fn sanitized_restores_defaults_for_unusable_values() {
        let settings = InteractionSettings::from_json_str(
            r#"{
                "ray_length": 0.0,
                "default_proximity": -2.0,
                "vicinity_radius": 4.0,
                "cursor_icons": [ { "id": 1, "label": "Use" }, { "id": 1, "label": "Open" } ]
            }"#,
        )
        .expect("settings")
        .sanitized();
        let defaults = InteractionSettings::default();
        assert_eq!(settings.ray_length, defaults.ray_length);
        assert_eq!(settings.default_proximity, defaults.default_proximity);
        assert_eq!(settings.vicinity_radius, 4.0);
        assert_eq!(settings.cursor_icons.len(), 1);
        assert_eq!(settings.icon_label(IconId(1)), Some("Use"));
    }

    #[test]
    fn load_settings_reports_missing_file() {
        let temp = TempDir::new().expect("temp");
        let err = load_settings(&temp.path().join("absent.json")).expect_err("read error");
        assert!(matches!(err, SettingsError::Read { .. }));
    }
}
