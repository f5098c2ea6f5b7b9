use crate::hotspot::{Hotspot, InteractionRef, ItemId};
use crate::resolver::SelectionState;
use crate::runtime::GameState;
use crate::settings::{InteractionMethod, InteractionSettings};

#[derive(Debug, Clone, Copy)]
pub struct LabelInput<'a> {
    pub settings: &'a InteractionSettings,
    pub hotspot: Option<&'a Hotspot>,
    pub held_item: Option<ItemId>,
    pub item_label: Option<&'a str>,
    pub selection: &'a SelectionState,
    pub game_state: GameState,
    pub blocking_cutscene: bool,
    pub language: usize,
}

pub fn compose_label(input: &LabelInput<'_>) -> String {
    let settings = input.settings;
    match input.game_state {
        GameState::Cutscene => return String::new(),
        GameState::DialogOptions if !settings.label_during_dialogue_options => {
            return String::new()
        }
        _ => {}
    }
    if input.blocking_cutscene {
        return String::new();
    }

    if let Some(item) = input.held_item {
        let item_name = input
            .item_label
            .map(str::to_string)
            .unwrap_or_else(|| format!("item {}", item.0));
        return match input.hotspot {
            Some(hotspot) => join(&[
                &settings.use_item_label,
                &item_name,
                &settings.item_preposition,
                hotspot.display_name(input.language),
            ]),
            None => join(&[&settings.use_item_label, &item_name]),
        };
    }

    let Some(hotspot) = input.hotspot else {
        return String::new();
    };
    let name = hotspot.display_name(input.language);

    match settings.interaction_method {
        InteractionMethod::ChooseInteractionThenHotspot => match input.selection.cursor_icon {
            Some(icon) => join(&[settings.icon_label(icon).unwrap_or_default(), name]),
            None if settings.allow_walk_cursor => join(&[&settings.walk_label, name]),
            None => name.to_string(),
        },
        InteractionMethod::ChooseHotspotThenInteraction
            if settings.select_interactions.is_cycling() =>
        {
            let prefix = match input.selection.interaction.current(hotspot) {
                Some(interaction @ InteractionRef::Use(_)) => hotspot
                    .button(interaction)
                    .and_then(|button| button.icon)
                    .and_then(|icon| settings.icon_label(icon))
                    .unwrap_or_default(),
                Some(InteractionRef::Examine) => settings.examine_label.as_str(),
                _ => "",
            };
            join(&[prefix, name])
        }
        InteractionMethod::ContextSensitive if input.selection.examine_mode => {
            join(&[&settings.examine_label, name])
        }
        _ => name.to_string(),
    }
}

fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
