use super::{IconId, ItemId};

/// External thing the action/script engine runs for an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchTarget {
    ScriptAsset(String),
    SceneActionList(String),
    Callback(String),
}

impl DispatchTarget {
    pub fn name(&self) -> &str {
        match self {
            Self::ScriptAsset(name) | Self::SceneActionList(name) | Self::Callback(name) => name,
        }
    }
}

/// A dispatch target plus the parameter slots it declares for the hotspot
/// and the held item. Only declared slots are filled on dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub target: DispatchTarget,
    pub hotspot_parameter: Option<u32>,
    pub item_parameter: Option<u32>,
}

impl Handler {
    pub fn new(target: DispatchTarget) -> Self {
        Self {
            target,
            hotspot_parameter: None,
            item_parameter: None,
        }
    }

    pub fn with_hotspot_parameter(mut self, slot: u32) -> Self {
        self.hotspot_parameter = Some(slot);
        self
    }

    pub fn with_item_parameter(mut self, slot: u32) -> Self {
        self.item_parameter = Some(slot);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayerAction {
    #[default]
    DoNothing,
    TurnToFace,
    WalkTo,
    WalkToMarker,
}

impl PlayerAction {
    pub fn walks(self) -> bool {
        matches!(self, Self::WalkTo | Self::WalkToMarker)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub icon: Option<IconId>,
    pub item: Option<ItemId>,
    pub handler: Option<Handler>,
    pub player_action: PlayerAction,
    pub proximity: Option<f32>,
    pub blocking: bool,
    pub face_after: bool,
    pub(crate) enabled: bool,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            icon: None,
            item: None,
            handler: None,
            player_action: PlayerAction::DoNothing,
            proximity: None,
            blocking: false,
            face_after: false,
            enabled: true,
        }
    }
}

impl Button {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_icon(mut self, icon: IconId) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_item(mut self, item: ItemId) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_player_action(mut self, player_action: PlayerAction) -> Self {
        self.player_action = player_action;
        self
    }

    pub fn with_proximity(mut self, proximity: f32) -> Self {
        self.proximity = Some(proximity);
        self
    }

    pub fn with_blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    pub fn with_face_after(mut self, face_after: bool) -> Self {
        self.face_after = face_after;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
