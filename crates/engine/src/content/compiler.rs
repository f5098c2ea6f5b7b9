use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::info;

use crate::geometry::{Vec2, Vec3};
use crate::hotspot::{
    Button, Collider, DispatchTarget, DoubleClickPolicy, Handler, IconId, ItemId, Marker,
    PlayerAction,
};

use super::database::{HotspotDef, HotspotDefDatabase, HotspotDefId};
use super::discovery::collect_xml_files_sorted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDef,
}

#[derive(Debug, Clone, Error)]
#[error("{code:?}: {message} (file={}{})", .file_path.display(), describe_location(.location))]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

fn describe_location(location: &Option<SourceLocation>) -> String {
    match location {
        Some(loc) => format!(", line={}, column={}", loc.line, loc.column),
        None => String::new(),
    }
}

/// Compiles every `<HotspotDef>` under `dir`. A defName may appear only once
/// across the whole directory; ids are assigned in defName order.
pub fn compile_hotspot_defs(dir: &Path) -> Result<HotspotDefDatabase, ContentCompileError> {
    let xml_files = collect_xml_files_sorted(dir).map_err(|error| ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to scan content directory: {}", error.source),
        file_path: error.path,
        location: None,
    })?;

    let mut merged = BTreeMap::<String, HotspotDef>::new();
    let mut defined_in = HashMap::<String, PathBuf>::new();
    for xml_file in &xml_files {
        let raw = fs::read_to_string(xml_file).map_err(|source| ContentCompileError {
            code: ContentErrorCode::ReadFile,
            message: format!("failed to read XML file: {source}"),
            file_path: xml_file.clone(),
            location: None,
        })?;
        for (def, location) in parse_located_defs(xml_file, &raw)? {
            if let Some(first) = defined_in.get(&def.def_name) {
                return Err(ContentCompileError {
                    code: ContentErrorCode::DuplicateDef,
                    message: format!(
                        "duplicate HotspotDef '{}'; first defined in {}",
                        def.def_name,
                        first.display()
                    ),
                    file_path: xml_file.clone(),
                    location: Some(location),
                });
            }
            defined_in.insert(def.def_name.clone(), xml_file.clone());
            merged.insert(def.def_name.clone(), def);
        }
    }

    let database = HotspotDefDatabase::from_hotspot_defs(merged.into_values().collect());
    info!(
        files = xml_files.len(),
        hotspot_defs = database.len(),
        dir = %dir.display(),
        "hotspot_defs_compiled"
    );
    Ok(database)
}

/// Parses one `<Defs>` document. Duplicate defNames within the document are
/// rejected.
pub fn parse_hotspot_defs(
    file_path: &Path,
    raw: &str,
) -> Result<Vec<HotspotDef>, ContentCompileError> {
    let located = parse_located_defs(file_path, raw)?;
    let mut seen = HashSet::<String>::new();
    let mut defs = Vec::with_capacity(located.len());
    for (def, location) in located {
        if !seen.insert(def.def_name.clone()) {
            return Err(ContentCompileError {
                code: ContentErrorCode::DuplicateDef,
                message: format!("duplicate HotspotDef '{}'", def.def_name),
                file_path: file_path.to_path_buf(),
                location: Some(location),
            });
        }
        defs.push(def);
    }
    Ok(defs)
}

struct XmlSource<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl XmlSource<'_, '_> {
    fn location_of(&self, node: Node<'_, '_>) -> SourceLocation {
        let pos = self.doc.text_pos_at(node.range().start);
        SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }
    }

    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        ContentCompileError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(self.location_of(node)),
        }
    }

    fn required_text(&self, node: Node<'_, '_>) -> Result<String, ContentCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{}> must not be empty", node.tag_name().name()),
                node,
            ));
        }
        Ok(value)
    }

    fn parse_value<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        expected: &str,
    ) -> Result<T, ContentCompileError> {
        let value = self.required_text(node)?;
        value.parse::<T>().map_err(|_| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!(
                    "<{}> value '{}' is not a valid {}",
                    node.tag_name().name(),
                    value,
                    expected
                ),
                node,
            )
        })
    }

    fn parse_non_negative(&self, node: Node<'_, '_>) -> Result<f32, ContentCompileError> {
        let parsed = self.parse_value::<f32>(node, "number")?;
        if !parsed.is_finite() || parsed < 0.0 {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("<{}> must be finite and >= 0", node.tag_name().name()),
                node,
            ));
        }
        Ok(parsed)
    }

    fn parse_floats(&self, node: Node<'_, '_>, text: &str) -> Result<Vec<f32>, ContentCompileError> {
        text.split_whitespace()
            .map(|part| {
                part.parse::<f32>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| {
                        self.error_at(
                            ContentErrorCode::InvalidValue,
                            format!(
                                "<{}> component '{}' is not a finite number",
                                node.tag_name().name(),
                                part
                            ),
                            node,
                        )
                    })
            })
            .collect()
    }

    /// `x y` or `x y z`.
    fn parse_vec3(&self, node: Node<'_, '_>) -> Result<Vec3, ContentCompileError> {
        let value = self.required_text(node)?;
        match self.parse_floats(node, &value)?.as_slice() {
            [x, y] => Ok(Vec3::new(*x, *y, 0.0)),
            [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
            _ => Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!(
                    "<{}> expects 2 or 3 components, got '{}'",
                    node.tag_name().name(),
                    value
                ),
                node,
            )),
        }
    }

    /// `Rect hx hy`, `Circle r`, `Box hx hy hz` or `Sphere r`.
    fn parse_collider(&self, node: Node<'_, '_>) -> Result<Collider, ContentCompileError> {
        let value = self.required_text(node)?;
        let (shape, rest) = value.split_once(char::is_whitespace).unwrap_or((value.as_str(), ""));
        let numbers = self.parse_floats(node, rest)?;
        if numbers.iter().any(|value| *value <= 0.0) {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("collider '{}' dimensions must be > 0", value),
                node,
            ));
        }
        let collider = match (shape, numbers.as_slice()) {
            ("Rect", [x, y]) => Collider::Rect {
                half_extents: Vec2::new(*x, *y),
            },
            ("Circle", [radius]) => Collider::Circle { radius: *radius },
            ("Box", [x, y, z]) => Collider::Box {
                half_extents: Vec3::new(*x, *y, *z),
            },
            ("Sphere", [radius]) => Collider::Sphere { radius: *radius },
            _ => {
                return Err(self.error_at(
                    ContentErrorCode::InvalidValue,
                    format!(
                        "invalid collider '{}'; expected 'Rect hx hy', 'Circle r', 'Box hx hy hz' or 'Sphere r'",
                        value
                    ),
                    node,
                ))
            }
        };
        Ok(collider)
    }

    fn parse_bool(&self, node: Node<'_, '_>) -> Result<bool, ContentCompileError> {
        self.parse_value::<bool>(node, "bool (true or false)")
    }
}

fn parse_located_defs(
    file_path: &Path,
    raw: &str,
) -> Result<Vec<(HotspotDef, SourceLocation)>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let source = XmlSource {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(source.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    let mut defs = Vec::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "HotspotDef" {
            return Err(source.error_at(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; only <HotspotDef> is supported",
                    child.tag_name().name()
                ),
                child,
            ));
        }
        defs.push((parse_hotspot_def(&source, child)?, source.location_of(child)));
    }
    Ok(defs)
}

fn parse_hotspot_def(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
) -> Result<HotspotDef, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut def_name: Option<String> = None;
    let mut label: Option<String> = None;
    let mut translations = Vec::<String>::new();
    let mut collider: Option<Collider> = None;
    let mut facing_offset: Option<Vec3> = None;
    let mut walk_to_marker: Option<Marker> = None;
    let mut boundary: Option<Collider> = None;
    let mut use_buttons = Vec::<Button>::new();
    let mut examine_button: Option<Button> = None;
    let mut inventory_buttons = Vec::<Button>::new();
    let mut unhandled_use: Option<Button> = None;
    let mut unhandled_inventory: Option<Button> = None;
    let mut double_click = DoubleClickPolicy::None;
    let mut single_interaction = false;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        let repeatable = matches!(field_name.as_str(), "use" | "inventory");
        if !repeatable && !seen_fields.insert(field_name.clone()) {
            return Err(source.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{}> in <HotspotDef>", field_name),
                field,
            ));
        }

        match field_name.as_str() {
            "defName" => def_name = Some(source.required_text(field)?),
            "label" => label = Some(source.required_text(field)?),
            "translations" => {
                for entry in field.children().filter(|child| child.is_element()) {
                    if entry.tag_name().name() != "li" {
                        return Err(source.error_at(
                            ContentErrorCode::UnknownField,
                            format!(
                                "unknown field <{}> in <translations>; expected <li>",
                                entry.tag_name().name()
                            ),
                            entry,
                        ));
                    }
                    // Empty entries are allowed and fall back to the label.
                    translations.push(entry.text().map(str::trim).unwrap_or_default().to_string());
                }
            }
            "collider" => collider = Some(source.parse_collider(field)?),
            "facingOffset" => facing_offset = Some(source.parse_vec3(field)?),
            "walkToMarker" => walk_to_marker = Some(parse_marker(source, field)?),
            "boundary" => boundary = Some(source.parse_collider(field)?),
            "doubleClick" => {
                let value = source.required_text(field)?;
                double_click = match value.as_str() {
                    "None" => DoubleClickPolicy::None,
                    "TriggersInstantly" => DoubleClickPolicy::TriggersInstantly,
                    "MakesPlayerRun" => DoubleClickPolicy::MakesPlayerRun,
                    _ => {
                        return Err(source.error_at(
                            ContentErrorCode::InvalidValue,
                            format!(
                                "invalid doubleClick '{}'; allowed values: None, TriggersInstantly, MakesPlayerRun",
                                value
                            ),
                            field,
                        ))
                    }
                };
            }
            "singleInteraction" => single_interaction = source.parse_bool(field)?,
            "use" => use_buttons.push(parse_button(source, field)?),
            "examine" => examine_button = Some(parse_button(source, field)?),
            "inventory" => {
                let button = parse_button(source, field)?;
                if button.item.is_none() {
                    return Err(source.error_at(
                        ContentErrorCode::MissingField,
                        "missing required field <item> in <inventory>".to_string(),
                        field,
                    ));
                }
                inventory_buttons.push(button);
            }
            "unhandledUse" => unhandled_use = Some(parse_button(source, field)?),
            "unhandledInventory" => unhandled_inventory = Some(parse_button(source, field)?),
            _ => {
                return Err(source.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{}> in <HotspotDef>", field_name),
                    field,
                ))
            }
        }
    }

    let Some(def_name) = def_name else {
        return Err(missing_field(source, node, "defName", "HotspotDef"));
    };
    let Some(label) = label else {
        return Err(missing_field(source, node, "label", "HotspotDef"));
    };
    let Some(collider) = collider else {
        return Err(missing_field(source, node, "collider", "HotspotDef"));
    };

    let mut labels = vec![label];
    labels.extend(translations);

    Ok(HotspotDef {
        id: HotspotDefId(0),
        def_name,
        labels,
        collider,
        facing_offset,
        walk_to_marker,
        boundary,
        use_buttons,
        examine_button,
        inventory_buttons,
        unhandled_use,
        unhandled_inventory,
        double_click,
        single_interaction,
    })
}

fn parse_marker(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
) -> Result<Marker, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut offset: Option<Vec3> = None;
    let mut forward = Vec3::FORWARD;
    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(source.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{}> in <walkToMarker>", field_name),
                field,
            ));
        }
        match field_name.as_str() {
            "offset" => offset = Some(source.parse_vec3(field)?),
            "forward" => {
                forward = source.parse_vec3(field)?.normalize_or_zero();
                if forward.is_zero() {
                    return Err(source.error_at(
                        ContentErrorCode::InvalidValue,
                        "<forward> must not be a zero vector".to_string(),
                        field,
                    ));
                }
            }
            _ => {
                return Err(source.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{}> in <walkToMarker>", field_name),
                    field,
                ))
            }
        }
    }
    let Some(position) = offset else {
        return Err(missing_field(source, node, "offset", "walkToMarker"));
    };
    Ok(Marker { position, forward })
}

fn parse_button(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
) -> Result<Button, ContentCompileError> {
    let context = node.tag_name().name();
    let mut seen_fields = HashSet::<String>::new();
    let mut button = Button::new();
    let mut target: Option<DispatchTarget> = None;
    let mut hotspot_parameter: Option<u32> = None;
    let mut item_parameter: Option<u32> = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(source.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{}> in <{}>", field_name, context),
                field,
            ));
        }

        match field_name.as_str() {
            "icon" => button.icon = Some(IconId(source.parse_value(field, "icon id")?)),
            "item" => button.item = Some(ItemId(source.parse_value(field, "item id")?)),
            "script" | "actionList" | "callback" => {
                if target.is_some() {
                    return Err(source.error_at(
                        ContentErrorCode::InvalidValue,
                        format!(
                            "<{}> declares more than one of <script>, <actionList>, <callback>",
                            context
                        ),
                        field,
                    ));
                }
                let name = source.required_text(field)?;
                target = Some(match field_name.as_str() {
                    "script" => DispatchTarget::ScriptAsset(name),
                    "actionList" => DispatchTarget::SceneActionList(name),
                    _ => DispatchTarget::Callback(name),
                });
            }
            "hotspotParameter" => {
                hotspot_parameter = Some(source.parse_value(field, "parameter slot")?)
            }
            "itemParameter" => item_parameter = Some(source.parse_value(field, "parameter slot")?),
            "playerAction" => {
                let value = source.required_text(field)?;
                button.player_action = match value.as_str() {
                    "DoNothing" => PlayerAction::DoNothing,
                    "TurnToFace" => PlayerAction::TurnToFace,
                    "WalkTo" => PlayerAction::WalkTo,
                    "WalkToMarker" => PlayerAction::WalkToMarker,
                    _ => {
                        return Err(source.error_at(
                            ContentErrorCode::InvalidValue,
                            format!(
                                "invalid playerAction '{}'; allowed values: DoNothing, TurnToFace, WalkTo, WalkToMarker",
                                value
                            ),
                            field,
                        ))
                    }
                };
            }
            "proximity" => button.proximity = Some(source.parse_non_negative(field)?),
            "blocking" => button.blocking = source.parse_bool(field)?,
            "faceAfter" => button.face_after = source.parse_bool(field)?,
            "enabled" => button.enabled = source.parse_bool(field)?,
            _ => {
                return Err(source.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{}> in <{}>", field_name, context),
                    field,
                ))
            }
        }
    }

    match target {
        Some(target) => {
            let mut handler = Handler::new(target);
            handler.hotspot_parameter = hotspot_parameter;
            handler.item_parameter = item_parameter;
            button.handler = Some(handler);
        }
        None if hotspot_parameter.is_some() || item_parameter.is_some() => {
            return Err(source.error_at(
                ContentErrorCode::InvalidValue,
                format!(
                    "<{}> declares parameter slots without <script>, <actionList> or <callback>",
                    context
                ),
                node,
            ))
        }
        None => {}
    }
    Ok(button)
}

fn missing_field(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
    context: &str,
) -> ContentCompileError {
    source.error_at(
        ContentErrorCode::MissingField,
        format!("missing required field <{}> in <{}>", field_name, context),
        node,
    )
}
