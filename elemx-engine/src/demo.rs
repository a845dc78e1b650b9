use elemx_core::class_names;
use elemx_core::color::Color;
use elemx_core::document::{
    CompoundLayer, CompoundStructure, Document, MaterialData, ViewData, WallSweep,
};
use elemx_core::enums::{DisplayStyle, MaterialFunctionAssignment, ViewDetailLevel};
use elemx_core::ids::ElementId;
use elemx_core::overrides::OverrideGraphicSettings;
use elemx_core::parameter::{Parameter, ParameterValue};
use tracing::debug;

/// 示例文档中的关键元素。
#[derive(Debug, Clone, Copy)]
pub struct DemoElements {
    pub walls: ElementId,
    pub doors: ElementId,
    pub brick: ElementId,
    pub concrete: ElementId,
    pub label: ElementId,
    pub basic_wall: ElementId,
    pub legacy_wall: ElementId,
    pub wall: ElementId,
    pub plan: ElementId,
}

pub const FIRE_RATING_GUID: &str = "6f3c2f7e-5a1d-4b8e-9d2a-0c4e8b1f7a31";

/// 为 CLI / 快速验证填充一份示例文档，返回关键元素 ID。
pub fn populate_demo(doc: &mut Document) -> DemoElements {
    let walls = doc.add_category("Walls");
    let doors = doc.add_category("Doors");
    let head_height = doc.add_parameter_definition("Head Height");
    let fire_rating = doc.add_parameter_definition("Fire Rating");
    let diagonal = doc.add_fill_pattern("Diagonal Up");
    let solid = doc.add_fill_pattern("Solid fill");
    let dash = doc.add_line_pattern("Dash");
    let brick_asset = doc.add_appearance_asset("Masonry - Brick Red");

    let mut brick_data = MaterialData::default();
    brick_data.surface_foreground_pattern_color = Color::new(180, 72, 48);
    brick_data.surface_foreground_pattern_id = solid;
    brick_data.cut_foreground_pattern_id = diagonal;
    brick_data.appearance_asset_id = brick_asset;
    let brick = doc.add_material("Brick", brick_data);
    let concrete = doc.add_material("Concrete", MaterialData::default());

    let label = doc.add_element_type(class_names::TEXT_NOTE_TYPE, "Label 2.5mm");
    if let Some(element) = doc.seed_element_mut(label) {
        element.parameters = vec![
            Parameter::new("Text Size", -1100, ParameterValue::Double(2.5)),
            Parameter::new("Text Font", -1101, ParameterValue::String("Arial".into())),
            Parameter::new("Bold", -1102, ParameterValue::Integer(0)),
        ];
    }
    doc.add_element_type(class_names::DIMENSION_TYPE, "Linear 2.5mm");

    let mut skirting = WallSweep::new("Skirting");
    skirting.distance = 100.0;
    let basic_wall = doc.add_wall_type(
        "Basic 200",
        CompoundStructure {
            layers: vec![
                CompoundLayer::new(brick, MaterialFunctionAssignment::Finish1, 20.0),
                CompoundLayer::new(concrete, MaterialFunctionAssignment::Structure, 180.0),
            ],
            sweeps: vec![skirting],
        },
    );
    if let Some(element) = doc.seed_element_mut(basic_wall) {
        element.category = Some(walls);
        element.parameters = vec![
            Parameter::new("Function", -1200, ParameterValue::Integer(1)),
            Parameter::shared(
                "Fire Rating",
                fire_rating.get(),
                FIRE_RATING_GUID,
                ParameterValue::String("60 min".into()),
            ),
            Parameter::new("Width", -1201, ParameterValue::Double(200.0)).read_only(),
        ];
    }
    let legacy_wall = doc.add_wall_type(
        "Generic 200",
        CompoundStructure {
            layers: vec![CompoundLayer::new(
                concrete,
                MaterialFunctionAssignment::Structure,
                200.0,
            )],
            sweeps: Vec::new(),
        },
    );

    let wall = doc.add_instance(class_names::WALL, "Wall 1", Some(legacy_wall));
    if let Some(element) = doc.seed_element_mut(wall) {
        element.category = Some(walls);
        element.parameters = vec![
            Parameter::new("Comments", -1300, ParameterValue::String("Corridor".into())),
            Parameter::new("Base Offset", -1301, ParameterValue::Double(0.0)),
            Parameter::new("Structural Material", -1302, ParameterValue::ElementId(concrete)),
        ];
    }
    let door = doc.add_instance(class_names::FAMILY_INSTANCE, "Door D1", None);
    if let Some(element) = doc.seed_element_mut(door) {
        element.category = Some(doors);
        element.parameters = vec![
            Parameter::new("Mark", -1001, ParameterValue::String("D1".into())),
            Parameter::new("Head Height", head_height.get(), ParameterValue::Double(2100.0)),
        ];
    }
    doc.add_instance(class_names::TEXT_NOTE, "Note 1", Some(label));

    let mut plan_data = ViewData::default();
    plan_data.display_style = DisplayStyle::HiddenLine;
    plan_data.shadow_intensity = 35;
    plan_data.sunlight_intensity = 80;
    let mut wall_graphics = OverrideGraphicSettings::default();
    wall_graphics.cut_line_color = Some(Color::new(200, 0, 0));
    wall_graphics.cut_line_pattern_id = dash;
    wall_graphics.cut_line_weight = 5;
    wall_graphics.detail_level = ViewDetailLevel::Fine;
    plan_data.set_category_overrides(walls, wall_graphics);
    plan_data.set_category_hidden(doors, true);
    let plan = doc.add_view("Level 1", plan_data);

    let ids = DemoElements {
        walls,
        doors,
        brick,
        concrete,
        label,
        basic_wall,
        legacy_wall,
        wall,
        plan,
    };

    debug!(
        elements = doc.len(),
        basic_wall = ids.basic_wall.get(),
        plan = ids.plan.get(),
        "已创建示例文档"
    );

    ids
}
