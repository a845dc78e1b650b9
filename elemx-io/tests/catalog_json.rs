
use elemx_core::class_names;
use elemx_core::color::Color;
use elemx_core::document::{
    CompoundLayer, CompoundStructure, Document, HostDocument, MaterialData, ViewData, WallSweep,
};
use elemx_core::enums::{DisplayStyle, MaterialFunctionAssignment};
use elemx_core::overrides::OverrideGraphicSettings;
use elemx_core::parameter::{Parameter, ParameterValue};

use golden::assert_golden;
use elemx_io::{Catalog, CatalogRecord, EntityRecord, ExportOptions, JsonFacade, RecordKind};

fn fixture() -> Document {
    let mut doc = Document::new();
    let walls = doc.add_category("Walls");
    let solid = doc.add_fill_pattern("Solid fill");

    let mut brick_data = MaterialData::default();
    brick_data.surface_foreground_pattern_color = Color::new(180, 72, 48);
    brick_data.surface_foreground_pattern_id = solid;
    let brick = doc.add_material("Brick", brick_data);

    let wall_type = doc.add_wall_type(
        "Basic 200",
        CompoundStructure {
            layers: vec![
                CompoundLayer::new(brick, MaterialFunctionAssignment::Finish1, 20.0),
                CompoundLayer::new(brick, MaterialFunctionAssignment::Structure, 180.0),
            ],
            sweeps: vec![WallSweep::new("Skirting")],
        },
    );
    let element = doc.seed_element_mut(wall_type).expect("wall type");
    element.category = Some(walls);
    element.parameters = vec![
        Parameter::new("Function", -1200, ParameterValue::Integer(1)),
        Parameter::new("Width", -1201, ParameterValue::Double(200.0)).read_only(),
    ];
    doc
}

#[test]
fn template_export_matches_golden() {
    let doc = fixture();
    let catalog = Catalog::export_document(&doc, ExportOptions { template: true })
        .expect("导出模板目录失败");
    assert_golden("template_catalog", &catalog);
}

#[test]
fn every_record_kind_survives_text() {
    let mut doc = fixture();
    let walls = doc
        .elements_of_class(class_names::CATEGORY)
        .next()
        .map(|category| category.id)
        .expect("category");
    doc.add_element_type(class_names::TEXT_NOTE_TYPE, "Label 2.5mm");
    doc.add_instance(class_names::TEXT_NOTE, "Note 1", None);
    let mut view = ViewData::default();
    view.display_style = DisplayStyle::Shading;
    let mut graphics = OverrideGraphicSettings::default();
    graphics.transparency = 40;
    view.set_category_overrides(walls, graphics);
    doc.add_view("Level 1", view);

    let catalog = Catalog::export_document(&doc, ExportOptions::default()).expect("导出失败");
    let facade = JsonFacade::compact();
    let decoded = facade
        .decode(&facade.encode(&catalog).expect("序列化失败"))
        .expect("解析失败");
    assert_eq!(decoded, catalog);

    let kinds: Vec<RecordKind> = decoded
        .into_records()
        .iter()
        .map(EntityRecord::kind)
        .collect();
    for kind in [
        RecordKind::Material,
        RecordKind::Type,
        RecordKind::WallType,
        RecordKind::View,
        RecordKind::Category,
        RecordKind::Generic,
    ] {
        assert!(kinds.contains(&kind), "missing {kind:?}");
    }
}

#[test]
fn hand_written_records_dispatch_by_host_class() {
    let text = r#"{
        "materials": {},
        "elements": [
            { "host_class": "DB.Grid", "name": "A" },
            { "host_class": "DB.View", "name": "Level 2",
              "is_template_view": false,
              "display_style": { "type_name": "DB.DisplayStyle", "value_name": "Wireframe" },
              "shadow_intensity": 0, "sunlight_intensity": 0 }
        ]
    }"#;
    let catalog = JsonFacade::new().decode(text).expect("解析手写目录失败");
    assert!(catalog.wall_types.is_empty());
    match &catalog.elements[..] {
        [CatalogRecord::Generic(grid), CatalogRecord::View(view)] => {
            assert_eq!(grid.name, "A");
            assert!(grid.parameters.is_empty());
            assert_eq!(view.display_style.value_name, "Wireframe");
            assert!(view.category_overrides.is_empty());
        }
        other => panic!("unexpected records: {other:?}"),
    }
}
