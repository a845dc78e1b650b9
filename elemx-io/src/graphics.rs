use elemx_core::color::Color;
use elemx_core::document::HostDocument;
use elemx_core::enums::ViewDetailLevel;
use elemx_core::ids::ElementId;
use elemx_core::overrides::{NO_LINE_WEIGHT, OverrideGraphicSettings};
use serde::{Deserialize, Serialize};

use crate::RecordError;
use crate::binding::ReferenceResolver;
use crate::values::{ColorRecord, EnumRecord, IdentityRef};

/// 判定图形覆盖是否偏离哨兵值。
///
/// 对每个字段逐一累加，不提前返回。
pub fn is_modified(live: &OverrideGraphicSettings) -> bool {
    let mut modified = false;
    modified |= !live.cut_foreground_pattern_visible;
    modified |= live.cut_foreground_pattern_color.is_some();
    modified |= !live.cut_foreground_pattern_id.is_invalid();
    modified |= !live.cut_background_pattern_visible;
    modified |= live.cut_background_pattern_color.is_some();
    modified |= !live.cut_background_pattern_id.is_invalid();
    modified |= !live.surface_foreground_pattern_visible;
    modified |= live.surface_foreground_pattern_color.is_some();
    modified |= !live.surface_foreground_pattern_id.is_invalid();
    modified |= !live.surface_background_pattern_visible;
    modified |= live.surface_background_pattern_color.is_some();
    modified |= !live.surface_background_pattern_id.is_invalid();
    modified |= live.cut_line_color.is_some();
    modified |= !live.cut_line_pattern_id.is_invalid();
    modified |= live.cut_line_weight != NO_LINE_WEIGHT;
    modified |= live.projection_line_color.is_some();
    modified |= !live.projection_line_pattern_id.is_invalid();
    modified |= live.projection_line_weight != NO_LINE_WEIGHT;
    modified |= live.transparency != 0;
    modified |= live.halftone;
    modified |= live.detail_level != ViewDetailLevel::Undefined;
    modified
}

/// 图形覆盖记录，完整复制宿主的全部字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicOverrideRecord {
    pub cut_foreground_pattern_visible: bool,
    #[serde(default)]
    pub cut_foreground_pattern_color: Option<ColorRecord>,
    pub cut_foreground_pattern: IdentityRef,
    pub cut_background_pattern_visible: bool,
    #[serde(default)]
    pub cut_background_pattern_color: Option<ColorRecord>,
    pub cut_background_pattern: IdentityRef,
    pub surface_foreground_pattern_visible: bool,
    #[serde(default)]
    pub surface_foreground_pattern_color: Option<ColorRecord>,
    pub surface_foreground_pattern: IdentityRef,
    pub surface_background_pattern_visible: bool,
    #[serde(default)]
    pub surface_background_pattern_color: Option<ColorRecord>,
    pub surface_background_pattern: IdentityRef,
    #[serde(default)]
    pub cut_line_color: Option<ColorRecord>,
    pub cut_line_pattern: IdentityRef,
    pub cut_line_weight: i32,
    #[serde(default)]
    pub projection_line_color: Option<ColorRecord>,
    pub projection_line_pattern: IdentityRef,
    pub projection_line_weight: i32,
    pub transparency: i32,
    pub halftone: bool,
    pub detail_level: EnumRecord,
    #[serde(skip, default = "recorded_as_modified")]
    is_modified: bool,
}

// 只有被修改的覆盖才会写出，因此解析得到的记录视为已修改。
fn recorded_as_modified() -> bool {
    true
}

fn color_record(color: Option<Color>) -> Option<ColorRecord> {
    color.map(ColorRecord::from)
}

fn live_color(color: Option<ColorRecord>) -> Option<Color> {
    color.map(Color::from)
}

impl GraphicOverrideRecord {
    pub fn from_live<D: HostDocument + ?Sized>(
        live: &OverrideGraphicSettings,
        document: &D,
    ) -> Self {
        let reference = |id: ElementId| IdentityRef::from_id(id, document);
        Self {
            cut_foreground_pattern_visible: live.cut_foreground_pattern_visible,
            cut_foreground_pattern_color: color_record(live.cut_foreground_pattern_color),
            cut_foreground_pattern: reference(live.cut_foreground_pattern_id),
            cut_background_pattern_visible: live.cut_background_pattern_visible,
            cut_background_pattern_color: color_record(live.cut_background_pattern_color),
            cut_background_pattern: reference(live.cut_background_pattern_id),
            surface_foreground_pattern_visible: live.surface_foreground_pattern_visible,
            surface_foreground_pattern_color: color_record(live.surface_foreground_pattern_color),
            surface_foreground_pattern: reference(live.surface_foreground_pattern_id),
            surface_background_pattern_visible: live.surface_background_pattern_visible,
            surface_background_pattern_color: color_record(live.surface_background_pattern_color),
            surface_background_pattern: reference(live.surface_background_pattern_id),
            cut_line_color: color_record(live.cut_line_color),
            cut_line_pattern: reference(live.cut_line_pattern_id),
            cut_line_weight: live.cut_line_weight,
            projection_line_color: color_record(live.projection_line_color),
            projection_line_pattern: reference(live.projection_line_pattern_id),
            projection_line_weight: live.projection_line_weight,
            transparency: live.transparency,
            halftone: live.halftone,
            detail_level: EnumRecord::from_host(live.detail_level),
            is_modified: is_modified(live),
        }
    }

    pub fn references_mut(&mut self) -> Vec<&mut IdentityRef> {
        vec![
            &mut self.cut_foreground_pattern,
            &mut self.cut_background_pattern,
            &mut self.surface_foreground_pattern,
            &mut self.surface_background_pattern,
            &mut self.cut_line_pattern,
            &mut self.projection_line_pattern,
        ]
    }

    /// 导出时是否偏离默认值。解析自文本的记录总是视为已修改。
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// 无条件重建全部字段；是否应当应用由调用方决定。
    pub fn to_live<R: ReferenceResolver + ?Sized>(
        &self,
        resolver: &mut R,
    ) -> Result<OverrideGraphicSettings, RecordError> {
        Ok(OverrideGraphicSettings {
            cut_foreground_pattern_visible: self.cut_foreground_pattern_visible,
            cut_foreground_pattern_color: live_color(self.cut_foreground_pattern_color),
            cut_foreground_pattern_id: resolver.resolve_or_invalid(&self.cut_foreground_pattern),
            cut_background_pattern_visible: self.cut_background_pattern_visible,
            cut_background_pattern_color: live_color(self.cut_background_pattern_color),
            cut_background_pattern_id: resolver.resolve_or_invalid(&self.cut_background_pattern),
            surface_foreground_pattern_visible: self.surface_foreground_pattern_visible,
            surface_foreground_pattern_color: live_color(self.surface_foreground_pattern_color),
            surface_foreground_pattern_id: resolver
                .resolve_or_invalid(&self.surface_foreground_pattern),
            surface_background_pattern_visible: self.surface_background_pattern_visible,
            surface_background_pattern_color: live_color(self.surface_background_pattern_color),
            surface_background_pattern_id: resolver
                .resolve_or_invalid(&self.surface_background_pattern),
            cut_line_color: live_color(self.cut_line_color),
            cut_line_pattern_id: resolver.resolve_or_invalid(&self.cut_line_pattern),
            cut_line_weight: self.cut_line_weight,
            projection_line_color: live_color(self.projection_line_color),
            projection_line_pattern_id: resolver.resolve_or_invalid(&self.projection_line_pattern),
            projection_line_weight: self.projection_line_weight,
            transparency: self.transparency,
            halftone: self.halftone,
            detail_level: self.detail_level.resolve::<ViewDetailLevel>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use elemx_core::document::Document;

    use super::*;

    type Mutation = fn(&mut OverrideGraphicSettings);

    fn case(field: &'static str, mutate: Mutation) -> (&'static str, Mutation) {
        (field, mutate)
    }

    fn single_field_mutations() -> Vec<(&'static str, Mutation)> {
        vec![
            case("cut_foreground_pattern_visible", |o| o.cut_foreground_pattern_visible = false),
            case("cut_foreground_pattern_color", |o| {
                o.cut_foreground_pattern_color = Some(Color::new(255, 0, 0))
            }),
            case("cut_foreground_pattern_id", |o| o.cut_foreground_pattern_id = ElementId::new(3)),
            case("cut_background_pattern_visible", |o| o.cut_background_pattern_visible = false),
            case("cut_background_pattern_color", |o| {
                o.cut_background_pattern_color = Some(Color::new(0, 0, 0))
            }),
            case("cut_background_pattern_id", |o| o.cut_background_pattern_id = ElementId::new(3)),
            case("surface_foreground_pattern_visible", |o| {
                o.surface_foreground_pattern_visible = false
            }),
            case("surface_foreground_pattern_color", |o| {
                o.surface_foreground_pattern_color = Some(Color::new(10, 20, 30))
            }),
            case("surface_foreground_pattern_id", |o| {
                o.surface_foreground_pattern_id = ElementId::new(0)
            }),
            case("surface_background_pattern_visible", |o| {
                o.surface_background_pattern_visible = false
            }),
            case("surface_background_pattern_color", |o| {
                o.surface_background_pattern_color = Some(Color::new(1, 1, 1))
            }),
            case("surface_background_pattern_id", |o| {
                o.surface_background_pattern_id = ElementId::new(9)
            }),
            case("cut_line_color", |o| o.cut_line_color = Some(Color::new(0, 128, 0))),
            case("cut_line_pattern_id", |o| o.cut_line_pattern_id = ElementId::new(4)),
            case("cut_line_weight", |o| o.cut_line_weight = 5),
            case("projection_line_color", |o| {
                o.projection_line_color = Some(Color::new(0, 0, 255))
            }),
            case("projection_line_pattern_id", |o| {
                o.projection_line_pattern_id = ElementId::new(4)
            }),
            case("projection_line_weight", |o| o.projection_line_weight = 1),
            case("transparency", |o| o.transparency = 40),
            case("halftone", |o| o.halftone = true),
            case("detail_level", |o| o.detail_level = ViewDetailLevel::Fine),
        ]
    }

    #[test]
    fn default_override_is_not_modified() {
        assert!(!is_modified(&OverrideGraphicSettings::default()));
    }

    #[test]
    fn every_single_field_mutation_is_detected() {
        for (field, mutate) in single_field_mutations() {
            let mut settings = OverrideGraphicSettings::default();
            mutate(&mut settings);
            assert!(is_modified(&settings), "mutation of `{field}` not detected");
        }
    }

    #[test]
    fn modification_is_sticky_across_later_fields() {
        let mut settings = OverrideGraphicSettings::default();
        settings.cut_foreground_pattern_visible = false;
        settings.detail_level = ViewDetailLevel::Undefined;
        assert!(is_modified(&settings));
    }

    struct ByNumber<'a>(&'a Document);

    impl ReferenceResolver for ByNumber<'_> {
        fn resolve_reference(&mut self, reference: &IdentityRef) -> Option<ElementId> {
            reference.resolve(self.0).live()
        }
    }

    #[test]
    fn to_live_recreates_every_field() {
        let mut doc = Document::new();
        let hatch = doc.add_fill_pattern("Diagonal");
        let dash = doc.add_line_pattern("Dash");

        let mut settings = OverrideGraphicSettings::default();
        settings.surface_foreground_pattern_id = hatch;
        settings.surface_foreground_pattern_color = Some(Color::new(200, 10, 10));
        settings.projection_line_pattern_id = dash;
        settings.projection_line_weight = 6;
        settings.transparency = 25;
        settings.detail_level = ViewDetailLevel::Medium;

        let record = GraphicOverrideRecord::from_live(&settings, &doc);
        assert!(record.is_modified());
        assert_eq!(
            record.surface_foreground_pattern.display_name.as_deref(),
            Some("Diagonal")
        );

        let rebuilt = record.to_live(&mut ByNumber(&doc)).expect("to_live");
        assert_eq!(rebuilt, settings);
    }

    #[test]
    fn unknown_detail_level_fails_on_apply() {
        let doc = Document::new();
        let mut record = GraphicOverrideRecord::from_live(&OverrideGraphicSettings::default(), &doc);
        assert!(!record.is_modified());
        record.detail_level.value_name = "Extreme".to_string();
        let err = record.to_live(&mut ByNumber(&doc)).unwrap_err();
        assert!(matches!(err, RecordError::UnknownEnumMember { .. }));
    }

    #[test]
    fn modified_flag_is_not_serialized() {
        let doc = Document::new();
        let mut settings = OverrideGraphicSettings::default();
        settings.halftone = true;
        let record = GraphicOverrideRecord::from_live(&settings, &doc);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("is_modified").is_none());
        let decoded: GraphicOverrideRecord = serde_json::from_value(json).unwrap();
        assert!(decoded.halftone);
    }
}
