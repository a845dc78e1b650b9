use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::enums::ViewDetailLevel;
use crate::ids::ElementId;

/// 线宽未覆盖时的取值。
pub const NO_LINE_WEIGHT: i32 = -1;

/// 视图中某个类别的图形覆盖设置。
///
/// 每个字段都有宿主定义的“未设置”哨兵值，见 `Default`：
/// 填充图案可见性为 `true`，颜色为无效（`None`），图案编号与线宽为 −1，
/// 透明度为 0，半色调为 `false`，详细程度为 `Undefined`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideGraphicSettings {
    pub cut_foreground_pattern_visible: bool,
    pub cut_foreground_pattern_color: Option<Color>,
    pub cut_foreground_pattern_id: ElementId,
    pub cut_background_pattern_visible: bool,
    pub cut_background_pattern_color: Option<Color>,
    pub cut_background_pattern_id: ElementId,
    pub surface_foreground_pattern_visible: bool,
    pub surface_foreground_pattern_color: Option<Color>,
    pub surface_foreground_pattern_id: ElementId,
    pub surface_background_pattern_visible: bool,
    pub surface_background_pattern_color: Option<Color>,
    pub surface_background_pattern_id: ElementId,
    pub cut_line_color: Option<Color>,
    pub cut_line_pattern_id: ElementId,
    pub cut_line_weight: i32,
    pub projection_line_color: Option<Color>,
    pub projection_line_pattern_id: ElementId,
    pub projection_line_weight: i32,
    pub transparency: i32,
    pub halftone: bool,
    pub detail_level: ViewDetailLevel,
}

impl Default for OverrideGraphicSettings {
    fn default() -> Self {
        Self {
            cut_foreground_pattern_visible: true,
            cut_foreground_pattern_color: None,
            cut_foreground_pattern_id: ElementId::INVALID,
            cut_background_pattern_visible: true,
            cut_background_pattern_color: None,
            cut_background_pattern_id: ElementId::INVALID,
            surface_foreground_pattern_visible: true,
            surface_foreground_pattern_color: None,
            surface_foreground_pattern_id: ElementId::INVALID,
            surface_background_pattern_visible: true,
            surface_background_pattern_color: None,
            surface_background_pattern_id: ElementId::INVALID,
            cut_line_color: None,
            cut_line_pattern_id: ElementId::INVALID,
            cut_line_weight: NO_LINE_WEIGHT,
            projection_line_color: None,
            projection_line_pattern_id: ElementId::INVALID,
            projection_line_weight: NO_LINE_WEIGHT,
            transparency: 0,
            halftone: false,
            detail_level: ViewDetailLevel::Undefined,
        }
    }
}
