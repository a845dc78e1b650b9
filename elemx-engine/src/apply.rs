use std::collections::HashMap;

use elemx_core::color::Color;
use elemx_core::document::{
    CategoryData, CompoundLayer, CompoundStructure, Element, ElementData, HostDocument,
    MaterialData, WallSweep,
};
use elemx_core::enums::{DeckEmbeddingType, DisplayStyle, HostEnum, MaterialFunctionAssignment};
use elemx_core::ids::ElementId;
use elemx_io::category::CategoryRecord;
use elemx_io::material::{MaterialRecord, PatternRecord};
use elemx_io::values::{IdentityRef, resolve_member};
use elemx_io::view::ViewRecord;
use elemx_io::wall_type::WallTypeRecord;
use elemx_io::{CatalogRecord, EntityCore, EntityRecord, ReferenceResolver, TypeRecord};
use tracing::warn;

use crate::errors::EngineError;
use crate::locate::Locator;

/// 专用记录的读取阶段：根据当前元素计算新的专有数据，不修改文档。
///
/// 返回 `None` 表示该记录没有专有数据需要写入。
pub trait ApplyRecord: EntityRecord {
    fn prepare_data<D: HostDocument + ?Sized>(
        &self,
        current: &Element,
        locator: &mut Locator<'_, D>,
    ) -> Result<Option<ElementData>, EngineError>;
}

pub(crate) fn mismatch<R: EntityRecord + ?Sized>(record: &R, element: &Element) -> EngineError {
    EngineError::TypeMismatch {
        name: record.name().to_string(),
        host_class: record.core().host_class.clone(),
        id: element.id,
        found: element.class_name.clone(),
    }
}

/// 未设置的引用写为无效编号；无法解析时保留当前值。
fn resolve_or_keep<D: HostDocument + ?Sized>(
    locator: &mut Locator<'_, D>,
    reference: &IdentityRef,
    current: ElementId,
) -> ElementId {
    if reference.is_unset() {
        return ElementId::INVALID;
    }
    match locator.resolve_reference(reference) {
        Some(id) => id,
        None => {
            warn!(
                numeric_id = reference.numeric_id,
                name = reference.display_name.as_deref().unwrap_or(""),
                "引用无法解析，保留原值"
            );
            current
        }
    }
}

impl ApplyRecord for EntityCore {
    fn prepare_data<D: HostDocument + ?Sized>(
        &self,
        _current: &Element,
        _locator: &mut Locator<'_, D>,
    ) -> Result<Option<ElementData>, EngineError> {
        Ok(None)
    }
}

impl ApplyRecord for TypeRecord {
    fn prepare_data<D: HostDocument + ?Sized>(
        &self,
        current: &Element,
        _locator: &mut Locator<'_, D>,
    ) -> Result<Option<ElementData>, EngineError> {
        match current.data {
            ElementData::Type => Ok(None),
            _ => Err(mismatch(self, current)),
        }
    }
}

impl ApplyRecord for MaterialRecord {
    fn prepare_data<D: HostDocument + ?Sized>(
        &self,
        current: &Element,
        locator: &mut Locator<'_, D>,
    ) -> Result<Option<ElementData>, EngineError> {
        let ElementData::Material(live) = &current.data else {
            return Err(mismatch(self, current));
        };

        let mut pattern = |record: &PatternRecord, current: ElementId| -> (Color, ElementId) {
            (
                record.color.into(),
                resolve_or_keep(locator, &record.pattern, current),
            )
        };
        let (cut_foreground_pattern_color, cut_foreground_pattern_id) =
            pattern(&self.cut_foreground, live.cut_foreground_pattern_id);
        let (cut_background_pattern_color, cut_background_pattern_id) =
            pattern(&self.cut_background, live.cut_background_pattern_id);
        let (surface_foreground_pattern_color, surface_foreground_pattern_id) =
            pattern(&self.surface_foreground, live.surface_foreground_pattern_id);
        let (surface_background_pattern_color, surface_background_pattern_id) =
            pattern(&self.surface_background, live.surface_background_pattern_id);

        Ok(Some(ElementData::Material(MaterialData {
            cut_foreground_pattern_color,
            cut_foreground_pattern_id,
            cut_background_pattern_color,
            cut_background_pattern_id,
            surface_foreground_pattern_color,
            surface_foreground_pattern_id,
            surface_background_pattern_color,
            surface_background_pattern_id,
            appearance_asset_id: resolve_or_keep(
                locator,
                &self.appearance_asset,
                live.appearance_asset_id,
            ),
        })))
    }
}

impl ApplyRecord for ViewRecord {
    /// 只覆盖记录中出现的类别，其余类别的设置保持不变。
    fn prepare_data<D: HostDocument + ?Sized>(
        &self,
        current: &Element,
        locator: &mut Locator<'_, D>,
    ) -> Result<Option<ElementData>, EngineError> {
        let ElementData::View(live) = &current.data else {
            return Err(mismatch(self, current));
        };

        let mut view = live.clone();
        view.is_template = self.is_template_view;
        view.display_style = self.display_style.resolve::<DisplayStyle>()?;
        view.shadow_intensity = self.shadow_intensity;
        view.sunlight_intensity = self.sunlight_intensity;

        for entry in &self.category_overrides {
            let Some(category) = locator.resolve_reference(&entry.category) else {
                warn!(
                    view = %self.core.name,
                    category = entry.category.display_name.as_deref().unwrap_or(""),
                    "视图中的类别无法定位，跳过"
                );
                continue;
            };
            view.set_category_hidden(category, entry.is_hidden);
            if let Some(graphics) = entry
                .graphic_override
                .as_ref()
                .filter(|graphics| graphics.is_modified())
            {
                view.set_category_overrides(category, graphics.to_live(locator)?);
            }
        }
        Ok(Some(ElementData::View(view)))
    }
}

impl ApplyRecord for CategoryRecord {
    fn prepare_data<D: HostDocument + ?Sized>(
        &self,
        current: &Element,
        locator: &mut Locator<'_, D>,
    ) -> Result<Option<ElementData>, EngineError> {
        let ElementData::Category(live) = &current.data else {
            return Err(mismatch(self, current));
        };
        Ok(Some(ElementData::Category(CategoryData {
            line_color: self.line_color.map(Into::into),
            material_id: resolve_or_keep(locator, &self.material, live.material_id),
            projection_line_weight: self.projection_line_weight,
            cut_line_weight: self.cut_line_weight,
        })))
    }
}

impl ApplyRecord for WallTypeRecord {
    /// 复合结构整体重建；附着的扫掠按名称保留原有偏移。
    fn prepare_data<D: HostDocument + ?Sized>(
        &self,
        current: &Element,
        locator: &mut Locator<'_, D>,
    ) -> Result<Option<ElementData>, EngineError> {
        let ElementData::WallType(live) = &current.data else {
            return Err(mismatch(self, current));
        };

        let mut layers = Vec::with_capacity(self.compound_structure.layers.len());
        for (index, layer) in self.compound_structure.layers.iter().enumerate() {
            let existing = live.layers.get(index);
            let function = resolve_member::<MaterialFunctionAssignment>(
                MaterialFunctionAssignment::TYPE_NAME,
                &layer.function_name,
            )?;
            let deck_embedding = resolve_member::<DeckEmbeddingType>(
                DeckEmbeddingType::TYPE_NAME,
                &layer.deck_embedding_type,
            )?;
            layers.push(CompoundLayer {
                material_id: resolve_or_keep(
                    locator,
                    &layer.material_id,
                    existing.map_or(ElementId::INVALID, |live| live.material_id),
                ),
                function,
                width: layer.width,
                deck_embedding,
                deck_profile_id: resolve_or_keep(
                    locator,
                    &layer.deck_profile_id,
                    existing.map_or(ElementId::INVALID, |live| live.deck_profile_id),
                ),
                is_cap: layer.is_cap_layer,
            });
        }

        let offsets: HashMap<&str, f64> = live
            .sweeps
            .iter()
            .map(|sweep| (sweep.name.as_str(), sweep.distance))
            .collect();
        let sweeps = self
            .compound_structure
            .attached_sweeps
            .iter()
            .map(|name| {
                let mut sweep = WallSweep::new(name.clone());
                if let Some(distance) = offsets.get(name.as_str()) {
                    sweep.distance = *distance;
                }
                sweep
            })
            .collect();

        Ok(Some(ElementData::WallType(CompoundStructure { layers, sweeps })))
    }
}

impl ApplyRecord for CatalogRecord {
    fn prepare_data<D: HostDocument + ?Sized>(
        &self,
        current: &Element,
        locator: &mut Locator<'_, D>,
    ) -> Result<Option<ElementData>, EngineError> {
        match self {
            CatalogRecord::Material(record) => record.prepare_data(current, locator),
            CatalogRecord::Type(record) => record.prepare_data(current, locator),
            CatalogRecord::WallType(record) => record.prepare_data(current, locator),
            CatalogRecord::View(record) => record.prepare_data(current, locator),
            CatalogRecord::Category(record) => record.prepare_data(current, locator),
            CatalogRecord::Generic(core) => core.prepare_data(current, locator),
        }
    }
}
