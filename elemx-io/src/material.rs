use elemx_core::color::Color;
use elemx_core::document::{Element, ElementData, HostDocument};
use elemx_core::ids::ElementId;
use serde::{Deserialize, Serialize};

use crate::ExportError;
use crate::entity::{EntityCore, EntityRecord, RecordKind};
use crate::values::{ColorRecord, IdentityRef};

/// 颜色与填充图案的组合。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub color: ColorRecord,
    pub pattern: IdentityRef,
}

impl PatternRecord {
    fn from_live<D: HostDocument + ?Sized>(color: Color, pattern: ElementId, document: &D) -> Self {
        Self {
            color: color.into(),
            pattern: IdentityRef::from_id(pattern, document),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    #[serde(flatten)]
    pub core: EntityCore,
    pub cut_foreground: PatternRecord,
    pub cut_background: PatternRecord,
    pub surface_foreground: PatternRecord,
    pub surface_background: PatternRecord,
    pub appearance_asset: IdentityRef,
}

impl MaterialRecord {
    pub fn from_element<D: HostDocument + ?Sized>(
        element: &Element,
        document: &D,
    ) -> Result<Self, ExportError> {
        let ElementData::Material(material) = &element.data else {
            return Err(ExportError::type_mismatch(element, RecordKind::Material));
        };
        Ok(Self {
            core: EntityCore::from_element(element, document),
            cut_foreground: PatternRecord::from_live(
                material.cut_foreground_pattern_color,
                material.cut_foreground_pattern_id,
                document,
            ),
            cut_background: PatternRecord::from_live(
                material.cut_background_pattern_color,
                material.cut_background_pattern_id,
                document,
            ),
            surface_foreground: PatternRecord::from_live(
                material.surface_foreground_pattern_color,
                material.surface_foreground_pattern_id,
                document,
            ),
            surface_background: PatternRecord::from_live(
                material.surface_background_pattern_color,
                material.surface_background_pattern_id,
                document,
            ),
            appearance_asset: IdentityRef::from_id(material.appearance_asset_id, document),
        })
    }
}

impl EntityRecord for MaterialRecord {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Material
    }

    fn references_mut(&mut self) -> Vec<&mut IdentityRef> {
        let mut references = self.core.parameter_references_mut();
        references.extend([
            &mut self.cut_foreground.pattern,
            &mut self.cut_background.pattern,
            &mut self.surface_foreground.pattern,
            &mut self.surface_background.pattern,
            &mut self.appearance_asset,
        ]);
        references
    }
}

#[cfg(test)]
mod tests {
    use elemx_core::class_names;
    use elemx_core::document::{Document, MaterialData};

    use super::*;

    #[test]
    fn material_snapshot_references_patterns() {
        let mut doc = Document::new();
        let solid = doc.add_fill_pattern("Solid fill");
        let asset = doc.add_appearance_asset("Brick Red");
        let brick = doc.add_material(
            "Brick",
            MaterialData {
                surface_foreground_pattern_color: Color::new(180, 60, 40),
                surface_foreground_pattern_id: solid,
                appearance_asset_id: asset,
                ..MaterialData::default()
            },
        );

        let record = MaterialRecord::from_element(doc.element(brick).unwrap(), &doc).unwrap();
        assert_eq!(record.core.name, "Brick");
        assert_eq!(
            record.surface_foreground.color,
            ColorRecord {
                red: 180,
                green: 60,
                blue: 40
            }
        );
        assert_eq!(record.surface_foreground.pattern.numeric_id, solid.get());
        assert!(record.cut_foreground.pattern.is_unset());
        assert_eq!(
            record.appearance_asset.display_name.as_deref(),
            Some("Brick Red")
        );
    }

    #[test]
    fn non_material_element_is_rejected() {
        let mut doc = Document::new();
        let id = doc.add_element_type(class_names::ELEMENT_TYPE, "Not a material");
        let err = MaterialRecord::from_element(doc.element(id).unwrap(), &doc).unwrap_err();
        assert!(matches!(
            err,
            ExportError::TypeMismatch {
                expected: RecordKind::Material,
                ..
            }
        ));
    }
}
