use elemx_core::document::{CompoundLayer, CompoundStructure, Element, ElementData, HostDocument};
use elemx_core::enums::HostEnum;
use serde::{Deserialize, Serialize};

use crate::ExportError;
use crate::entity::{EntityCore, EntityRecord, RecordKind};
use crate::values::IdentityRef;

/// 复合结构中的一层。功能与楼板嵌入方式以宿主枚举成员名保存。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub material_id: IdentityRef,
    pub function_name: String,
    pub width: f64,
    pub deck_embedding_type: String,
    pub deck_profile_id: IdentityRef,
    pub is_cap_layer: bool,
}

impl LayerRecord {
    fn from_live<D: HostDocument + ?Sized>(layer: &CompoundLayer, document: &D) -> Self {
        Self {
            material_id: IdentityRef::from_id(layer.material_id, document),
            function_name: layer.function.member_name().to_string(),
            width: layer.width,
            deck_embedding_type: layer.deck_embedding.member_name().to_string(),
            deck_profile_id: IdentityRef::from_id(layer.deck_profile_id, document),
            is_cap_layer: layer.is_cap,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundStructureRecord {
    pub layers: Vec<LayerRecord>,
    #[serde(default)]
    pub attached_sweeps: Vec<String>,
}

impl CompoundStructureRecord {
    pub fn from_live<D: HostDocument + ?Sized>(
        structure: &CompoundStructure,
        document: &D,
    ) -> Self {
        Self {
            layers: structure
                .layers
                .iter()
                .map(|layer| LayerRecord::from_live(layer, document))
                .collect(),
            attached_sweeps: structure
                .sweeps
                .iter()
                .map(|sweep| sweep.name.clone())
                .collect(),
        }
    }
}

/// 带复合结构的类型记录（墙类型）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallTypeRecord {
    #[serde(flatten)]
    pub core: EntityCore,
    pub compound_structure: CompoundStructureRecord,
}

impl WallTypeRecord {
    pub fn from_element<D: HostDocument + ?Sized>(
        element: &Element,
        document: &D,
    ) -> Result<Self, ExportError> {
        let ElementData::WallType(structure) = &element.data else {
            return Err(ExportError::type_mismatch(element, RecordKind::WallType));
        };
        Ok(Self {
            core: EntityCore::from_element(element, document),
            compound_structure: CompoundStructureRecord::from_live(structure, document),
        })
    }
}

impl EntityRecord for WallTypeRecord {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn kind(&self) -> RecordKind {
        RecordKind::WallType
    }

    fn references_mut(&mut self) -> Vec<&mut IdentityRef> {
        let mut references = self.core.parameter_references_mut();
        for layer in &mut self.compound_structure.layers {
            references.push(&mut layer.material_id);
            references.push(&mut layer.deck_profile_id);
        }
        references
    }
}

#[cfg(test)]
mod tests {
    use elemx_core::document::{Document, MaterialData, WallSweep};
    use elemx_core::enums::MaterialFunctionAssignment;

    use super::*;

    #[test]
    fn layers_keep_order_and_names() {
        let mut doc = Document::new();
        let brick = doc.add_material("Brick", MaterialData::default());
        let insulation = doc.add_material("Mineral Wool", MaterialData::default());
        let structure = CompoundStructure {
            layers: vec![
                CompoundLayer::new(brick, MaterialFunctionAssignment::Finish1, 102.5),
                CompoundLayer::new(insulation, MaterialFunctionAssignment::Insulation, 50.0),
                CompoundLayer::new(brick, MaterialFunctionAssignment::Structure, 100.0),
            ],
            sweeps: vec![WallSweep::new("Skirting")],
        };
        let wall_type = doc.add_wall_type("Cavity 255", structure);

        let record = WallTypeRecord::from_element(doc.element(wall_type).unwrap(), &doc).unwrap();
        let functions: Vec<&str> = record
            .compound_structure
            .layers
            .iter()
            .map(|layer| layer.function_name.as_str())
            .collect();
        assert_eq!(functions, ["Finish1", "Insulation", "Structure"]);
        assert_eq!(
            record.compound_structure.layers[1]
                .material_id
                .display_name
                .as_deref(),
            Some("Mineral Wool")
        );
        assert_eq!(record.compound_structure.layers[0].deck_embedding_type, "Invalid");
        assert!(record.compound_structure.layers[0].deck_profile_id.is_unset());
        assert_eq!(record.compound_structure.attached_sweeps, ["Skirting"]);
        let width: f64 = record.compound_structure.layers.iter().map(|layer| layer.width).sum();
        assert!((width - 252.5).abs() < 1e-9);
    }
}
