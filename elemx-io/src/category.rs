use elemx_core::document::{Element, ElementData, HostDocument};
use serde::{Deserialize, Serialize};

use crate::ExportError;
use crate::entity::{EntityCore, EntityRecord, RecordKind};
use crate::values::{ColorRecord, IdentityRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(flatten)]
    pub core: EntityCore,
    #[serde(default)]
    pub line_color: Option<ColorRecord>,
    pub material: IdentityRef,
    pub projection_line_weight: i32,
    pub cut_line_weight: i32,
}

impl CategoryRecord {
    pub fn from_element<D: HostDocument + ?Sized>(
        element: &Element,
        document: &D,
    ) -> Result<Self, ExportError> {
        let ElementData::Category(category) = &element.data else {
            return Err(ExportError::type_mismatch(element, RecordKind::Category));
        };
        Ok(Self {
            core: EntityCore::from_element(element, document),
            line_color: category.line_color.map(ColorRecord::from),
            material: IdentityRef::from_id(category.material_id, document),
            projection_line_weight: category.projection_line_weight,
            cut_line_weight: category.cut_line_weight,
        })
    }
}

impl EntityRecord for CategoryRecord {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Category
    }

    fn references_mut(&mut self) -> Vec<&mut IdentityRef> {
        let mut references = self.core.parameter_references_mut();
        references.push(&mut self.material);
        references
    }
}
