use elemx_core::class_names;
use elemx_core::document::{Element, ElementData, HostDocument};
use serde::{Deserialize, Serialize};

use crate::ExportError;
use crate::entity::{EntityCore, EntityRecord, RecordKind};
use crate::graphics::{GraphicOverrideRecord, is_modified};
use crate::values::{EnumRecord, IdentityRef};

/// 单个类别在视图中的可见性与图形覆盖。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryOverrideRecord {
    pub category: IdentityRef,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphic_override: Option<GraphicOverrideRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    #[serde(flatten)]
    pub core: EntityCore,
    pub is_template_view: bool,
    pub display_style: EnumRecord,
    pub shadow_intensity: i32,
    pub sunlight_intensity: i32,
    #[serde(default)]
    pub category_overrides: Vec<CategoryOverrideRecord>,
}

impl ViewRecord {
    /// 只记录被隐藏或覆盖被修改过的类别，输出规模与实际定制量成正比。
    pub fn from_element<D: HostDocument + ?Sized>(
        element: &Element,
        document: &D,
    ) -> Result<Self, ExportError> {
        let ElementData::View(view) = &element.data else {
            return Err(ExportError::type_mismatch(element, RecordKind::View));
        };

        let mut category_overrides = Vec::new();
        for category in document.elements_of_class(class_names::CATEGORY) {
            let is_hidden = view.is_category_hidden(category.id);
            let live = view.category_overrides(category.id);
            let modified = is_modified(&live);
            if !is_hidden && !modified {
                continue;
            }
            category_overrides.push(CategoryOverrideRecord {
                category: IdentityRef::from_element(category, document),
                is_hidden,
                graphic_override: modified
                    .then(|| GraphicOverrideRecord::from_live(&live, document)),
            });
        }

        Ok(Self {
            core: EntityCore::from_element(element, document),
            is_template_view: view.is_template,
            display_style: EnumRecord::from_host(view.display_style),
            shadow_intensity: view.shadow_intensity,
            sunlight_intensity: view.sunlight_intensity,
            category_overrides,
        })
    }
}

impl EntityRecord for ViewRecord {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn kind(&self) -> RecordKind {
        RecordKind::View
    }

    fn references_mut(&mut self) -> Vec<&mut IdentityRef> {
        let mut references = self.core.parameter_references_mut();
        for entry in &mut self.category_overrides {
            references.push(&mut entry.category);
            if let Some(graphics) = &mut entry.graphic_override {
                references.extend(graphics.references_mut());
            }
        }
        references
    }
}
