use elemx_core::class_names;
use elemx_core::document::{Element, HostDocument};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parameter::ParameterRecord;
use crate::values::{IdentityRef, category_name};

/// 记录种类。由宿主运行时类型名决定，未知类型落到 `Generic`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Material,
    Type,
    WallType,
    View,
    Category,
    Generic,
}

impl RecordKind {
    pub fn from_class_name(class_name: &str) -> Self {
        match class_name {
            class_names::MATERIAL => RecordKind::Material,
            class_names::ELEMENT_TYPE
            | class_names::TEXT_NOTE_TYPE
            | class_names::DIMENSION_TYPE => RecordKind::Type,
            class_names::WALL_TYPE => RecordKind::WallType,
            class_names::VIEW => RecordKind::View,
            class_names::CATEGORY => RecordKind::Category,
            _ => RecordKind::Generic,
        }
    }

    /// 类型族记录：找不到目标时可由模板复制创建，也可参与别名合并。
    pub fn is_type_family(self) -> bool {
        matches!(
            self,
            RecordKind::Material | RecordKind::Type | RecordKind::WallType | RecordKind::View
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Material => "material",
            RecordKind::Type => "type",
            RecordKind::WallType => "wall type",
            RecordKind::View => "view",
            RecordKind::Category => "category",
            RecordKind::Generic => "element",
        }
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// 所有记录共享的实体核心字段，各专用记录以组合方式嵌入。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCore {
    pub host_class: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub numeric_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_template: bool,
}

impl EntityCore {
    pub fn new(host_class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            host_class: host_class.into(),
            name: name.into(),
            numeric_id: 0,
            stable_id: None,
            category_name: None,
            parameters: Vec::new(),
            alias_names: None,
            is_template: false,
        }
    }

    /// 从宿主元素拍摄快照。只读参数视为派生值，直接跳过。
    pub fn from_element<D: HostDocument + ?Sized>(element: &Element, document: &D) -> Self {
        let parameters: Vec<ParameterRecord> = element
            .parameters
            .iter()
            .filter(|param| !param.is_read_only)
            .map(|param| ParameterRecord::from_live(param, document))
            .collect();
        let skipped = element.parameters.len() - parameters.len();
        if skipped > 0 {
            debug!(id = element.id.get(), skipped, "跳过只读参数");
        }

        Self {
            host_class: element.class_name.clone(),
            name: element.name.clone(),
            numeric_id: element.id.get(),
            stable_id: Some(element.unique_id.clone()),
            category_name: category_name(element, document),
            parameters,
            alias_names: None,
            is_template: false,
        }
    }

    /// 转为模板记录：去掉编号与稳定 ID，仅能按名称定位。
    pub fn into_template(mut self) -> Self {
        self.numeric_id = 0;
        self.stable_id = None;
        self.is_template = true;
        self
    }

    pub fn parameter_references_mut(&mut self) -> Vec<&mut IdentityRef> {
        self.parameters
            .iter_mut()
            .filter_map(|parameter| parameter.reference_value.as_mut())
            .collect()
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alias_names = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    pub fn aliases(&self) -> &[String] {
        self.alias_names.as_deref().unwrap_or_default()
    }
}

/// 记录的公共访问接口。
pub trait EntityRecord {
    fn core(&self) -> &EntityCore;

    fn core_mut(&mut self) -> &mut EntityCore;

    fn kind(&self) -> RecordKind;

    #[inline]
    fn name(&self) -> &str {
        &self.core().name
    }

    /// 记录中的全部嵌套引用，含参数引用。
    fn references_mut(&mut self) -> Vec<&mut IdentityRef> {
        self.core_mut().parameter_references_mut()
    }
}

impl EntityRecord for EntityCore {
    fn core(&self) -> &EntityCore {
        self
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        self
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Generic
    }
}

/// 类型记录，结构与通用记录相同，仅用于分派。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRecord {
    #[serde(flatten)]
    pub core: EntityCore,
}

impl TypeRecord {
    pub fn from_element<D: HostDocument + ?Sized>(element: &Element, document: &D) -> Self {
        Self {
            core: EntityCore::from_element(element, document),
        }
    }
}

impl EntityRecord for TypeRecord {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Type
    }
}
