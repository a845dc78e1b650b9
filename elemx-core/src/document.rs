use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::class_names;
use crate::color::Color;
use crate::enums::{DeckEmbeddingType, DisplayStyle, MaterialFunctionAssignment};
use crate::errors::HostError;
use crate::ids::ElementId;
use crate::overrides::{NO_LINE_WEIGHT, OverrideGraphicSettings};
use crate::parameter::Parameter;

/// 宿主文档的协作接口。引擎只通过该接口查找、修改文档。
///
/// 所有写操作（`element_mut`、`duplicate_type`、`change_type`）都必须处于已打开的事务中；
/// 同一时刻只允许一个事务。
pub trait HostDocument {
    fn element(&self, id: ElementId) -> Option<&Element>;

    fn element_by_unique_id(&self, unique_id: &str) -> Option<&Element>;

    /// 按宿主枚举顺序返回全部元素。
    fn elements(&self) -> Box<dyn Iterator<Item = &Element> + '_>;

    fn elements_of_class<'a>(
        &'a self,
        class_name: &'a str,
    ) -> Box<dyn Iterator<Item = &'a Element> + 'a> {
        Box::new(
            self.elements()
                .filter(move |element| element.class_name == class_name),
        )
    }

    /// 当前是否处于可写事务中。
    fn is_modifiable(&self) -> bool;

    fn start_transaction(&mut self, name: &str) -> Result<(), HostError>;

    fn commit_transaction(&mut self) -> Result<(), HostError>;

    fn rollback_transaction(&mut self) -> Result<(), HostError>;

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element, HostError>;

    /// 以 `template` 为模板复制出名为 `name` 的新类型。
    fn duplicate_type(&mut self, template: ElementId, name: &str) -> Result<ElementId, HostError>;

    /// 将实例改为引用 `new_type`。
    fn change_type(&mut self, instance: ElementId, new_type: ElementId) -> Result<(), HostError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub unique_id: String,
    pub class_name: String,
    pub name: String,
    pub category: Option<ElementId>,
    pub parameters: Vec<Parameter>,
    pub data: ElementData,
    pub is_pinned: bool,
}

impl Element {
    pub fn parameter_by_guid(&self, guid: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|param| param.guid.as_deref() == Some(guid))
    }

    pub fn parameter_by_guid_mut(&mut self, guid: &str) -> Option<&mut Parameter> {
        self.parameters
            .iter_mut()
            .find(|param| param.guid.as_deref() == Some(guid))
    }

    /// 按参数定义编号（内建标签或定义元素编号）查找。
    pub fn parameter_by_definition(&self, definition_id: i64) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|param| param.definition_id == definition_id)
    }

    pub fn parameter_by_definition_mut(&mut self, definition_id: i64) -> Option<&mut Parameter> {
        self.parameters
            .iter_mut()
            .find(|param| param.definition_id == definition_id)
    }

    pub fn parameter_by_name(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|param| param.name == name)
    }

    /// 实例所引用的类型。
    #[inline]
    pub fn type_id(&self) -> Option<ElementId> {
        match &self.data {
            ElementData::Instance { type_id } => *type_id,
            _ => None,
        }
    }

    /// 类型类元素（可被复制、名称在同类中唯一）。
    pub fn is_type(&self) -> bool {
        matches!(
            self.data,
            ElementData::Type
                | ElementData::WallType(_)
                | ElementData::Material(_)
                | ElementData::View(_)
        )
    }
}

/// 不同宿主类型携带的专有数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementData {
    /// 无专有数据的元素（参数定义、填充图案、外观资源等）。
    Plain,
    Instance {
        type_id: Option<ElementId>,
    },
    Type,
    WallType(CompoundStructure),
    Material(MaterialData),
    View(ViewData),
    Category(CategoryData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialData {
    pub cut_foreground_pattern_color: Color,
    pub cut_foreground_pattern_id: ElementId,
    pub cut_background_pattern_color: Color,
    pub cut_background_pattern_id: ElementId,
    pub surface_foreground_pattern_color: Color,
    pub surface_foreground_pattern_id: ElementId,
    pub surface_background_pattern_color: Color,
    pub surface_background_pattern_id: ElementId,
    pub appearance_asset_id: ElementId,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            cut_foreground_pattern_color: Color::default(),
            cut_foreground_pattern_id: ElementId::INVALID,
            cut_background_pattern_color: Color::default(),
            cut_background_pattern_id: ElementId::INVALID,
            surface_foreground_pattern_color: Color::default(),
            surface_foreground_pattern_id: ElementId::INVALID,
            surface_background_pattern_color: Color::default(),
            surface_background_pattern_id: ElementId::INVALID,
            appearance_asset_id: ElementId::INVALID,
        }
    }
}

/// 视图中单个类别的可见性与图形覆盖。
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryOverride {
    pub hidden: bool,
    pub graphics: OverrideGraphicSettings,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewData {
    pub is_template: bool,
    pub display_style: DisplayStyle,
    pub shadow_intensity: i32,
    pub sunlight_intensity: i32,
    category_overrides: BTreeMap<ElementId, CategoryOverride>,
}

impl ViewData {
    pub fn is_category_hidden(&self, category: ElementId) -> bool {
        self.category_overrides
            .get(&category)
            .is_some_and(|entry| entry.hidden)
    }

    /// 返回类别的图形覆盖，未设置时为全哨兵值。
    pub fn category_overrides(&self, category: ElementId) -> OverrideGraphicSettings {
        self.category_overrides
            .get(&category)
            .map(|entry| entry.graphics.clone())
            .unwrap_or_default()
    }

    pub fn set_category_hidden(&mut self, category: ElementId, hidden: bool) {
        self.category_overrides.entry(category).or_default().hidden = hidden;
    }

    pub fn set_category_overrides(
        &mut self,
        category: ElementId,
        graphics: OverrideGraphicSettings,
    ) {
        self.category_overrides.entry(category).or_default().graphics = graphics;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryData {
    pub line_color: Option<Color>,
    pub material_id: ElementId,
    pub projection_line_weight: i32,
    pub cut_line_weight: i32,
}

impl Default for CategoryData {
    fn default() -> Self {
        Self {
            line_color: None,
            material_id: ElementId::INVALID,
            projection_line_weight: NO_LINE_WEIGHT,
            cut_line_weight: NO_LINE_WEIGHT,
        }
    }
}

/// 墙类型等分层构件的复合结构。
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundStructure {
    pub layers: Vec<CompoundLayer>,
    pub sweeps: Vec<WallSweep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundLayer {
    pub material_id: ElementId,
    pub function: MaterialFunctionAssignment,
    pub width: f64,
    pub deck_embedding: DeckEmbeddingType,
    pub deck_profile_id: ElementId,
    pub is_cap: bool,
}

impl CompoundLayer {
    pub fn new(material_id: ElementId, function: MaterialFunctionAssignment, width: f64) -> Self {
        Self {
            material_id,
            function,
            width,
            deck_embedding: DeckEmbeddingType::Invalid,
            deck_profile_id: ElementId::INVALID,
            is_cap: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSweep {
    pub name: String,
    pub distance: f64,
}

impl WallSweep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            distance: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct OpenTransaction {
    name: String,
    elements: BTreeMap<ElementId, Element>,
    next_id: i64,
}

/// 内存中的参考宿主文档，按编号顺序枚举元素。
///
/// `add_*` 系列方法用于构建初始文档，不经过事务；
/// 经由 `HostDocument` 的写操作必须位于事务中，提交失败时整体回滚。
#[derive(Debug, Clone)]
pub struct Document {
    episode: Uuid,
    elements: BTreeMap<ElementId, Element>,
    next_id: i64,
    transaction: Option<OpenTransaction>,
}

impl Document {
    const FIRST_ID: i64 = 100;

    pub fn new() -> Self {
        Self {
            episode: Uuid::new_v4(),
            elements: BTreeMap::new(),
            next_id: Self::FIRST_ID,
            transaction: None,
        }
    }

    fn next_id(&mut self) -> ElementId {
        let id = ElementId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn unique_id_for(&self, id: ElementId) -> String {
        format!("{}-{:08x}", self.episode, id.get())
    }

    pub fn add_element(
        &mut self,
        class_name: impl Into<String>,
        name: impl Into<String>,
        data: ElementData,
    ) -> ElementId {
        let id = self.next_id();
        let element = Element {
            id,
            unique_id: self.unique_id_for(id),
            class_name: class_name.into(),
            name: name.into(),
            category: None,
            parameters: Vec::new(),
            data,
            is_pinned: false,
        };
        self.elements.insert(id, element);
        id
    }

    pub fn add_category(&mut self, name: impl Into<String>) -> ElementId {
        self.add_element(
            class_names::CATEGORY,
            name,
            ElementData::Category(CategoryData::default()),
        )
    }

    pub fn add_parameter_definition(&mut self, name: impl Into<String>) -> ElementId {
        self.add_element(class_names::PARAMETER_ELEMENT, name, ElementData::Plain)
    }

    pub fn add_fill_pattern(&mut self, name: impl Into<String>) -> ElementId {
        self.add_element(class_names::FILL_PATTERN, name, ElementData::Plain)
    }

    pub fn add_line_pattern(&mut self, name: impl Into<String>) -> ElementId {
        self.add_element(class_names::LINE_PATTERN, name, ElementData::Plain)
    }

    pub fn add_appearance_asset(&mut self, name: impl Into<String>) -> ElementId {
        self.add_element(class_names::APPEARANCE_ASSET, name, ElementData::Plain)
    }

    pub fn add_material(&mut self, name: impl Into<String>, data: MaterialData) -> ElementId {
        self.add_element(class_names::MATERIAL, name, ElementData::Material(data))
    }

    /// 添加普通类型，`class_name` 可为元素类型、文字类型或尺寸标注类型。
    pub fn add_element_type(
        &mut self,
        class_name: impl Into<String>,
        name: impl Into<String>,
    ) -> ElementId {
        self.add_element(class_name, name, ElementData::Type)
    }

    pub fn add_wall_type(
        &mut self,
        name: impl Into<String>,
        structure: CompoundStructure,
    ) -> ElementId {
        self.add_element(class_names::WALL_TYPE, name, ElementData::WallType(structure))
    }

    pub fn add_view(&mut self, name: impl Into<String>, data: ViewData) -> ElementId {
        self.add_element(class_names::VIEW, name, ElementData::View(data))
    }

    pub fn add_instance(
        &mut self,
        class_name: impl Into<String>,
        name: impl Into<String>,
        type_id: Option<ElementId>,
    ) -> ElementId {
        self.add_element(class_name, name, ElementData::Instance { type_id })
    }

    /// 构建初始文档时直接修改元素（不经过事务）。
    pub fn seed_element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// 本次事务中新建或改名的类型元素，其名称在同一类中必须唯一，否则事务无法提交。
    fn validate_names(&self, before: &BTreeMap<ElementId, Element>) -> Result<(), HostError> {
        let touched = self.elements.values().filter(|element| {
            element.is_type()
                && before.get(&element.id).is_none_or(|old| {
                    old.name != element.name || old.class_name != element.class_name
                })
        });
        for element in touched {
            let clash = self.elements.values().find(|other| {
                other.id != element.id
                    && other.is_type()
                    && other.class_name == element.class_name
                    && other.name == element.name
            });
            if let Some(existing) = clash {
                return Err(HostError::CommitRejected(format!(
                    "elements {} and {} of class {} share the name `{}`",
                    existing.id, element.id, element.class_name, element.name
                )));
            }
        }
        Ok(())
    }

    fn ensure_modifiable(&self) -> Result<(), HostError> {
        if self.transaction.is_some() {
            Ok(())
        } else {
            Err(HostError::NotModifiable)
        }
    }

    fn restore(&mut self, transaction: OpenTransaction) {
        self.elements = transaction.elements;
        self.next_id = transaction.next_id;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDocument for Document {
    fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    fn element_by_unique_id(&self, unique_id: &str) -> Option<&Element> {
        self.elements
            .values()
            .find(|element| element.unique_id == unique_id)
    }

    fn elements(&self) -> Box<dyn Iterator<Item = &Element> + '_> {
        Box::new(self.elements.values())
    }

    fn is_modifiable(&self) -> bool {
        self.transaction.is_some()
    }

    fn start_transaction(&mut self, name: &str) -> Result<(), HostError> {
        if let Some(open) = &self.transaction {
            return Err(HostError::TransactionAlreadyOpen(open.name.clone()));
        }
        self.transaction = Some(OpenTransaction {
            name: name.to_string(),
            elements: self.elements.clone(),
            next_id: self.next_id,
        });
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), HostError> {
        let transaction = self
            .transaction
            .take()
            .ok_or(HostError::NoOpenTransaction)?;
        if let Err(err) = self.validate_names(&transaction.elements) {
            self.restore(transaction);
            return Err(err);
        }
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<(), HostError> {
        let transaction = self
            .transaction
            .take()
            .ok_or(HostError::NoOpenTransaction)?;
        self.restore(transaction);
        Ok(())
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element, HostError> {
        self.ensure_modifiable()?;
        self.elements
            .get_mut(&id)
            .ok_or(HostError::ElementNotFound(id))
    }

    fn duplicate_type(&mut self, template: ElementId, name: &str) -> Result<ElementId, HostError> {
        self.ensure_modifiable()?;
        let source = self
            .elements
            .get(&template)
            .ok_or(HostError::ElementNotFound(template))?;
        if !source.is_type() {
            return Err(HostError::InvalidOperation(format!(
                "element {template} is not a type and cannot be duplicated"
            )));
        }
        let clash = self
            .elements
            .values()
            .any(|element| element.class_name == source.class_name && element.name == name);
        if clash {
            return Err(HostError::DuplicateName {
                class_name: source.class_name.clone(),
                name: name.to_string(),
            });
        }

        let mut copy = source.clone();
        let id = self.next_id();
        copy.id = id;
        copy.unique_id = self.unique_id_for(id);
        copy.name = name.to_string();
        copy.is_pinned = false;
        self.elements.insert(id, copy);
        Ok(id)
    }

    fn change_type(&mut self, instance: ElementId, new_type: ElementId) -> Result<(), HostError> {
        self.ensure_modifiable()?;
        let target_class = self
            .elements
            .get(&new_type)
            .filter(|element| element.is_type())
            .map(|element| element.class_name.clone())
            .ok_or(HostError::ElementNotFound(new_type))?;

        let current_type = {
            let element = self
                .elements
                .get(&instance)
                .ok_or(HostError::ElementNotFound(instance))?;
            if element.is_pinned {
                return Err(HostError::ElementPinned(instance));
            }
            match &element.data {
                ElementData::Instance { type_id } => *type_id,
                _ => {
                    return Err(HostError::InvalidOperation(format!(
                        "element {instance} is not an instance"
                    )));
                }
            }
        };

        if let Some(current) = current_type.and_then(|id| self.elements.get(&id)) {
            if current.class_name != target_class {
                return Err(HostError::InvalidOperation(format!(
                    "cannot change instance {instance} from {} to {target_class}",
                    current.class_name
                )));
            }
        }

        let element = self
            .elements
            .get_mut(&instance)
            .ok_or(HostError::ElementNotFound(instance))?;
        element.data = ElementData::Instance {
            type_id: Some(new_type),
        };
        Ok(())
    }
}
