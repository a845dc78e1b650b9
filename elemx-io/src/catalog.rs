use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use elemx_core::document::{Element, HostDocument};
use elemx_core::ids::ElementId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::category::CategoryRecord;
use crate::entity::{EntityCore, EntityRecord, RecordKind, TypeRecord};
use crate::material::MaterialRecord;
use crate::view::ViewRecord;
use crate::wall_type::WallTypeRecord;
use crate::values::IdentityRef;
use crate::{CatalogError, ExportError};

/// 记录的封闭集合，`Generic` 兜底未知的宿主类型。
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogRecord {
    Material(MaterialRecord),
    Type(TypeRecord),
    WallType(WallTypeRecord),
    View(ViewRecord),
    Category(CategoryRecord),
    Generic(EntityCore),
}

impl CatalogRecord {
    /// 按宿主运行时类型选择专用记录。
    pub fn from_element<D: HostDocument + ?Sized>(
        element: &Element,
        document: &D,
    ) -> Result<Self, ExportError> {
        let record = match RecordKind::from_class_name(&element.class_name) {
            RecordKind::Material => {
                CatalogRecord::Material(MaterialRecord::from_element(element, document)?)
            }
            RecordKind::Type => CatalogRecord::Type(TypeRecord::from_element(element, document)),
            RecordKind::WallType => {
                CatalogRecord::WallType(WallTypeRecord::from_element(element, document)?)
            }
            RecordKind::View => CatalogRecord::View(ViewRecord::from_element(element, document)?),
            RecordKind::Category => {
                CatalogRecord::Category(CategoryRecord::from_element(element, document)?)
            }
            RecordKind::Generic => {
                CatalogRecord::Generic(EntityCore::from_element(element, document))
            }
        };
        Ok(record)
    }

    /// 模板记录不携带本文档的编号，嵌套引用同样只保留名称与类型。
    pub fn into_template(mut self) -> Self {
        for reference in self.references_mut() {
            reference.detach();
        }
        let core = self.core_mut();
        *core = core.clone().into_template();
        self
    }
}

impl EntityRecord for CatalogRecord {
    fn core(&self) -> &EntityCore {
        match self {
            CatalogRecord::Material(record) => &record.core,
            CatalogRecord::Type(record) => &record.core,
            CatalogRecord::WallType(record) => &record.core,
            CatalogRecord::View(record) => &record.core,
            CatalogRecord::Category(record) => &record.core,
            CatalogRecord::Generic(core) => core,
        }
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        match self {
            CatalogRecord::Material(record) => &mut record.core,
            CatalogRecord::Type(record) => &mut record.core,
            CatalogRecord::WallType(record) => &mut record.core,
            CatalogRecord::View(record) => &mut record.core,
            CatalogRecord::Category(record) => &mut record.core,
            CatalogRecord::Generic(core) => core,
        }
    }

    fn references_mut(&mut self) -> Vec<&mut IdentityRef> {
        match self {
            CatalogRecord::Material(record) => record.references_mut(),
            CatalogRecord::Type(record) => record.references_mut(),
            CatalogRecord::WallType(record) => record.references_mut(),
            CatalogRecord::View(record) => record.references_mut(),
            CatalogRecord::Category(record) => record.references_mut(),
            CatalogRecord::Generic(core) => core.references_mut(),
        }
    }

    fn kind(&self) -> RecordKind {
        match self {
            CatalogRecord::Material(_) => RecordKind::Material,
            CatalogRecord::Type(_) => RecordKind::Type,
            CatalogRecord::WallType(_) => RecordKind::WallType,
            CatalogRecord::View(_) => RecordKind::View,
            CatalogRecord::Category(_) => RecordKind::Category,
            CatalogRecord::Generic(_) => RecordKind::Generic,
        }
    }
}

impl Serialize for CatalogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CatalogRecord::Material(record) => record.serialize(serializer),
            CatalogRecord::Type(record) => record.serialize(serializer),
            CatalogRecord::WallType(record) => record.serialize(serializer),
            CatalogRecord::View(record) => record.serialize(serializer),
            CatalogRecord::Category(record) => record.serialize(serializer),
            CatalogRecord::Generic(core) => core.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for CatalogRecord {
    /// 读取 `host_class` 后按与导出相同的规则分派。
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;
        let class_name = value
            .get("host_class")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| De::Error::missing_field("host_class"))?;
        let kind = RecordKind::from_class_name(class_name);
        let record = match kind {
            RecordKind::Material => serde_json::from_value(value).map(CatalogRecord::Material),
            RecordKind::Type => serde_json::from_value(value).map(CatalogRecord::Type),
            RecordKind::WallType => serde_json::from_value(value).map(CatalogRecord::WallType),
            RecordKind::View => serde_json::from_value(value).map(CatalogRecord::View),
            RecordKind::Category => serde_json::from_value(value).map(CatalogRecord::Category),
            RecordKind::Generic => serde_json::from_value(value).map(CatalogRecord::Generic),
        };
        record.map_err(De::Error::custom)
    }
}

/// 导出选项。
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportOptions {
    /// 以模板形式导出（不含编号与稳定 ID），用于其他文档。
    pub template: bool,
}

pub const MATERIALS_BUCKET: &str = "materials";
pub const ELEMENT_TYPES_BUCKET: &str = "element-types";
pub const WALL_TYPES_BUCKET: &str = "wall-types";

/// 整个文档的记录集合：材质、类型、墙类型按名称分桶，其余元素保持数组。
///
/// 分桶中的记录必须属于该桶的记录种类，否则读取失败。
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Catalog {
    #[serde(default, deserialize_with = "material_bucket")]
    pub materials: BTreeMap<String, MaterialRecord>,
    #[serde(default, deserialize_with = "element_type_bucket")]
    pub element_types: BTreeMap<String, TypeRecord>,
    #[serde(default, deserialize_with = "wall_type_bucket")]
    pub wall_types: BTreeMap<String, WallTypeRecord>,
    #[serde(default)]
    pub elements: Vec<CatalogRecord>,
}

fn checked_bucket<'de, De, R>(
    deserializer: De,
    bucket: &'static str,
    expected: RecordKind,
) -> Result<BTreeMap<String, R>, De::Error>
where
    De: Deserializer<'de>,
    R: Deserialize<'de> + EntityRecord,
{
    use serde::de::Error;

    let records = BTreeMap::<String, R>::deserialize(deserializer)?;
    let misplaced = records
        .values()
        .find(|record| RecordKind::from_class_name(&record.core().host_class) != expected);
    if let Some(record) = misplaced {
        return Err(De::Error::custom(CatalogError::BucketMismatch {
            bucket,
            name: record.name().to_string(),
            host_class: record.core().host_class.clone(),
        }));
    }
    Ok(records)
}

fn material_bucket<'de, De: Deserializer<'de>>(
    deserializer: De,
) -> Result<BTreeMap<String, MaterialRecord>, De::Error> {
    checked_bucket(deserializer, MATERIALS_BUCKET, RecordKind::Material)
}

fn element_type_bucket<'de, De: Deserializer<'de>>(
    deserializer: De,
) -> Result<BTreeMap<String, TypeRecord>, De::Error> {
    checked_bucket(deserializer, ELEMENT_TYPES_BUCKET, RecordKind::Type)
}

fn wall_type_bucket<'de, De: Deserializer<'de>>(
    deserializer: De,
) -> Result<BTreeMap<String, WallTypeRecord>, De::Error> {
    checked_bucket(deserializer, WALL_TYPES_BUCKET, RecordKind::WallType)
}

fn insert_unique<R>(
    bucket: &mut BTreeMap<String, R>,
    bucket_name: &'static str,
    record: R,
    name: String,
) -> Result<(), CatalogError> {
    match bucket.entry(name) {
        Entry::Occupied(entry) => Err(CatalogError::DuplicateKey {
            bucket: bucket_name,
            name: entry.key().clone(),
        }),
        Entry::Vacant(entry) => {
            entry.insert(record);
            Ok(())
        }
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 放入对应分桶。同一分桶中的重名记录视为错误，不会覆盖。
    pub fn insert(&mut self, record: CatalogRecord) -> Result<(), CatalogError> {
        let name = record.name().to_string();
        match record {
            CatalogRecord::Material(record) => {
                insert_unique(&mut self.materials, MATERIALS_BUCKET, record, name)
            }
            CatalogRecord::Type(record) => {
                insert_unique(&mut self.element_types, ELEMENT_TYPES_BUCKET, record, name)
            }
            CatalogRecord::WallType(record) => {
                insert_unique(&mut self.wall_types, WALL_TYPES_BUCKET, record, name)
            }
            other => {
                self.elements.push(other);
                Ok(())
            }
        }
    }

    /// 导出指定元素。不存在的编号记录日志后跳过。
    pub fn export<D, I>(
        document: &D,
        ids: I,
        options: ExportOptions,
    ) -> Result<Self, CatalogError>
    where
        D: HostDocument + ?Sized,
        I: IntoIterator<Item = ElementId>,
    {
        let mut catalog = Self::new();
        for id in ids {
            let Some(element) = document.element(id) else {
                warn!(id = id.get(), "导出时未找到元素，跳过");
                continue;
            };
            catalog.push_element(element, document, options)?;
        }
        Ok(catalog)
    }

    /// 按宿主枚举顺序导出整个文档。
    pub fn export_document<D: HostDocument + ?Sized>(
        document: &D,
        options: ExportOptions,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for element in document.elements() {
            catalog.push_element(element, document, options)?;
        }
        debug!(
            materials = catalog.materials.len(),
            element_types = catalog.element_types.len(),
            wall_types = catalog.wall_types.len(),
            elements = catalog.elements.len(),
            "文档导出完成"
        );
        Ok(catalog)
    }

    fn push_element<D: HostDocument + ?Sized>(
        &mut self,
        element: &Element,
        document: &D,
        options: ExportOptions,
    ) -> Result<(), CatalogError> {
        let mut record = CatalogRecord::from_element(element, document)?;
        if options.template {
            record = record.into_template();
        }
        self.insert(record)
    }

    pub fn len(&self) -> usize {
        self.materials.len() + self.element_types.len() + self.wall_types.len() + self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 展平为单一序列：材质、类型、墙类型，最后是其余元素。
    pub fn into_records(self) -> Vec<CatalogRecord> {
        let mut records = Vec::with_capacity(self.len());
        records.extend(self.materials.into_values().map(CatalogRecord::Material));
        records.extend(self.element_types.into_values().map(CatalogRecord::Type));
        records.extend(self.wall_types.into_values().map(CatalogRecord::WallType));
        records.extend(self.elements);
        records
    }
}

#[cfg(test)]
mod tests {
    use elemx_core::class_names;
    use elemx_core::document::{Document, MaterialData};

    use super::*;

    #[test]
    fn duplicate_material_names_are_rejected() {
        let mut doc = Document::new();
        let first = doc.add_material("Brick", MaterialData::default());
        let second = doc.add_material("Brick", MaterialData::default());

        let err = Catalog::export(&doc, [first, second], ExportOptions::default()).unwrap_err();
        match err {
            CatalogError::DuplicateKey { bucket, name } => {
                assert_eq!(bucket, MATERIALS_BUCKET);
                assert_eq!(name, "Brick");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn same_name_in_different_buckets_is_allowed() {
        let mut doc = Document::new();
        doc.add_material("Standard", MaterialData::default());
        doc.add_element_type(class_names::TEXT_NOTE_TYPE, "Standard");
        doc.add_instance(class_names::TEXT_NOTE, "Standard", None);
        doc.add_instance(class_names::TEXT_NOTE, "Standard", None);

        let catalog = Catalog::export_document(&doc, ExportOptions::default()).unwrap();
        assert_eq!(catalog.materials.len(), 1);
        assert_eq!(catalog.element_types.len(), 1);
        assert_eq!(catalog.elements.len(), 2);
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn records_are_flattened_bucket_by_bucket() {
        let mut doc = Document::new();
        let note = doc.add_instance(class_names::TEXT_NOTE, "Note", None);
        let label = doc.add_element_type(class_names::TEXT_NOTE_TYPE, "Label");
        let concrete = doc.add_material("Concrete", MaterialData::default());

        let catalog = Catalog::export(&doc, [note, label, concrete], ExportOptions::default())
            .unwrap();
        let kinds: Vec<RecordKind> = catalog
            .into_records()
            .iter()
            .map(EntityRecord::kind)
            .collect();
        assert_eq!(
            kinds,
            [RecordKind::Material, RecordKind::Type, RecordKind::Generic]
        );
    }

    #[test]
    fn bucket_records_of_another_class_are_rejected() {
        let text = r#"{
            "element-types": {
                "Brick": {"host_class": "DB.Material", "name": "Brick", "numeric_id": 7}
            }
        }"#;
        let err = serde_json::from_str::<Catalog>(text).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("element-types"), "{message}");
        assert!(message.contains("DB.Material"), "{message}");

        let elements = r#"{
            "elements": [{"host_class": "DB.TextNoteType", "name": "Label"}]
        }"#;
        let catalog: Catalog = serde_json::from_str(elements).unwrap();
        assert!(matches!(catalog.elements[..], [CatalogRecord::Type(_)]));
    }

    #[test]
    fn missing_host_class_is_a_parse_error() {
        let err = serde_json::from_str::<CatalogRecord>(r#"{"name": "Orphan"}"#).unwrap_err();
        assert!(err.to_string().contains("host_class"));
    }
}
