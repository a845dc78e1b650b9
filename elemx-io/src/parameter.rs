use elemx_core::document::HostDocument;
use elemx_core::enums::StorageType;
use elemx_core::parameter::{Parameter, ParameterValue};
use serde::{Deserialize, Serialize};

use crate::values::IdentityRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageKind {
    Double,
    Integer,
    String,
    Reference,
}

impl From<StorageType> for StorageKind {
    fn from(storage: StorageType) -> Self {
        match storage {
            StorageType::Double => StorageKind::Double,
            StorageType::Integer => StorageKind::Integer,
            StorageType::String => StorageKind::String,
            StorageType::ElementId => StorageKind::Reference,
        }
    }
}

/// 参数记录。`scalar_value` 与 `reference_value` 按 `storage_kind` 二选一。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub name: String,
    pub storage_kind: StorageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_value: Option<IdentityRef>,
    pub numeric_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_guid: Option<String>,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub is_read_only: bool,
}

impl ParameterRecord {
    /// 标量参数记录（Double / Integer / String）。
    pub fn scalar(
        name: impl Into<String>,
        storage_kind: StorageKind,
        value: impl Into<String>,
        numeric_id: i64,
    ) -> Self {
        Self {
            name: name.into(),
            storage_kind,
            scalar_value: Some(value.into()),
            reference_value: None,
            numeric_id,
            shared_guid: None,
            is_shared: false,
            is_read_only: false,
        }
    }

    pub fn reference(name: impl Into<String>, value: IdentityRef, numeric_id: i64) -> Self {
        Self {
            name: name.into(),
            storage_kind: StorageKind::Reference,
            scalar_value: None,
            reference_value: Some(value),
            numeric_id,
            shared_guid: None,
            is_shared: false,
            is_read_only: false,
        }
    }

    pub fn from_live<D: HostDocument + ?Sized>(param: &Parameter, document: &D) -> Self {
        let storage_kind = StorageKind::from(param.storage_type());
        let (scalar_value, reference_value) = match &param.value {
            ParameterValue::Double(value) => (Some(value.to_string()), None),
            ParameterValue::Integer(value) => (Some(value.to_string()), None),
            ParameterValue::ElementId(id) => (None, Some(IdentityRef::from_id(*id, document))),
            ParameterValue::String(text) => (Some(text.clone()), None),
        };
        // GUID 只在宿主参数本身为共享参数时写出。
        let shared_guid = if param.is_shared {
            param.guid.clone()
        } else {
            None
        };
        Self {
            name: param.name.clone(),
            storage_kind,
            scalar_value,
            reference_value,
            numeric_id: param.definition_id,
            shared_guid,
            is_shared: param.is_shared,
            is_read_only: param.is_read_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use elemx_core::document::Document;
    use elemx_core::ids::ElementId;

    use super::*;

    #[test]
    fn scalars_are_rendered_as_text() {
        let doc = Document::new();
        let width = Parameter::new("Width", 12, ParameterValue::Double(4.5));
        let count = Parameter::new("Count", -1010, ParameterValue::Integer(-3));
        let mark = Parameter::new("Mark", -1011, ParameterValue::String("A-01".into()));

        let width = ParameterRecord::from_live(&width, &doc);
        assert_eq!(width.storage_kind, StorageKind::Double);
        assert_eq!(width.scalar_value.as_deref(), Some("4.5"));
        assert!(width.reference_value.is_none());
        assert_eq!(width.numeric_id, 12);

        let count = ParameterRecord::from_live(&count, &doc);
        assert_eq!(count.scalar_value.as_deref(), Some("-3"));

        let mark = ParameterRecord::from_live(&mark, &doc);
        assert_eq!(mark.storage_kind, StorageKind::String);
        assert_eq!(mark.scalar_value.as_deref(), Some("A-01"));
    }

    #[test]
    fn reference_parameter_builds_identity() {
        let mut doc = Document::new();
        let material = doc.add_material("Brick", Default::default());
        let param = Parameter::new("Material", -1020, ParameterValue::ElementId(material));

        let record = ParameterRecord::from_live(&param, &doc);
        assert_eq!(record.storage_kind, StorageKind::Reference);
        assert!(record.scalar_value.is_none());
        let reference = record.reference_value.expect("reference value");
        assert_eq!(reference.numeric_id, material.get());
        assert_eq!(reference.display_name.as_deref(), Some("Brick"));

        let missing = Parameter::new("Phase", -1021, ParameterValue::ElementId(ElementId::INVALID));
        let record = ParameterRecord::from_live(&missing, &doc);
        assert!(record.reference_value.unwrap().is_unset());
    }

    #[test]
    fn guid_only_for_live_shared_parameters() {
        let doc = Document::new();
        let shared = Parameter::shared("Fire Rating", 50, "guid-1", ParameterValue::String("1h".into()));
        let record = ParameterRecord::from_live(&shared, &doc);
        assert!(record.is_shared);
        assert_eq!(record.shared_guid.as_deref(), Some("guid-1"));

        // 非共享参数即便携带 GUID 也不写出。
        let mut project = Parameter::new("Zone", 51, ParameterValue::String("N".into()));
        project.guid = Some("guid-2".to_string());
        let record = ParameterRecord::from_live(&project, &doc);
        assert!(!record.is_shared);
        assert!(record.shared_guid.is_none());
    }
}
