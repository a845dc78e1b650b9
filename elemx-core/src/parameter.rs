use serde::{Deserialize, Serialize};

use crate::enums::StorageType;
use crate::errors::HostError;
use crate::ids::ElementId;

/// 参数值，变体与 `StorageType` 一一对应。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Double(f64),
    Integer(i64),
    String(String),
    ElementId(ElementId),
}

impl ParameterValue {
    pub fn storage_type(&self) -> StorageType {
        match self {
            ParameterValue::Double(_) => StorageType::Double,
            ParameterValue::Integer(_) => StorageType::Integer,
            ParameterValue::String(_) => StorageType::String,
            ParameterValue::ElementId(_) => StorageType::ElementId,
        }
    }
}

/// 元素上的一个参数。
///
/// `definition_id` 为负数时表示内建参数标签，为正数时指向文档中的参数定义元素。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub definition_id: i64,
    pub value: ParameterValue,
    pub is_read_only: bool,
    pub is_shared: bool,
    pub guid: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, definition_id: i64, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            definition_id,
            value,
            is_read_only: false,
            is_shared: false,
            guid: None,
        }
    }

    /// 共享参数，按 GUID 匹配。
    pub fn shared(
        name: impl Into<String>,
        definition_id: i64,
        guid: impl Into<String>,
        value: ParameterValue,
    ) -> Self {
        Self {
            is_shared: true,
            guid: Some(guid.into()),
            ..Self::new(name, definition_id, value)
        }
    }

    pub fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    #[inline]
    pub fn storage_type(&self) -> StorageType {
        self.value.storage_type()
    }

    /// 写入新值。只读参数与存储类型不一致时由宿主拒绝。
    pub fn set(&mut self, value: ParameterValue) -> Result<(), HostError> {
        if self.is_read_only {
            return Err(HostError::ReadOnlyParameter(self.name.clone()));
        }
        let expected = self.storage_type();
        let found = value.storage_type();
        if expected != found {
            return Err(HostError::StorageMismatch {
                parameter: self.name.clone(),
                expected,
                found,
            });
        }
        self.value = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_checks_storage_and_read_only() {
        let mut width = Parameter::new("Width", 12, ParameterValue::Double(1.0));
        width.set(ParameterValue::Double(2.5)).expect("set double");
        assert_eq!(width.value, ParameterValue::Double(2.5));

        let err = width.set(ParameterValue::Integer(3)).unwrap_err();
        assert!(matches!(err, HostError::StorageMismatch { .. }));

        let mut area = Parameter::new("Area", -1001, ParameterValue::Double(4.0)).read_only();
        let err = area.set(ParameterValue::Double(1.0)).unwrap_err();
        assert!(matches!(err, HostError::ReadOnlyParameter(name) if name == "Area"));
    }

    #[test]
    fn shared_parameter_carries_guid() {
        let param = Parameter::shared(
            "Fire Rating",
            40,
            "6fb2c5d4-1b5e-4c57-9f4a-0d5d1f0e2a11",
            ParameterValue::String("2h".into()),
        );
        assert!(param.is_shared);
        assert_eq!(param.storage_type(), StorageType::String);
        assert!(param.guid.is_some());
    }
}
