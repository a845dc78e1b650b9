use elemx_core::class_names;
use elemx_core::document::{Element, HostDocument};
use elemx_core::ids::ElementId;
use elemx_core::parameter::{Parameter, ParameterValue};
use elemx_io::ReferenceResolver;
use elemx_io::parameter::{ParameterRecord, StorageKind};
use tracing::{debug, warn};

use crate::errors::ParameterError;
use crate::locate::Locator;

/// 目标元素上的参数位置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSlot {
    Shared(String),
    Definition(i64),
}

impl ParameterSlot {
    fn get<'e>(&self, element: &'e Element) -> Option<&'e Parameter> {
        match self {
            ParameterSlot::Shared(guid) => element.parameter_by_guid(guid),
            ParameterSlot::Definition(id) => element.parameter_by_definition(*id),
        }
    }

    fn get_mut<'e>(&self, element: &'e mut Element) -> Option<&'e mut Parameter> {
        match self {
            ParameterSlot::Shared(guid) => element.parameter_by_guid_mut(guid),
            ParameterSlot::Definition(id) => element.parameter_by_definition_mut(*id),
        }
    }
}

/// 已解析、待写入的参数值。
#[derive(Debug, Clone, PartialEq)]
pub struct PendingParameter {
    pub name: String,
    pub slot: ParameterSlot,
    pub value: ParameterValue,
}

impl PendingParameter {
    pub fn write(self, target: &mut Element) -> Result<(), ParameterError> {
        let Some(param) = self.slot.get_mut(target) else {
            return Err(ParameterError::LookupMiss(self.name));
        };
        param.set(self.value).map_err(|source| ParameterError::Host {
            name: self.name,
            source,
        })
    }
}

/// 在目标元素上查找参数：共享参数按 GUID，内建参数按负编号，
/// 其余按编号解析参数定义元素后再查找。
pub fn find_slot<D: HostDocument + ?Sized>(
    record: &ParameterRecord,
    target: &Element,
    document: &D,
) -> Option<ParameterSlot> {
    if record.is_shared {
        let guid = record.shared_guid.as_deref()?;
        return target
            .parameter_by_guid(guid)
            .map(|_| ParameterSlot::Shared(guid.to_string()));
    }

    let definition_id = match record.numeric_id {
        id if id < 0 => id,
        id if id > 0 => document
            .element(ElementId::new(id))
            .filter(|element| element.class_name == class_names::PARAMETER_ELEMENT)?
            .id
            .get(),
        _ => return None,
    };
    target
        .parameter_by_definition(definition_id)
        .map(|_| ParameterSlot::Definition(definition_id))
}

/// 读取阶段：定位参数并按存储类型解析出宿主值。
pub fn prepare_parameter<D: HostDocument + ?Sized>(
    record: &ParameterRecord,
    target: &Element,
    locator: &mut Locator<'_, D>,
) -> Result<PendingParameter, ParameterError> {
    if record.is_read_only {
        return Err(ParameterError::ReadOnly(record.name.clone()));
    }
    let slot = find_slot(record, target, locator.document())
        .ok_or_else(|| ParameterError::LookupMiss(record.name.clone()))?;
    if slot.get(target).is_some_and(|param| param.is_read_only) {
        return Err(ParameterError::ReadOnly(record.name.clone()));
    }

    let value = match record.storage_kind {
        StorageKind::Reference => {
            let reference = record
                .reference_value
                .as_ref()
                .ok_or_else(|| ParameterError::MissingValue(record.name.clone()))?;
            if reference.is_unset() {
                ParameterValue::ElementId(ElementId::INVALID)
            } else {
                let id = locator.resolve_reference(reference).ok_or_else(|| {
                    ParameterError::UnresolvedReference {
                        name: record.name.clone(),
                    }
                })?;
                ParameterValue::ElementId(id)
            }
        }
        kind => {
            let text = record
                .scalar_value
                .as_deref()
                .ok_or_else(|| ParameterError::MissingValue(record.name.clone()))?;
            parse_scalar(&record.name, kind, text)?
        }
    };

    Ok(PendingParameter {
        name: record.name.clone(),
        slot,
        value,
    })
}

fn parse_scalar(
    name: &str,
    kind: StorageKind,
    text: &str,
) -> Result<ParameterValue, ParameterError> {
    let failure = || ParameterError::ParseFailure {
        name: name.to_string(),
        value: text.to_string(),
        kind,
    };
    match kind {
        StorageKind::Double => text
            .trim()
            .parse::<f64>()
            .map(ParameterValue::Double)
            .map_err(|_| failure()),
        StorageKind::Integer => text
            .trim()
            .parse::<i64>()
            .map(ParameterValue::Integer)
            .map_err(|_| failure()),
        StorageKind::String => Ok(ParameterValue::String(text.to_string())),
        StorageKind::Reference => Err(failure()),
    }
}

/// 批量准备参数。单个失败只记入错误列表。
pub fn prepare_all<D: HostDocument + ?Sized>(
    records: &[ParameterRecord],
    target: &Element,
    locator: &mut Locator<'_, D>,
) -> (Vec<PendingParameter>, Vec<ParameterError>) {
    let mut pending = Vec::with_capacity(records.len());
    let mut errors = Vec::new();
    for record in records {
        if record.is_read_only {
            debug!(parameter = %record.name, "跳过只读参数记录");
            continue;
        }
        match prepare_parameter(record, target, locator) {
            Ok(value) => pending.push(value),
            Err(err) => {
                warn!(id = target.id.get(), error = %err, "参数无法应用");
                errors.push(err);
            }
        }
    }
    (pending, errors)
}

/// 写入阶段。
pub fn write_all(pending: Vec<PendingParameter>, target: &mut Element) -> Vec<ParameterError> {
    let mut errors = Vec::new();
    for parameter in pending {
        if let Err(err) = parameter.write(target) {
            warn!(id = target.id.get(), error = %err, "宿主拒绝参数值");
            errors.push(err);
        }
    }
    errors
}
