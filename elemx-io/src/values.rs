use std::num::ParseIntError;
use std::str::FromStr;

use elemx_core::color::Color;
use elemx_core::document::{Element, HostDocument};
use elemx_core::enums::HostEnum;
use elemx_core::ids::ElementId;
use serde::{Deserialize, Serialize};

use crate::RecordError;
use crate::binding::Resolved;

/// 指向宿主元素的可移植引用。
///
/// `numeric_id` 是唯一的解析键；其余字段只用于调试与跨文档按名称查找。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRef {
    pub numeric_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable_id: Option<String>,
}

impl IdentityRef {
    /// 仅含编号的引用，对应从文本构造的情形。
    pub fn from_numeric(numeric_id: i64) -> Self {
        Self {
            numeric_id,
            display_name: None,
            host_class: None,
            category_name: None,
            stable_id: None,
        }
    }

    /// 宿主的无效编号。
    pub fn unset() -> Self {
        Self::from_numeric(ElementId::INVALID.get())
    }

    pub fn from_element<D: HostDocument + ?Sized>(element: &Element, document: &D) -> Self {
        Self {
            numeric_id: element.id.get(),
            display_name: Some(element.name.clone()),
            host_class: Some(element.class_name.clone()),
            category_name: category_name(element, document),
            stable_id: Some(element.unique_id.clone()),
        }
    }

    /// 按编号构造，元素存在时补全注释字段。
    pub fn from_id<D: HostDocument + ?Sized>(id: ElementId, document: &D) -> Self {
        if id.is_invalid() {
            return Self::unset();
        }
        match document.element(id) {
            Some(element) => Self::from_element(element, document),
            None => Self::from_numeric(id.get()),
        }
    }

    /// 没有任何可用于查找的信息，应用时对应宿主的无效编号。
    pub fn is_unset(&self) -> bool {
        self.numeric_id <= 0 && self.stable_id.is_none() && self.display_name.is_none()
    }

    /// 引用记录了宿主类型时，候选元素必须属于该类型。
    pub fn accepts(&self, element: &Element) -> bool {
        self.host_class
            .as_deref()
            .is_none_or(|class_name| element.class_name == class_name)
    }

    /// 按非零编号解析。类型不符的命中视为未命中，未命中同样记录在结果中。
    pub fn resolve<D: HostDocument + ?Sized>(&self, document: &D) -> Resolved<&Self> {
        let live = if self.numeric_id != 0 {
            document
                .element(ElementId::new(self.numeric_id))
                .filter(|element| self.accepts(element))
                .map(|element| element.id)
        } else {
            None
        };
        Resolved::new(self, live)
    }

    /// 模板导出：去掉本文档的编号与稳定 ID，只留名称与类型供其他文档查找。
    pub fn detach(&mut self) {
        if self.display_name.is_some() {
            self.numeric_id = 0;
            self.stable_id = None;
        } else {
            *self = Self::unset();
        }
    }
}

impl FromStr for IdentityRef {
    type Err = ParseIntError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        text.trim().parse::<i64>().map(Self::from_numeric)
    }
}

pub(crate) fn category_name<D: HostDocument + ?Sized>(
    element: &Element,
    document: &D,
) -> Option<String> {
    element
        .category
        .and_then(|id| document.element(id))
        .map(|category| category.name.clone())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRecord {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl From<Color> for ColorRecord {
    fn from(color: Color) -> Self {
        Self {
            red: color.red,
            green: color.green,
            blue: color.blue,
        }
    }
}

impl From<ColorRecord> for Color {
    fn from(record: ColorRecord) -> Self {
        Color::new(record.red, record.green, record.blue)
    }
}

/// 以“类型名 + 成员名”保存的宿主枚举值，应用时才校验成员是否存在。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumRecord {
    pub type_name: String,
    pub value_name: String,
}

impl EnumRecord {
    pub fn from_host<E: HostEnum>(value: E) -> Self {
        Self {
            type_name: E::TYPE_NAME.to_string(),
            value_name: value.member_name().to_string(),
        }
    }

    pub fn resolve<E: HostEnum>(&self) -> Result<E, RecordError> {
        if self.type_name != E::TYPE_NAME {
            return Err(RecordError::EnumTypeMismatch {
                expected: E::TYPE_NAME,
                found: self.type_name.clone(),
            });
        }
        resolve_member(E::TYPE_NAME, &self.value_name)
    }
}

/// 按成员名解析枚举，供只保存成员名的字段使用。
pub fn resolve_member<E: HostEnum>(type_name: &str, value_name: &str) -> Result<E, RecordError> {
    E::from_member_name(value_name).ok_or_else(|| RecordError::UnknownEnumMember {
        type_name: type_name.to_string(),
        value_name: value_name.to_string(),
    })
}
