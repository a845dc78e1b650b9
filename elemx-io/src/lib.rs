use std::fs;
use std::path::Path;

use elemx_core::document::Element;
use elemx_core::ids::ElementId;
use thiserror::Error;

pub mod binding;
pub mod catalog;
pub mod category;
pub mod entity;
pub mod graphics;
pub mod material;
pub mod parameter;
pub mod values;
pub mod view;
pub mod wall_type;

pub use binding::{HasLiveBinding, ReferenceResolver, Resolved};
pub use catalog::{Catalog, CatalogRecord, ExportOptions};
pub use entity::{EntityCore, EntityRecord, RecordKind, TypeRecord};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

/// 记录在应用阶段才能发现的问题。
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("`{value_name}` is not a member of {type_name}")]
    UnknownEnumMember {
        type_name: String,
        value_name: String,
    },
    #[error("expected a value of {expected}, found {found}")]
    EnumTypeMismatch {
        expected: &'static str,
        found: String,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("element {id} of class {class_name} cannot be exported as {}", .expected.label())]
    TypeMismatch {
        id: ElementId,
        class_name: String,
        expected: RecordKind,
    },
}

impl ExportError {
    pub(crate) fn type_mismatch(element: &Element, expected: RecordKind) -> Self {
        Self::TypeMismatch {
            id: element.id,
            class_name: element.class_name.clone(),
            expected,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate key `{name}` in bucket `{bucket}`")]
    DuplicateKey { bucket: &'static str, name: String },
    #[error("record `{name}` of class `{host_class}` does not belong in bucket `{bucket}`")]
    BucketMismatch {
        bucket: &'static str,
        name: String,
        host_class: String,
    },
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub trait CatalogLoader {
    fn load(&self, path: &Path) -> Result<Catalog, IoError>;
}

pub trait CatalogSaver {
    fn save(&self, catalog: &Catalog, path: &Path) -> Result<(), IoError>;
}

/// JSON 文本格式的读写入口。
#[derive(Debug, Clone, Copy)]
pub struct JsonFacade {
    pretty: bool,
}

impl JsonFacade {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn with_pretty(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn encode(&self, catalog: &Catalog) -> Result<String, IoError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(catalog)?
        } else {
            serde_json::to_string(catalog)?
        };
        Ok(text)
    }

    pub fn decode(&self, text: &str) -> Result<Catalog, IoError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Default for JsonFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogLoader for JsonFacade {
    fn load(&self, path: &Path) -> Result<Catalog, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode(&data)
    }
}

impl CatalogSaver for JsonFacade {
    fn save(&self, catalog: &Catalog, path: &Path) -> Result<(), IoError> {
        let text = self.encode(catalog)?;
        fs::write(path, text).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}
