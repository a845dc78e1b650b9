pub mod apply;
pub mod demo;
pub mod import;
pub mod locate;
pub mod merge;
pub mod parameters;
pub mod reconcile;
pub mod transaction;

pub mod errors {
    use elemx_core::errors::HostError;
    use elemx_core::ids::ElementId;
    use elemx_io::RecordError;
    use elemx_io::parameter::StorageKind;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("{kind} `{name}` could not be located or created")]
        LookupMiss { kind: &'static str, name: String },
        #[error("record `{name}` ({host_class}) does not match element {id} ({found})")]
        TypeMismatch {
            name: String,
            host_class: String,
            id: ElementId,
            found: String,
        },
        #[error("{kind} `{name}` cannot take part in an alias merge")]
        NotMergeable { kind: &'static str, name: String },
        #[error("transaction `{name}` failed: {source}")]
        Transaction {
            name: String,
            #[source]
            source: HostError,
        },
        #[error(transparent)]
        Host(#[from] HostError),
        #[error(transparent)]
        Record(#[from] RecordError),
    }

    /// 单个参数的应用结果，不会中断整个实体的应用。
    #[derive(Debug, Error)]
    pub enum ParameterError {
        #[error("parameter `{0}` was not found on the target")]
        LookupMiss(String),
        #[error("parameter `{name}`: referenced element could not be resolved")]
        UnresolvedReference { name: String },
        #[error("parameter `{name}`: cannot parse {value:?} as {kind:?}")]
        ParseFailure {
            name: String,
            value: String,
            kind: StorageKind,
        },
        #[error("parameter `{0}` carries no value")]
        MissingValue(String),
        #[error("parameter `{0}` is read-only")]
        ReadOnly(String),
        #[error("parameter `{name}` rejected by host: {source}")]
        Host {
            name: String,
            #[source]
            source: HostError,
        },
    }
}
