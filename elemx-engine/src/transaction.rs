use elemx_core::document::HostDocument;
use tracing::{debug, warn};

use crate::errors::EngineError;

/// 在事务中执行 `work`。
///
/// 文档已处于可写事务时直接复用；否则打开专用事务，成功后提交，失败时回滚。
/// 提交被宿主拒绝时文档保持事务前的状态。
pub fn with_transaction<D, T, F>(document: &mut D, name: &str, work: F) -> Result<T, EngineError>
where
    D: HostDocument + ?Sized,
    F: FnOnce(&mut D) -> Result<T, EngineError>,
{
    if document.is_modifiable() {
        return work(document);
    }

    document
        .start_transaction(name)
        .map_err(|source| EngineError::Transaction {
            name: name.to_string(),
            source,
        })?;
    debug!(transaction = name, "已打开事务");

    match work(document) {
        Ok(value) => {
            document
                .commit_transaction()
                .map_err(|source| EngineError::Transaction {
                    name: name.to_string(),
                    source,
                })?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = document.rollback_transaction() {
                warn!(transaction = name, error = %rollback, "回滚事务失败");
            }
            Err(err)
        }
    }
}
