use elemx_core::document::HostDocument;
use elemx_core::ids::ElementId;
use tracing::{debug, info, warn};

use crate::apply::ApplyRecord;
use crate::errors::EngineError;
use crate::reconcile::{ReconcileOptions, Reconciled, Reconciler};
use crate::transaction::with_transaction;

/// 一个已改为引用规范类型的实例。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedInstance {
    pub alias: String,
    pub alias_type: ElementId,
    pub instance: ElementId,
}

#[derive(Debug)]
pub enum MergeFailureReason {
    /// 别名在文档中找不到对应类型。
    UnresolvedAlias,
    /// 宿主拒绝改变实例的类型（例如实例被锁定）。
    Rejected(EngineError),
}

#[derive(Debug)]
pub struct MergeFailure {
    pub alias: String,
    pub instance: Option<ElementId>,
    pub reason: MergeFailureReason,
}

/// 别名合并的结果：成功与失败分开列出，调用方不会收到沉默的部分结果。
#[derive(Debug)]
pub struct MergeReport {
    pub canonical: Reconciled,
    pub merged: Vec<MergedInstance>,
    pub failed: Vec<MergeFailure>,
}

impl MergeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<D: HostDocument + ?Sized> Reconciler<'_, D> {
    /// 先应用规范类型，再把每个别名类型的实例改为引用规范类型。
    ///
    /// 每次改型单独成事务，个别失败不会撤销其余已完成的改型。
    ///
    /// 只改写实例的 `type_id`。材质、视图等经由嵌套引用使用的别名保持原样，
    /// 这类别名能解析但不会产生合并项。
    pub fn merge_aliases<R: ApplyRecord + ?Sized>(
        &mut self,
        record: &R,
        options: ReconcileOptions,
    ) -> Result<MergeReport, EngineError> {
        if !record.kind().is_type_family() {
            return Err(EngineError::NotMergeable {
                kind: record.kind().label(),
                name: record.name().to_string(),
            });
        }

        let canonical = self.reconcile(record, options)?;
        let class_name = record.core().host_class.as_str();
        let mut merged = Vec::new();
        let mut failed = Vec::new();

        for alias in record.core().aliases() {
            let alias_type = self
                .document()
                .elements_of_class(class_name)
                .find(|element| element.name == *alias && element.id != canonical.element)
                .map(|element| element.id);
            let Some(alias_type) = alias_type else {
                warn!(alias = %alias, canonical = %canonical.name, "别名无法解析");
                failed.push(MergeFailure {
                    alias: alias.clone(),
                    instance: None,
                    reason: MergeFailureReason::UnresolvedAlias,
                });
                continue;
            };

            let instances: Vec<ElementId> = self
                .document()
                .elements()
                .filter(|element| element.type_id() == Some(alias_type))
                .map(|element| element.id)
                .collect();
            if instances.is_empty() {
                debug!(alias = %alias, alias_type = alias_type.get(), "别名类型没有实例");
            }

            for instance in instances {
                let transaction = format!("Merge `{alias}` into `{}`", canonical.name);
                let result = with_transaction(self.document_mut(), &transaction, |doc| {
                    doc.change_type(instance, canonical.element)
                        .map_err(EngineError::from)
                });
                match result {
                    Ok(()) => merged.push(MergedInstance {
                        alias: alias.clone(),
                        alias_type,
                        instance,
                    }),
                    Err(err) => {
                        warn!(
                            alias = %alias,
                            instance = instance.get(),
                            error = %err,
                            "改型被拒绝"
                        );
                        failed.push(MergeFailure {
                            alias: alias.clone(),
                            instance: Some(instance),
                            reason: MergeFailureReason::Rejected(err),
                        });
                    }
                }
            }
        }

        info!(
            canonical = %canonical.name,
            merged = merged.len(),
            failed = failed.len(),
            "别名合并完成"
        );
        Ok(MergeReport {
            canonical,
            merged,
            failed,
        })
    }
}
