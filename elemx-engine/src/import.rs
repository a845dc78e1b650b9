use elemx_core::document::HostDocument;
use elemx_io::{Catalog, CatalogRecord, EntityRecord, RecordKind};
use tracing::{info, warn};

use crate::errors::EngineError;
use crate::merge::MergeReport;
use crate::reconcile::{ReconcileOptions, Reconciled, Reconciler};

/// 导入行为开关，通常来自配置文件。
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub create_missing: bool,
    pub merge_aliases: bool,
}

#[derive(Debug)]
pub struct ImportFailure {
    pub name: String,
    pub kind: RecordKind,
    pub error: EngineError,
}

/// 整体导入结果。单条记录失败不会中断其余记录。
#[derive(Debug, Default)]
pub struct ImportReport {
    pub reconciled: Vec<Reconciled>,
    pub failed: Vec<ImportFailure>,
    pub merges: Vec<MergeReport>,
}

impl ImportReport {
    /// 全部已应用的记录，包括别名合并中的规范类型。
    pub fn outcomes(&self) -> impl Iterator<Item = &Reconciled> {
        self.reconciled
            .iter()
            .chain(self.merges.iter().map(|merge| &merge.canonical))
    }

    pub fn created(&self) -> usize {
        self.outcomes().filter(|outcome| outcome.created).count()
    }

    pub fn parameter_errors(&self) -> usize {
        self.outcomes()
            .map(|outcome| outcome.parameter_errors.len())
            .sum()
    }

    fn push_failure(&mut self, record: &CatalogRecord, error: EngineError) {
        warn!(
            name = %record.name(),
            kind = record.kind().label(),
            error = %error,
            "记录导入失败"
        );
        self.failed.push(ImportFailure {
            name: record.name().to_string(),
            kind: record.kind(),
            error,
        });
    }
}

/// 按材质、类型、墙类型、其余元素的顺序应用整份目录。
pub fn import_catalog<D: HostDocument + ?Sized>(
    document: &mut D,
    catalog: Catalog,
    options: ImportOptions,
) -> ImportReport {
    let reconcile_options = ReconcileOptions {
        create_missing: options.create_missing,
        template: None,
    };
    let mut reconciler = Reconciler::new(document);
    let mut report = ImportReport::default();

    for record in catalog.into_records() {
        let merge = options.merge_aliases
            && record.kind().is_type_family()
            && !record.core().aliases().is_empty();
        if merge {
            match reconciler.merge_aliases(&record, reconcile_options) {
                Ok(merged) => {
                    if !merged.is_complete() {
                        warn!(
                            name = %record.name(),
                            failed = merged.failed.len(),
                            "别名合并未全部完成"
                        );
                    }
                    report.merges.push(merged);
                }
                Err(error) => report.push_failure(&record, error),
            }
        } else {
            match reconciler.reconcile(&record, reconcile_options) {
                Ok(outcome) => report.reconciled.push(outcome),
                Err(error) => report.push_failure(&record, error),
            }
        }
    }

    info!(
        reconciled = report.outcomes().count(),
        created = report.created(),
        merged = report.merges.len(),
        failed = report.failed.len(),
        parameter_errors = report.parameter_errors(),
        "目录导入完成"
    );
    report
}

#[cfg(test)]
mod tests {
    use elemx_core::class_names;
    use elemx_core::document::{Document, MaterialData};
    use elemx_core::parameter::{Parameter, ParameterValue};
    use elemx_io::parameter::{ParameterRecord, StorageKind};
    use elemx_io::{EntityCore, ExportOptions, TypeRecord};

    use super::*;

    #[test]
    fn template_catalog_populates_an_empty_document() {
        let mut source = Document::new();
        source.add_material("Brick", MaterialData::default());
        source.add_element_type(class_names::TEXT_NOTE_TYPE, "Label 2.5");
        let catalog = Catalog::export_document(&source, ExportOptions { template: true }).unwrap();

        // 目标文档各类中至少要有一个可复制的模板。
        let mut target = Document::new();
        target.add_material("Default", MaterialData::default());
        target.add_element_type(class_names::TEXT_NOTE_TYPE, "Standard");

        let report = import_catalog(
            &mut target,
            catalog,
            ImportOptions {
                create_missing: true,
                merge_aliases: false,
            },
        );
        assert!(report.failed.is_empty(), "{:?}", report.failed);
        assert_eq!(report.created(), 2);
        let names: Vec<&str> = target.elements().map(|element| element.name.as_str()).collect();
        assert!(names.contains(&"Brick"));
        assert!(names.contains(&"Label 2.5"));
    }

    #[test]
    fn failures_are_collected_per_record() {
        let mut doc = Document::new();
        let mut catalog = Catalog::new();
        catalog
            .insert(CatalogRecord::Type(TypeRecord {
                core: EntityCore::new(class_names::TEXT_NOTE_TYPE, "Orphan"),
            }))
            .unwrap();
        catalog
            .insert(CatalogRecord::Generic(EntityCore::new(class_names::WALL, "Wall 9")))
            .unwrap();

        let report = import_catalog(&mut doc, catalog, ImportOptions::default());
        assert!(report.reconciled.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].kind, RecordKind::Type);
        assert!(matches!(report.failed[1].error, EngineError::LookupMiss { .. }));
    }

    #[test]
    fn aliases_merge_only_when_enabled() {
        let mut doc = Document::new();
        let canonical = doc.add_element_type(class_names::TEXT_NOTE_TYPE, "Label");
        let legacy = doc.add_element_type(class_names::TEXT_NOTE_TYPE, "Old Label");
        let note = doc.add_instance(class_names::TEXT_NOTE, "Note", Some(legacy));

        let mut record = TypeRecord::from_element(doc.element(canonical).unwrap(), &doc);
        record.core = record.core.clone().with_aliases(["Old Label"]);
        let mut catalog = Catalog::new();
        catalog.insert(CatalogRecord::Type(record)).unwrap();

        let report = import_catalog(&mut doc, catalog.clone(), ImportOptions::default());
        assert!(report.merges.is_empty());
        assert_eq!(doc.element(note).unwrap().type_id(), Some(legacy));

        let options = ImportOptions {
            create_missing: false,
            merge_aliases: true,
        };
        let report = import_catalog(&mut doc, catalog, options);
        assert_eq!(report.merges.len(), 1);
        assert_eq!(report.merges[0].merged.len(), 1);
        assert_eq!(doc.element(note).unwrap().type_id(), Some(canonical));
    }

    #[test]
    fn merged_records_count_toward_report_totals() {
        let mut doc = Document::new();
        let canonical = doc.add_element_type(class_names::TEXT_NOTE_TYPE, "Label");
        doc.seed_element_mut(canonical).unwrap().parameters =
            vec![Parameter::new("Text Size", -1100, ParameterValue::Double(2.5))];
        let legacy = doc.add_element_type(class_names::TEXT_NOTE_TYPE, "Old Label");
        doc.add_instance(class_names::TEXT_NOTE, "Note", Some(legacy));

        let mut record = TypeRecord::from_element(doc.element(canonical).unwrap(), &doc);
        record.core = record.core.clone().with_aliases(["Old Label"]);
        record.core.parameters =
            vec![ParameterRecord::scalar("Text Size", StorageKind::Double, "big", -1100)];
        let mut catalog = Catalog::new();
        catalog.insert(CatalogRecord::Type(record)).unwrap();

        let options = ImportOptions {
            create_missing: false,
            merge_aliases: true,
        };
        let report = import_catalog(&mut doc, catalog, options);
        assert!(report.reconciled.is_empty());
        assert_eq!(report.merges.len(), 1);
        assert_eq!(report.outcomes().count(), 1);
        assert_eq!(report.parameter_errors(), 1);
        assert_eq!(report.created(), 0);
    }
}
