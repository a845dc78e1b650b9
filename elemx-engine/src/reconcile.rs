use elemx_core::document::HostDocument;
use elemx_core::errors::HostError;
use elemx_core::ids::ElementId;
use elemx_io::{EntityRecord, HasLiveBinding, RecordKind, Resolved};
use tracing::{debug, info};

use crate::apply::{ApplyRecord, mismatch};
use crate::errors::{EngineError, ParameterError};
use crate::locate::{Locator, ResolutionCache};
use crate::parameters;
use crate::transaction::with_transaction;

/// 定位失败时的处理方式。
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// 类型族记录找不到目标时，是否复制模板创建。
    pub create_missing: bool,
    /// 显式指定的模板；缺省时使用同类中的第一个元素。
    pub template: Option<ElementId>,
}

impl ReconcileOptions {
    pub fn create_missing() -> Self {
        Self {
            create_missing: true,
            template: None,
        }
    }
}

/// 单条记录的应用结果。
#[derive(Debug)]
pub struct Reconciled {
    pub name: String,
    pub kind: RecordKind,
    pub element: ElementId,
    pub created: bool,
    pub parameter_errors: Vec<ParameterError>,
}

/// 在单个文档上定位、创建并应用记录。定位缓存在整个生命周期内共享。
pub struct Reconciler<'d, D: ?Sized> {
    document: &'d mut D,
    cache: ResolutionCache,
}

impl<'d, D: HostDocument + ?Sized> Reconciler<'d, D> {
    pub fn new(document: &'d mut D) -> Self {
        Self {
            document,
            cache: ResolutionCache::new(),
        }
    }

    pub fn document(&self) -> &D {
        &*self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut D {
        &mut *self.document
    }

    /// 只定位，不修改文档。
    pub fn resolve<'r, R: EntityRecord + ?Sized>(&mut self, record: &'r R) -> Resolved<&'r R> {
        Locator::new(&*self.document, &mut self.cache).resolve(record)
    }

    /// 定位（必要时创建）并应用记录，全部修改处于同一事务中。
    ///
    /// 参数级别的问题记录在结果中，不会使整体失败。
    pub fn reconcile<R: ApplyRecord + ?Sized>(
        &mut self,
        record: &R,
        options: ReconcileOptions,
    ) -> Result<Reconciled, EngineError> {
        let resolved = self.resolve(record);
        let template = match resolved.live_binding() {
            Some(_) => None,
            None => Some(self.template_for(record, options)?),
        };
        let (record, located) = resolved.into_parts();

        let name = record.name().to_string();
        let transaction = format!("Apply {} `{}`", record.kind().label(), name);
        let Self { document, cache } = &mut *self;
        let outcome = with_transaction(&mut **document, &transaction, |doc| {
            let (target, created) = match (located, template) {
                (Some(id), _) => (id, false),
                (None, Some(template)) => {
                    let id = doc.duplicate_type(template, record.name())?;
                    cache.forget(id);
                    info!(
                        name = %record.name(),
                        id = id.get(),
                        template = template.get(),
                        "由模板创建"
                    );
                    (id, true)
                }
                (None, None) => {
                    return Err(EngineError::LookupMiss {
                        kind: record.kind().label(),
                        name: record.name().to_string(),
                    });
                }
            };
            let parameter_errors = apply_to(doc, cache, record, target)?;
            Ok((target, created, parameter_errors))
        });

        match outcome {
            Ok((element, created, parameter_errors)) => Ok(Reconciled {
                name,
                kind: record.kind(),
                element,
                created,
                parameter_errors,
            }),
            Err(err) => {
                self.cache.clear();
                Err(err)
            }
        }
    }

    fn template_for<R: ApplyRecord + ?Sized>(
        &self,
        record: &R,
        options: ReconcileOptions,
    ) -> Result<ElementId, EngineError> {
        let miss = || EngineError::LookupMiss {
            kind: record.kind().label(),
            name: record.name().to_string(),
        };
        if !options.create_missing || !record.kind().is_type_family() {
            return Err(miss());
        }
        if let Some(template) = options.template {
            return Ok(template);
        }
        self.document
            .elements_of_class(&record.core().host_class)
            .find(|element| element.is_type())
            .map(|element| element.id)
            .ok_or_else(miss)
    }
}

/// 将记录写到 `target`：先在只读阶段准备好全部新值，再一次性写入。
fn apply_to<D, R>(
    document: &mut D,
    cache: &mut ResolutionCache,
    record: &R,
    target: ElementId,
) -> Result<Vec<ParameterError>, EngineError>
where
    D: HostDocument + ?Sized,
    R: ApplyRecord + ?Sized,
{
    let (data, pending, mut errors) = {
        let current = document
            .element(target)
            .ok_or(HostError::ElementNotFound(target))?;
        if current.class_name != record.core().host_class {
            return Err(mismatch(record, current));
        }
        let mut locator = Locator::new(&*document, cache);
        let data = record.prepare_data(current, &mut locator)?;
        let (pending, errors) =
            parameters::prepare_all(&record.core().parameters, current, &mut locator);
        (data, pending, errors)
    };

    let element = document.element_mut(target)?;
    if element.name != record.name() {
        debug!(id = target.get(), from = %element.name, to = %record.name(), "重命名");
        element.name = record.name().to_string();
    }
    if let Some(data) = data {
        element.data = data;
    }
    errors.extend(parameters::write_all(pending, element));
    Ok(errors)
}
