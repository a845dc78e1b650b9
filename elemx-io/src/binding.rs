use elemx_core::ids::ElementId;

use crate::values::IdentityRef;

/// 可以报告宿主绑定的类型。
pub trait HasLiveBinding {
    fn live_binding(&self) -> Option<ElementId>;
}

/// 记录的第二阶段：原记录加上解析得到的宿主元素。
///
/// 解析结果（包括未命中）在本次操作内保持不变，且从不写回可移植格式。
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<R> {
    record: R,
    live: Option<ElementId>,
}

impl<R> Resolved<R> {
    pub fn new(record: R, live: Option<ElementId>) -> Self {
        Self { record, live }
    }

    #[inline]
    pub fn record(&self) -> &R {
        &self.record
    }

    #[inline]
    pub fn live(&self) -> Option<ElementId> {
        self.live
    }

    pub fn into_parts(self) -> (R, Option<ElementId>) {
        (self.record, self.live)
    }
}

impl<R> HasLiveBinding for Resolved<R> {
    fn live_binding(&self) -> Option<ElementId> {
        self.live
    }
}

/// 把引用记录解析为宿主编号。引擎以完整的查找顺序实现该接口。
pub trait ReferenceResolver {
    fn resolve_reference(&mut self, reference: &IdentityRef) -> Option<ElementId>;

    /// 未设置的引用映射为无效编号，未命中同样退化为无效编号。
    fn resolve_or_invalid(&mut self, reference: &IdentityRef) -> ElementId {
        if reference.is_unset() {
            return ElementId::INVALID;
        }
        self.resolve_reference(reference).unwrap_or(ElementId::INVALID)
    }
}
