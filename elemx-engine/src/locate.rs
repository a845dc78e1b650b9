use std::collections::HashMap;

use elemx_core::document::{Element, HostDocument};
use elemx_core::ids::ElementId;
use elemx_io::values::IdentityRef;
use elemx_io::{EntityCore, EntityRecord, ReferenceResolver, Resolved};
use tracing::{debug, trace};

/// 定位所需的全部键，按优先级依次尝试。
#[derive(Debug, Clone, Copy, Default)]
pub struct LocateKey<'a> {
    pub stable_id: Option<&'a str>,
    pub numeric_id: i64,
    pub name: Option<&'a str>,
    pub host_class: Option<&'a str>,
}

impl<'a> From<&'a EntityCore> for LocateKey<'a> {
    fn from(core: &'a EntityCore) -> Self {
        Self {
            stable_id: core.stable_id.as_deref(),
            numeric_id: core.numeric_id,
            name: Some(core.name.as_str()),
            host_class: Some(core.host_class.as_str()),
        }
    }
}

impl<'a> From<&'a IdentityRef> for LocateKey<'a> {
    fn from(reference: &'a IdentityRef) -> Self {
        Self {
            stable_id: reference.stable_id.as_deref(),
            numeric_id: reference.numeric_id,
            name: reference.display_name.as_deref(),
            host_class: reference.host_class.as_deref(),
        }
    }
}

/// 一次导入/应用过程中的编号查找缓存，未命中同样缓存。
#[derive(Debug, Default)]
pub struct ResolutionCache {
    by_number: HashMap<i64, Option<ElementId>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }

    /// 新建元素后调用，避免沿用此前缓存的未命中。
    pub fn forget(&mut self, id: ElementId) {
        self.by_number.remove(&id.get());
    }

    /// 事务回滚后缓存的命中可能已失效。
    pub fn clear(&mut self) {
        self.by_number.clear();
    }
}

/// 只读的定位器：借用文档与缓存，实现完整的查找顺序。
pub struct Locator<'a, D: ?Sized> {
    document: &'a D,
    cache: &'a mut ResolutionCache,
}

impl<'a, D: HostDocument + ?Sized> Locator<'a, D> {
    pub fn new(document: &'a D, cache: &'a mut ResolutionCache) -> Self {
        Self { document, cache }
    }

    #[inline]
    pub fn document(&self) -> &'a D {
        self.document
    }

    /// 按非零编号查找，结果写入缓存。
    pub fn by_number(&mut self, numeric_id: i64) -> Option<ElementId> {
        if numeric_id == 0 {
            return None;
        }
        let document = self.document;
        *self.cache.by_number.entry(numeric_id).or_insert_with(|| {
            document
                .element(ElementId::new(numeric_id))
                .map(|element| element.id)
        })
    }

    /// 稳定 ID 优先，其次非零编号，最后名称加宿主类型。
    ///
    /// 记录自身的定位不检查类型，类型不符由应用阶段报告。
    pub fn locate(&mut self, key: LocateKey<'_>) -> Option<ElementId> {
        self.locate_with(key, false)
    }

    /// `same_class` 为真时，稳定 ID 或编号命中了其他类型的元素视为未命中，
    /// 继续按名称加类型查找。
    fn locate_with(&mut self, key: LocateKey<'_>, same_class: bool) -> Option<ElementId> {
        let document = self.document;
        let admits = |element: &Element| {
            !same_class
                || key
                    .host_class
                    .is_none_or(|class_name| element.class_name == class_name)
        };

        if let Some(unique_id) = key.stable_id {
            if let Some(element) = document.element_by_unique_id(unique_id) {
                if admits(element) {
                    trace!(unique_id, id = element.id.get(), "按稳定 ID 定位");
                    return Some(element.id);
                }
                debug!(unique_id, found = %element.class_name, "稳定 ID 命中的元素类型不符");
            }
        }

        if let Some(id) = self.by_number(key.numeric_id) {
            match document.element(id) {
                Some(element) if !admits(element) => {
                    debug!(
                        numeric_id = key.numeric_id,
                        found = %element.class_name,
                        "编号命中的元素类型不符"
                    );
                }
                _ => {
                    trace!(numeric_id = key.numeric_id, "按编号定位");
                    return Some(id);
                }
            }
        }

        let (Some(name), Some(host_class)) = (key.name, key.host_class) else {
            return None;
        };
        let found = document
            .elements_of_class(host_class)
            .find(|element| element.name == name)
            .map(|element| element.id);
        if found.is_some() {
            trace!(name, host_class, "按名称定位");
        }
        found
    }

    /// 记录的第一阶段到第二阶段：附上定位结果。
    pub fn resolve<'r, R: EntityRecord + ?Sized>(&mut self, record: &'r R) -> Resolved<&'r R> {
        let live = self.locate(LocateKey::from(record.core()));
        Resolved::new(record, live)
    }
}

impl<D: HostDocument + ?Sized> ReferenceResolver for Locator<'_, D> {
    fn resolve_reference(&mut self, reference: &IdentityRef) -> Option<ElementId> {
        self.locate_with(LocateKey::from(reference), true)
    }
}

#[cfg(test)]
mod tests {
    use elemx_core::class_names;
    use elemx_core::document::{Document, MaterialData};
    use elemx_io::HasLiveBinding;

    use super::*;

    fn core_for(doc: &Document, id: ElementId) -> EntityCore {
        EntityCore::from_element(doc.element(id).unwrap(), doc)
    }

    #[test]
    fn stable_id_wins_over_conflicting_number() {
        let mut doc = Document::new();
        let brick = doc.add_material("Brick", MaterialData::default());
        let glass = doc.add_material("Glass", MaterialData::default());

        let mut core = core_for(&doc, brick);
        core.numeric_id = glass.get();

        let mut cache = ResolutionCache::new();
        let mut locator = Locator::new(&doc, &mut cache);
        assert_eq!(locator.locate(LocateKey::from(&core)), Some(brick));
    }

    #[test]
    fn falls_back_to_number_then_name() {
        let mut doc = Document::new();
        let brick = doc.add_material("Brick", MaterialData::default());
        let mut cache = ResolutionCache::new();
        let mut locator = Locator::new(&doc, &mut cache);

        let mut stale = core_for(&doc, brick);
        stale.stable_id = Some("gone".to_string());
        assert_eq!(locator.locate(LocateKey::from(&stale)), Some(brick));

        let template = core_for(&doc, brick).into_template();
        assert_eq!(locator.locate(LocateKey::from(&template)), Some(brick));

        let other_class = EntityCore::new(class_names::ELEMENT_TYPE, "Brick");
        assert_eq!(locator.locate(LocateKey::from(&other_class)), None);
    }

    #[test]
    fn numeric_misses_are_cached() {
        let mut doc = Document::new();
        doc.add_fill_pattern("Solid");
        let mut cache = ResolutionCache::new();
        {
            let mut locator = Locator::new(&doc, &mut cache);
            assert_eq!(locator.by_number(4242), None);
            assert_eq!(locator.by_number(0), None);
        }
        assert_eq!(cache.len(), 1);
        cache.forget(ElementId::new(4242));
        assert!(cache.is_empty());
    }

    #[test]
    fn resolve_attaches_live_binding() {
        let mut doc = Document::new();
        let label = doc.add_element_type(class_names::TEXT_NOTE_TYPE, "Label 2.5");
        let mut cache = ResolutionCache::new();
        let mut locator = Locator::new(&doc, &mut cache);

        let core = core_for(&doc, label);
        let resolved = locator.resolve(&core);
        assert_eq!(resolved.live_binding(), Some(label));
        assert_eq!(resolved.record().name, "Label 2.5");

        let absent = EntityCore::new(class_names::TEXT_NOTE_TYPE, "Label 5");
        assert_eq!(locator.resolve(&absent).live(), None);
    }

    #[test]
    fn references_resolve_by_name_across_documents() {
        let mut source = Document::new();
        let solid = source.add_fill_pattern("Solid fill");
        let reference = IdentityRef::from_id(solid, &source);

        // 目标文档中同一编号属于另一类型。
        let mut target = Document::new();
        let asset = target.add_appearance_asset("Brick Red");
        let crosshatch = target.add_fill_pattern("Crosshatch");
        let target_solid = target.add_fill_pattern("Solid fill");
        assert_eq!(asset, solid);
        let mut cache = ResolutionCache::new();
        let mut locator = Locator::new(&target, &mut cache);
        assert_eq!(locator.resolve_reference(&reference), Some(target_solid));

        // 同类型的编号命中无法识别，模板引用因此不携带编号。
        let mut same_class = reference.clone();
        same_class.numeric_id = crosshatch.get();
        assert_eq!(locator.resolve_reference(&same_class), Some(crosshatch));
        let mut detached = same_class.clone();
        detached.detach();
        assert_eq!(locator.resolve_reference(&detached), Some(target_solid));

        assert_eq!(locator.resolve_or_invalid(&IdentityRef::unset()), ElementId::INVALID);
    }

    #[test]
    fn record_locate_keeps_wrong_class_hits_for_mismatch_reporting() {
        let mut doc = Document::new();
        let label = doc.add_element_type(class_names::TEXT_NOTE_TYPE, "Label");
        let mut core = EntityCore::new(class_names::MATERIAL, "Brick");
        core.numeric_id = label.get();

        let mut cache = ResolutionCache::new();
        let mut locator = Locator::new(&doc, &mut cache);
        assert_eq!(locator.locate(LocateKey::from(&core)), Some(label));
    }
}
