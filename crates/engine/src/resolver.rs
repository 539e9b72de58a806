//! Peer group resolution
//!
//! Turns a record into the peer group it belongs to. A group is always
//! described by its `ScopeFilter`; when the record's container already has
//! its collection loaded, the group also carries that collection and reads
//! are answered from memory instead of the store.
//!
//! A cached collection is trusted to be ascending by position and current.
//! The resolver never re-sorts it, and never uses it when the caller asks
//! for a fresh query (as the assigner does after a scope change).

use std::borrow::Cow;

use ordinal_core::{PeerQuery, Result, ScopeFilter, SortableConfig, SortableRecord};

/// A container's already-loaded collection of records
///
/// Unloaded by default. `reset` drops the loaded records so the next
/// resolution goes back to the store.
#[derive(Debug, Clone)]
pub struct PeerCache<R> {
    records: Option<Vec<R>>,
}

impl<R> Default for PeerCache<R> {
    fn default() -> Self {
        Self { records: None }
    }
}

impl<R> PeerCache<R> {
    /// A cache with nothing loaded
    pub fn unloaded() -> Self {
        Self::default()
    }

    /// A cache holding `records`, which must be ascending by position
    pub fn loaded(records: Vec<R>) -> Self {
        Self {
            records: Some(records),
        }
    }

    /// True when records are materialized
    pub fn is_loaded(&self) -> bool {
        self.records.is_some()
    }

    /// The loaded records
    pub fn records(&self) -> Option<&[R]> {
        self.records.as_deref()
    }

    /// Forget the loaded records
    pub fn reset(&mut self) {
        self.records = None;
    }
}

/// One resolved peer group
#[derive(Debug)]
pub struct PeerGroup<'c, R> {
    filter: ScopeFilter,
    cached: Option<&'c [R]>,
}

impl<'c, R: SortableRecord> PeerGroup<'c, R> {
    /// Equality filter selecting the group in the store
    pub fn filter(&self) -> &ScopeFilter {
        &self.filter
    }

    /// True when the group is answered from a loaded collection
    pub fn is_materialized(&self) -> bool {
        self.cached.is_some()
    }

    /// Every peer, ascending by position
    pub fn load<Q>(&self, query: &mut Q) -> Result<Cow<'c, [R]>>
    where
        Q: PeerQuery<Record = R>,
    {
        match self.cached {
            Some(records) => Ok(Cow::Borrowed(records)),
            None => Ok(Cow::Owned(query.select_peers(&self.filter)?)),
        }
    }

    /// Largest position in the group, 0 when there is none
    pub fn max_position<Q>(&self, query: &mut Q) -> Result<i64>
    where
        Q: PeerQuery<Record = R>,
    {
        let max = match self.cached {
            Some(records) => records.iter().filter_map(|r| r.position()).max(),
            None => query.max_position(&self.filter)?,
        };
        Ok(max.unwrap_or(0))
    }

    /// Peer with the smallest position strictly greater than `position`
    pub fn first_after<Q>(&self, query: &mut Q, position: i64) -> Result<Option<R>>
    where
        Q: PeerQuery<Record = R>,
    {
        match self.cached {
            Some(records) => Ok(records
                .iter()
                .find(|r| r.position().map_or(false, |p| p > position))
                .cloned()),
            None => query.first_after(&self.filter, position),
        }
    }

    /// Peer with the largest position strictly less than `position`
    pub fn last_before<Q>(&self, query: &mut Q, position: i64) -> Result<Option<R>>
    where
        Q: PeerQuery<Record = R>,
    {
        match self.cached {
            Some(records) => Ok(records
                .iter()
                .rev()
                .find(|r| r.position().map_or(false, |p| p < position))
                .cloned()),
            None => query.last_before(&self.filter, position),
        }
    }
}

/// Resolves records to their peer groups
#[derive(Debug, Clone)]
pub struct PeerGroupResolver {
    scope: Vec<String>,
    container_key: Option<String>,
    container_type: Option<String>,
}

impl PeerGroupResolver {
    /// Resolver for records declared by `config`
    pub fn new(config: &SortableConfig) -> Self {
        Self {
            scope: config.scope_attributes(),
            container_key: config.container.as_ref().map(|c| c.foreign_key.clone()),
            container_type: config
                .container
                .as_ref()
                .and_then(|c| c.foreign_type.clone()),
        }
    }

    /// Attributes whose values define the group
    pub fn scope_attributes(&self) -> &[String] {
        &self.scope
    }

    /// Equality filter on every scope attribute's current value
    pub fn filter_for<R: SortableRecord>(&self, record: &R) -> ScopeFilter {
        let mut filter = ScopeFilter::global();
        for attribute in &self.scope {
            filter.push(attribute.clone(), record.scope_value(attribute));
        }
        filter
    }

    /// True when any scope attribute differs from its persisted value
    pub fn scope_changed<R: SortableRecord>(&self, record: &R) -> bool {
        self.scope.iter().any(|s| record.scope_changed(s))
    }

    /// True when the record points at a container whose collection may be reused
    ///
    /// A polymorphic reference needs both its type and its key set.
    pub fn references_container<R: SortableRecord>(&self, record: &R) -> bool {
        let Some(key) = &self.container_key else {
            return false;
        };
        let typed = match &self.container_type {
            Some(kind) => !record.scope_value(kind).is_null(),
            None => true,
        };
        typed && !record.scope_value(key).is_null()
    }

    /// Resolve `record`'s peer group
    ///
    /// The container's loaded collection in `cache` is used only when
    /// `force_fresh` is false, a container is configured, the record
    /// references one, and the collection is loaded.
    pub fn peers<'c, R: SortableRecord>(
        &self,
        record: &R,
        cache: Option<&'c PeerCache<R>>,
        force_fresh: bool,
    ) -> PeerGroup<'c, R> {
        let cached = if force_fresh || !self.references_container(record) {
            None
        } else {
            cache.and_then(|c| c.records())
        };
        PeerGroup {
            filter: self.filter_for(record),
            cached,
        }
    }

    /// Drop any loaded collection so the next resolution queries the store
    pub fn invalidate<R>(&self, cache: Option<&mut PeerCache<R>>) {
        if let Some(cache) = cache {
            cache.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryPeers;
    use ordinal_core::{ContainerConfig, Record, Value};

    fn container_config() -> SortableConfig {
        SortableConfig::new().with_container(ContainerConfig::new("container", "container_id"))
    }

    #[test]
    fn test_filter_uses_current_scope_values() {
        let resolver = PeerGroupResolver::new(
            &SortableConfig::new().with_container(
                ContainerConfig::new("owner", "owner_id").polymorphic("owner_type"),
            ),
        );
        let record = Record::new().with("owner_type", "List").with("owner_id", 3);
        let filter = resolver.filter_for(&record);
        assert_eq!(
            filter.key().into_vec(),
            vec![Value::from("List"), Value::Int(3)]
        );
    }

    #[test]
    fn test_global_scope_has_empty_filter() {
        let resolver = PeerGroupResolver::new(&SortableConfig::new());
        assert!(resolver.filter_for(&Record::new()).is_global());
        assert!(!resolver.references_container(&Record::new()));
    }

    #[test]
    fn test_cache_used_only_with_container_reference() {
        let resolver = PeerGroupResolver::new(&container_config());
        let cache = PeerCache::loaded(vec![Record::new().with_position(1)]);

        let with_container = Record::new().with("container_id", 1);
        assert!(resolver.peers(&with_container, Some(&cache), false).is_materialized());

        let orphan = Record::new();
        assert!(!resolver.peers(&orphan, Some(&cache), false).is_materialized());
    }

    #[test]
    fn test_polymorphic_reference_needs_type_and_key() {
        let resolver = PeerGroupResolver::new(&SortableConfig::new().with_container(
            ContainerConfig::new("owner", "owner_id").polymorphic("owner_type"),
        ));
        let cache = PeerCache::loaded(vec![Record::new().with_position(1)]);

        let typed = Record::new().with("owner_type", "List").with("owner_id", 3);
        assert!(resolver.references_container(&typed));
        assert!(resolver.peers(&typed, Some(&cache), false).is_materialized());

        let untyped = Record::new().with("owner_id", 3);
        assert!(!resolver.references_container(&untyped));
        assert!(!resolver.peers(&untyped, Some(&cache), false).is_materialized());

        let keyless = Record::new().with("owner_type", "List");
        assert!(!resolver.references_container(&keyless));
    }

    #[test]
    fn test_force_fresh_bypasses_cache() {
        let resolver = PeerGroupResolver::new(&container_config());
        let cache = PeerCache::loaded(vec![Record::new().with_position(1)]);
        let record = Record::new().with("container_id", 1);
        assert!(!resolver.peers(&record, Some(&cache), true).is_materialized());
    }

    #[test]
    fn test_unloaded_cache_falls_back_to_query() {
        let resolver = PeerGroupResolver::new(&container_config());
        let cache = PeerCache::unloaded();
        let record = Record::new().with("container_id", 1);
        assert!(!resolver.peers(&record, Some(&cache), false).is_materialized());
    }

    #[test]
    fn test_scope_without_container_never_uses_cache() {
        let resolver = PeerGroupResolver::new(&SortableConfig::new().with_scope(["list_id"]));
        let cache = PeerCache::loaded(vec![Record::new().with_position(1)]);
        let record = Record::new().with("list_id", 1);
        assert!(!resolver.peers(&record, Some(&cache), false).is_materialized());
    }

    #[test]
    fn test_cached_reads_do_not_query() {
        let resolver = PeerGroupResolver::new(&container_config());
        let cache = PeerCache::loaded(vec![
            Record::new().with("container_id", 1).with_position(2),
            Record::new().with("container_id", 1).with_position(5),
        ]);
        let record = Record::new().with("container_id", 1);
        let group = resolver.peers(&record, Some(&cache), false);

        let mut store = MemoryPeers::default();
        assert_eq!(group.max_position(&mut store).unwrap(), 5);
        assert_eq!(group.first_after(&mut store, 2).unwrap().unwrap().position(), Some(5));
        assert_eq!(group.last_before(&mut store, 5).unwrap().unwrap().position(), Some(2));
        assert!(group.first_after(&mut store, 5).unwrap().is_none());
        assert_eq!(group.load(&mut store).unwrap().len(), 2);
        assert_eq!(store.queries, 0);
    }

    #[test]
    fn test_empty_group_max_is_zero() {
        let resolver = PeerGroupResolver::new(&SortableConfig::new());
        let group = resolver.peers(&Record::new(), None::<&PeerCache<Record>>, false);
        let mut store = MemoryPeers::default();
        assert_eq!(group.max_position(&mut store).unwrap(), 0);
        assert_eq!(store.queries, 1);
    }

    #[test]
    fn test_invalidate_resets_cache() {
        let resolver = PeerGroupResolver::new(&container_config());
        let mut cache = PeerCache::loaded(vec![Record::new()]);
        resolver.invalidate(Some(&mut cache));
        assert!(!cache.is_loaded());
        resolver.invalidate::<Record>(None);
    }

    #[test]
    fn test_scope_changed() {
        use std::collections::BTreeMap;
        let resolver = PeerGroupResolver::new(&container_config());
        let attributes: BTreeMap<String, Value> =
            [("container_id".to_string(), Value::Int(1))].into_iter().collect();
        let mut record = Record::loaded(ordinal_core::RecordId::new(1), attributes, 1);
        assert!(!resolver.scope_changed(&record));
        record.set("container_id", 2);
        assert!(resolver.scope_changed(&record));
    }
}
