//! Lock-protected result store.
//!
//! Items live behind an `RwLock`; every query goes through
//! [`ResultStore::run_with_read_lock`] and sees a consistent snapshot.
//! Mutations notify subscribed listeners on the mutating thread, after the
//! write lock has been released.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use rayon::prelude::*;
use tracing::debug;

use crate::category::Category;
use crate::consts::PARALLEL_ITEM_THRESHOLD;
use crate::error::{ResViewError, Result};
use crate::idlist::IdList;
use crate::item::{Field, ItemId, ItemKind, ItemKinds, ItemRef, ResultItem};
use crate::loader::ResultFile;

/// Options that shape a category query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Expand vector/statistic/histogram fields into extra scalar rows.
    pub include_fields: bool,
}

impl QueryOptions {
    pub fn with_fields(include_fields: bool) -> Self {
        Self { include_fields }
    }
}

/// What changed in the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreChange {
    FileLoaded { label: String, items: usize },
    FileUnloaded { label: String },
    Cleared,
    Disposed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreChangeEvent {
    pub change: StoreChange,
    /// Store generation after the change.
    pub generation: u64,
}

/// Receives change notifications. Called on the thread that mutated the store.
pub trait StoreListener: Send + Sync {
    fn store_changed(&self, event: &StoreChangeEvent);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct LoadedFile {
    label: String,
    runs: Vec<String>,
}

#[derive(Default)]
struct StoreData {
    files: Vec<LoadedFile>,
    /// Sorted by id, which is load order.
    items: Vec<ResultItem>,
    next_id: u64,
}

pub struct ResultStore {
    data: RwLock<StoreData>,
    disposed: AtomicBool,
    generation: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn StoreListener>)>>,
    next_listener: AtomicU64,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self {
            data: RwLock::new(StoreData {
                next_id: 1,
                ..StoreData::default()
            }),
            disposed: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }
}

impl ResultStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Run `f` against a read-locked snapshot of the store.
    pub fn run_with_read_lock<T>(&self, f: impl FnOnce(&StoreSnapshot<'_>) -> T) -> Result<T> {
        if self.is_disposed() {
            return Err(ResViewError::StoreUnavailable);
        }
        let guard = self.data.read().map_err(|_| ResViewError::StoreUnavailable)?;
        Ok(f(&StoreSnapshot { data: &guard }))
    }

    /// Query one category under a read lock.
    pub fn query(&self, category: Category, options: &QueryOptions) -> Result<IdList> {
        self.run_with_read_lock(|snapshot| snapshot.query(category, options))
    }

    /// Add the items of a parsed result file. Returns the number of items added.
    pub fn load_file(&self, label: impl Into<String>, file: ResultFile) -> Result<usize> {
        let label = label.into();
        let added = {
            let mut data = self.write()?;
            if data.files.iter().any(|f| f.label == label) {
                remove_file(&mut data, &label);
            }
            let ResultFile { runs, records } = file;
            let added = records.len();
            for record in records {
                let id = ItemId::new(data.next_id);
                data.next_id += 1;
                data.items.push(record.into_item(id, &label));
            }
            data.files.push(LoadedFile {
                label: label.clone(),
                runs,
            });
            added
        };
        debug!(file = %label, items = added, "result file loaded");
        self.notify(StoreChange::FileLoaded {
            label,
            items: added,
        });
        Ok(added)
    }

    /// Remove a file and its items. Returns false if no such file was loaded.
    pub fn unload_file(&self, label: &str) -> Result<bool> {
        let removed = {
            let mut data = self.write()?;
            remove_file(&mut data, label)
        };
        if removed {
            debug!(file = %label, "result file unloaded");
            self.notify(StoreChange::FileUnloaded {
                label: label.to_string(),
            });
        }
        Ok(removed)
    }

    pub fn clear(&self) -> Result<()> {
        {
            let mut data = self.write()?;
            data.files.clear();
            data.items.clear();
        }
        self.notify(StoreChange::Cleared);
        Ok(())
    }

    /// Drop all content and make every further query fail with
    /// [`ResViewError::StoreUnavailable`]. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Ok(mut data) = self.data.write() {
            data.files.clear();
            data.items.clear();
        }
        self.notify(StoreChange::Disposed);
    }

    pub fn subscribe(&self, listener: Arc<dyn StoreListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, listener));
        id
    }

    /// Detach a listener. Returns false if it was not attached.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, StoreData>> {
        if self.is_disposed() {
            return Err(ResViewError::StoreUnavailable);
        }
        self.data.write().map_err(|_| ResViewError::StoreUnavailable)
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Arc<dyn StoreListener>)>> {
        // A panicking listener must not disable notifications for everyone else.
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, change: StoreChange) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let event = StoreChangeEvent { change, generation };
        let listeners: Vec<_> = self
            .lock_listeners()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener.store_changed(&event);
        }
    }
}

fn remove_file(data: &mut StoreData, label: &str) -> bool {
    let before = data.files.len();
    data.files.retain(|f| f.label != label);
    if data.files.len() == before {
        return false;
    }
    data.items.retain(|item| item.file != label);
    true
}

/// Read-locked view of the store contents.
pub struct StoreSnapshot<'a> {
    data: &'a StoreData,
}

impl<'a> StoreSnapshot<'a> {
    pub fn item_count(&self) -> usize {
        self.data.items.len()
    }

    pub fn file_labels(&self) -> Vec<&'a str> {
        self.data.files.iter().map(|f| f.label.as_str()).collect()
    }

    /// Run ids of all loaded files, in load order, without duplicates.
    pub fn runs(&self) -> Vec<&'a str> {
        let mut runs: Vec<&str> = Vec::new();
        for run in self.data.files.iter().flat_map(|f| f.runs.iter()) {
            if !runs.contains(&run.as_str()) {
                runs.push(run);
            }
        }
        runs
    }

    pub fn item(&self, id: ItemId) -> Option<&'a ResultItem> {
        let items = &self.data.items;
        items
            .binary_search_by_key(&id, |item| item.id)
            .ok()
            .map(|i| &items[i])
    }

    /// Resolve an id, including field scalar ids.
    pub fn resolve(&self, id: ItemId) -> Option<ItemRef<'a>> {
        let parent = self.item(id.parent())?;
        match id.field_kind() {
            None => Some(ItemRef::Item(parent)),
            Some(field) => parent.fields.get(&field).map(|value| ItemRef::Field {
                parent,
                field,
                value: *value,
            }),
        }
    }

    pub fn item_kinds(&self, ids: &IdList) -> ItemKinds {
        ids.iter()
            .filter_map(|id| self.resolve(id))
            .map(|item| item.kind())
            .collect()
    }

    pub fn query(&self, category: Category, options: &QueryOptions) -> IdList {
        match category {
            Category::All => self.all_items(options.include_fields),
            Category::Scalars => self.all_scalars(options.include_fields),
            Category::Parameters => self.all_parameters(),
            Category::Vectors => self.all_vectors(),
            Category::Histograms => self.all_statistics().union_with(&self.all_histograms()),
        }
    }

    pub fn all_items(&self, include_fields: bool) -> IdList {
        self.collect(|item| {
            let mut ids = vec![item.id];
            if include_fields {
                ids.extend(field_ids(item));
            }
            ids
        })
    }

    pub fn all_scalars(&self, include_fields: bool) -> IdList {
        self.collect(|item| {
            if item.kind == ItemKind::Scalar {
                vec![item.id]
            } else if include_fields {
                field_ids(item)
            } else {
                Vec::new()
            }
        })
    }

    pub fn all_parameters(&self) -> IdList {
        self.of_kind(ItemKind::Parameter)
    }

    pub fn all_vectors(&self) -> IdList {
        self.of_kind(ItemKind::Vector)
    }

    pub fn all_statistics(&self) -> IdList {
        self.of_kind(ItemKind::Statistics)
    }

    pub fn all_histograms(&self) -> IdList {
        self.of_kind(ItemKind::Histogram)
    }

    fn of_kind(&self, kind: ItemKind) -> IdList {
        self.collect(|item| if item.kind == kind { vec![item.id] } else { Vec::new() })
    }

    fn collect<F>(&self, ids_of: F) -> IdList
    where
        F: Fn(&ResultItem) -> Vec<ItemId> + Sync,
    {
        let items = &self.data.items;
        if items.len() >= PARALLEL_ITEM_THRESHOLD {
            let chunks: Vec<Vec<ItemId>> = items.par_iter().map(&ids_of).collect();
            chunks.into_iter().flatten().collect()
        } else {
            items.iter().flat_map(ids_of).collect()
        }
    }
}

fn field_ids(item: &ResultItem) -> Vec<ItemId> {
    if !item.kind.has_fields() {
        return Vec::new();
    }
    Field::ALL
        .iter()
        .filter(|f| item.fields.contains_key(f))
        .map(|f| item.id.field(*f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_result_file;

    const SAMPLE: &str = "\
run r1
par Net.host[0] sendInterval 0.5
scalar Net.host[0] sent 10
scalar Net.host[1] sent 12
vector 1 Net.host[0] rtt
field count 3
field mean 0.25
statistic Net.host[0] delay
field count 4
field max 1.5
histogram Net.host[0] size
field count 2
bin 0 1
bin 10 1
";

    fn store() -> Arc<ResultStore> {
        let store = ResultStore::new();
        store
            .load_file("a.sca", parse_result_file(SAMPLE).unwrap())
            .unwrap();
        store
    }

    #[test]
    fn field_expansion_adds_field_scalars() {
        let store = store();
        let plain = store.query(Category::Scalars, &QueryOptions::default()).unwrap();
        assert_eq!(plain.len(), 2);
        let expanded = store
            .query(Category::Scalars, &QueryOptions::with_fields(true))
            .unwrap();
        // 2 scalars + rtt:{count,mean} + delay:{count,max} + size:{count}
        assert_eq!(expanded.len(), 7);
    }

    #[test]
    fn resolve_field_scalar_reports_scalar_kind() {
        let store = store();
        store
            .run_with_read_lock(|s| {
                let vectors = s.all_vectors();
                let rtt = vectors.get(0).unwrap();
                let mean = s.resolve(rtt.field(Field::Mean)).unwrap();
                assert_eq!(mean.kind(), ItemKind::Scalar);
                assert_eq!(mean.name(), "rtt:mean");
                assert_eq!(mean.value(), Some(0.25));
                assert!(s.resolve(rtt.field(Field::Max)).is_none());
            })
            .unwrap();
    }

    #[test]
    fn reloading_a_label_replaces_its_items() {
        let store = store();
        store
            .load_file("a.sca", parse_result_file(SAMPLE).unwrap())
            .unwrap();
        let all = store.query(Category::All, &QueryOptions::default()).unwrap();
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn disposed_store_is_unavailable() {
        let store = store();
        store.dispose();
        store.dispose();
        assert!(matches!(
            store.query(Category::All, &QueryOptions::default()),
            Err(ResViewError::StoreUnavailable)
        ));
        assert!(store.load_file("b.sca", ResultFile::default()).is_err());
    }
}
