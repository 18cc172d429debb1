use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{
        Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::{debug, warn};

use crate::{
    config::MapOptions,
    error::{Error, Result},
    mapping::{Classification, Mapped, TypeDescriptor, binder::RowPlan},
    sql::types::Columns,
};

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PlanKey {
    type_id: TypeId,
    columns: Columns,
    match_underscores: bool,
}

/// Counts of the one-time analysis work done by a registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Destination types described
    pub classifications: u64,
    /// Field accessors bound to a column list
    pub field_bindings: u64,
    /// Row plans built
    pub plans: u64,
}

/// Concurrent cache of type descriptors and row plans
///
/// Entries are computed outside the lock and inserted first-writer-wins,
/// so concurrent callers racing on the same key all observe one entry.
/// The work counters may still count a raced computation twice.
#[derive(Default)]
pub struct Registry {
    types: RwLock<HashMap<TypeId, Entry>>,
    plans: RwLock<HashMap<PlanKey, Entry>>,
    classifications: AtomicU64,
    field_bindings: AtomicU64,
    plans_built: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry
    pub fn global() -> Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Registry::new())).clone()
    }

    /// Descriptor of `T`, computed on first request
    pub fn descriptor<T: Mapped>(&self) -> Result<Arc<TypeDescriptor<T>>> {
        let id = TypeId::of::<T>();
        if let Some(entry) = read(&self.types).get(&id) {
            return downcast(entry.clone());
        }

        let descriptor = T::describe();
        self.classifications.fetch_add(1, Ordering::Relaxed);
        debug!(
            type_name = descriptor.type_name,
            classification = ?descriptor.classification(),
            "described destination type"
        );

        let entry = write(&self.types)
            .entry(id)
            .or_insert_with(|| Arc::new(descriptor) as Entry)
            .clone();
        downcast(entry)
    }

    pub fn classify<T: Mapped>(&self) -> Result<Classification> {
        Ok(self.descriptor::<T>()?.classification())
    }

    /// Row plan of `T` for one column list, built on first request
    pub(crate) fn plan<T: Mapped>(
        &self,
        columns: &Columns,
        options: &MapOptions,
    ) -> Result<Arc<RowPlan<T>>> {
        let key = PlanKey {
            type_id: TypeId::of::<T>(),
            columns: columns.clone(),
            match_underscores: options.match_underscores,
        };
        if let Some(entry) = read(&self.plans).get(&key) {
            return downcast(entry.clone());
        }

        let descriptor = self.descriptor::<T>()?;
        let plan = RowPlan::build(&descriptor, columns, options)?;
        self.plans_built.fetch_add(1, Ordering::Relaxed);
        self.field_bindings
            .fetch_add(plan.bindings().len() as u64, Ordering::Relaxed);
        debug!(
            type_name = descriptor.type_name,
            columns = columns.len(),
            "built row plan"
        );

        let entry = write(&self.plans)
            .entry(key)
            .or_insert_with(|| Arc::new(plan) as Entry)
            .clone();
        downcast(entry)
    }

    pub fn stats(&self) -> Stats {
        Stats {
            classifications: self.classifications.load(Ordering::Relaxed),
            field_bindings: self.field_bindings.load(Ordering::Relaxed),
            plans: self.plans_built.load(Ordering::Relaxed),
        }
    }

    /// Number of described types
    pub fn len(&self) -> usize {
        read(&self.types).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.types).is_empty()
    }
}

// Cache entries are inserted whole, so a poisoned lock still guards a consistent map
fn read<K, V>(lock: &RwLock<HashMap<K, V>>) -> RwLockReadGuard<'_, HashMap<K, V>> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!("registry lock poisoned, recovering");
        poisoned.into_inner()
    })
}

fn write<K, V>(lock: &RwLock<HashMap<K, V>>) -> RwLockWriteGuard<'_, HashMap<K, V>> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!("registry lock poisoned, recovering");
        poisoned.into_inner()
    })
}

fn downcast<T: Any + Send + Sync>(entry: Entry) -> Result<Arc<T>> {
    entry.downcast::<T>().map_err(|_| {
        Error::Internal(format!(
            "registry entry is not a {}",
            std::any::type_name::<T>()
        ))
    })
}
