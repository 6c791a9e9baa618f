use chrono::Utc;
use platform_db::KeyValueStore;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::StoreError,
    model::{Employee, EmployeeFields, EmployeeId, seed_employees},
};

pub const DEFAULT_STORAGE_KEY: &str = "roster.employees";

/// How [`RecordStore::load`] obtained its list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Restored { count: usize },
    Seeded,
    /// The stored value did not decode; the store started empty and the value
    /// stays in place until the next mutation overwrites it.
    Corrupt,
}

/// Sole owner of the employee list. Every mutation is written through to
/// storage before it returns; a failed write rolls the in-memory change back.
pub struct RecordStore<S> {
    storage: S,
    key: String,
    employees: Vec<Employee>,
}

impl<S: KeyValueStore> RecordStore<S> {
    /// An empty, unloaded store.
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            employees: Vec::new(),
        }
    }

    pub async fn open(
        storage: S,
        key: impl Into<String>,
    ) -> Result<(Self, LoadOutcome), StoreError> {
        let mut store = Self::new(storage, key);
        let outcome = store.load().await?;
        Ok((store, outcome))
    }

    #[instrument(name = "roster.load", skip(self), fields(key = %self.key))]
    pub async fn load(&mut self) -> Result<LoadOutcome, StoreError> {
        let stored = self.storage.get(&self.key).await?;
        let Some(raw) = stored.filter(|raw| !raw.trim().is_empty()) else {
            self.employees = seed_employees();
            self.save().await?;
            info!(count = self.employees.len(), "no stored roster; installed seed data");
            return Ok(LoadOutcome::Seeded);
        };
        match serde_json::from_str::<Vec<Employee>>(&raw) {
            Ok(employees) => {
                let count = employees.len();
                self.employees = employees;
                debug!(count, "roster restored");
                Ok(LoadOutcome::Restored { count })
            }
            Err(err) => {
                warn!(error = %err, "stored roster is unreadable; starting empty");
                self.employees.clear();
                Ok(LoadOutcome::Corrupt)
            }
        }
    }

    pub async fn save(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.employees)?;
        self.storage.set(&self.key, &raw).await?;
        Ok(())
    }

    pub async fn add(&mut self, fields: EmployeeFields) -> Result<Employee, StoreError> {
        let employee = Employee::from_fields(self.next_id(), fields);
        self.employees.push(employee.clone());
        if let Err(err) = self.save().await {
            self.employees.pop();
            return Err(err);
        }
        info!(id = employee.id, "employee added");
        Ok(employee)
    }

    pub async fn update(
        &mut self,
        id: EmployeeId,
        fields: EmployeeFields,
    ) -> Result<Option<Employee>, StoreError> {
        let Some(index) = self.position(id) else {
            warn!(id, "update skipped; no such employee");
            return Ok(None);
        };
        let previous = self.employees[index].clone();
        self.employees[index].apply(fields);
        if let Err(err) = self.save().await {
            self.employees[index] = previous;
            return Err(err);
        }
        info!(id, "employee updated");
        Ok(Some(self.employees[index].clone()))
    }

    pub async fn delete(&mut self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let Some(index) = self.position(id) else {
            warn!(id, "delete skipped; no such employee");
            return Ok(None);
        };
        let removed = self.employees.remove(index);
        if let Err(err) = self.save().await {
            self.employees.insert(index, removed);
            return Err(err);
        }
        info!(id, "employee deleted");
        Ok(Some(removed))
    }

    pub async fn reset_to_seed(&mut self) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut self.employees, seed_employees());
        if let Err(err) = self.save().await {
            self.employees = previous;
            return Err(err);
        }
        info!(count = self.employees.len(), "roster reset to seed data");
        Ok(())
    }

    pub fn snapshot(&self) -> &[Employee] {
        &self.employees
    }

    pub fn get(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|employee| employee.id == id)
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn position(&self, id: EmployeeId) -> Option<usize> {
        self.employees.iter().position(|employee| employee.id == id)
    }

    /// Millisecond timestamp, bumped past the largest id in use. Once the
    /// largest id is `i64::MAX` the smallest free positive id is reused.
    fn next_id(&self) -> EmployeeId {
        let now = Utc::now().timestamp_millis();
        match self.employees.iter().map(|employee| employee.id).max() {
            None => now.max(1),
            Some(max) => match max.checked_add(1) {
                Some(floor) => now.max(floor),
                None => self.smallest_free_id(),
            },
        }
    }

    fn smallest_free_id(&self) -> EmployeeId {
        let mut taken: Vec<EmployeeId> = self
            .employees
            .iter()
            .map(|employee| employee.id)
            .filter(|id| *id > 0)
            .collect();
        taken.sort_unstable();
        taken.dedup();
        let mut candidate = 1;
        for id in taken {
            if id != candidate {
                break;
            }
            candidate += 1;
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use platform_db::{DbError, DbResult, MemoryStore};

    use super::*;
    use crate::model::EmployeeDraft;

    fn fields(name: &str) -> EmployeeFields {
        EmployeeFields::normalized(&EmployeeDraft {
            name: name.into(),
            email: format!("{}@technova.com", name.to_lowercase()),
            department: "Engineering".into(),
            skills: vec!["Python".into()],
            certified: false,
        })
    }

    async fn seeded(storage: MemoryStore) -> RecordStore<MemoryStore> {
        let (store, outcome) = RecordStore::open(storage, DEFAULT_STORAGE_KEY).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Seeded);
        store
    }

    #[tokio::test]
    async fn empty_storage_is_seeded_and_persisted() {
        let storage = MemoryStore::new();
        let store = seeded(storage.clone()).await;
        assert_eq!(store.snapshot(), seed_employees().as_slice());

        let raw = storage.get(DEFAULT_STORAGE_KEY).await.unwrap().unwrap();
        let stored: Vec<Employee> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, seed_employees());
    }

    #[tokio::test]
    async fn save_then_load_in_fresh_session_round_trips() {
        let storage = MemoryStore::new();
        let mut first = seeded(storage.clone()).await;
        first.add(fields("Dana")).await.unwrap();
        first.delete(2).await.unwrap();
        let expected = first.snapshot().to_vec();

        let (second, outcome) = RecordStore::open(storage, DEFAULT_STORAGE_KEY).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Restored { count: 3 });
        assert_eq!(second.snapshot(), expected.as_slice());
    }

    #[tokio::test]
    async fn corrupt_value_loads_empty_and_is_left_alone() {
        let storage = MemoryStore::new();
        storage.set(DEFAULT_STORAGE_KEY, "{not json").await.unwrap();

        let (store, outcome) = RecordStore::open(storage.clone(), DEFAULT_STORAGE_KEY)
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Corrupt);
        assert!(store.is_empty());
        assert_eq!(
            storage.get(DEFAULT_STORAGE_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn wrong_shape_counts_as_corrupt() {
        let storage = MemoryStore::new();
        storage
            .set(DEFAULT_STORAGE_KEY, r#"[{"id":"one","name":"x"}]"#)
            .await
            .unwrap();
        let (_, outcome) = RecordStore::open(storage, DEFAULT_STORAGE_KEY).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Corrupt);
    }

    #[tokio::test]
    async fn ids_stay_unique_across_adds_and_deletes() {
        let mut store = seeded(MemoryStore::new()).await;
        for round in 0..20 {
            let added = store.add(fields(&format!("Worker{round}"))).await.unwrap();
            if round % 3 == 0 {
                store.delete(added.id).await.unwrap();
            }
        }
        store.delete(1).await.unwrap();
        store.add(fields("Late")).await.unwrap();

        let ids: HashSet<_> = store.snapshot().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), store.len());
    }

    #[tokio::test]
    async fn maximal_id_does_not_overflow_allocation() {
        let storage = MemoryStore::new();
        let mut top = seed_employees().remove(0);
        top.id = i64::MAX;
        let mut second = seed_employees().remove(1);
        second.id = 1;
        storage
            .set(DEFAULT_STORAGE_KEY, &serde_json::to_string(&[top, second]).unwrap())
            .await
            .unwrap();

        let (mut store, _) = RecordStore::open(storage, DEFAULT_STORAGE_KEY).await.unwrap();
        let first = store.add(fields("Dana")).await.unwrap();
        let next = store.add(fields("Eve")).await.unwrap();
        assert_eq!(first.id, 2);
        assert_eq!(next.id, 3);

        let ids: HashSet<_> = store.snapshot().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 4);
    }

    #[tokio::test]
    async fn blank_value_is_treated_as_missing() {
        let storage = MemoryStore::new();
        storage.set(DEFAULT_STORAGE_KEY, "  ").await.unwrap();
        let store = seeded(storage.clone()).await;
        assert_eq!(store.len(), 3);
        assert!(storage.get(DEFAULT_STORAGE_KEY).await.unwrap().unwrap().starts_with('['));
    }

    #[tokio::test]
    async fn update_replaces_fields_but_not_id() {
        let mut store = seeded(MemoryStore::new()).await;
        let updated = store.update(3, fields("Charles")).await.unwrap().unwrap();
        assert_eq!(updated.id, 3);
        assert_eq!(updated.name, "Charles");
        assert_eq!(store.get(3).unwrap().department, "Engineering");
        assert_eq!(store.snapshot()[2].id, 3);
    }

    #[tokio::test]
    async fn missing_ids_are_noops() {
        let storage = MemoryStore::new();
        let mut store = seeded(storage.clone()).await;
        storage.set(DEFAULT_STORAGE_KEY, "sentinel").await.unwrap();

        assert!(store.update(99, fields("Ghost")).await.unwrap().is_none());
        assert!(store.delete(99).await.unwrap().is_none());
        assert_eq!(store.len(), 3);
        assert_eq!(
            storage.get(DEFAULT_STORAGE_KEY).await.unwrap().as_deref(),
            Some("sentinel")
        );
    }

    struct ReadOnlyStore;

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> DbResult<Option<String>> {
            Ok(Some(serde_json::to_string(&seed_employees()).unwrap()))
        }

        async fn set(&self, _key: &str, _value: &str) -> DbResult<()> {
            Err(DbError::Unavailable("read only".into()))
        }
    }

    #[tokio::test]
    async fn failed_writes_roll_back() {
        let (mut store, _) = RecordStore::open(ReadOnlyStore, DEFAULT_STORAGE_KEY)
            .await
            .unwrap();
        assert!(store.add(fields("Dana")).await.is_err());
        assert!(store.update(1, fields("Dana")).await.is_err());
        assert!(store.delete(2).await.is_err());
        assert_eq!(store.snapshot(), seed_employees().as_slice());
    }
}
