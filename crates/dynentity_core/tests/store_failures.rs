use dynentity_core::{
    DbResult, EntityDescription, EntityStore, FetchRequest, FieldSet, NewRecord, Predicate, Query,
    Record, SaveOutcome, Schema, SchemaProvider, SqliteEngine, StoreEngine, StoreError,
    StoreOptions, Value,
};
use std::cell::Cell;

/// Delegating engine that counts durable saves and fetches.
struct CountingEngine {
    inner: SqliteEngine,
    saves: usize,
    fetches: Cell<usize>,
}

impl CountingEngine {
    fn with_schema(schema_sql: &str) -> Self {
        let inner = SqliteEngine::open_in_memory(&StoreOptions::default()).unwrap();
        inner.connection().execute_batch(schema_sql).unwrap();
        Self {
            inner,
            saves: 0,
            fetches: Cell::new(0),
        }
    }
}

impl SchemaProvider for CountingEngine {
    fn load_schema(&self) -> DbResult<Schema> {
        self.inner.load_schema()
    }
}

impl StoreEngine for CountingEngine {
    fn fetch(&self, request: &FetchRequest<'_>) -> DbResult<Vec<Record>> {
        self.fetches.set(self.fetches.get() + 1);
        self.inner.fetch(request)
    }

    fn count(&self, request: &FetchRequest<'_>) -> DbResult<usize> {
        self.inner.count(request)
    }

    fn stage_insert(&mut self, record: NewRecord) {
        self.inner.stage_insert(record);
    }

    fn stage_delete(&mut self, entity: &EntityDescription, record: &Record) {
        self.inner.stage_delete(entity, record);
    }

    fn save(&mut self) -> DbResult<SaveOutcome> {
        self.saves += 1;
        self.inner.save()
    }

    fn discard_pending(&mut self) {
        self.inner.discard_pending();
    }

    fn has_pending_changes(&self) -> bool {
        self.inner.has_pending_changes()
    }
}

const STRICT_PERSON_SCHEMA: &str =
    "CREATE TABLE Person (name TEXT NOT NULL, age INTEGER CHECK (age >= 0));";

fn person(name: &str, age: i64) -> FieldSet {
    FieldSet::from([
        ("Name".to_string(), Value::from(name)),
        ("Age".to_string(), Value::from(age)),
    ])
}

fn counting_store() -> EntityStore<CountingEngine> {
    EntityStore::introspect(CountingEngine::with_schema(STRICT_PERSON_SCHEMA)).unwrap()
}

#[test]
fn insert_many_issues_exactly_one_save_regardless_of_batch_size() {
    let mut store = counting_store();

    for (round, size) in [0_usize, 1, 7, 100].into_iter().enumerate() {
        let batch: Vec<FieldSet> = (0..size).map(|age| person("P", age as i64)).collect();
        let inserted = store.insert_many("Person", &batch).unwrap();
        assert_eq!(inserted.len(), size);
        assert_eq!(store.engine().saves, round + 1);
    }
}

#[test]
fn insert_one_and_delete_all_each_issue_one_save() {
    let mut store = counting_store();

    store.insert_one("Person", &person("Ann", 30)).unwrap();
    store.insert_one("Person", &person("Bob", 40)).unwrap();
    assert_eq!(store.engine().saves, 2);

    assert_eq!(store.delete_all("Person").unwrap(), 2);
    assert_eq!(store.engine().saves, 3);
}

#[test]
fn count_is_answered_without_fetching_records() {
    let mut store = counting_store();
    store
        .insert_many("Person", &[person("Ann", 30), person("Bob", 41), person("Cy", 52)])
        .unwrap();

    assert_eq!(store.count("Person", &Predicate::gt("age", 35)).unwrap(), 2);
    assert_eq!(store.count("Person", &Predicate::All).unwrap(), 3);
    assert_eq!(store.engine().fetches.get(), 0);
}

#[test]
fn unknown_entity_never_reaches_save() {
    let mut store = counting_store();

    assert!(store.insert_one("Ghost", &person("Ann", 30)).is_err());
    assert!(store.insert_many("Ghost", &[person("Ann", 30)]).is_err());
    assert!(store.delete_all("Ghost").is_err());

    assert_eq!(store.engine().saves, 0);
    assert!(!store.engine().has_pending_changes());
}

#[test]
fn failed_batch_save_persists_nothing_and_discards_pending_records() {
    let mut store = counting_store();

    let err = store
        .insert_many("Person", &[person("Ann", 30), person("Bob", -1)])
        .unwrap_err();
    assert!(matches!(err, StoreError::Save { ref entity, .. } if entity == "Person"));
    assert_eq!(store.count("Person", &Predicate::All).unwrap(), 0);
    assert!(!store.engine().has_pending_changes());

    // A retry starts clean: only the retried record becomes durable.
    store.insert_one("Person", &person("Cid", 50)).unwrap();
    let all = store.query("Person", &Query::all()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].get("name"), Some(&Value::from("Cid")));
}

#[test]
fn failed_single_save_reports_error_and_leaves_store_clean() {
    let mut store = counting_store();

    // `name` is NOT NULL, and a null field is dropped rather than assigned.
    let missing_name = FieldSet::from([
        ("Name".to_string(), Value::Null),
        ("Age".to_string(), Value::from(5)),
    ]);
    let err = store.insert_one("Person", &missing_name).unwrap_err();
    assert!(matches!(err, StoreError::Save { .. }));
    assert_eq!(err.code(), "save_failed");
    assert!(!store.engine().has_pending_changes());

    store.insert_one("Person", &person("Ann", 5)).unwrap();
    assert_eq!(store.count("Person", &Predicate::All).unwrap(), 1);
}

#[test]
fn failed_delete_save_keeps_every_record() {
    let mut store = EntityStore::open_sqlite_in_memory(
        "CREATE TABLE Owner (id INTEGER PRIMARY KEY, name TEXT);
         CREATE TABLE Pet (species TEXT, owner_id INTEGER REFERENCES Owner(id));",
        &StoreOptions::default(),
    )
    .unwrap();
    store
        .insert_many(
            "Owner",
            &[
                FieldSet::from([
                    ("Id".to_string(), Value::from(1)),
                    ("Name".to_string(), Value::from("Ann")),
                ]),
                FieldSet::from([
                    ("Id".to_string(), Value::from(2)),
                    ("Name".to_string(), Value::from("Bob")),
                ]),
            ],
        )
        .unwrap();
    store
        .insert_one(
            "Pet",
            &FieldSet::from([
                ("Species".to_string(), Value::from("cat")),
                ("Owner_id".to_string(), Value::from(2)),
            ]),
        )
        .unwrap();

    let err = store.delete_all("Owner").unwrap_err();
    assert!(matches!(err, StoreError::Save { .. }));
    assert_eq!(store.count("Owner", &Predicate::All).unwrap(), 2);
    assert!(!store.engine().has_pending_changes());

    // Removing the referencing row first makes the same call succeed.
    assert_eq!(store.delete_all("Pet").unwrap(), 1);
    assert_eq!(store.delete_all("Owner").unwrap(), 2);
}

#[test]
fn fetch_failure_is_distinguishable_from_no_matches() {
    let mut store = EntityStore::open_sqlite_in_memory(
        "CREATE TABLE Person (name TEXT, age INTEGER);",
        &StoreOptions::default(),
    )
    .unwrap();
    assert!(store.query("Person", &Query::all()).unwrap().is_empty());

    // The schema was loaded at open and is never refreshed, so the dropped
    // table is still considered known and the engine fetch fails.
    store
        .engine()
        .connection()
        .execute_batch("DROP TABLE Person;")
        .unwrap();

    let err = store.query("Person", &Query::all()).unwrap_err();
    assert!(matches!(err, StoreError::Fetch { ref entity, .. } if entity == "Person"));

    let err = store.delete_all("Person").unwrap_err();
    assert!(matches!(err, StoreError::Fetch { .. }));
    assert!(!store.engine().has_pending_changes());
}

#[test]
fn schema_changes_after_open_are_not_observed() {
    let mut store = EntityStore::open_sqlite_in_memory(
        "CREATE TABLE Person (name TEXT);",
        &StoreOptions::default(),
    )
    .unwrap();
    store
        .engine()
        .connection()
        .execute_batch("CREATE TABLE Later (label TEXT);")
        .unwrap();

    assert!(!store.contains_entity("Later"));
    let err = store
        .insert_one(
            "Later",
            &FieldSet::from([("Label".to_string(), Value::from("x"))]),
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownEntity(_)));
}

#[test]
fn open_with_static_schema_provider_uses_that_schema() {
    let engine = SqliteEngine::open_in_memory(&StoreOptions::default()).unwrap();
    engine
        .connection()
        .execute_batch("CREATE TABLE Person (name TEXT, age INTEGER, secret TEXT);")
        .unwrap();
    let schema = Schema::new([dynentity_core::EntityDescription::new(
        "Person",
        ["name", "age"],
    )]);

    let mut store = EntityStore::open(engine, &schema).unwrap();
    let record = store
        .insert_one(
            "Person",
            &FieldSet::from([
                ("Name".to_string(), Value::from("Ann")),
                ("Secret".to_string(), Value::from("hidden")),
            ]),
        )
        .unwrap();

    assert!(record.get("secret").is_none());
    let fetched = store.query("Person", &Query::all()).unwrap();
    assert_eq!(fetched, vec![record]);
}
