use crate::error::StoreError;
use crate::input::{CreateInput, UpdateInput};
use crate::profile::Profile;
use crate::storage::{Storage, StorageError};
use crate::validation::{validate, ValidationPolicy};
use std::collections::HashSet;
use std::error::Error as _;
use tracing::{event, instrument, warn, Level};
use uuid::Uuid;

/// Storage entry holding the serialized collection.
pub const DEFAULT_STORAGE_KEY: &str = "profiles";

/// Owns the profile collection and mirrors every change to storage.
///
/// The collection is newest first. Storage is read once, in [`ProfileStore::open`];
/// afterwards the in-memory collection is authoritative and the whole of it is
/// written back after each mutation.
#[derive(Debug)]
pub struct ProfileStore<S: Storage> {
    storage: S,
    key: String,
    profiles: Vec<Profile>,
    synced: bool,
}

impl<S: Storage> ProfileStore<S> {
    pub fn open(storage: S) -> Self {
        Self::open_with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn open_with_key(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let profiles = load(&storage, &key);
        event!(Level::DEBUG, key = %key, count = profiles.len(), "Opened profile store");

        Self {
            storage,
            key,
            profiles,
            synced: true,
        }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn snapshot(&self) -> Vec<Profile> {
        self.profiles.clone()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// False while the last write to storage failed.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    #[instrument(skip(self, input))]
    pub fn create(
        &mut self,
        input: &CreateInput,
        policy: ValidationPolicy,
    ) -> Result<Profile, StoreError> {
        let fields = validate(input, policy)?;
        let profile = fields.with_id(self.fresh_id());

        self.profiles.insert(0, profile.clone());
        event!(Level::INFO, id = %profile.id, "Created profile");

        self.persist()?;
        Ok(profile)
    }

    #[instrument(skip(self, input))]
    pub fn update(
        &mut self,
        id: &str,
        input: &UpdateInput,
        policy: ValidationPolicy,
    ) -> Result<Profile, StoreError> {
        let fields = validate(input, policy)?;
        let slot = self
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let profile = fields.with_id(id.to_string());
        *slot = profile.clone();
        event!(Level::INFO, id, "Updated profile");

        self.persist()?;
        Ok(profile)
    }

    /// Remove the profile with `id`. A missing id leaves the collection as it is.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.id != id);
        if self.profiles.len() == before {
            event!(Level::DEBUG, id, "No profile to remove");
        } else {
            event!(Level::INFO, id, "Removed profile");
        }

        self.persist()
    }

    /// Profiles whose name contains `term` (ignoring case) and whose formatted
    /// address equals `location`, in collection order. An empty term or an
    /// empty or absent location does not filter.
    pub fn query(&self, term: &str, location: Option<&str>) -> Vec<Profile> {
        let location = location.filter(|l| !l.is_empty());
        self.profiles
            .iter()
            .filter(|p| p.name_contains(term))
            .filter(|p| location.map_or(true, |l| p.is_located_at(l)))
            .cloned()
            .collect()
    }

    /// Distinct formatted addresses across the whole collection, sorted by
    /// UTF-16 code units.
    pub fn locations(&self) -> Vec<String> {
        let mut locations: Vec<String> = self
            .profiles
            .iter()
            .map(|p| p.address.formatted.clone())
            .collect();
        locations.sort_unstable_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));
        locations.dedup();
        locations
    }

    /// Write the current collection again, e.g. after a failed write.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.persist()
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        match self.write() {
            Ok(()) => {
                self.synced = true;
                Ok(())
            }
            Err(e) => {
                warn!(
                    error = %e,
                    cause = ?e.source().map(ToString::to_string),
                    "Profiles kept in memory but not saved"
                );
                self.synced = false;
                Err(StoreError::from(e))
            }
        }
    }

    fn write(&mut self) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&self.profiles)?;
        self.storage.set(&self.key, &serialized)
    }
}

fn load<S: Storage>(storage: &S, key: &str) -> Vec<Profile> {
    let stored = match storage.get(key) {
        Ok(Some(stored)) => stored,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(
                error = %e,
                cause = ?e.source().map(ToString::to_string),
                "Could not read stored profiles, starting empty"
            );
            return Vec::new();
        }
    };

    let profiles: Vec<Profile> = serde_json::from_str(&stored).unwrap_or_else(|e| {
        warn!("Stored profiles are unreadable, starting empty: {e}");
        Vec::new()
    });

    // Ids must be unique; the first record for an id wins.
    let mut seen = HashSet::new();
    let count = profiles.len();
    let profiles: Vec<Profile> = profiles
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect();
    if profiles.len() < count {
        warn!(
            dropped = count - profiles.len(),
            "Stored profiles repeat ids, keeping the first of each"
        );
    }
    profiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ProfileInput;
    use crate::storage::MemoryStorage;
    use crate::validation::ValidationError;
    use std::error::Error;

    /// Counts writes and can be told to fail them.
    #[derive(Default)]
    struct RecordingStorage {
        inner: MemoryStorage,
        writes: usize,
        failing: bool,
    }

    impl Storage for RecordingStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes += 1;
            if self.failing {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    quota: 0,
                });
            }
            self.inner.set(key, value)
        }
    }

    fn input(name: &str) -> ProfileInput {
        ProfileInput {
            name: name.to_string(),
            photo: "https://example.com/photo.png".to_string(),
            lat: "1.5".to_string(),
            lng: "2.5".to_string(),
            ..Default::default()
        }
    }

    fn located(name: &str, formatted: &str) -> ProfileInput {
        ProfileInput {
            formatted: Some(formatted.to_string()),
            ..input(name)
        }
    }

    fn names(profiles: &[Profile]) -> Vec<&str> {
        profiles.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_create_prepends() {
        let mut store = ProfileStore::open(RecordingStorage::default());
        let ann = store.create(&input("Ann"), ValidationPolicy::Standard).unwrap();
        let bob = store.create(&input("Bob"), ValidationPolicy::Standard).unwrap();

        assert!(!ann.id.is_empty());
        assert_ne!(ann.id, bob.id);
        assert_eq!(names(store.profiles()), vec!["Bob", "Ann"]);
        assert_eq!(store.storage().writes, 2);
    }

    #[test]
    fn test_rejected_create_does_not_touch_storage() {
        let mut store = ProfileStore::open(RecordingStorage::default());
        store.create(&input("Ann"), ValidationPolicy::Standard).unwrap();
        let before = store.snapshot();

        let mut bad = input("Bob");
        bad.lng = "east".to_string();
        let err = store.create(&bad, ValidationPolicy::Standard).unwrap_err();

        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::InvalidLongitude)
        ));
        assert_eq!(err.to_string(), "Valid longitude is required");
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.storage().writes, 1);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut store = ProfileStore::open(RecordingStorage::default());
        let ann = store
            .create(
                &ProfileInput {
                    contact: Some("ann@example.com".to_string()),
                    interests: Some("music".to_string()),
                    ..input("Ann")
                },
                ValidationPolicy::Standard,
            )
            .unwrap();
        store.create(&input("Bob"), ValidationPolicy::Standard).unwrap();

        let updated = store
            .update(&ann.id, &input("Ann2"), ValidationPolicy::Standard)
            .unwrap();

        assert_eq!(updated.id, ann.id);
        assert_eq!(names(store.profiles()), vec!["Bob", "Ann2"]);
        // Full replace: fields absent from the input are cleared.
        assert_eq!(store.profiles()[1].contact, "");
        assert!(store.profiles()[1].interests.is_empty());
        assert_eq!(store.storage().writes, 3);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut store = ProfileStore::open(RecordingStorage::default());
        store.create(&input("Ann"), ValidationPolicy::Standard).unwrap();
        let before = store.snapshot();

        let err = store
            .update("missing", &input("Bob"), ValidationPolicy::Standard)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref id) if id == "missing"));
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.storage().writes, 1);
    }

    #[test]
    fn test_update_validates_before_lookup() {
        let mut store = ProfileStore::open(RecordingStorage::default());
        let err = store
            .update("missing", &input(""), ValidationPolicy::Standard)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::NameRequired)
        ));
    }

    #[test]
    fn test_remove_missing_id_still_persists() {
        let mut store = ProfileStore::open(RecordingStorage::default());
        let ann = store.create(&input("Ann"), ValidationPolicy::Standard).unwrap();

        store.remove("missing").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.storage().writes, 2);

        store.remove(&ann.id).unwrap();
        assert!(store.is_empty());
        assert!(store.get(&ann.id).is_none());
        assert_eq!(store.storage().writes, 3);
    }

    #[test]
    fn test_query_filters() {
        let mut store = ProfileStore::open(MemoryStorage::new());
        for (name, place) in [
            ("Ann", "Springfield"),
            ("bob", "Shelbyville"),
            ("Joanna", "Springfield"),
        ] {
            store
                .create(&located(name, place), ValidationPolicy::Standard)
                .unwrap();
        }

        assert_eq!(store.query("", None), store.snapshot());
        assert_eq!(store.query("", Some("")), store.snapshot());
        assert_eq!(names(&store.query("AN", None)), vec!["Joanna", "Ann"]);
        assert_eq!(
            names(&store.query("", Some("Springfield"))),
            vec!["Joanna", "Ann"]
        );
        assert_eq!(names(&store.query("B", Some("Shelbyville"))), vec!["bob"]);
        assert!(store.query("ann", Some("Shelbyville")).is_empty());
        assert!(store.query("", Some("springfield")).is_empty());
    }

    #[test]
    fn test_locations_follow_current_state() {
        let mut store = ProfileStore::open(MemoryStorage::new());
        let a = store
            .create(&located("Ann", "Springfield"), ValidationPolicy::Standard)
            .unwrap();
        store
            .create(&located("Bob", "Capital City"), ValidationPolicy::Standard)
            .unwrap();
        store
            .create(&located("Cy", "Springfield"), ValidationPolicy::Standard)
            .unwrap();
        assert_eq!(store.locations(), vec!["Capital City", "Springfield"]);

        store
            .update(&a.id, &located("Ann", "Ogdenville"), ValidationPolicy::Standard)
            .unwrap();
        assert_eq!(
            store.locations(),
            vec!["Capital City", "Ogdenville", "Springfield"]
        );
    }

    #[test]
    fn test_write_failure_keeps_mutation() {
        let mut store = ProfileStore::open(RecordingStorage::default());
        store.storage.failing = true;

        let err = store
            .create(&input("Ann"), ValidationPolicy::Standard)
            .unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
        assert_eq!(err.to_string(), "Profiles could not be saved");
        let cause = err.source().unwrap().to_string();
        assert!(cause.starts_with("Storage quota exceeded"));
        assert!(!err.to_string().contains(&cause));
        assert_eq!(names(store.profiles()), vec!["Ann"]);
        assert!(!store.is_synced());
        assert_eq!(store.storage().inner.get(DEFAULT_STORAGE_KEY).unwrap(), None);

        store.storage.failing = false;
        store.flush().unwrap();
        assert!(store.is_synced());
        assert!(store
            .storage()
            .inner
            .get(DEFAULT_STORAGE_KEY)
            .unwrap()
            .unwrap()
            .contains("\"Ann\""));
    }

    #[test]
    fn test_open_ignores_unreadable_entry() {
        let mut storage = MemoryStorage::new();
        storage.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        let store = ProfileStore::open(storage);
        assert!(store.is_empty());
        assert!(store.is_synced());
    }

    #[test]
    fn test_open_keeps_first_of_repeated_ids() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                DEFAULT_STORAGE_KEY,
                r#"[{"id":"1","name":"Ann","photo":"u","address":{"lat":1,"lng":2}},{"id":"2","name":"Bob","photo":"u","address":{"lat":1,"lng":2}},{"id":"1","name":"Ann again","photo":"u","address":{"lat":1,"lng":2}}]"#,
            )
            .unwrap();
        let mut store = ProfileStore::open(storage);
        assert_eq!(names(store.profiles()), vec!["Ann", "Bob"]);

        store
            .update("1", &input("Ann2"), ValidationPolicy::Standard)
            .unwrap();
        assert_eq!(names(store.profiles()), vec!["Ann2", "Bob"]);

        store.remove("1").unwrap();
        assert_eq!(names(store.profiles()), vec!["Bob"]);
        assert!(store.get("1").is_none());
    }

    #[test]
    fn test_locations_sort_by_utf16_units() {
        let mut store = ProfileStore::open(MemoryStorage::new());
        for place in ["\u{FFFD}", "\u{10000}", "Springfield", "\u{10000}"] {
            store
                .create(&located("Ann", place), ValidationPolicy::Standard)
                .unwrap();
        }
        assert_eq!(
            store.locations(),
            vec!["Springfield", "\u{10000}", "\u{FFFD}"]
        );
    }

    #[test]
    fn test_open_with_key() {
        let mut store = ProfileStore::open_with_key(MemoryStorage::new(), "directory");
        store.create(&input("Ann"), ValidationPolicy::Standard).unwrap();

        let storage = store.into_storage();
        assert!(storage.get("directory").unwrap().is_some());
        assert!(storage.get(DEFAULT_STORAGE_KEY).unwrap().is_none());
    }
}
