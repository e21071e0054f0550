use crate::error::{AdvisorError, RemoteStoreError};
use crate::observe::{NoopObserver, RunObserver};
use crate::storage::model::{decode_model, encode_model, StoredModel};
use crate::storage::object_store::ObjectStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of reading a model from the remote store only.
#[derive(Debug)]
pub enum RemoteLoad<M> {
    Found(M),
    NotFoundRemote(RemoteStoreError),
    Error(AdvisorError),
}

/// Versioned JSON persistence. The remote store is authoritative; a local
/// seed directory is consulted only when the remote object is missing.
pub struct ModelStore<S> {
    remote: S,
    seed_dir: PathBuf,
    observer: Arc<dyn RunObserver>,
}

impl<S: ObjectStore> ModelStore<S> {
    pub fn new(remote: S, seed_dir: impl Into<PathBuf>) -> Self {
        Self {
            remote,
            seed_dir: seed_dir.into(),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn remote(&self) -> &S {
        &self.remote
    }

    /// Where a seed copy of `object_name` is expected on local disk.
    pub fn local_path<M: StoredModel>(&self, object_name: &str) -> PathBuf {
        self.seed_dir.join(M::FOLDER_PREFIX).join(object_name)
    }

    pub fn load_remote<M: StoredModel>(&self, namespace: &str, object_name: &str) -> RemoteLoad<M> {
        let key = M::object_key(object_name);
        match self.remote.get(namespace, &key) {
            Ok(bytes) => match decode_model::<M>(&bytes) {
                Ok(model) => RemoteLoad::Found(model),
                Err(err) => RemoteLoad::Error(err),
            },
            Err(err) if err.is_not_found() => RemoteLoad::NotFoundRemote(err),
            Err(err) => RemoteLoad::Error(err.into()),
        }
    }

    /// Loads from the remote store. On a remote miss, falls back to the local
    /// seed copy and uploads it to the expected key before returning it.
    pub fn try_load<M: StoredModel>(
        &self,
        namespace: &str,
        object_name: &str,
    ) -> Result<M, AdvisorError> {
        let not_found = match self.load_remote::<M>(namespace, object_name) {
            RemoteLoad::Found(model) => return Ok(model),
            RemoteLoad::Error(err) => return Err(err),
            RemoteLoad::NotFoundRemote(err) => err,
        };

        let key = M::object_key(object_name);
        self.observer.remote_miss(namespace, &key);

        let local_path = self.local_path::<M>(object_name);
        let Some((model, body)) = self.load_local::<M>(&local_path)? else {
            return Err(not_found.into());
        };

        self.remote.put(namespace, &key, &body)?;
        self.observer.healed(&local_path, namespace, &key);
        Ok(model)
    }

    /// Writes to the remote store. There is no local fallback.
    pub fn save<M: StoredModel>(
        &self,
        model: &M,
        namespace: &str,
        object_name: &str,
    ) -> Result<(), AdvisorError> {
        let body = encode_model(model)?;
        self.remote
            .put(namespace, &M::object_key(object_name), &body)?;
        Ok(())
    }

    /// Reads and validates a seed file, keeping its bytes for the upload.
    fn load_local<M: StoredModel>(
        &self,
        path: &Path,
    ) -> Result<Option<(M, Vec<u8>)>, AdvisorError> {
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(path)?;
        let model = decode_model::<M>(&bytes)?;
        Ok(Some((model, bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ticker_list::TickerList;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Fake remote that records every upload.
    #[derive(Default)]
    struct RecordingStore {
        objects: RefCell<HashMap<(String, String), Vec<u8>>>,
        puts: RefCell<Vec<(String, String, Vec<u8>)>>,
        get_failure: Option<RemoteStoreError>,
    }

    impl ObjectStore for RecordingStore {
        fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RemoteStoreError> {
            if let Some(err) = &self.get_failure {
                return Err(err.clone());
            }
            self.objects
                .borrow()
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| RemoteStoreError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
        }

        fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), RemoteStoreError> {
            self.puts
                .borrow_mut()
                .push((bucket.to_string(), key.to_string(), body.to_vec()));
            self.objects
                .borrow_mut()
                .insert((bucket.to_string(), key.to_string()), body.to_vec());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RunObserver for RecordingObserver {
        fn remote_miss(&self, bucket: &str, key: &str) {
            self.events.lock().unwrap().push(format!("miss {bucket}/{key}"));
        }

        fn healed(&self, _local_path: &Path, bucket: &str, key: &str) {
            self.events.lock().unwrap().push(format!("healed {bucket}/{key}"));
        }
    }

    fn dow3() -> TickerList {
        TickerList {
            list_name: "DOW30".into(),
            list_type: "US_EQUITIES".into(),
            comparison_symbol: "DIA".into(),
            ticker_symbols: vec!["AAPL".into(), "AXP".into(), "BA".into()],
        }
    }

    fn write_seed(dir: &Path, name: &str, list: &TickerList) {
        let folder = dir.join(TickerList::FOLDER_PREFIX);
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join(name), serde_json::to_vec(list).unwrap()).unwrap();
    }

    #[test]
    fn remote_hit_does_not_touch_local_or_upload() {
        let seed = tempfile::tempdir().unwrap();
        let remote = RecordingStore::default();
        remote.objects.borrow_mut().insert(
            ("sa-data".into(), "ticker-files/djia30.json".into()),
            serde_json::to_vec(&dow3()).unwrap(),
        );
        let store = ModelStore::new(remote, seed.path());

        let list: TickerList = store.try_load("sa-data", "djia30.json").unwrap();
        assert_eq!(list, dow3());
        assert!(store.remote().puts.borrow().is_empty());
    }

    #[test]
    fn remote_miss_with_local_seed_heals_exactly_once() {
        let seed = tempfile::tempdir().unwrap();
        write_seed(seed.path(), "djia30.json", &dow3());
        let observer = Arc::new(RecordingObserver::default());
        let store = ModelStore::new(RecordingStore::default(), seed.path())
            .with_observer(observer.clone());

        let list: TickerList = store.try_load("sa-data", "djia30.json").unwrap();
        assert_eq!(list, dow3());

        let puts = store.remote().puts.borrow();
        assert_eq!(puts.len(), 1);
        let (bucket, key, body) = &puts[0];
        assert_eq!(bucket, "sa-data");
        assert_eq!(key, "ticker-files/djia30.json");
        let uploaded: TickerList = decode_model(body).unwrap();
        assert_eq!(uploaded, dow3());

        assert_eq!(
            *observer.events.lock().unwrap(),
            vec![
                "miss sa-data/ticker-files/djia30.json".to_string(),
                "healed sa-data/ticker-files/djia30.json".to_string(),
            ]
        );
    }

    #[test]
    fn healed_object_is_served_remotely_next_time() {
        let seed = tempfile::tempdir().unwrap();
        write_seed(seed.path(), "djia30.json", &dow3());
        let store = ModelStore::new(RecordingStore::default(), seed.path());

        let _: TickerList = store.try_load("sa-data", "djia30.json").unwrap();
        std::fs::remove_dir_all(seed.path().join(TickerList::FOLDER_PREFIX)).unwrap();

        let again: TickerList = store.try_load("sa-data", "djia30.json").unwrap();
        assert_eq!(again, dow3());
        assert_eq!(store.remote().puts.borrow().len(), 1);
    }

    #[test]
    fn remote_miss_without_local_propagates_original_not_found() {
        let seed = tempfile::tempdir().unwrap();
        let store = ModelStore::new(RecordingStore::default(), seed.path());

        let err = store.try_load::<TickerList>("sa-data", "missing.json").unwrap_err();
        match err {
            AdvisorError::RemoteStore(inner) => assert_eq!(
                inner,
                RemoteStoreError::NotFound {
                    bucket: "sa-data".into(),
                    key: "ticker-files/missing.json".into(),
                }
            ),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.remote().puts.borrow().is_empty());
    }

    #[test]
    fn other_remote_failures_skip_local_fallback() {
        let seed = tempfile::tempdir().unwrap();
        write_seed(seed.path(), "djia30.json", &dow3());
        let remote = RecordingStore {
            get_failure: Some(RemoteStoreError::Request {
                bucket: "sa-data".into(),
                key: "ticker-files/djia30.json".into(),
                reason: "access denied".into(),
            }),
            ..Default::default()
        };
        let store = ModelStore::new(remote, seed.path());

        let err = store.try_load::<TickerList>("sa-data", "djia30.json").unwrap_err();
        assert!(err.to_string().contains("access denied"));
        assert!(store.remote().puts.borrow().is_empty());
    }

    #[test]
    fn malformed_local_seed_is_fatal_and_not_uploaded() {
        let seed = tempfile::tempdir().unwrap();
        let folder = seed.path().join(TickerList::FOLDER_PREFIX);
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("bad.json"), br#"{"list_name": "x"}"#).unwrap();
        let store = ModelStore::new(RecordingStore::default(), seed.path());

        let err = store.try_load::<TickerList>("sa-data", "bad.json").unwrap_err();
        assert!(matches!(err, AdvisorError::Validation { .. }));
        assert!(store.remote().puts.borrow().is_empty());
    }

    #[test]
    fn malformed_remote_object_is_an_error_not_a_miss() {
        let seed = tempfile::tempdir().unwrap();
        write_seed(seed.path(), "djia30.json", &dow3());
        let remote = RecordingStore::default();
        remote.objects.borrow_mut().insert(
            ("sa-data".into(), "ticker-files/djia30.json".into()),
            b"[]".to_vec(),
        );
        let store = ModelStore::new(remote, seed.path());

        assert!(matches!(
            store.load_remote::<TickerList>("sa-data", "djia30.json"),
            RemoteLoad::Error(AdvisorError::Validation { .. })
        ));
        assert!(store.try_load::<TickerList>("sa-data", "djia30.json").is_err());
    }

    #[test]
    fn save_writes_remote_only() {
        let seed = tempfile::tempdir().unwrap();
        let store = ModelStore::new(RecordingStore::default(), seed.path());

        store.save(&dow3(), "sa-data", "djia30.json").unwrap();
        assert_eq!(store.remote().puts.borrow().len(), 1);
        assert!(!store.local_path::<TickerList>("djia30.json").exists());
        assert!(matches!(
            store.load_remote::<TickerList>("sa-data", "djia30.json"),
            RemoteLoad::Found(_)
        ));
    }
}
