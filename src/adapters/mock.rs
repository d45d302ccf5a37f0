use std::{
    cell::RefCell,
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
    rc::Rc,
};

use crate::{
    adapters,
    model::store::{Bucket, DeleteFailure, DeleteReport, ListingPage, StoreError},
};

/// Shared in-memory state behind every handle a `MockStore` hands out.
#[derive(Default)]
pub struct MockState {
    pub buckets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    pub page_size: usize,
    pub calls: Vec<String>,
    pub cursors: Vec<Option<String>>,
    pub open_handles: usize,
    pub connections: usize,

    pub list_objects_error: Option<StoreError>,
    pub list_buckets_error: Option<StoreError>,
    pub create_bucket_error: Option<StoreError>,
    /// Created anyway before `create_bucket_error` is returned.
    pub create_races: bool,
    pub failing_keys: HashSet<String>,
    /// 1-based `delete_objects` call that fails outright.
    pub delete_objects_error_on_call: Option<(usize, StoreError)>,
    pub endless_listing: bool,
    pub drop_cursor: bool,
    pub ignore_writes: bool,
}

#[derive(Clone)]
pub struct MockStore {
    pub state: Rc<RefCell<MockState>>,
}

impl MockStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                page_size,
                ..Default::default()
            })),
        }
    }

    pub fn with_bucket(self, bucket: &str, keys: &[&str]) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let objects = state.buckets.entry(bucket.to_string()).or_default();
            for key in keys {
                objects.insert(key.to_string(), key.as_bytes().to_vec());
            }
        }
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.as_str() == name)
            .count()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.state
            .borrow()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.state.borrow().buckets.contains_key(bucket)
    }
}

impl adapters::Connect for MockStore {
    fn connect(&self) -> Result<Box<dyn adapters::ObjectStore>, StoreError> {
        {
            let mut state = self.state.borrow_mut();
            state.open_handles += 1;
            state.connections += 1;
        }

        Ok(Box::new(MockHandle {
            state: Rc::clone(&self.state),
        }))
    }
}

pub struct MockHandle {
    state: Rc<RefCell<MockState>>,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.state.borrow_mut().open_handles -= 1;
    }
}

fn no_such_bucket(bucket: &str) -> StoreError {
    StoreError::service(
        "NoSuchBucket",
        &format!("The specified bucket does not exist: {}", bucket),
    )
}

impl MockHandle {
    fn record(&self, call: &str) {
        self.state.borrow_mut().calls.push(call.to_string());
    }

    fn calls_to(&self, call: &str) -> usize {
        self.state.borrow().calls.iter().filter(|c| c.as_str() == call).count()
    }
}

impl adapters::ObjectStore for MockHandle {
    fn list_buckets(&self) -> Result<Vec<Bucket>, StoreError> {
        self.record("list_buckets");
        let mut state = self.state.borrow_mut();

        if let Some(err) = state.list_buckets_error.take() {
            return Err(err);
        }

        Ok(state
            .buckets
            .keys()
            .map(|name| Bucket { name: name.clone() })
            .collect())
    }

    fn create_bucket(&self, bucket: &str, _region: &str) -> Result<(), StoreError> {
        self.record("create_bucket");
        let mut state = self.state.borrow_mut();

        if let Some(err) = state.create_bucket_error.take() {
            if state.create_races {
                state.buckets.entry(bucket.to_string()).or_default();
            }
            return Err(err);
        }

        if state.buckets.contains_key(bucket) {
            return Err(StoreError::service(
                "BucketAlreadyOwnedByYou",
                "Your previous request to create the named bucket succeeded",
            ));
        }

        state.buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    fn delete_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        self.record("delete_bucket");
        let mut state = self.state.borrow_mut();

        match state.buckets.get(bucket) {
            None => Err(no_such_bucket(bucket)),
            Some(objects) if !objects.is_empty() => Err(StoreError::service(
                "BucketNotEmpty",
                "The bucket you tried to delete is not empty",
            )),
            Some(_) => {
                state.buckets.remove(bucket);
                Ok(())
            }
        }
    }

    fn list_objects(&self, bucket: &str, cursor: Option<&str>) -> Result<ListingPage, StoreError> {
        self.record("list_objects");
        let mut state = self.state.borrow_mut();
        state.cursors.push(cursor.map(|c| c.to_string()));

        if let Some(err) = state.list_objects_error.take() {
            return Err(err);
        }

        if state.endless_listing {
            return Ok(ListingPage {
                keys: vec![],
                truncated: true,
                cursor: Some("again".to_string()),
            });
        }

        let page_index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix('m')
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| StoreError::service("InvalidArgument", "bad continuation token"))?,
        };

        let page_size = state.page_size;
        let objects = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let start = page_index * page_size;
        let keys: Vec<String> = objects.keys().skip(start).take(page_size).cloned().collect();
        let truncated = start + page_size < objects.len();

        Ok(ListingPage {
            keys,
            truncated,
            cursor: if truncated && !state.drop_cursor {
                Some(format!("m{}", page_index + 1))
            } else {
                None
            },
        })
    }

    fn put_object(&self, bucket: &str, key: &str, source: &Path) -> Result<(), StoreError> {
        self.record("put_object");
        let body = fs::read(source).map_err(|err| StoreError::Io {
            path: source.to_path_buf(),
            source: err,
        })?;

        let mut state = self.state.borrow_mut();
        let ignore_writes = state.ignore_writes;
        let objects = state.buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        if !ignore_writes {
            objects.insert(key.to_string(), body);
        }
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, StoreError> {
        self.record("get_object");
        let body = self
            .state
            .borrow()
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::service("NoSuchKey", "The specified key does not exist."))?;

        fs::write(dest, &body).map_err(|err| StoreError::Io {
            path: dest.to_path_buf(),
            source: err,
        })?;
        Ok(body.len() as u64)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.record("delete_object");
        let mut state = self.state.borrow_mut();
        let ignore_writes = state.ignore_writes;
        let objects = state.buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        if !ignore_writes {
            objects.remove(key);
        }
        Ok(())
    }

    fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteReport, StoreError> {
        self.record("delete_objects");
        let call_no = self.calls_to("delete_objects");
        let mut state = self.state.borrow_mut();

        if matches!(state.delete_objects_error_on_call, Some((n, _)) if n == call_no) {
            if let Some((_, err)) = state.delete_objects_error_on_call.take() {
                return Err(err);
            }
        }
        let failing_keys = state.failing_keys.clone();
        let objects = state.buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;

        let mut report = DeleteReport::default();
        for key in keys {
            if failing_keys.contains(key) {
                report.failures.push(DeleteFailure {
                    key: key.clone(),
                    code: "AccessDenied".to_string(),
                    message: "Access Denied".to_string(),
                });
            } else {
                objects.remove(key);
                report.deleted.push(key.clone());
            }
        }
        Ok(report)
    }

    fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
    ) -> Result<(), StoreError> {
        self.record("copy_object");
        let mut state = self.state.borrow_mut();

        let body = state
            .buckets
            .get(source_bucket)
            .ok_or_else(|| no_such_bucket(source_bucket))?
            .get(source_key)
            .cloned()
            .ok_or_else(|| StoreError::service("NoSuchKey", "The specified key does not exist."))?;

        state
            .buckets
            .get_mut(target_bucket)
            .ok_or_else(|| no_such_bucket(target_bucket))?
            .insert(target_key.to_string(), body);
        Ok(())
    }
}
