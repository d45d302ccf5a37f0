use std::ops::ControlFlow;

use tracing::{debug, info, warn};

use crate::{
    adapters::{Connect, ObjectStore},
    model::{
        outcome::{show_error, TaskError},
        store::StoreError,
    },
};

/// Upper bound on listing pages followed before a listing is abandoned.
pub const MAX_LISTING_PAGES: usize = 100_000;

/// Largest number of keys the provider accepts in one multi-key delete.
pub const MAX_KEYS_PER_DELETE: usize = 1000;

const BUCKET_OWNED_BY_YOU: &str = "BucketAlreadyOwnedByYou";
const BUCKET_ALREADY_EXISTS: &str = "BucketAlreadyExists";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciled {
    Existing,
    Created,
}

/// How a listed key is compared against a search string. Single-key lookups
/// are exact; bulk selection is by substring.
#[derive(Clone, Copy, Debug)]
pub enum KeyMatch<'a> {
    Exact(&'a str),
    Contains(&'a str),
}

impl KeyMatch<'_> {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyMatch::Exact(wanted) => key == *wanted,
            KeyMatch::Contains(needle) => key.contains(needle),
        }
    }
}

/// Keys selected for a multi-key delete, in listing order.
#[derive(Debug, Default)]
pub struct DeletionBatch {
    pub keys: Vec<String>,
}

impl DeletionBatch {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn chunks(&self) -> std::slice::Chunks<'_, String> {
        self.keys.chunks(MAX_KEYS_PER_DELETE)
    }
}

/// Bucket-level capability: reconcile and query buckets.
pub trait ContainerAware {
    fn store(&self) -> &dyn ObjectStore;

    fn list_bucket_names(&self) -> Result<Vec<String>, TaskError> {
        let buckets = self.store().list_buckets()?;
        Ok(buckets.into_iter().map(|b| b.name).collect())
    }

    /// Lookup failures are logged and reported as absent.
    fn bucket_exists(&self, bucket: &str) -> bool {
        match self.list_bucket_names() {
            Ok(names) => names.iter().any(|name| name == bucket),
            Err(err) => {
                show_error(&err, "list_buckets");
                false
            }
        }
    }

    /// Creates `bucket` unless it is already visible to the credential.
    fn ensure_bucket(&self, bucket: &str, region: &str) -> Result<Reconciled, TaskError> {
        if self.list_bucket_names()?.iter().any(|name| name == bucket) {
            info!(bucket = bucket, "bucket already exists");
            return Ok(Reconciled::Existing);
        }

        info!(bucket = bucket, region = region, "creating bucket");
        let err = match self.store().create_bucket(bucket, region) {
            Ok(()) => return Ok(Reconciled::Created),
            Err(err) => err,
        };

        let code = err.code().unwrap_or_default().to_string();
        match code.as_str() {
            BUCKET_OWNED_BY_YOU => {
                warn!(bucket = bucket, "bucket created concurrently");
                Ok(Reconciled::Existing)
            }
            BUCKET_ALREADY_EXISTS if self.list_bucket_names()?.iter().any(|name| name == bucket) => {
                warn!(bucket = bucket, "bucket created concurrently");
                Ok(Reconciled::Existing)
            }
            _ => Err(err.into()),
        }
    }
}

/// Object-level capability built on paginated listing.
pub trait ObjectAware: ContainerAware {
    fn page_limit(&self) -> usize {
        MAX_LISTING_PAGES
    }

    /// Walks every page of `bucket`, handing each key to `visit` until it
    /// breaks or the listing is exhausted.
    fn scan<F>(&self, bucket: &str, mut visit: F) -> Result<(), TaskError>
    where
        F: FnMut(&str) -> ControlFlow<()>,
    {
        let mut cursor: Option<String> = None;

        for page_no in 1..=self.page_limit() {
            let page = self.store().list_objects(bucket, cursor.as_deref())?;
            debug!(
                bucket = bucket,
                page = page_no,
                keys = page.keys.len(),
                truncated = page.truncated,
                "listed page"
            );

            for key in &page.keys {
                if visit(key).is_break() {
                    return Ok(());
                }
            }

            if !page.truncated {
                return Ok(());
            }

            cursor = match page.cursor {
                Some(next) => Some(next),
                None => {
                    return Err(StoreError::service(
                        "MissingContinuationToken",
                        "truncated listing returned no continuation token",
                    )
                    .into())
                }
            };
        }

        Err(TaskError::PaginationLimit {
            bucket: bucket.to_string(),
            pages: self.page_limit(),
        })
    }

    /// Exact-match lookup across every page.
    fn find_object(&self, bucket: &str, key: &str) -> Result<bool, TaskError> {
        let wanted = KeyMatch::Exact(key);
        let mut found = false;

        self.scan(bucket, |listed| {
            if wanted.matches(listed) {
                found = true;
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;

        Ok(found)
    }

    /// Like `find_object`, but listing failures are logged and reported as
    /// absent.
    fn object_exists(&self, bucket: &str, key: &str) -> bool {
        info!(bucket = bucket, key = key, "checking for key");

        match self.find_object(bucket, key) {
            Ok(found) => found,
            Err(err) => {
                show_error(&err, "list_objects");
                false
            }
        }
    }

    /// Collects every key containing `search`. An empty `search` selects all keys.
    fn collect_keys(&self, bucket: &str, search: &str) -> Result<DeletionBatch, TaskError> {
        let wanted = KeyMatch::Contains(search);
        let mut batch = DeletionBatch::default();

        self.scan(bucket, |listed| {
            if wanted.matches(listed) {
                debug!(key = listed, "selected key");
                batch.keys.push(listed.to_string());
            }
            ControlFlow::Continue(())
        })?;

        Ok(batch)
    }
}

/// Store handle scoped to a single step invocation; released on drop.
pub struct Session {
    store: Box<dyn ObjectStore>,
    page_limit: usize,
}

impl Session {
    pub fn open(connector: &dyn Connect) -> Result<Self, TaskError> {
        let store = connector.connect()?;
        debug!("acquired store handle");

        Ok(Self {
            store,
            page_limit: MAX_LISTING_PAGES,
        })
    }

    #[cfg(test)]
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("released store handle");
    }
}

impl ContainerAware for Session {
    fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }
}

impl ObjectAware for Session {
    fn page_limit(&self) -> usize {
        self.page_limit
    }
}
