use std::path::Path;

use crate::model::store::{Bucket, DeleteReport, ListingPage, StoreError};

#[cfg(test)]
pub mod mock;
pub mod s3;

/// Blocking handle onto a remote object store.
pub trait ObjectStore {
    fn list_buckets(&self) -> Result<Vec<Bucket>, StoreError>;

    fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError>;

    fn delete_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    fn list_objects(&self, bucket: &str, cursor: Option<&str>) -> Result<ListingPage, StoreError>;

    fn put_object(&self, bucket: &str, key: &str, source: &Path) -> Result<(), StoreError>;

    /// Streams the object body into `dest`, returning the bytes written.
    fn get_object(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, StoreError>;

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;

    fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteReport, StoreError>;

    fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
    ) -> Result<(), StoreError>;
}

/// Produces a fresh store handle for each step invocation.
pub trait Connect {
    fn connect(&self) -> Result<Box<dyn ObjectStore>, StoreError>;
}
