use std::{fmt, io, path::Path};

use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier},
};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{
    adapters,
    model::store::{Bucket, DeleteFailure, DeleteReport, ListingPage, StoreError},
    util,
};

/// Region that must not be sent as a location constraint.
const DEFAULT_REGION: &str = "us-east-1";

fn store_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    if let Some(svc_err) = err.as_service_error() {
        return StoreError::service(
            svc_err.code().unwrap_or("Unknown"),
            svc_err.message().unwrap_or("no message"),
        );
    }

    StoreError::Transport(DisplayErrorContext(&err).to_string())
}

/// Builds a new S3 client from the shared SDK config on every `connect`.
pub struct S3Connector {
    config: aws_config::SdkConfig,
    force_path_style: bool,
}

impl S3Connector {
    pub fn new(config: aws_config::SdkConfig, force_path_style: bool) -> Self {
        Self {
            config,
            force_path_style,
        }
    }
}

impl adapters::Connect for S3Connector {
    fn connect(&self) -> Result<Box<dyn adapters::ObjectStore>, StoreError> {
        let conf = aws_sdk_s3::config::Builder::from(&self.config)
            .force_path_style(self.force_path_style)
            .build();

        Ok(Box::new(aws_sdk_s3::Client::from_conf(conf)))
    }
}

impl adapters::ObjectStore for aws_sdk_s3::Client {
    fn list_buckets(&self) -> Result<Vec<Bucket>, StoreError> {
        let lb = util::poll::block_until_ready(self.list_buckets().send()).map_err(store_error)?;

        Ok(lb
            .buckets()
            .iter()
            .filter_map(|b| b.name())
            .map(|name| Bucket {
                name: name.to_string(),
            })
            .collect())
    }

    fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError> {
        let mut req = self.create_bucket().bucket(bucket);

        if region != DEFAULT_REGION {
            req = req.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        util::poll::block_until_ready(req.send()).map_err(store_error)?;

        Ok(())
    }

    fn delete_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let req = self.delete_bucket().bucket(bucket);

        util::poll::block_until_ready(req.send()).map_err(store_error)?;

        Ok(())
    }

    fn list_objects(&self, bucket: &str, cursor: Option<&str>) -> Result<ListingPage, StoreError> {
        let mut req = self.list_objects_v2().bucket(bucket);

        if let Some(tok) = cursor {
            req = req.continuation_token(tok);
        }

        let lo = util::poll::block_until_ready(req.send()).map_err(store_error)?;

        let keys = lo
            .contents()
            .iter()
            .filter_map(|o| o.key())
            .map(|k| k.to_string())
            .collect();

        Ok(ListingPage {
            keys,
            truncated: lo.is_truncated().unwrap_or(false),
            cursor: lo.next_continuation_token().map(|tok| tok.to_string()),
        })
    }

    fn put_object(&self, bucket: &str, key: &str, source: &Path) -> Result<(), StoreError> {
        let body = util::poll::block_until_ready(ByteStream::from_path(source)).map_err(|err| {
            StoreError::Io {
                path: source.to_path_buf(),
                source: io::Error::other(err),
            }
        })?;

        let req = self.put_object().bucket(bucket).key(key).body(body);

        let po = util::poll::block_until_ready(req.send()).map_err(store_error)?;
        debug!(key = key, e_tag = po.e_tag().unwrap_or(""), "put_object response");

        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, StoreError> {
        let req = self.get_object().bucket(bucket).key(key);

        let o = util::poll::block_until_ready(req.send()).map_err(store_error)?;

        let mut file = util::poll::block_until_ready(tokio::fs::File::create(dest)).map_err(|err| {
            StoreError::Io {
                path: dest.to_path_buf(),
                source: err,
            }
        })?;

        // streamed to disk; build artifacts can be larger than memory
        let mut body_reader = o.body.into_async_read();
        let written = util::poll::block_until_ready(async {
            let written = tokio::io::copy(&mut body_reader, &mut file).await?;
            file.flush().await?;
            Ok::<u64, io::Error>(written)
        })
        .map_err(|err| StoreError::Transport(format!("failed to stream body: {}, {}", key, err)))?;

        debug!(key = key, bytes = written, dest = %dest.display(), "get_object response");

        Ok(written)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let req = self.delete_object().bucket(bucket).key(key);

        util::poll::block_until_ready(req.send()).map_err(store_error)?;

        Ok(())
    }

    fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteReport, StoreError> {
        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        let req = self.delete_objects().bucket(bucket).delete(delete);

        let dout = util::poll::block_until_ready(req.send()).map_err(store_error)?;

        Ok(DeleteReport {
            deleted: dout
                .deleted()
                .iter()
                .filter_map(|d| d.key())
                .map(|k| k.to_string())
                .collect(),
            failures: dout
                .errors()
                .iter()
                .map(|e| DeleteFailure {
                    key: e.key().unwrap_or("").to_string(),
                    code: e.code().unwrap_or("Unknown").to_string(),
                    message: e.message().unwrap_or("").to_string(),
                })
                .collect(),
        })
    }

    fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
    ) -> Result<(), StoreError> {
        let req = self
            .copy_object()
            .copy_source(util::uri::copy_source(source_bucket, source_key))
            .bucket(target_bucket)
            .key(target_key);

        util::poll::block_until_ready(req.send()).map_err(store_error)?;

        Ok(())
    }
}
