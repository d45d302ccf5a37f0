use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::model::outcome::TaskError;

const S3_SCHEME: &str = "s3://";

/// Unreserved characters plus `/`, which separates bucket and key segments.
const COPY_SOURCE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Accepts `s3://bucket` or a bare bucket name.
pub fn parse_bucket(bucket_uri: &str) -> Result<String, TaskError> {
    let bucket = match bucket_uri.split_once("://") {
        None => bucket_uri,
        Some(_) if bucket_uri.starts_with(S3_SCHEME) => &bucket_uri[S3_SCHEME.len()..],
        Some((scheme, _)) => {
            return Err(TaskError::Configuration(format!(
                "unsupported provider scheme: {}://",
                scheme
            )))
        }
    };

    let bucket = bucket.trim_end_matches('/');
    if bucket.is_empty() {
        return Err(TaskError::Configuration(format!(
            "failed to parse bucket of: {}",
            bucket_uri
        )));
    }

    Ok(bucket.to_string())
}

/// `bucket/key` as sent in the copy-source header; the key is URL-encoded.
pub fn copy_source(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, utf8_percent_encode(key, COPY_SOURCE_ENCODE_SET))
}
