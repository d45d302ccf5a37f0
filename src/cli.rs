use std::path::PathBuf;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use clap::{Parser, Subcommand};

use crate::{
    model::outcome::TaskError,
    tasks::{
        copy_file::CopyFile, create_bucket::CreateBucket, delete_bucket::DeleteBucket,
        delete_file::DeleteFile, delete_matching::DeleteMatching, get_file::GetFile,
        put_file::PutFile, Task,
    },
    util,
};

const CREDENTIALS_PROVIDER: &str = "bucketstep";

#[derive(Parser, Debug)]
#[command(name = "bucketstep", version, about = "Build steps for S3 buckets and objects")]
pub struct Cli {
    #[arg(
        long = "access-key",
        env = "AWS_ACCESS_KEY_ID",
        global = true,
        hide_env_values = true
    )]
    pub access_key: Option<String>,

    #[arg(
        long = "secret-key",
        env = "AWS_SECRET_ACCESS_KEY",
        global = true,
        hide_env_values = true
    )]
    pub secret_key: Option<String>,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-1", global = true)]
    pub region: String,

    /// S3-compatible endpoint; switches to path-style addressing.
    #[arg(long = "endpoint-url", global = true)]
    pub endpoint_url: Option<String>,

    #[command(subcommand)]
    pub step: Step,
}

#[derive(Subcommand, Debug)]
pub enum Step {
    /// Create a bucket unless it already exists.
    CreateBucket {
        #[arg(long)]
        bucket: String,
    },
    /// Delete an empty bucket.
    DeleteBucket {
        #[arg(long)]
        bucket: String,
    },
    /// Upload a local file, creating the bucket if needed.
    Put {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        file: PathBuf,
        /// Defaults to the file's base name.
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        overwrite: bool,
    },
    /// Download a key to a local file.
    Get {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        /// Defaults to the key's base name.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete a single key.
    Delete {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
    },
    /// Copy a key, optionally into another bucket.
    Copy {
        #[arg(long)]
        bucket: String,
        #[arg(long = "source-key")]
        source_key: String,
        #[arg(long = "target-bucket")]
        target_bucket: Option<String>,
        #[arg(long = "target-key")]
        target_key: String,
        #[arg(long)]
        overwrite: bool,
    },
    /// Delete every key containing the search string.
    DeleteMatching {
        #[arg(long)]
        bucket: String,
        /// An empty string matches every key.
        #[arg(long)]
        search: String,
        #[arg(long = "confirm-delete-all")]
        confirm_delete_all: bool,
    },
}

impl Cli {
    pub fn into_task(self) -> Result<Box<dyn Task>, TaskError> {
        let bucket_of = util::uri::parse_bucket;

        let task: Box<dyn Task> = match self.step {
            Step::CreateBucket { bucket } => Box::new(CreateBucket {
                bucket: bucket_of(&bucket)?,
                region: self.region,
            }),
            Step::DeleteBucket { bucket } => Box::new(DeleteBucket {
                bucket: bucket_of(&bucket)?,
            }),
            Step::Put {
                bucket,
                file,
                key,
                overwrite,
            } => Box::new(PutFile {
                bucket: bucket_of(&bucket)?,
                region: self.region,
                file,
                key,
                overwrite,
            }),
            Step::Get {
                bucket,
                key,
                output,
            } => Box::new(GetFile {
                bucket: bucket_of(&bucket)?,
                key,
                output,
            }),
            Step::Delete { bucket, key } => Box::new(DeleteFile {
                bucket: bucket_of(&bucket)?,
                key,
            }),
            Step::Copy {
                bucket,
                source_key,
                target_bucket,
                target_key,
                overwrite,
            } => Box::new(CopyFile {
                bucket: bucket_of(&bucket)?,
                source_key,
                target_bucket: target_bucket.as_deref().map(bucket_of).transpose()?,
                target_key,
                overwrite,
            }),
            Step::DeleteMatching {
                bucket,
                search,
                confirm_delete_all,
            } => Box::new(DeleteMatching {
                bucket: bucket_of(&bucket)?,
                search,
                confirm_all: confirm_delete_all,
            }),
        };

        Ok(task)
    }

    /// Explicit keys take precedence; otherwise the default provider chain applies.
    pub fn sdk_config(&self) -> Result<aws_config::SdkConfig, TaskError> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(self.region.clone()));

        match (&self.access_key, &self.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    CREDENTIALS_PROVIDER,
                ));
            }
            (None, None) => {}
            _ => {
                return Err(TaskError::Configuration(
                    "access key and secret key must be given together".to_string(),
                ))
            }
        }

        if let Some(url) = &self.endpoint_url {
            loader = loader.endpoint_url(url);
        }

        Ok(util::poll::block_until_ready(loader.load()))
    }
}
