//! Inbound events and resize request assembly

use crate::error::ResizeError;
use crate::options::{build_args, OptionName, OptionSet};
use serde::Deserialize;
use std::collections::HashMap;

/// Event delivered by the caller
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResizeEvent {
    pub key: String,
    #[serde(default)]
    pub max_width: Option<u32>,
    #[serde(default)]
    pub max_height: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Environment variables consulted on every invocation
const DELEGATE_ENV_VARS: [&str; 5] = [
    "S3_BUCKET",
    "RESIZE_STRATEGY",
    "JPEG_COMPRESSION",
    "PNG_COMPRESSION",
    "S3_READ_METHOD",
];

/// Process-wide delegate configuration.
///
/// Values are forwarded to the delegate verbatim, so they stay strings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DelegateEnv {
    pub s3_bucket: Option<String>,
    pub resize_strategy: Option<String>,
    pub jpeg_compression: Option<String>,
    pub png_compression: Option<String>,
    pub s3_read_method: Option<String>,
}

impl DelegateEnv {
    /// Snapshot the delegate variables from the current process environment
    pub fn from_process_env() -> Result<Self, ResizeError> {
        let vars = DELEGATE_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v)))
            .collect::<HashMap<_, _>>();

        Self::from_vars(vars)
    }

    /// Load from an explicit set of `NAME=value` pairs
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ResizeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let config = config::Config::builder()
            .add_source(config::Environment::default().source(Some(source)))
            .build()
            .map_err(|e| ResizeError::InvalidRequest(format!("reading environment: {e}")))?;

        config
            .try_deserialize::<DelegateEnv>()
            .map_err(|e| ResizeError::InvalidRequest(format!("reading environment: {e}")))
    }
}

/// A fully assembled resize request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    bucket: String,
    key: String,
    options: OptionSet,
}

impl ResizeRequest {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        options: OptionSet,
    ) -> Result<Self, ResizeError> {
        let bucket = bucket.into();
        let key = key.into();

        if bucket.is_empty() {
            return Err(ResizeError::InvalidRequest("bucket is empty".to_string()));
        }
        if key.is_empty() {
            return Err(ResizeError::InvalidRequest("key is empty".to_string()));
        }

        Ok(Self {
            bucket,
            key,
            options,
        })
    }

    /// Combine an event with the delegate environment.
    ///
    /// Dimensions and format come from the event; strategy, compression and
    /// read method only ever come from the environment.
    pub fn from_event(event: ResizeEvent, env: &DelegateEnv) -> Result<Self, ResizeError> {
        let bucket = env
            .s3_bucket
            .clone()
            .ok_or_else(|| ResizeError::InvalidRequest("S3_BUCKET is not set".to_string()))?;

        let mut options = OptionSet::new();
        options.set(OptionName::MaxWidth, event.max_width);
        options.set(OptionName::MaxHeight, event.max_height);
        options.set(OptionName::Format, event.format);
        options.set(OptionName::ResizeStrategy, env.resize_strategy.clone());
        options.set(OptionName::JpegCompression, env.jpeg_compression.clone());
        options.set(OptionName::PngCompression, env.png_compression.clone());
        options.set(OptionName::S3ReadMethod, env.s3_read_method.clone());

        Self::new(bucket, event.key, options)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Delegate arguments for this request
    pub fn args(&self) -> Vec<String> {
        build_args(&self.bucket, &self.key, &self.options)
    }
}
