use serde::{Deserialize, Serialize};

use consul_http::{HttpRequest, Method};

use crate::call::ApiCall;
use crate::client::Consul;
use crate::decode::{self, base64_value, Indexed};
use crate::dispatch::Dispatch;
use crate::error::Error;
use crate::options::{QueryOptions, WriteOptions};

/// One entry of the key/value store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct KvPair {
    pub key: String,
    pub create_index: u64,
    pub modify_index: u64,
    pub lock_index: u64,
    pub flags: u64,
    /// Raw value, decoded from base64
    #[serde(with = "base64_value")]
    pub value: Option<Vec<u8>>,
    /// Session holding the lock, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl KvPair {
    /// The value as UTF-8 text, if it is valid UTF-8.
    pub fn value_str(&self) -> Option<&str> {
        self.value
            .as_deref()
            .and_then(|value| std::str::from_utf8(value).ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvPutOptions {
    /// Only write if the entry's modify index matches; 0 means "only if absent"
    pub cas: Option<u64>,
    pub flags: Option<u64>,
    /// Acquire the lock with this session
    pub acquire: Option<String>,
    /// Release the lock held by this session
    pub release: Option<String>,
    pub write: WriteOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvDeleteOptions {
    /// Delete every key under the prefix
    pub recurse: bool,
    pub cas: Option<u64>,
    pub write: WriteOptions,
}

/// The `/v1/kv` endpoints.
pub struct Kv<'a, D> {
    consul: &'a Consul<D>,
}

fn key_path(key: &str) -> Result<String, Error> {
    if key.starts_with('/') {
        return Err(Error::invalid(format!(
            "keys should not start with a forward slash: {}",
            key
        )));
    }
    // URL normalization would silently rewrite these
    if key.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(Error::invalid(format!(
            "keys should not contain '.' or '..' segments: {}",
            key
        )));
    }
    Ok(format!("/v1/kv/{}", key))
}

impl<'a, D: Dispatch> Kv<'a, D> {
    pub(crate) fn new(consul: &'a Consul<D>) -> Self {
        Self { consul }
    }

    fn read(&self, key: &str, options: &QueryOptions) -> Result<HttpRequest, Error> {
        Ok(self
            .consul
            .read_request(Method::GET, &key_path(key)?, options))
    }

    /// Read one key. A missing key is `None`, not an error.
    pub fn get(
        &self,
        key: &str,
        options: &QueryOptions,
    ) -> D::Output<Indexed<Option<KvPair>>> {
        self.consul.dispatch(ApiCall::from_result(
            self.read(key, options),
            |response| decode::indexed(response, decode::first::<KvPair>),
        ))
    }

    /// Read every entry under `prefix`.
    pub fn list(&self, prefix: &str, options: &QueryOptions) -> D::Output<Indexed<Vec<KvPair>>> {
        let request = self
            .read(prefix, options)
            .map(|request| request.with_flag("recurse"));

        self.consul.dispatch(ApiCall::from_result(request, |response| {
            decode::indexed(response, decode::json_or_none::<Vec<KvPair>>)
                .map(|indexed| indexed.map(Option::unwrap_or_default))
        }))
    }

    /// List key names under `prefix`, up to the first `separator` after it.
    pub fn keys(
        &self,
        prefix: &str,
        separator: Option<&str>,
        options: &QueryOptions,
    ) -> D::Output<Indexed<Vec<String>>> {
        let request = self.read(prefix, options).map(|mut request| {
            request.params.push("keys", "");
            request.params.push_opt("separator", separator);
            request
        });

        self.consul.dispatch(ApiCall::from_result(request, |response| {
            decode::indexed(response, decode::json_or_none::<Vec<String>>)
                .map(|indexed| indexed.map(Option::unwrap_or_default))
        }))
    }

    /// Write `value` to `key`. Returns whether the write was applied, which is
    /// `false` when a check-and-set or lock operation lost.
    pub fn put(
        &self,
        key: &str,
        value: impl Into<Vec<u8>>,
        options: &KvPutOptions,
    ) -> D::Output<bool> {
        let request = key_path(key).map(|path| {
            let mut request = self
                .consul
                .write_request(Method::PUT, &path, &options.write)
                .with_body(value);
            request.params.push_opt("cas", options.cas);
            request.params.push_opt("flags", options.flags);
            request.params.push_opt("acquire", options.acquire.as_ref());
            request.params.push_opt("release", options.release.as_ref());
            request
        });

        self.consul
            .dispatch(ApiCall::from_result(request, decode::json::<bool>))
    }

    pub fn delete(&self, key: &str, options: &KvDeleteOptions) -> D::Output<bool> {
        let request = key_path(key).map(|path| {
            let mut request = self
                .consul
                .write_request(Method::DELETE, &path, &options.write);
            if options.recurse {
                request.params.push("recurse", "");
            }
            request.params.push_opt("cas", options.cas);
            request
        });

        self.consul
            .dispatch(ApiCall::from_result(request, decode::json::<bool>))
    }
}
