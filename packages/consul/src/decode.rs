//! Response callbacks.
//!
//! Each function turns a normalized [`HttpResponse`] into a typed value after
//! the status check. Endpoints pair one of these with a request to form an
//! [`ApiCall`](crate::ApiCall).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use consul_http::HttpResponse;

use crate::error::Error;

pub const INDEX_HEADER: &str = "X-Consul-Index";

/// A value paired with the index of the state it was read at.
///
/// Pass `index` back through [`QueryOptions::index`](crate::QueryOptions) to
/// make a blocking query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indexed<T> {
    pub index: u64,
    pub value: T,
}

impl<T> Indexed<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Indexed<U> {
        Indexed {
            index: self.index,
            value: f(self.value),
        }
    }
}

/// Classify error statuses.
///
/// 5xx is checked first, then 400, 401, 403, and 404 unless `allow_404`.
pub fn check_status(response: &HttpResponse, allow_404: bool) -> Result<(), Error> {
    match response.code {
        500..=599 => Err(Error::Server {
            code: response.code,
            body: response.body.clone(),
        }),
        400 => Err(Error::BadRequest(format!(
            "{} {}",
            response.code, response.body
        ))),
        401 => Err(Error::AclDisabled(response.body.clone())),
        403 => Err(Error::PermissionDenied(response.body.clone())),
        404 if !allow_404 => Err(Error::NotFound(response.body.clone())),
        _ => Ok(()),
    }
}

/// `true` for a 200 answer.
pub fn boolean(response: HttpResponse) -> Result<bool, Error> {
    check_status(&response, true)?;
    Ok(response.code == 200)
}

/// Parse the body as JSON; a 404 is an error.
pub fn json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, Error> {
    check_status(&response, false)?;
    Ok(serde_json::from_str(&response.body)?)
}

/// Parse the body as JSON; a 404 yields `None`.
pub fn json_allow_404<T: DeserializeOwned>(response: HttpResponse) -> Result<Option<T>, Error> {
    check_status(&response, true)?;
    if response.code == 404 {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&response.body)?))
}

/// Like [`json_allow_404`], treating a JSON `null` body the same as a 404.
pub fn json_or_none<T: DeserializeOwned>(response: HttpResponse) -> Result<Option<T>, Error> {
    Ok(json_allow_404::<Option<T>>(response)?.flatten())
}

/// First element of a JSON array; empty, `null` or 404 yield `None`.
pub fn first<T: DeserializeOwned>(response: HttpResponse) -> Result<Option<T>, Error> {
    Ok(json_or_none::<Vec<T>>(response)?.and_then(|items| items.into_iter().next()))
}

/// The `ID` field of a JSON object.
pub fn id(response: HttpResponse) -> Result<String, Error> {
    #[derive(Deserialize)]
    struct Created {
        #[serde(rename = "ID")]
        id: String,
    }

    json::<Created>(response).map(|created| created.id)
}

/// Read the `X-Consul-Index` header.
pub fn index(response: &HttpResponse) -> Result<u64, Error> {
    let raw = response
        .header(INDEX_HEADER)
        .ok_or_else(|| Error::decode(format!("missing {} header", INDEX_HEADER)))?;
    raw.trim()
        .parse()
        .map_err(|_| Error::decode(format!("invalid {} header: {}", INDEX_HEADER, raw)))
}

/// Run `inner` and pair its value with the response index.
///
/// Status errors take precedence over a missing index.
pub fn indexed<T>(
    response: HttpResponse,
    inner: impl FnOnce(HttpResponse) -> Result<T, Error>,
) -> Result<Indexed<T>, Error> {
    check_status(&response, true)?;
    let index = index(&response)?;
    Ok(Indexed {
        index,
        value: inner(response)?,
    })
}

/// Deserialize an explicit `null` as the type's default.
///
/// The agent writes empty maps and lists as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Base64 (de)serialization for KV values.
pub(crate) mod base64_value {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(code: u16, body: &str) -> HttpResponse {
        HttpResponse::new(code, body)
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            check_status(&response(500, "rpc error"), true),
            Err(Error::Server { code: 500, .. })
        ));
        assert!(matches!(
            check_status(&response(503, ""), true),
            Err(Error::Server { code: 503, .. })
        ));
        assert!(matches!(
            check_status(&response(400, "bad"), true),
            Err(Error::BadRequest(msg)) if msg == "400 bad"
        ));
        assert!(matches!(
            check_status(&response(401, "ACL support disabled"), true),
            Err(Error::AclDisabled(_))
        ));
        assert!(matches!(
            check_status(&response(403, "Permission denied"), true),
            Err(Error::PermissionDenied(_))
        ));
        assert!(matches!(
            check_status(&response(404, ""), false),
            Err(Error::NotFound(_))
        ));
        assert!(check_status(&response(404, ""), true).is_ok());
        assert!(check_status(&response(200, ""), false).is_ok());
        assert!(check_status(&response(304, ""), false).is_ok());
    }

    #[test]
    fn boolean_decoding() {
        assert!(boolean(response(200, "")).unwrap());
        assert!(!boolean(response(404, "")).unwrap());
        assert!(boolean(response(403, "")).is_err());
    }

    #[test]
    fn json_decoding() {
        let value: bool = json(response(200, "true")).unwrap();
        assert!(value);

        assert!(matches!(
            json::<bool>(response(404, "")),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            json::<bool>(response(200, "not json")),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn json_allow_404_decoding() {
        let value: Option<Vec<String>> = json_allow_404(response(404, "")).unwrap();
        assert!(value.is_none());

        let value: Option<Vec<String>> = json_allow_404(response(200, r#"["a"]"#)).unwrap();
        assert_eq!(value, Some(vec!["a".to_string()]));
    }

    #[test]
    fn json_or_none_treats_null_as_missing() {
        let value: Option<Vec<String>> = json_or_none(response(200, "null")).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn first_element() {
        let value: Option<String> = first(response(200, r#"["a", "b"]"#)).unwrap();
        assert_eq!(value.as_deref(), Some("a"));
        assert!(first::<String>(response(200, "[]")).unwrap().is_none());
        assert!(first::<String>(response(200, "null")).unwrap().is_none());
        assert!(first::<String>(response(404, "")).unwrap().is_none());
    }

    #[test]
    fn id_decoding() {
        let created = id(response(200, r#"{"ID": "adf4238a-882b-9ddc-4a9d-5b6758e4159e"}"#));
        assert_eq!(created.unwrap(), "adf4238a-882b-9ddc-4a9d-5b6758e4159e");
        assert!(id(response(200, "{}")).is_err());
    }

    #[test]
    fn indexed_decoding() {
        let r = response(200, r#"["web"]"#).with_header(INDEX_HEADER, "1234");
        let result: Indexed<Vec<String>> = indexed(r, json).unwrap();
        assert_eq!(result.index, 1234);
        assert_eq!(result.value, vec!["web".to_string()]);

        let r = response(404, "").with_header(INDEX_HEADER, "7");
        let result: Indexed<Option<String>> = indexed(r, json_allow_404).unwrap();
        assert_eq!(result.index, 7);
        assert!(result.value.is_none());
    }

    #[test]
    fn indexed_requires_header() {
        let result = indexed(response(200, "[]"), json::<Vec<String>>);
        assert!(matches!(result, Err(Error::Decode { .. })));

        let r = response(200, "[]").with_header(INDEX_HEADER, "abc");
        assert!(matches!(
            indexed(r, json::<Vec<String>>),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn indexed_reports_status_before_index() {
        let result = indexed(response(500, "leader lost"), json::<Vec<String>>);
        assert!(matches!(result, Err(Error::Server { code: 500, .. })));
    }

    #[test]
    fn indexed_map() {
        let indexed = Indexed {
            index: 3,
            value: vec![1, 2],
        };
        assert_eq!(indexed.map(|v| v.len()), Indexed { index: 3, value: 2 });
    }
}
