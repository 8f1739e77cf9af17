use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use consul_http::Method;

use crate::api::agent::AgentService;
use crate::api::health::{HealthCheck, Node};
use crate::call::ApiCall;
use crate::client::Consul;
use crate::decode::{self, Indexed};
use crate::dispatch::Dispatch;
use crate::options::{QueryOptions, WriteOptions};

/// A node and the services registered on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeServices {
    pub node: Node,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub services: HashMap<String, AgentService>,
}

/// One service instance in the catalog view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CatalogService {
    #[serde(rename = "ID")]
    pub id: String,
    pub node: String,
    pub address: String,
    pub datacenter: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub node_meta: HashMap<String, String>,
    #[serde(rename = "ServiceID")]
    pub service_id: String,
    pub service_name: String,
    pub service_address: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub service_tags: Vec<String>,
    pub service_port: u16,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub service_meta: HashMap<String, String>,
    pub create_index: u64,
    pub modify_index: u64,
}

/// Direct catalog write of a node, optionally with a service and a check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogRegistration {
    pub node: String,
    pub address: String,
    /// Filled from the write options when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub node_meta: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<AgentService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<HealthCheck>,
}

impl CatalogRegistration {
    pub fn new(node: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_service(mut self, service: AgentService) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_check(mut self, check: HealthCheck) -> Self {
        self.check = Some(check);
        self
    }
}

/// Removes a node, or only one of its services or checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogDeregistration {
    pub node: String,
    #[serde(rename = "ServiceID", skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(rename = "CheckID", skip_serializing_if = "Option::is_none")]
    pub check_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
}

impl CatalogDeregistration {
    pub fn node(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            ..Default::default()
        }
    }

    pub fn service(node: impl Into<String>, service_id: impl Into<String>) -> Self {
        Self {
            service_id: Some(service_id.into()),
            ..Self::node(node)
        }
    }

    pub fn check(node: impl Into<String>, check_id: impl Into<String>) -> Self {
        Self {
            check_id: Some(check_id.into()),
            ..Self::node(node)
        }
    }
}

/// The `/v1/catalog` endpoints.
pub struct Catalog<'a, D> {
    consul: &'a Consul<D>,
}

impl<'a, D: Dispatch> Catalog<'a, D> {
    pub(crate) fn new(consul: &'a Consul<D>) -> Self {
        Self { consul }
    }

    /// Every datacenter known to the servers.
    pub fn datacenters(&self) -> D::Output<Vec<String>> {
        let request = self
            .consul
            .request(Method::GET, "/v1/catalog/datacenters", None);
        self.consul
            .dispatch(ApiCall::new(request, decode::json::<Vec<String>>))
    }

    pub fn nodes(&self, options: &QueryOptions) -> D::Output<Indexed<Vec<Node>>> {
        let request = self
            .consul
            .read_request(Method::GET, "/v1/catalog/nodes", options);
        self.consul.dispatch(ApiCall::new(request, |response| {
            decode::indexed(response, decode::json::<Vec<Node>>)
        }))
    }

    /// Service names with the union of their tags.
    pub fn services(&self, options: &QueryOptions) -> D::Output<Indexed<HashMap<String, Vec<String>>>> {
        let request = self
            .consul
            .read_request(Method::GET, "/v1/catalog/services", options);
        self.consul.dispatch(ApiCall::new(request, |response| {
            decode::indexed(response, decode::json::<HashMap<String, Vec<String>>>)
        }))
    }

    /// Services on `node`; `None` for an unknown node.
    pub fn node(&self, node: &str, options: &QueryOptions) -> D::Output<Indexed<Option<NodeServices>>> {
        let request = self.consul.read_request(
            Method::GET,
            &format!("/v1/catalog/node/{}", node),
            options,
        );
        self.consul.dispatch(ApiCall::new(request, |response| {
            decode::indexed(response, decode::json_or_none::<NodeServices>)
        }))
    }

    /// Instances of `service`, optionally filtered by `tag`.
    pub fn service(
        &self,
        service: &str,
        tag: Option<&str>,
        options: &QueryOptions,
    ) -> D::Output<Indexed<Vec<CatalogService>>> {
        let mut request = self.consul.read_request(
            Method::GET,
            &format!("/v1/catalog/service/{}", service),
            options,
        );
        request.params.push_opt("tag", tag);
        self.consul.dispatch(ApiCall::new(request, |response| {
            decode::indexed(response, decode::json::<Vec<CatalogService>>)
        }))
    }

    pub fn register(
        &self,
        registration: &CatalogRegistration,
        options: &WriteOptions,
    ) -> D::Output<bool> {
        let mut registration = registration.clone();
        if registration.datacenter.is_none() {
            registration.datacenter = self.consul.write_dc(options);
        }

        let request = self
            .consul
            .request(Method::PUT, "/v1/catalog/register", options.token.as_deref())
            .with_json_body(&registration)
            .map_err(Into::into);
        self.consul
            .dispatch(ApiCall::from_result(request, decode::boolean))
    }

    pub fn deregister(
        &self,
        deregistration: &CatalogDeregistration,
        options: &WriteOptions,
    ) -> D::Output<bool> {
        let mut deregistration = deregistration.clone();
        if deregistration.datacenter.is_none() {
            deregistration.datacenter = self.consul.write_dc(options);
        }

        let request = self
            .consul
            .request(Method::PUT, "/v1/catalog/deregister", options.token.as_deref())
            .with_json_body(&deregistration)
            .map_err(Into::into);
        self.consul
            .dispatch(ApiCall::from_result(request, decode::boolean))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registration_body() {
        let registration = CatalogRegistration::new("ext-db", "192.168.10.10").with_service(AgentService {
            id: "redis1".to_string(),
            service: "redis".to_string(),
            port: 8000,
            ..Default::default()
        });

        let value = serde_json::to_value(&registration).unwrap();
        assert_eq!(value["Node"], "ext-db");
        assert_eq!(value["Address"], "192.168.10.10");
        assert_eq!(value["Service"]["ID"], "redis1");
        assert_eq!(value["Service"]["Port"], 8000);
        assert!(value.get("Datacenter").is_none());
        assert!(value.get("Check").is_none());
    }

    #[test]
    fn deregistration_variants() {
        assert_eq!(
            serde_json::to_value(CatalogDeregistration::node("n1")).unwrap(),
            json!({"Node": "n1"})
        );
        assert_eq!(
            serde_json::to_value(CatalogDeregistration::service("n1", "redis1")).unwrap(),
            json!({"Node": "n1", "ServiceID": "redis1"})
        );
        assert_eq!(
            serde_json::to_value(CatalogDeregistration::check("n1", "mem")).unwrap(),
            json!({"Node": "n1", "CheckID": "mem"})
        );
    }

    #[test]
    fn catalog_service_decodes() {
        let services: Vec<CatalogService> = serde_json::from_value(json!([{
            "ID": "40e4a748-2192-161a-0510-9bf59fe950b5",
            "Node": "foobar",
            "Address": "192.168.10.10",
            "Datacenter": "dc1",
            "NodeMeta": {"somekey": "somevalue"},
            "ServiceAddress": "172.17.0.3",
            "ServiceID": "32a2a47f7992:nodea:5000",
            "ServiceName": "foobar",
            "ServicePort": 5000,
            "ServiceTags": ["tacos"],
            "ServiceMeta": {"foobar_meta_value": "baz"},
            "CreateIndex": 10,
            "ModifyIndex": 12
        }]))
        .unwrap();

        assert_eq!(services[0].service_port, 5000);
        assert_eq!(services[0].service_tags, vec!["tacos"]);
        assert_eq!(services[0].modify_index, 12);
    }

    #[test]
    fn null_collections_decode_as_empty() {
        let service: CatalogService = serde_json::from_value(json!({
            "Node": "ext-db",
            "NodeMeta": null,
            "ServiceID": "pg",
            "ServiceTags": null,
            "ServiceMeta": null
        }))
        .unwrap();
        assert!(service.node_meta.is_empty());
        assert!(service.service_tags.is_empty());
        assert!(service.service_meta.is_empty());

        let node: NodeServices = serde_json::from_value(json!({
            "Node": {"Node": "ext-db", "TaggedAddresses": null, "Meta": null},
            "Services": null
        }))
        .unwrap();
        assert_eq!(node.node.node, "ext-db");
        assert!(node.services.is_empty());
    }
}
