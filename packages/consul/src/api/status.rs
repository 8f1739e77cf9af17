use consul_http::Method;

use crate::call::ApiCall;
use crate::client::Consul;
use crate::decode;
use crate::dispatch::Dispatch;

/// The `/v1/status` endpoints: raft leader and peers.
pub struct Status<'a, D> {
    consul: &'a Consul<D>,
}

impl<'a, D: Dispatch> Status<'a, D> {
    pub(crate) fn new(consul: &'a Consul<D>) -> Self {
        Self { consul }
    }

    /// Address of the raft leader, empty while there is none.
    pub fn leader(&self) -> D::Output<String> {
        let request = self.consul.request(Method::GET, "/v1/status/leader", None);
        self.consul
            .dispatch(ApiCall::new(request, decode::json::<String>))
    }

    pub fn peers(&self) -> D::Output<Vec<String>> {
        let request = self.consul.request(Method::GET, "/v1/status/peers", None);
        self.consul
            .dispatch(ApiCall::new(request, decode::json::<Vec<String>>))
    }
}
