// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Transport for the gNMI RPCs

use async_trait::async_trait;
use std::time::Duration;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::AsciiMetadataValue;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
#[allow(unused)]
use tracing::{debug, error, info};

use crate::errors::GnmiError;
use crate::proto::{
    CAPABILITIES_METHOD, CapabilityRequest, CapabilityResponse, GET_METHOD, GetRequest,
    GetResponse, SET_METHOD, SetRequest, SetResponse,
};

/// The three RPCs needed to configure a device.
///
/// Implementations must not retry internally: failures are reported as the raw [`Status`]
/// and classified by the caller.
#[async_trait]
pub trait GnmiTransport: Send + Sync {
    async fn capabilities(&self, request: CapabilityRequest)
    -> Result<CapabilityResponse, Status>;
    async fn get(&self, request: GetRequest) -> Result<GetResponse, Status>;
    async fn set(&self, request: SetRequest) -> Result<SetResponse, Status>;
}

/// User credentials, sent as `username` / `password` metadata with every RPC.
#[derive(Clone)]
pub struct Credentials {
    username: AsciiMetadataValue,
    password: AsciiMetadataValue,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Result<Self, GnmiError> {
        let username = AsciiMetadataValue::try_from(username)
            .map_err(|_| GnmiError::Transport("username is not valid metadata".to_string()))?;
        let password = AsciiMetadataValue::try_from(password)
            .map_err(|_| GnmiError::Transport("password is not valid metadata".to_string()))?;
        Ok(Self { username, password })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// [`GnmiTransport`] over a tonic channel.
#[derive(Clone, Debug)]
pub struct GrpcTransport {
    grpc: tonic::client::Grpc<Channel>,
    credentials: Option<Credentials>,
    target: String,
}

impl GrpcTransport {
    /// Open a channel to `target` (e.g. `http://10.0.0.1:50051`). `timeout` bounds connection
    /// establishment and every subsequent RPC.
    pub async fn connect(
        target: &str,
        timeout: Duration,
        credentials: Option<Credentials>,
    ) -> Result<Self, GnmiError> {
        debug!("Connecting to gNMI target {target}...");
        let endpoint = Endpoint::from_shared(target.to_string())
            .map_err(|e| GnmiError::Transport(format!("bad target '{target}': {e}")))?
            .connect_timeout(timeout)
            .timeout(timeout);
        let channel = endpoint.connect().await.map_err(|e| {
            error!("Failed to connect to {target}: {e}");
            GnmiError::DeviceUnavailable(format!("{target}: {e}"))
        })?;
        info!("Connected to gNMI target {target}");
        Ok(Self {
            grpc: tonic::client::Grpc::new(channel),
            credentials,
            target: target.to_string(),
        })
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    async fn unary<Req, Resp>(&self, message: Req, method: &'static str) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.grpc.clone();
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("service was not ready: {e}")))?;

        let mut request = Request::new(message);
        if let Some(credentials) = &self.credentials {
            let metadata = request.metadata_mut();
            metadata.insert("username", credentials.username.clone());
            metadata.insert("password", credentials.password.clone());
        }
        let codec = tonic_prost::ProstCodec::default();
        let response = grpc
            .unary(request, PathAndQuery::from_static(method), codec)
            .await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl GnmiTransport for GrpcTransport {
    async fn capabilities(
        &self,
        request: CapabilityRequest,
    ) -> Result<CapabilityResponse, Status> {
        self.unary(request, CAPABILITIES_METHOD).await
    }
    async fn get(&self, request: GetRequest) -> Result<GetResponse, Status> {
        self.unary(request, GET_METHOD).await
    }
    async fn set(&self, request: SetRequest) -> Result<SetResponse, Status> {
        self.unary(request, SET_METHOD).await
    }
}

#[cfg(test)]
mod tests {
    use super::{Credentials, GrpcTransport};
    use crate::errors::GnmiError;
    use std::time::Duration;

    #[test]
    fn credentials_are_redacted() {
        let creds = Credentials::new("admin", "secret").unwrap();
        let shown = format!("{creds:?}");
        assert!(shown.contains("admin"));
        assert!(!shown.contains("secret"));
        assert!(Credentials::new("admin\n", "x").is_err());
    }

    #[tokio::test]
    async fn connect_rejects_bad_target() {
        let err = GrpcTransport::connect("not a uri", Duration::from_millis(10), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GnmiError::Transport(_)));
    }
}
