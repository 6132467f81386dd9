#[cfg(feature = "aws")]
pub mod route53;
pub mod rate_limit;

use std::{fmt::Debug, sync::Arc};
use thiserror::Error;
use crate::{
    model::{
        ChangeInfo, ChangeResourceRecordSets, GetChange, GetHostedZone, GetHostedZoneOutput,
        ListHostedZones, ListHostedZonesOutput, ListResourceRecordSets, ListResourceRecordSetsOutput,
    },
    response::Response,
};

/// Executes requests against the remote DNS API.
///
/// Implementations never fail out of band: every outcome, including
/// transport errors, is reported inside the returned [`Response`].
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn list_hosted_zones(&self, request: ListHostedZones) -> Response<ListHostedZonesOutput>;
    async fn get_hosted_zone(&self, request: GetHostedZone) -> Response<GetHostedZoneOutput>;
    async fn list_resource_record_sets(&self, request: ListResourceRecordSets) -> Response<ListResourceRecordSetsOutput>;
    async fn change_resource_record_sets(&self, request: ChangeResourceRecordSets) -> Response<ChangeInfo>;
    async fn get_change(&self, request: GetChange) -> Response<ChangeInfo>;
}

/// A request that knows which transport operation serves it.
#[async_trait::async_trait]
pub trait Request: Debug + Clone + Send + Sync + 'static {
    type Output: Send;

    const OPERATION: &'static str;

    async fn send(self, transport: &dyn Transport) -> Response<Self::Output>;
}

/// Opens a transport scope for one top-level call.
#[async_trait::async_trait]
pub trait Connect: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Transport>, ConnectError>;
}

#[derive(Debug, Error)]
#[error("failed to open transport: {0}")]
pub struct ConnectError(pub String);

/// Hands the same transport to every call instead of opening a new one.
#[derive(Clone)]
pub struct SharedTransport {
    transport: Arc<dyn Transport>,
}

impl SharedTransport {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl Connect for SharedTransport {
    async fn connect(&self) -> Result<Arc<dyn Transport>, ConnectError> {
        Ok(Arc::clone(&self.transport))
    }
}
