use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};
use crate::{
    combine::Combine,
    model::RecordType,
    paginate::{run_all, Paginated},
    response::{ApiError, Response},
    transport::{Connect, ConnectError, Request, Transport},
};

/// Entry point for the DNS workflows.
///
/// Every top-level call opens its own transport scope through the
/// [`Connect`] it was built with and releases it before returning, however
/// many pages were fetched. To reuse one transport across calls, build the
/// client from a [`SharedTransport`](crate::transport::SharedTransport).
#[derive(Clone)]
pub struct Client {
    connector: Arc<dyn Connect>,
    page_size: Option<i32>,
}

impl Client {
    pub fn new<C: Connect + 'static>(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            page_size: None,
        }
    }

    /// Page size requested from listing endpoints. The server default applies when unset.
    pub fn page_size(&self) -> Option<i32> {
        self.page_size
    }

    pub fn page_size_mut(&mut self) -> &mut Option<i32> {
        &mut self.page_size
    }

    async fn scope(&self) -> Result<Scope, Error> {
        let transport = self.connector.connect().await?;
        trace!("opened transport scope");
        Ok(Scope { transport })
    }

    /// Issues exactly one request and unwraps its outcome.
    pub async fn call_once<R: Request>(&self, request: R) -> Result<R::Output, Error> {
        let scope = self.scope().await?;
        let response = request.send(scope.transport()).await;

        Ok(response.into_result()?)
    }

    /// Follows `request` through every page and unwraps the merged outcome.
    pub async fn call_all<R>(&self, request: R) -> Result<R::Output, Error>
        where R: Paginated, R::Output: Combine {
        Ok(self.send_all(request).await?.into_result()?)
    }

    /// Like [`call_all`](Self::call_all), but keeps the merged response and its metadata.
    pub async fn send_all<R>(&self, request: R) -> Result<Response<R::Output>, Error>
        where R: Paginated, R::Output: Combine {
        let scope = self.scope().await?;
        let response = run_all(scope.transport(), request).await;

        debug!(operation = R::OPERATION, pages = response.pages(), ok = response.is_ok(), "pagination finished");
        Ok(response)
    }
}

/// A transport held for the duration of one top-level call.
struct Scope {
    transport: Arc<dyn Transport>,
}

impl Scope {
    fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        trace!("released transport scope");
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error("no hosted zone found for domain {0}")]
    ZoneNotFound(String),
    #[error("no {rr_type} record set named {name}")]
    RecordSetNotFound {
        name: String,
        rr_type: RecordType,
    },
    #[error("change {0} was not in sync before the timeout")]
    ChangeTimeout(String),
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use mockall::predicate::eq;
    use super::*;
    use crate::{
        model::{GetChange, ChangeInfo, ChangeStatus, HostedZone, ListHostedZones, ListHostedZonesOutput},
        response::Metadata,
        transport::{MockTransport, SharedTransport},
    };

    fn zones(ids: &[&str], next_marker: Option<&str>) -> Response<ListHostedZonesOutput> {
        Response::ok(Metadata::single(ListHostedZones::OPERATION, None), ListHostedZonesOutput {
            hosted_zones: ids.iter().map(|id| HostedZone::new(*id, "example.com.")).collect(),
            is_truncated: next_marker.is_some(),
            next_marker: next_marker.map(ToOwned::to_owned),
            max_items: None,
        })
    }

    fn client(mock: MockTransport) -> Client {
        Client::new(SharedTransport::new(Arc::new(mock)))
    }

    /// Counts open scopes so tests can check they are released.
    struct CountingConnector {
        transport: Arc<dyn Transport>,
        opened: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Connect for Arc<CountingConnector> {
        async fn connect(&self) -> Result<Arc<dyn Transport>, ConnectError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::clone(&self.transport))
        }
    }

    struct FailingConnector;

    #[async_trait::async_trait]
    impl Connect for FailingConnector {
        async fn connect(&self) -> Result<Arc<dyn Transport>, ConnectError> {
            Err(ConnectError("no credentials".to_owned()))
        }
    }

    #[tokio::test]
    async fn call_once_returns_payload() {
        let mut mock = MockTransport::new();
        mock.expect_get_change()
            .with(eq(GetChange { id: "C1".to_owned() }))
            .times(1)
            .returning(|_| Response::ok(Metadata::single("GetChange", None), ChangeInfo {
                id: "C1".to_owned(),
                status: ChangeStatus::InSync,
                submitted_at: None,
                comment: None,
            }));

        let info = client(mock).call_once(GetChange { id: "C1".to_owned() }).await.unwrap();
        assert_eq!(info.status, ChangeStatus::InSync);
    }

    #[tokio::test]
    async fn call_once_propagates_failure() {
        let mut mock = MockTransport::new();
        mock.expect_get_change()
            .times(1)
            .returning(|_| Response::fail(Metadata::single("GetChange", None), ApiError::new("NoSuchChange")));

        let err = client(mock).call_once(GetChange { id: "C1".to_owned() }).await.unwrap_err();
        assert!(matches!(err, Error::Api(e) if e.message == "NoSuchChange"));
    }

    #[tokio::test]
    async fn call_all_uses_one_scope_for_every_page() {
        let mut mock = MockTransport::new();
        mock.expect_list_hosted_zones()
            .withf(|r| r.marker.is_none())
            .times(1)
            .returning(|_| zones(&["Z1"], Some("t1")));
        mock.expect_list_hosted_zones()
            .withf(|r| r.marker.as_deref() == Some("t1"))
            .times(1)
            .returning(|_| zones(&["Z2"], None));

        let transport: Arc<dyn Transport> = Arc::new(mock);
        let connector = Arc::new(CountingConnector {
            transport: Arc::clone(&transport),
            opened: AtomicUsize::new(0),
        });
        let client = Client::new(Arc::clone(&connector));

        let output = client.call_all(ListHostedZones::default()).await.unwrap();
        let ids: Vec<_> = output.hosted_zones.iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, ["Z1", "Z2"]);

        assert_eq!(connector.opened.load(Ordering::SeqCst), 1);
        // Only the test and the connector still hold the transport.
        assert_eq!(Arc::strong_count(&transport), 2);
    }

    #[tokio::test]
    async fn send_all_keeps_metadata() {
        let mut mock = MockTransport::new();
        mock.expect_list_hosted_zones()
            .withf(|r| r.marker.is_none())
            .returning(|_| zones(&["Z1"], Some("t1")));
        mock.expect_list_hosted_zones()
            .withf(|r| r.marker.as_deref() == Some("t1"))
            .returning(|_| Response::fail(Metadata::single(ListHostedZones::OPERATION, None), ApiError::new("Throttled")));

        let response = client(mock).send_all(ListHostedZones::default()).await.unwrap();
        assert_eq!(response.pages(), 2);
        assert_eq!(response.outcome, Err(ApiError::new("Throttled")));
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        let client = Client::new(FailingConnector);

        let err = client.call_all(ListHostedZones::default()).await.unwrap_err();
        assert!(matches!(err, Error::Connect(_)));
        assert_eq!(err.to_string(), "failed to open transport: no credentials");
    }
}
