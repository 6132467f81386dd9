use std::{error::Error as StdError, sync::Arc};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_route53::{
    error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::RequestId,
    types as aws,
    Client,
};
use tracing::debug;
use super::{rate_limit::RateLimit, Connect, ConnectError, Request, Transport};
use crate::{
    model::{
        Change, ChangeAction, ChangeBatch, ChangeInfo, ChangeResourceRecordSets, ChangeStatus,
        GetChange, GetHostedZone, GetHostedZoneOutput, HostedZone, ListHostedZones,
        ListHostedZonesOutput, ListResourceRecordSets, ListResourceRecordSetsOutput, RecordType,
        ResourceRecord, ResourceRecordSet,
    },
    response::{ApiError, Metadata, Response},
};

/// Opens a fresh Route 53 client, with freshly resolved AWS config, per scope.
#[derive(Debug, Clone, Default)]
pub struct Route53Connector {
    region: Option<String>,
    endpoint_url: Option<String>,
    rate_limit: Option<Arc<RateLimit>>,
}

impl Route53Connector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn endpoint_url(mut self, url: Option<String>) -> Self {
        self.endpoint_url = url;
        self
    }

    pub fn rate_limit(mut self, limit: Option<Arc<RateLimit>>) -> Self {
        self.rate_limit = limit;
        self
    }

    pub async fn open(&self) -> Route53Transport {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(url) = &self.endpoint_url {
            loader = loader.endpoint_url(url.clone());
        }
        let sdk_config = loader.load().await;

        debug!(region = ?sdk_config.region(), "opened route53 client");

        Route53Transport::new(Client::new(&sdk_config))
            .with_rate_limit(self.rate_limit.clone())
    }
}

#[async_trait::async_trait]
impl Connect for Route53Connector {
    async fn connect(&self) -> Result<Arc<dyn Transport>, ConnectError> {
        Ok(Arc::new(self.open().await))
    }
}

#[derive(Debug, Clone)]
pub struct Route53Transport {
    client: Client,
    rate_limit: Option<Arc<RateLimit>>,
}

impl Route53Transport {
    pub fn new(client: Client) -> Self {
        Self { client, rate_limit: None }
    }

    pub fn with_rate_limit(mut self, limit: Option<Arc<RateLimit>>) -> Self {
        self.rate_limit = limit;
        self
    }

    async fn throttle(&self) {
        if let Some(limit) = &self.rate_limit {
            limit.ready().await;
        }
    }
}

#[async_trait::async_trait]
impl Transport for Route53Transport {
    async fn list_hosted_zones(&self, request: ListHostedZones) -> Response<ListHostedZonesOutput> {
        self.throttle().await;
        let result = self.client.list_hosted_zones()
            .set_marker(request.marker)
            .set_max_items(request.max_items)
            .set_delegation_set_id(request.delegation_set_id)
            .send()
            .await;

        respond::<ListHostedZones, _, _, _>(result, |out| {
            let request_id = out.request_id().map(ToOwned::to_owned);
            let output = ListHostedZonesOutput {
                hosted_zones: out.hosted_zones.into_iter().map(hosted_zone).collect(),
                is_truncated: out.is_truncated,
                next_marker: out.next_marker,
                max_items: Some(out.max_items),
            };
            (request_id, Ok(output))
        })
    }

    async fn get_hosted_zone(&self, request: GetHostedZone) -> Response<GetHostedZoneOutput> {
        self.throttle().await;
        let result = self.client.get_hosted_zone()
            .id(request.id)
            .send()
            .await;

        respond::<GetHostedZone, _, _, _>(result, |out| {
            let request_id = out.request_id().map(ToOwned::to_owned);
            let name_servers = out.delegation_set()
                .map(|d| d.name_servers().to_vec())
                .unwrap_or_default();
            let output = match out.hosted_zone {
                Some(zone) => Ok(GetHostedZoneOutput {
                    hosted_zone: hosted_zone(zone),
                    name_servers,
                }),
                None => Err(ApiError::missing_field("HostedZone")),
            };
            (request_id, output)
        })
    }

    async fn list_resource_record_sets(&self, request: ListResourceRecordSets) -> Response<ListResourceRecordSetsOutput> {
        self.throttle().await;
        let result = self.client.list_resource_record_sets()
            .hosted_zone_id(request.hosted_zone_id)
            .set_start_record_name(request.start_record_name)
            .set_start_record_type(request.start_record_type.map(|t| aws::RrType::from(t.as_str())))
            .set_start_record_identifier(request.start_record_identifier)
            .set_max_items(request.max_items)
            .send()
            .await;

        respond::<ListResourceRecordSets, _, _, _>(result, |out| {
            let request_id = out.request_id().map(ToOwned::to_owned);
            let output = ListResourceRecordSetsOutput {
                resource_record_sets: out.resource_record_sets.iter().map(record_set).collect(),
                is_truncated: out.is_truncated,
                next_record_name: out.next_record_name,
                next_record_type: out.next_record_type.map(|t| RecordType::from(t.as_str())),
                next_record_identifier: out.next_record_identifier,
                max_items: Some(out.max_items),
            };
            (request_id, Ok(output))
        })
    }

    async fn change_resource_record_sets(&self, request: ChangeResourceRecordSets) -> Response<ChangeInfo> {
        let batch = match change_batch(request.change_batch) {
            Ok(batch) => batch,
            Err(e) => {
                return Response::fail(
                    Metadata::single(ChangeResourceRecordSets::OPERATION, None),
                    ApiError::with_code("InvalidChangeBatch", e.to_string()),
                );
            }
        };

        self.throttle().await;
        let result = self.client.change_resource_record_sets()
            .hosted_zone_id(request.hosted_zone_id)
            .change_batch(batch)
            .send()
            .await;

        respond::<ChangeResourceRecordSets, _, _, _>(result, |out| {
            let request_id = out.request_id().map(ToOwned::to_owned);
            (request_id, change_info(out.change_info))
        })
    }

    async fn get_change(&self, request: GetChange) -> Response<ChangeInfo> {
        self.throttle().await;
        let result = self.client.get_change()
            .id(request.id)
            .send()
            .await;

        respond::<GetChange, _, _, _>(result, |out| {
            let request_id = out.request_id().map(ToOwned::to_owned);
            (request_id, change_info(out.change_info))
        })
    }
}

/// Wraps an SDK result into a single-request [`Response`].
fn respond<R, O, E, F>(result: Result<O, SdkError<E>>, convert: F) -> Response<R::Output>
    where
        R: Request,
        E: ProvideErrorMetadata + StdError + 'static,
        F: FnOnce(O) -> (Option<String>, Result<R::Output, ApiError>),
{
    match result {
        Ok(out) => {
            let (request_id, outcome) = convert(out);
            Response {
                metadata: Metadata::single(R::OPERATION, request_id),
                outcome,
            }
        }
        Err(e) => {
            let code = e.as_service_error()
                .and_then(|s| s.code())
                .map(ToOwned::to_owned);
            let error = ApiError {
                code,
                message: DisplayErrorContext(&e).to_string(),
            };
            debug!(operation = R::OPERATION, error = %error.message, "route53 request failed");
            Response::fail(Metadata::single(R::OPERATION, None), error)
        }
    }
}

fn hosted_zone(zone: aws::HostedZone) -> HostedZone {
    let (comment, private_zone) = match zone.config {
        Some(config) => (config.comment, config.private_zone),
        None => (None, false),
    };

    HostedZone {
        id: zone.id,
        name: zone.name,
        caller_reference: zone.caller_reference,
        comment,
        private_zone,
        record_set_count: zone.resource_record_set_count,
    }
}

fn record_set(set: &aws::ResourceRecordSet) -> ResourceRecordSet {
    ResourceRecordSet {
        name: set.name().to_owned(),
        rr_type: RecordType::from(set.r#type().as_str()),
        set_identifier: set.set_identifier().map(ToOwned::to_owned),
        ttl: set.ttl(),
        records: set.resource_records()
            .iter()
            .map(|r| ResourceRecord::new(r.value()))
            .collect(),
    }
}

fn change_info(info: Option<aws::ChangeInfo>) -> Result<ChangeInfo, ApiError> {
    let info = info.ok_or_else(|| ApiError::missing_field("ChangeInfo"))?;

    Ok(ChangeInfo {
        status: ChangeStatus::from(info.status.as_str()),
        submitted_at: Some(info.submitted_at.secs()),
        id: info.id,
        comment: info.comment,
    })
}

fn change_batch(batch: ChangeBatch) -> Result<aws::ChangeBatch, BuildError> {
    let changes = batch.changes
        .into_iter()
        .map(change)
        .collect::<Result<Vec<_>, _>>()?;

    aws::ChangeBatch::builder()
        .set_comment(batch.comment)
        .set_changes(Some(changes))
        .build()
}

fn change(change: Change) -> Result<aws::Change, BuildError> {
    let action = match change.action {
        ChangeAction::Create => aws::ChangeAction::Create,
        ChangeAction::Delete => aws::ChangeAction::Delete,
        ChangeAction::Upsert => aws::ChangeAction::Upsert,
    };
    let set = change.record_set;
    let records = set.records
        .into_iter()
        .map(|r| aws::ResourceRecord::builder().value(r.value).build())
        .collect::<Result<Vec<_>, _>>()?;

    aws::Change::builder()
        .action(action)
        .resource_record_set(aws::ResourceRecordSet::builder()
            .name(set.name)
            .r#type(aws::RrType::from(set.rr_type.as_str()))
            .set_set_identifier(set.set_identifier)
            .set_ttl(set.ttl)
            .set_resource_records(Some(records))
            .build()?)
        .build()
}
