//! The subset of the Route 53 API shapes this crate works with.

use std::fmt::{Display, Formatter};
use tracing::warn;
use crate::{
    combine::Combine,
    paginate::Paginated,
    response::Response,
    transport::{Request, Transport},
};

const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    pub id: String,
    pub name: String,
    pub caller_reference: String,
    pub comment: Option<String>,
    pub private_zone: bool,
    pub record_set_count: Option<i64>,
}

impl HostedZone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            caller_reference: String::new(),
            comment: None,
            private_zone: false,
            record_set_count: None,
        }
    }

    /// Zone name without the trailing dot.
    pub fn domain(&self) -> &str {
        trim_dot(&self.name)
    }

    /// Zone id without the `/hostedzone/` prefix.
    pub fn short_id(&self) -> &str {
        self.id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(&self.id)
    }

    pub fn matches_domain(&self, domain: &str) -> bool {
        self.domain().eq_ignore_ascii_case(trim_dot(domain))
    }
}

fn trim_dot(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Compares two DNS names ignoring case and a trailing dot.
pub fn same_name(a: &str, b: &str) -> bool {
    trim_dot(a).eq_ignore_ascii_case(trim_dot(b))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Caa,
    Cname,
    Ds,
    Mx,
    Naptr,
    Ns,
    Ptr,
    Soa,
    Spf,
    Srv,
    Txt,
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Ds => "DS",
            RecordType::Mx => "MX",
            RecordType::Naptr => "NAPTR",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Spf => "SPF",
            RecordType::Srv => "SRV",
            RecordType::Txt => "TXT",
            RecordType::Other(s) => s,
        }
    }
}

impl From<&str> for RecordType {
    fn from(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "CAA" => RecordType::Caa,
            "CNAME" => RecordType::Cname,
            "DS" => RecordType::Ds,
            "MX" => RecordType::Mx,
            "NAPTR" => RecordType::Naptr,
            "NS" => RecordType::Ns,
            "PTR" => RecordType::Ptr,
            "SOA" => RecordType::Soa,
            "SPF" => RecordType::Spf,
            "SRV" => RecordType::Srv,
            "TXT" => RecordType::Txt,
            other => RecordType::Other(other.to_owned()),
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub value: String,
}

impl ResourceRecord {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecordSet {
    pub name: String,
    pub rr_type: RecordType,
    pub set_identifier: Option<String>,
    pub ttl: Option<i64>,
    pub records: Vec<ResourceRecord>,
}

impl ResourceRecordSet {
    pub fn new(name: impl Into<String>, rr_type: RecordType) -> Self {
        Self {
            name: name.into(),
            rr_type,
            set_identifier: None,
            ttl: None,
            records: Vec::new(),
        }
    }

    pub fn with_records<I, S>(mut self, values: I) -> Self
        where I: IntoIterator<Item=S>, S: Into<String> {
        self.records = values.into_iter().map(ResourceRecord::new).collect();
        self
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Create,
    Delete,
    Upsert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: ChangeAction,
    pub record_set: ResourceRecordSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub comment: Option<String>,
    pub changes: Vec<Change>,
}

impl ChangeBatch {
    pub fn single(action: ChangeAction, record_set: ResourceRecordSet) -> Self {
        Self {
            comment: None,
            changes: vec![Change { action, record_set }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeStatus {
    Pending,
    InSync,
    Unknown(String),
}

impl From<&str> for ChangeStatus {
    fn from(s: &str) -> Self {
        match s {
            "PENDING" => ChangeStatus::Pending,
            "INSYNC" => ChangeStatus::InSync,
            other => ChangeStatus::Unknown(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeInfo {
    pub id: String,
    pub status: ChangeStatus,
    /// Seconds since the Unix epoch.
    pub submitted_at: Option<i64>,
    pub comment: Option<String>,
}

// Requests

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListHostedZones {
    pub marker: Option<String>,
    pub max_items: Option<i32>,
    pub delegation_set_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListHostedZonesOutput {
    pub hosted_zones: Vec<HostedZone>,
    pub is_truncated: bool,
    pub next_marker: Option<String>,
    pub max_items: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetHostedZone {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetHostedZoneOutput {
    pub hosted_zone: HostedZone,
    pub name_servers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResourceRecordSets {
    pub hosted_zone_id: String,
    pub start_record_name: Option<String>,
    pub start_record_type: Option<RecordType>,
    pub start_record_identifier: Option<String>,
    pub max_items: Option<i32>,
}

impl ListResourceRecordSets {
    pub fn new(hosted_zone_id: impl Into<String>) -> Self {
        Self {
            hosted_zone_id: hosted_zone_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResourceRecordSetsOutput {
    pub resource_record_sets: Vec<ResourceRecordSet>,
    pub is_truncated: bool,
    pub next_record_name: Option<String>,
    pub next_record_type: Option<RecordType>,
    pub next_record_identifier: Option<String>,
    pub max_items: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeResourceRecordSets {
    pub hosted_zone_id: String,
    pub change_batch: ChangeBatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetChange {
    pub id: String,
}

// Merging pages

impl Combine for ListHostedZonesOutput {
    fn combine(self, later: Self) -> Self {
        Self {
            hosted_zones: self.hosted_zones.combine(later.hosted_zones),
            is_truncated: later.is_truncated,
            next_marker: later.next_marker,
            max_items: later.max_items,
        }
    }
}

impl Combine for ListResourceRecordSetsOutput {
    fn combine(self, later: Self) -> Self {
        Self {
            resource_record_sets: self.resource_record_sets.combine(later.resource_record_sets),
            is_truncated: later.is_truncated,
            next_record_name: later.next_record_name,
            next_record_type: later.next_record_type,
            next_record_identifier: later.next_record_identifier,
            max_items: later.max_items,
        }
    }
}

// Following pages

impl Paginated for ListHostedZones {
    fn next_request(&self, response: &Response<ListHostedZonesOutput>) -> Option<Self> {
        let output = response.value()?;
        let marker = output.next_marker.clone()?;

        Some(Self {
            marker: Some(marker),
            max_items: self.max_items,
            delegation_set_id: self.delegation_set_id.clone(),
        })
    }
}

impl Paginated for ListResourceRecordSets {
    fn next_request(&self, response: &Response<ListResourceRecordSetsOutput>) -> Option<Self> {
        let output = response.value()?;
        if !output.is_truncated {
            return None;
        }

        let Some(name) = output.next_record_name.clone() else {
            warn!(zone = %self.hosted_zone_id, "truncated record set page without a next record name");
            return None;
        };

        Some(Self {
            hosted_zone_id: self.hosted_zone_id.clone(),
            start_record_name: Some(name),
            start_record_type: output.next_record_type.clone(),
            start_record_identifier: output.next_record_identifier.clone(),
            max_items: output.max_items.or(self.max_items),
        })
    }
}

// Dispatch

#[async_trait::async_trait]
impl Request for ListHostedZones {
    type Output = ListHostedZonesOutput;
    const OPERATION: &'static str = "ListHostedZones";

    async fn send(self, transport: &dyn Transport) -> Response<Self::Output> {
        transport.list_hosted_zones(self).await
    }
}

#[async_trait::async_trait]
impl Request for GetHostedZone {
    type Output = GetHostedZoneOutput;
    const OPERATION: &'static str = "GetHostedZone";

    async fn send(self, transport: &dyn Transport) -> Response<Self::Output> {
        transport.get_hosted_zone(self).await
    }
}

#[async_trait::async_trait]
impl Request for ListResourceRecordSets {
    type Output = ListResourceRecordSetsOutput;
    const OPERATION: &'static str = "ListResourceRecordSets";

    async fn send(self, transport: &dyn Transport) -> Response<Self::Output> {
        transport.list_resource_record_sets(self).await
    }
}

#[async_trait::async_trait]
impl Request for ChangeResourceRecordSets {
    type Output = ChangeInfo;
    const OPERATION: &'static str = "ChangeResourceRecordSets";

    async fn send(self, transport: &dyn Transport) -> Response<Self::Output> {
        transport.change_resource_record_sets(self).await
    }
}

#[async_trait::async_trait]
impl Request for GetChange {
    type Output = ChangeInfo;
    const OPERATION: &'static str = "GetChange";

    async fn send(self, transport: &dyn Transport) -> Response<Self::Output> {
        transport.get_change(self).await
    }
}
