use tracing::{debug, info, warn};
use crate::{
    client::{Client, Error},
    model::{
        same_name, Change, ChangeAction, ChangeBatch, ChangeInfo, ChangeResourceRecordSets,
        ListResourceRecordSets, ListResourceRecordSetsOutput, RecordType, ResourceRecord,
        ResourceRecordSet,
    },
    paginate::Paginated,
    response::Response,
    transport::{Request, Transport},
};

/// Narrows a record set listing to one name and/or type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub name: Option<String>,
    pub rr_type: Option<RecordType>,
}

impl RecordFilter {
    pub fn new(name: impl Into<String>, rr_type: RecordType) -> Self {
        Self {
            name: Some(name.into()),
            rr_type: Some(rr_type),
        }
    }

    pub fn matches(&self, set: &ResourceRecordSet) -> bool {
        let name = self.name.as_deref().map_or(true, |n| same_name(n, &set.name));
        let rr_type = self.rr_type.as_ref().map_or(true, |t| t == &set.rr_type);
        name && rr_type
    }
}

impl Client {
    /// Lists the record sets of a zone.
    ///
    /// The filter's name and type become the listing's start position, so the
    /// server skips everything ordered before them; the result is then cut
    /// down to exact matches. With a name, paging stops at the first page
    /// that reaches another name. A type without a name cannot be a start
    /// position, so that listing walks the whole zone.
    #[tracing::instrument(skip(self))]
    pub async fn get_record_sets(&self, zone_id: &str, filter: RecordFilter) -> Result<Vec<ResourceRecordSet>, Error> {
        let listing = ListResourceRecordSets {
            hosted_zone_id: zone_id.to_owned(),
            // Route 53 rejects a start type without a start name.
            start_record_type: filter.name.as_ref().and(filter.rr_type.clone()),
            start_record_name: filter.name.clone(),
            start_record_identifier: None,
            max_items: self.page_size(),
        };

        let mut sets = match &filter.name {
            Some(name) => self.call_all(NamedRecordSets { listing, name: name.clone() }).await?,
            None => self.call_all(listing).await?,
        }.resource_record_sets;
        sets.retain(|s| filter.matches(s));

        info!("found {} record sets", sets.len());
        Ok(sets)
    }

    async fn find_record_set(&self, zone_id: &str, domain: &str, rr_type: &RecordType) -> Result<ResourceRecordSet, Error> {
        self.get_record_sets(zone_id, RecordFilter::new(domain, rr_type.clone()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::RecordSetNotFound {
                name: domain.to_owned(),
                rr_type: rr_type.clone(),
            })
    }

    /// Replaces a record set's values with `transform(current values)`.
    ///
    /// The old set is deleted and the new one created in two separate change
    /// requests, so this is not atomic: if the create fails, the record stays
    /// deleted. The create is never issued when the delete fails. See
    /// [`update_records_atomic`](Self::update_records_atomic) for a single
    /// batch variant.
    #[tracing::instrument(skip(self, transform))]
    pub async fn update_records<F>(&self, zone_id: &str, domain: &str, rr_type: RecordType, transform: F) -> Result<ChangeInfo, Error>
        where F: FnOnce(Vec<ResourceRecord>) -> Vec<ResourceRecord> {
        let old = self.find_record_set(zone_id, domain, &rr_type).await?;
        let new = transformed(&old, transform);

        self.call_once(ChangeResourceRecordSets {
            hosted_zone_id: zone_id.to_owned(),
            change_batch: ChangeBatch::single(ChangeAction::Delete, old),
        }).await?;

        let created = self.call_once(ChangeResourceRecordSets {
            hosted_zone_id: zone_id.to_owned(),
            change_batch: ChangeBatch::single(ChangeAction::Create, new),
        }).await;

        if let Err(e) = &created {
            warn!(error = %e, "record set was deleted but could not be recreated");
        }
        created
    }

    /// Like [`update_records`](Self::update_records), but submits the delete
    /// and the create as one change batch that the server applies entirely
    /// or not at all.
    #[tracing::instrument(skip(self, transform))]
    pub async fn update_records_atomic<F>(&self, zone_id: &str, domain: &str, rr_type: RecordType, transform: F) -> Result<ChangeInfo, Error>
        where F: FnOnce(Vec<ResourceRecord>) -> Vec<ResourceRecord> {
        let old = self.find_record_set(zone_id, domain, &rr_type).await?;
        let new = transformed(&old, transform);

        self.call_once(ChangeResourceRecordSets {
            hosted_zone_id: zone_id.to_owned(),
            change_batch: ChangeBatch {
                comment: None,
                changes: vec![
                    Change { action: ChangeAction::Delete, record_set: old },
                    Change { action: ChangeAction::Create, record_set: new },
                ],
            },
        }).await
    }
}

/// A record set listing that starts at `name` and ends once the listing moves
/// past it. Route 53 orders all sets of one name together.
#[derive(Debug, Clone)]
struct NamedRecordSets {
    listing: ListResourceRecordSets,
    name: String,
}

#[async_trait::async_trait]
impl Request for NamedRecordSets {
    type Output = ListResourceRecordSetsOutput;
    const OPERATION: &'static str = ListResourceRecordSets::OPERATION;

    async fn send(self, transport: &dyn Transport) -> Response<Self::Output> {
        self.listing.send(transport).await
    }
}

impl Paginated for NamedRecordSets {
    fn next_request(&self, response: &Response<ListResourceRecordSetsOutput>) -> Option<Self> {
        let output = response.value()?;
        if output.resource_record_sets.iter().any(|s| !same_name(&s.name, &self.name)) {
            debug!(name = %self.name, "listing moved past the requested name");
            return None;
        }

        Some(Self {
            listing: self.listing.next_request(response)?,
            name: self.name.clone(),
        })
    }
}

fn transformed<F>(set: &ResourceRecordSet, transform: F) -> ResourceRecordSet
    where F: FnOnce(Vec<ResourceRecord>) -> Vec<ResourceRecord> {
    ResourceRecordSet {
        records: transform(set.records.clone()),
        ..set.clone()
    }
}
