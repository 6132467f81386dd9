use tracing::{debug, info};
use crate::{
    client::{Client, Error},
    model::{GetHostedZone, GetHostedZoneOutput, HostedZone, ListHostedZones},
};

impl Client {
    /// Lists every hosted zone in the account, following all pages.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_zones(&self) -> Result<Vec<HostedZone>, Error> {
        let request = ListHostedZones {
            max_items: self.page_size(),
            ..Default::default()
        };
        let zones = self.call_all(request).await?.hosted_zones;

        info!("found {} hosted zones", zones.len());
        Ok(zones)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_zone_by_id(&self, id: &str) -> Result<HostedZone, Error> {
        Ok(self.get_zone_details(id).await?.hosted_zone)
    }

    /// The zone together with its delegated name servers.
    #[tracing::instrument(skip(self))]
    pub async fn get_zone_details(&self, id: &str) -> Result<GetHostedZoneOutput, Error> {
        self.call_once(GetHostedZone { id: id.to_owned() }).await
    }

    /// Finds the zone serving exactly `domain`, ignoring case and a trailing dot.
    #[tracing::instrument(skip(self))]
    pub async fn get_zone_by_name(&self, domain: &str) -> Result<HostedZone, Error> {
        let zone = self.get_all_zones()
            .await?
            .into_iter()
            .find(|z| z.matches_domain(domain))
            .ok_or_else(|| Error::ZoneNotFound(domain.to_owned()))?;

        debug!(id = %zone.id, "matched zone");
        Ok(zone)
    }
}
