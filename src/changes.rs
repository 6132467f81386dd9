use std::time::Duration;
use tokio::{time, time::MissedTickBehavior};
use tracing::{debug, error};
use crate::{
    client::{Client, Error},
    model::{ChangeInfo, ChangeStatus, GetChange},
};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl Client {
    #[tracing::instrument(skip(self))]
    pub async fn get_change(&self, id: &str) -> Result<ChangeInfo, Error> {
        self.call_once(GetChange { id: id.to_owned() }).await
    }

    /// Polls a change until the server reports it as `INSYNC`.
    ///
    /// Every poll is its own top-level call. Intervals shorter than 100ms are
    /// raised to 100ms. Fails with [`Error::ChangeTimeout`] once `timeout`
    /// elapses.
    #[tracing::instrument(skip(self))]
    pub async fn wait_for_change(&self, id: &str, poll_interval: Duration, timeout: Duration) -> Result<ChangeInfo, Error> {
        match time::timeout(timeout, self.poll_change(id, poll_interval)).await {
            Ok(res) => res,
            Err(_) => {
                error!("timed out waiting for change");
                Err(Error::ChangeTimeout(id.to_owned()))
            }
        }
    }

    async fn poll_change(&self, id: &str, poll_interval: Duration) -> Result<ChangeInfo, Error> {
        let mut interval = time::interval(poll_interval.max(MIN_POLL_INTERVAL));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let info = self.get_change(id).await?;
            if info.status == ChangeStatus::InSync {
                return Ok(info);
            }
            debug!(status = ?info.status, "change not yet in sync");
        }
    }
}
