use log::{debug, error, info, warn};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::error::PollError;
use super::scheduler::{PollScheduler, TickEvent};
use super::state::{GatewayState, SchedulerState};
use crate::modem::ModemTransport;

#[derive(Debug, Error)]
pub enum PollerError {
    #[error("poller already running")]
    AlreadyRunning,
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Owns the background task that drives a [`PollScheduler`].
pub struct Poller {
    gateway: GatewayState,
    worker: Option<WorkerHandle>,
}

impl Poller {
    pub fn new(gateway: GatewayState) -> Self {
        Self {
            gateway,
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn start<T>(
        &mut self,
        scheduler: PollScheduler<T>,
        tick_interval: Duration,
    ) -> Result<(), PollerError>
    where
        T: ModemTransport + 'static,
    {
        if self.worker.is_some() {
            return Err(PollerError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_poll_loop(scheduler, tick_interval, stop_rx));
        self.worker = Some(WorkerHandle { stop_tx, join });
        info!("Poller started, ticking every {:?}", tick_interval);
        Ok(())
    }

    pub async fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
            info!("Poller stopped");
        }
        self.gateway.publish(SchedulerState::Idle, 0);
    }
}

async fn run_poll_loop<T: ModemTransport>(
    mut scheduler: PollScheduler<T>,
    tick_interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        let outcome = tokio::select! {
            outcome = scheduler.tick() => outcome,
            _ = &mut stop_rx => return,
        };
        report(outcome);

        let should_stop = tokio::select! {
            _ = sleep(tick_interval) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            return;
        }
    }
}

fn report(outcome: Result<TickEvent, PollError>) {
    match outcome {
        Ok(TickEvent::ModemReady) => info!("Modem ready"),
        Ok(TickEvent::RequestSent { device }) => debug!("Waiting for {}", device),
        Ok(TickEvent::Waiting { notifications }) => {
            debug!("Waiting for reply ({} of 2 parts)", notifications)
        }
        Ok(TickEvent::Reported { device, created }) => {
            if created {
                info!("New device {} added to registry", device);
            }
        }
        Ok(TickEvent::Reset) => info!("Polling paused"),
        Ok(TickEvent::Paused) => {}
        Ok(TickEvent::NothingToPoll) => debug!("Roster is empty, nothing to poll"),
        Err(err @ PollError::ReplyTimeout { .. }) => warn!("{}", err),
        Err(err @ PollError::MalformedFragment(_)) => warn!("{}", err),
        Err(err) => error!("{}", err),
    }
}
