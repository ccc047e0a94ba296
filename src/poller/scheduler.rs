use log::{debug, info, warn};
use std::time::Duration;

use super::error::PollError;
use super::state::{GatewayState, SchedulerState};
use crate::modem::{self, at, CommandDriver, ModemState, ModemTransport};
use crate::reassembly::MessageReassembler;
use crate::registry::Upsert;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Wait after `AT+CMGS` and after the message terminator.
    pub request_settle: Duration,
    /// Consecutive empty reads before a device is given up on.
    pub poll_timeout_ticks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickEvent {
    ModemReady,
    RequestSent { device: String },
    Waiting { notifications: u8 },
    Reported { device: String, created: bool },
    Reset,
    /// Polling disabled, nothing to do.
    Paused,
    /// Polling enabled but the roster is empty.
    NothingToPoll,
}

/// The polling control loop, one tick at a time.
///
/// Owns the modem driver exclusively; everything the HTTP side can see goes
/// through [`GatewayState`].
pub struct PollScheduler<T> {
    driver: CommandDriver<T>,
    gateway: GatewayState,
    roster: Vec<String>,
    config: SchedulerConfig,
    state: SchedulerState,
    cursor: usize,
    empty_reads: u32,
    reassembler: MessageReassembler,
}

impl<T: ModemTransport> PollScheduler<T> {
    pub fn new(driver: CommandDriver<T>, gateway: GatewayState, config: SchedulerConfig) -> Self {
        let roster = gateway.roster();
        Self {
            driver,
            gateway,
            roster,
            config,
            state: SchedulerState::Idle,
            cursor: 0,
            empty_reads: 0,
            reassembler: MessageReassembler::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub async fn tick(&mut self) -> Result<TickEvent, PollError> {
        let result = self.step().await;
        if result.is_err() && self.state == SchedulerState::SendingRequest {
            // The request may not have gone out; try again next tick.
            self.state = SchedulerState::Ready;
        }
        self.gateway.publish(self.state, self.cursor);
        result
    }

    async fn step(&mut self) -> Result<TickEvent, PollError> {
        match self.state {
            SchedulerState::Idle => {
                self.state = SchedulerState::AwaitingInit;
                self.initialize().await
            }
            SchedulerState::AwaitingInit => self.initialize().await,
            SchedulerState::Ready | SchedulerState::Resetting => self.dispatch().await,
            SchedulerState::SendingRequest => self.send_request().await,
            SchedulerState::AwaitingReply => self.await_reply().await,
        }
    }

    async fn initialize(&mut self) -> Result<TickEvent, PollError> {
        match modem::initialize(&mut self.driver).await? {
            ModemState::Ready => {
                self.state = SchedulerState::Ready;
                Ok(TickEvent::ModemReady)
            }
            ModemState::Unreachable => Err(PollError::ModemUnreachable),
        }
    }

    async fn dispatch(&mut self) -> Result<TickEvent, PollError> {
        if !self.gateway.read_poll_state() {
            return match self.state {
                SchedulerState::Resetting => Ok(TickEvent::Paused),
                _ => self.reset().await,
            };
        }

        if self.state == SchedulerState::Resetting {
            info!("Polling resumed");
            self.state = SchedulerState::Ready;
        }
        if self.roster.is_empty() {
            return Ok(TickEvent::NothingToPoll);
        }
        self.state = SchedulerState::SendingRequest;
        self.send_request().await
    }

    async fn reset(&mut self) -> Result<TickEvent, PollError> {
        self.state = SchedulerState::Resetting;
        self.cursor = 0;
        self.empty_reads = 0;
        self.reassembler.reset();
        self.gateway.reset_registry();
        info!("Polling disabled, registry cleared");

        self.purge().await?;
        Ok(TickEvent::Reset)
    }

    async fn send_request(&mut self) -> Result<TickEvent, PollError> {
        let device = self.roster[self.cursor].clone();
        info!(
            "Requesting location from {} ({}/{})",
            device,
            self.cursor + 1,
            self.roster.len()
        );

        self.driver.write_raw(&at::send_message(&device))?;
        self.driver.wait(self.config.request_settle).await;
        self.driver.flush()?;
        self.driver.settle().await;
        self.driver.write_raw(at::LOCATION_REQUEST)?;
        self.driver.settle().await;
        self.driver.write_raw(&[at::CTRL_Z])?;
        self.driver.wait(self.config.request_settle).await;
        self.driver.flush()?;

        self.state = SchedulerState::AwaitingReply;
        self.empty_reads = 0;
        Ok(TickEvent::RequestSent { device })
    }

    async fn await_reply(&mut self) -> Result<TickEvent, PollError> {
        // A cycle interrupted by a transport fault is retried without
        // waiting for new notifications.
        if self.reassembler.is_complete() {
            return self.complete_cycle().await;
        }

        let reply = self.driver.read_available()?;
        if !reply.is_empty() {
            self.empty_reads = 0;
            if self.reassembler.observe(&reply.raw) {
                return self.complete_cycle().await;
            }
            return Ok(TickEvent::Waiting {
                notifications: self.reassembler.notifications(),
            });
        }

        self.empty_reads += 1;
        if self.empty_reads >= self.config.poll_timeout_ticks {
            let device = self.roster[self.cursor].clone();
            let ticks = self.empty_reads;
            // A lone stored fragment would otherwise pair up with the next
            // device's reply.
            self.purge().await?;
            self.finish_cycle();
            return Err(PollError::ReplyTimeout { device, ticks });
        }

        Ok(TickEvent::Waiting {
            notifications: self.reassembler.notifications(),
        })
    }

    async fn complete_cycle(&mut self) -> Result<TickEvent, PollError> {
        let gateway = self.gateway.clone();
        let outcome = self
            .reassembler
            .collect(&mut self.driver, |id| gateway.is_known(id))
            .await;

        let result = match outcome {
            Ok(reassembled) => {
                let device = reassembled.record.device_id.clone();
                if !reassembled.known_sender {
                    warn!("{}", PollError::UnknownDevice(device.clone()));
                }
                let upsert = self.gateway.record_report(reassembled.record);
                info!("Location updated for {}", device);
                Ok(TickEvent::Reported {
                    device,
                    created: upsert == Upsert::Created,
                })
            }
            Err(err) => match PollError::from(err) {
                fault @ PollError::TransportFault(_) => return Err(fault),
                other => {
                    debug!(
                        "Discarding report from {} (decoded: {})",
                        self.reassembler.sender().unwrap_or("unknown sender"),
                        self.reassembler.is_decoded()
                    );
                    Err(other)
                }
            },
        };

        self.purge().await?;
        self.finish_cycle();
        result
    }

    async fn purge(&mut self) -> Result<(), PollError> {
        let reply = self.driver.send(at::DELETE_ALL).await?;
        if !reply.is_acknowledged() {
            warn!("Message purge answered with {}", reply.class);
        }
        Ok(())
    }

    fn finish_cycle(&mut self) {
        if self.roster.len() > 1 {
            self.cursor = (self.cursor + 1) % self.roster.len();
        }
        self.reassembler.reset();
        self.empty_reads = 0;
        self.state = SchedulerState::Ready;
    }
}
