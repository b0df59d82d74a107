//! Reset handshake, bringing the badge command interface to a known state.

use std::{thread::sleep, time::Duration};

use crate::constants::{RESET_INTERVAL_MS, RESET_MAX_ATTEMPTS, status};
use crate::error::{Error, Result};
use crate::frame;
use crate::protocol::Command;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResetState {
    #[default]
    Unknown,
    AwaitingAck,
    Ready,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ResetHandshake {
    state: ResetState,
    attempts: usize,
    max_attempts: usize,
    interval: Duration,
}

impl Default for ResetHandshake {
    fn default() -> Self {
        Self::new(Duration::from_millis(RESET_INTERVAL_MS))
    }
}

impl ResetHandshake {
    pub fn new(interval: Duration) -> Self {
        ResetHandshake {
            state: ResetState::Unknown,
            attempts: 0,
            max_attempts: RESET_MAX_ATTEMPTS,
            interval,
        }
    }

    pub fn state(&self) -> ResetState {
        self.state
    }

    /// Failed ack reads so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Send the reset byte until the device acknowledges it.
    ///
    /// Each ack read may take up to `timeout`. After `max_attempts` reads
    /// without the expected ack the handshake gives up for good.
    pub fn run<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        timeout: Duration,
    ) -> Result<()> {
        let reset = Command::Reset.into_raw()?;
        let expected = frame::verification_frame(status::RESET);

        // Whatever is pending belongs to an earlier, unknown state
        transport.clear_input()?;
        self.attempts = 0;

        log::debug!("=> {}", hex::encode(&reset));
        transport.send_raw(&reset)?;
        self.state = ResetState::AwaitingAck;

        loop {
            let resp = transport.recv_raw(expected.len(), timeout)?;
            if resp[..] == expected[..] {
                log::debug!("<= {}", hex::encode(&resp));
                self.state = ResetState::Ready;
                return Ok(());
            }

            self.attempts += 1;
            log::trace!(
                "reset attempt {} got [{}], expected [{}]",
                self.attempts,
                hex::encode(&resp),
                hex::encode(expected)
            );
            if self.attempts >= self.max_attempts {
                self.state = ResetState::Failed;
                log::error!("No response after {} reset attempts", self.attempts);
                return Err(Error::ResetFailure {
                    attempts: self.attempts,
                });
            }

            transport.send_raw(&reset)?;
            sleep(self.interval);
        }
    }
}
