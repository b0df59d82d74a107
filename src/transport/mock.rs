//! Scripted in-memory transport for tests.
use std::collections::VecDeque;
use std::time::Duration;

use super::Transport;
use crate::error::Result;
use crate::frame;

#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    /// Bytes sitting in the receive buffer before the session starts,
    /// dropped by `clear_input`
    pub stale: VecDeque<u8>,
    /// Bytes the "device" will hand out, in order
    pub incoming: VecDeque<u8>,
    /// Every `send_raw` call, in order
    pub sent: Vec<Vec<u8>>,
    /// Number of `recv_raw` calls
    pub reads: usize,
    /// Number of `clear_input` calls
    pub clears: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, bytes: &[u8]) -> &mut Self {
        self.incoming.extend(bytes);
        self
    }

    /// Queue a well-formed response frame.
    pub fn queue_response(&mut self, status: u8, payload: &[u8]) -> &mut Self {
        let raw = frame::encode(status, payload).expect("response fits a frame");
        self.queue(&raw)
    }

    pub fn sent_bytes(&self) -> usize {
        self.sent.iter().map(Vec::len).sum()
    }
}

impl Transport for MockTransport {
    fn send_raw(&mut self, raw: &[u8]) -> Result<()> {
        self.sent.push(raw.to_vec());
        Ok(())
    }

    fn recv_raw(&mut self, len: usize, _timeout: Duration) -> Result<Vec<u8>> {
        self.reads += 1;
        let mut buf: Vec<u8> = self.stale.drain(..len.min(self.stale.len())).collect();
        let n = (len - buf.len()).min(self.incoming.len());
        buf.extend(self.incoming.drain(..n));
        Ok(buf)
    }

    fn clear_input(&mut self) -> Result<()> {
        self.clears += 1;
        self.stale.clear();
        Ok(())
    }
}
