//! Mock transport for deterministic testing of protocol drivers.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. This lets you test command framing, reply
//! classification, and state polling without an amplifier on the bench.
//!
//! Clones share one script and one log, so a test can hand a clone to the
//! driver (which takes ownership of its transport) and keep another to
//! inspect what was sent afterwards.
//!
//! # Example
//!
//! ```
//! use amplink_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! // Power query: the amplifier answers "on".
//! mock.expect(b"#1,01\r", b"#2,01,1\r");
//! // Volume query: the amplifier stays silent.
//! mock.expect_no_reply(b"#1,05\r");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use amplink_core::error::{Error, Result};
use amplink_core::transport::Transport;

/// What the mock does when a matching request is sent.
#[derive(Debug, Clone)]
enum Outcome {
    /// Queue these bytes for the following `receive()` calls. An empty
    /// response makes `receive()` time out.
    Respond(Vec<u8>),
    /// Fail the `send()` itself with a write timeout.
    WriteTimeout,
}

#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    outcome: Outcome,
}

#[derive(Debug)]
struct MockState {
    expectations: VecDeque<Expectation>,
    /// Bytes waiting to be read, including unsolicited noise.
    pending: VecDeque<u8>,
    connected: bool,
    sent_log: Vec<Vec<u8>>,
    clear_count: usize,
}

/// A mock [`Transport`] for testing drivers without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation; its response
/// is then returned by subsequent `receive()` calls. A mismatched request or
/// an exhausted queue fails `send()` with [`Error::Protocol`].
///
/// `clear_buffers()` discards any bytes not yet read, the way a real serial
/// port flushes its input queue.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState {
                expectations: VecDeque::new(),
                pending: VecDeque::new(),
                connected: true,
                sent_log: Vec::new(),
                clear_count: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread poisons the lock; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an expected request/response pair.
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        self.push(request, Outcome::Respond(response.to_vec()));
    }

    /// Expect `request` and answer nothing, so the next read times out.
    pub fn expect_no_reply(&self, request: &[u8]) {
        self.push(request, Outcome::Respond(Vec::new()));
    }

    /// Expect `request` and fail the write with [`Error::Timeout`].
    pub fn expect_write_timeout(&self, request: &[u8]) {
        self.push(request, Outcome::WriteTimeout);
    }

    fn push(&self, request: &[u8], outcome: Outcome) {
        self.lock().expectations.push_back(Expectation {
            request: request.to_vec(),
            outcome,
        });
    }

    /// Queue bytes as if the device had sent them unprompted.
    ///
    /// They sit in the input buffer until read or cleared.
    pub fn inject_unsolicited(&self, data: &[u8]) {
        self.lock().pending.extend(data.iter().copied());
    }

    /// All data that has been sent through this transport, one entry per
    /// `send()` call.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.lock().sent_log.clone()
    }

    /// Sent data rendered as text with `\r` shown literally, for readable
    /// assertions against ASCII protocols.
    pub fn sent_lines(&self) -> Vec<String> {
        self.lock()
            .sent_log
            .iter()
            .map(|frame| String::from_utf8_lossy(frame).replace('\r', "\\r"))
            .collect()
    }

    /// Number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.lock().expectations.len()
    }

    /// Number of times `clear_buffers()` has been called.
    pub fn clear_count(&self) -> usize {
        self.lock().clear_count
    }

    /// Set the connected state of the mock transport.
    ///
    /// When `false`, subsequent calls fail with [`Error::NotConnected`].
    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        state.sent_log.push(data.to_vec());

        let Some(expectation) = state.expectations.pop_front() else {
            return Err(Error::Protocol(format!(
                "no more expectations in mock transport (sent {:?})",
                String::from_utf8_lossy(data)
            )));
        };

        if data != expectation.request.as_slice() {
            return Err(Error::Protocol(format!(
                "unexpected send data: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data)
            )));
        }

        match expectation.outcome {
            Outcome::Respond(response) => {
                state.pending.extend(response);
                Ok(())
            }
            Outcome::WriteTimeout => Err(Error::Timeout),
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        // Suspend once, like a real port waiting for bytes.
        tokio::task::yield_now().await;

        let mut state = self.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        if state.pending.is_empty() {
            return Err(Error::Timeout);
        }

        let n = state.pending.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(state.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn clear_buffers(&mut self) -> Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.pending.clear();
        state.clear_count += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.connected = false;
        state.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_transport_basic_send_receive() {
        let mut mock = MockTransport::new();
        mock.expect(b"#1,01\r", b"#2,01,1\r");

        mock.send(b"#1,01\r").await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"#2,01,1\r");
    }

    #[tokio::test]
    async fn receive_lets_other_tasks_run() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let mut mock = MockTransport::new();
        mock.inject_unsolicited(b"#2,01,0\r");

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

        let mut buf = [0u8; 16];
        mock.receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn mock_transport_clones_share_log() {
        let observer = MockTransport::new();
        let mut driver_side = observer.clone();
        observer.expect(b"#1,03\r", b"#2,03,0\r");
        observer.expect(b"#3,01\r", b"#4,01,11\r");

        driver_side.send(b"#1,03\r").await.unwrap();
        driver_side.send(b"#3,01\r").await.unwrap();

        assert_eq!(observer.sent_data().len(), 2);
        assert_eq!(observer.sent_lines(), vec!["#1,03\\r", "#3,01\\r"]);
        assert_eq!(observer.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn mock_transport_wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(b"#1,01\r", b"#2,01,1\r");

        let result = mock.send(b"#1,05\r").await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn mock_transport_no_expectations_errors() {
        let mut mock = MockTransport::new();
        let result = mock.send(b"#1,01\r").await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn mock_transport_receive_without_send_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 64];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn mock_transport_no_reply_times_out() {
        let mut mock = MockTransport::new();
        mock.expect_no_reply(b"#1,05\r");

        mock.send(b"#1,05\r").await.unwrap();
        let mut buf = [0u8; 64];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn mock_transport_write_timeout() {
        let mut mock = MockTransport::new();
        mock.expect_write_timeout(b"#1,02,1\r");

        let result = mock.send(b"#1,02,1\r").await;
        assert!(matches!(result, Err(Error::Timeout)));
        assert_eq!(mock.sent_data().len(), 1);
    }

    #[tokio::test]
    async fn mock_transport_clear_discards_unsolicited() {
        let mut mock = MockTransport::new();
        mock.inject_unsolicited(b"#4,01,03\r");
        mock.clear_buffers().await.unwrap();
        assert_eq!(mock.clear_count(), 1);

        let mut buf = [0u8; 64];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn mock_transport_disconnect() {
        let mut mock = MockTransport::new();
        assert!(mock.is_connected());

        mock.close().await.unwrap();
        assert!(!mock.is_connected());

        let result = mock.send(b"#1,01\r").await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn mock_transport_set_connected() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);
        assert!(!mock.is_connected());

        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::NotConnected)));
        assert!(matches!(mock.clear_buffers().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn mock_transport_partial_receive() {
        let mut mock = MockTransport::new();
        mock.expect(b"#1,05\r", b"#6,05,-40\r");
        mock.send(b"#1,05\r").await.unwrap();

        let mut buf = [0u8; 4];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"#6,0");

        let mut rest = [0u8; 16];
        let n = mock
            .receive(&mut rest, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&rest[..n], b"5,-40\r");
    }
}
