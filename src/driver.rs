//! Ingest driver: owns the byte source and is the only writer of decoded state

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use crate::config::BridgeConfig;
use crate::diagnostics::DiagnosticLog;
use crate::error::DecodeError;
use crate::protocol::{AssemblerStats, DEFAULT_FRAME_TIMEOUT, FrameAssembler, decode};
use crate::provider::Provider;
use crate::state::{SharedState, StateReader};
use crate::types::{Frame, Variant};

/// Bytes requested from the provider per read
const READ_CHUNK: usize = 256;

/// Ingest loop settings
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    /// Time allowed from a start marker to its end marker
    pub frame_timeout: Duration,
    /// Consecutive provider errors tolerated before the task ends
    pub max_errors: u32,
    /// Append a rendered snapshot here after every merge
    pub diagnostic_log: Option<PathBuf>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { frame_timeout: DEFAULT_FRAME_TIMEOUT, max_errors: 10, diagnostic_log: None }
    }
}

impl From<&BridgeConfig> for IngestOptions {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            frame_timeout: config.ingest.frame_timeout(),
            max_errors: config.ingest.max_errors,
            diagnostic_log: config.diagnostics.log_file.clone(),
        }
    }
}

/// Totals reported when the ingest task ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub bytes: u64,
    /// Frames decoded and merged
    pub decoded: u64,
    pub lights: u64,
    pub timer: u64,
    pub competitor_stats: u64,
    pub piste_status: u64,
    /// Frames matching no known layout
    pub unrecognized: u64,
    /// Frames matching a layout whose fields would not decode
    pub faults: u64,
    pub assembler: AssemblerStats,
}

impl IngestStats {
    fn record(&mut self, variant: Variant) {
        self.decoded += 1;
        match variant {
            Variant::Lights => self.lights += 1,
            Variant::Timer => self.timer += 1,
            Variant::CompetitorStats => self.competitor_stats += 1,
            Variant::PisteStatus => self.piste_status += 1,
            Variant::Unknown => {}
        }
    }
}

/// Handles to a running ingest task
pub struct IngestHandle {
    /// Read side of the decoded state
    pub state: StateReader,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Resolves with the final totals once the task ends
    pub task: JoinHandle<IngestStats>,
}

/// Drives bytes from a provider through framing and decoding into shared state
pub struct Ingestor;

impl Ingestor {
    /// Spawn the ingest task for the given provider
    ///
    /// State starts empty. The returned token stops the task.
    pub fn spawn<P>(provider: P, options: IngestOptions) -> IngestHandle
    where
        P: Provider,
    {
        let state = SharedState::new();
        let reader = state.reader();
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        let task = tokio::spawn(async move {
            Self::run(provider, Arc::new(state), options, cancel_task).await
        });

        IngestHandle { state: reader, cancel, task }
    }

    /// Run the ingest loop until the provider ends, fails too often, or is cancelled
    pub async fn run<P>(
        mut provider: P,
        state: Arc<SharedState>,
        options: IngestOptions,
        cancel: CancellationToken,
    ) -> IngestStats
    where
        P: Provider,
    {
        let source = provider.describe();
        info!("Ingest task started on {}", source);

        let mut assembler = FrameAssembler::new(options.frame_timeout);
        let mut stats = IngestStats::default();
        let mut log = open_log(options.diagnostic_log.as_deref()).await;
        let mut buf = [0u8; READ_CHUNK];
        let mut error_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!("Ingest task cancelled");
                break;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Ingest task cancelled during read");
                    break;
                }
                result = provider.read_chunk(&mut buf) => result,
            };

            match result {
                Ok(Some(0)) => {
                    assembler.expire(Instant::now());
                }
                Ok(Some(n)) => {
                    error_count = 0;
                    stats.bytes += n as u64;
                    let now = Instant::now();
                    for &byte in &buf[..n] {
                        if let Some(frame) = assembler.push(byte, now) {
                            Self::handle_frame(&frame, &state, &mut stats, log.as_mut()).await;
                        }
                    }
                }
                Ok(None) => {
                    info!("Byte source {} ended", source);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    error!("Provider error ({}/{}): {}", error_count, options.max_errors, e);

                    if error_count >= options.max_errors {
                        error!("Too many provider errors, stopping ingestion");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ... capped at 1.6s
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        stats.assembler = assembler.stats();
        info!(
            "Ingest task ended: {} bytes, {} frames, {} decoded, {} unrecognized, {} faults",
            stats.bytes,
            stats.assembler.frames,
            stats.decoded,
            stats.unrecognized,
            stats.faults
        );
        stats
    }

    async fn handle_frame(
        frame: &Frame,
        state: &SharedState,
        stats: &mut IngestStats,
        log: Option<&mut DiagnosticLog>,
    ) {
        match decode(frame.as_bytes()) {
            Ok(message) => {
                trace!(
                    "Frame {}: {} ({} fields)",
                    frame.sequence,
                    message.variant,
                    message.fields.len()
                );
                if let Some(status) = message.timer_status() {
                    trace!("Timer status: {}", status);
                }

                state.merge(message.variant, &message.fields);
                stats.record(message.variant);

                if let Some(log) = log {
                    if let Err(e) = log.append(&state.snapshot()).await {
                        warn!("Failed to write diagnostic log {}: {}", log.path().display(), e);
                    }
                }
            }
            Err(e @ DecodeError::MalformedFrame { .. }) => {
                stats.unrecognized += 1;
                info!("Frame {}: {}", frame.sequence, e);
            }
            Err(e @ DecodeError::DecodeFault { .. }) => {
                stats.faults += 1;
                warn!("Frame {}: {}", frame.sequence, e);
            }
        }
    }
}

async fn open_log(path: Option<&std::path::Path>) -> Option<DiagnosticLog> {
    let path = path?;
    match DiagnosticLog::open(path).await {
        Ok(log) => Some(log),
        Err(e) => {
            warn!("Diagnostic log disabled: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ReplayProvider;
    use crate::test_utils::{competitor_frame, lights_frame, piste_status_frame, timer_frame};
    use crate::types::FieldValue;
    use crate::{BridgeError, Result};
    use tokio::io::AsyncWriteExt;

    fn replay(bytes: Vec<u8>) -> ReplayProvider {
        ReplayProvider::from_reader(std::io::Cursor::new(bytes), "memory")
    }

    async fn ingest(bytes: Vec<u8>) -> (IngestStats, Arc<SharedState>) {
        let state = Arc::new(SharedState::new());
        let stats = Ingestor::run(
            replay(bytes),
            Arc::clone(&state),
            IngestOptions::default(),
            CancellationToken::new(),
        )
        .await;
        (stats, state)
    }

    #[tokio::test]
    async fn merges_every_known_message() {
        let mut stream = lights_frame(b"R1G0W1w0");
        stream.extend(timer_frame(b'R', b"01:30.5 "));
        stream.extend(competitor_frame(b"05:03", b"10000", b"00100", b'L', b'1', b"10"));
        stream.extend(piste_status_frame(*b"0101"));

        let (stats, state) = ingest(stream).await;
        let snapshot = state.snapshot();

        assert_eq!(stats.decoded, 4);
        assert_eq!(stats.piste_status, 1);
        assert_eq!(snapshot.counters.lights, 1);
        assert_eq!(snapshot.counters.timer, 1);
        assert_eq!(snapshot.counters.competitor_stats, 1);
        assert_eq!(snapshot.get("m4_raw_str"), Some(&FieldValue::Chars("0101".into())));

        let names: Vec<_> = snapshot.iter_fields().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "m1_lights",
                "m2_timer_status",
                "m2_timer_mmssdc",
                "m3_score",
                "m3_YRB_right",
                "m3_YRB_left",
                "m3_priority",
                "m3_period",
                "m3_video_requests",
                "m4_raw_str",
            ]
        );
    }

    #[tokio::test]
    async fn unknown_and_faulty_frames_leave_state_untouched() {
        let mut stream = vec![0x01, 0x13, b'?', 0x02, 0x04];
        stream.extend(lights_frame(&[b'R', 0xFE, b'G', b'0', b'W', b'0', b'w', b'0']));

        let (stats, state) = ingest(stream).await;

        assert_eq!(stats.unrecognized, 1);
        assert_eq!(stats.faults, 1);
        assert_eq!(stats.decoded, 0);
        assert_eq!(stats.assembler.frames, 2);
        assert_eq!(*state.snapshot(), crate::types::Snapshot::new());
    }

    #[tokio::test]
    async fn restart_recovers_only_second_frame() {
        let valid = lights_frame(b"R1G0W1w0");
        let mut stream = vec![0x01, 0x02];
        stream.extend_from_slice(&valid);

        let (stats, state) = ingest(stream).await;

        assert_eq!(stats.assembler.restarts, 1);
        assert_eq!(stats.lights, 1);
        assert_eq!(state.snapshot().get("m1_lights"), Some(&FieldValue::Window("R1G0W1w0".into())));
    }

    #[tokio::test]
    async fn later_messages_overwrite_earlier_fields() {
        let mut stream = timer_frame(b'R', b"02:00.0 ");
        stream.extend(lights_frame(b"R1G0W0w0"));
        stream.extend(timer_frame(b'N', b"01:58.3 "));

        let (_, state) = ingest(stream).await;
        let snapshot = state.snapshot();

        assert_eq!(snapshot.counters.timer, 2);
        assert_eq!(snapshot.get("m2_timer_status"), Some(&FieldValue::Char('N')));
        assert_eq!(snapshot.get("m2_timer_mmssdc"), Some(&FieldValue::Window("01:58.3 ".into())));
        assert_eq!(snapshot.get("m1_lights"), Some(&FieldValue::Window("R1G0W0w0".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_frame_expires_while_source_is_idle() {
        let (mut writer, reader) = tokio::io::duplex(256);
        let provider = ReplayProvider::from_reader(reader, "pipe")
            .with_poll_interval(Duration::from_millis(100));
        let handle = Ingestor::spawn(provider, IngestOptions::default());

        // Start a frame and stall past the timeout before finishing it
        let frame = lights_frame(b"R1G0W1w0");
        writer.write_all(&frame[..5]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        writer.write_all(&frame[5..]).await.unwrap();

        // A fresh, complete frame still goes through
        writer.write_all(&lights_frame(b"R0G1W0w0")).await.unwrap();
        drop(writer);

        let stats = handle.task.await.unwrap();
        assert_eq!(stats.assembler.timeouts, 1);
        assert_eq!(stats.lights, 1);
        assert_eq!(
            handle.state.snapshot().get("m1_lights"),
            Some(&FieldValue::Window("R0G1W0w0".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_a_silent_source() {
        let (_writer, reader) = tokio::io::duplex(16);
        let provider = ReplayProvider::from_reader(reader, "pipe");
        let handle = Ingestor::spawn(provider, IngestOptions::default());

        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.cancel.cancel();

        let stats = handle.task.await.unwrap();
        assert_eq!(stats.bytes, 0);
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl Provider for FailingProvider {
        async fn read_chunk(&mut self, _buf: &mut [u8]) -> Result<Option<usize>> {
            Err(BridgeError::device_lost(
                "unplugged",
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"),
            ))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_errors() {
        let options = IngestOptions { max_errors: 3, ..IngestOptions::default() };
        let stats = Ingestor::run(
            FailingProvider,
            Arc::new(SharedState::new()),
            options,
            CancellationToken::new(),
        )
        .await;
        assert_eq!(stats, IngestStats::default());
    }

    #[tokio::test]
    async fn writes_diagnostic_log_after_each_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data_log.txt");
        let options = IngestOptions { diagnostic_log: Some(path.clone()), ..IngestOptions::default() };

        let mut stream = lights_frame(b"R1G0W0w0");
        stream.extend(vec![0x01, 0x13, 0x04]);
        stream.extend(timer_frame(b'B', b"01:00.0 "));

        Ingestor::run(replay(stream), Arc::new(SharedState::new()), options, CancellationToken::new())
            .await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("m1_msg_counter").count(), 2);
        assert!(contents.contains("\">>>01:00.0 <<<\""));
    }
}
