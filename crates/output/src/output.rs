//! The output orchestrator
//!
//! Owns the encoder, the pacing timer, the shared chunk queue and the
//! client registry, and mediates between the playback thread and the
//! runtime. Producer-side state (encoder, timer, pause flag, unflushed
//! counter) lives directly in [`SnapcastOutput`] and is only touched by
//! the playback thread; everything the runtime sees is behind the single
//! mutex in [`OutputShared`].

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chorale_encoder::{AudioFormat, Encoder, PreparedEncoder, WavePrepared};

use crate::chunk::Chunk;
use crate::client::{run_connection, ClientHandle};
use crate::config::SnapcastConfig;
use crate::driver::{
    AudioOutput, FLAG_ENABLE_DISABLE, FLAG_NEED_FULLY_DEFINED_AUDIO_FORMAT, FLAG_PAUSE,
};
use crate::error::OutputError;
use crate::listener::Listener;
use crate::tags::{stream_tags_json, Tag};
use crate::timer::PaceTimer;
#[cfg(feature = "zeroconf")]
use crate::zeroconf::ZeroconfService;
use crate::Result;

/// Stream format name sent in every codec header
pub(crate) const CODEC_NAME: &str = "wave";

/// Force an encoder flush after this much input produced no output
const FLUSH_THRESHOLD: usize = 64 * 1024;

/// Encoder read buffer; one chunk is at most this large
const CHUNK_READ_SIZE: usize = 32 * 1024;

/// Poll interval while paused: low CPU, still notices new clients quickly
const PAUSE_DELAY: Duration = Duration::from_secs(1);

/// State shared between the playback thread and the runtime tasks
pub(crate) struct OutputShared {
    state: Mutex<OutputState>,
    drain_cond: Condvar,
    /// Wakes the inject task to forward queued chunks
    inject: Notify,
}

struct OutputState {
    open: bool,
    /// Container prelude sent to every client after its handshake;
    /// non-empty exactly while the output is open
    codec_header: Bytes,
    chunks: VecDeque<Arc<Chunk>>,
    clients: Vec<Arc<ClientHandle>>,
}

impl OutputShared {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(OutputState {
                open: false,
                codec_header: Bytes::new(),
                chunks: VecDeque::new(),
                clients: Vec::new(),
            }),
            drain_cond: Condvar::new(),
            inject: Notify::new(),
        })
    }

    /// The codec header, if the output is open
    pub(crate) fn codec_header(&self) -> Option<Bytes> {
        let state = self.state.lock();
        if state.open && !state.codec_header.is_empty() {
            Some(state.codec_header.clone())
        } else {
            None
        }
    }

    fn has_clients(&self) -> bool {
        !self.state.lock().clients.is_empty()
    }

    /// Register a freshly accepted connection
    ///
    /// While the output is closed the socket is simply dropped.
    pub(crate) fn accept(self: &Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        let mut state = self.state.lock();
        if !state.open {
            debug!(%peer, "rejecting connection, output closed");
            return;
        }

        let client = ClientHandle::new(peer);
        state.clients.push(Arc::clone(&client));
        drop(state);

        debug!(%peer, id = client.id(), "client connected");
        tokio::spawn(run_connection(Arc::clone(self), client, stream));
    }

    /// Unlink a departed session
    pub(crate) fn remove_client(&self, id: u64) {
        let mut state = self.state.lock();
        state.clients.retain(|c| c.id() != id);
        drop(state);

        // The departed client may have been the last undrained one
        self.notify_drain();
    }

    /// Re-evaluate any drain() waiter
    pub(crate) fn notify_drain(&self) {
        let _state = self.state.lock();
        self.drain_cond.notify_all();
    }

    /// Move queued chunks to every client, in FIFO order
    fn deliver_chunks(&self) {
        let mut state = self.state.lock();
        while let Some(chunk) = state.chunks.pop_front() {
            for client in &state.clients {
                client.push(&chunk);
            }
        }
        drop(state);

        self.notify_drain();
    }

    fn is_drained(state: &OutputState) -> bool {
        state.chunks.is_empty() && state.clients.iter().all(|c| c.is_drained())
    }
}

/// Listener sockets and advertisement held between enable and disable
struct Bound {
    cancel: CancellationToken,
    port: u16,
    #[cfg(feature = "zeroconf")]
    advertiser: Option<ZeroconfService>,
}

/// The Snapcast streaming output
///
/// All methods are blocking and belong to the playback thread; the handle
/// passed at construction is where the socket work runs. Do not call them
/// from inside the runtime.
pub struct SnapcastOutput {
    handle: Handle,
    config: SnapcastConfig,
    shared: Arc<OutputShared>,
    /// Stops the inject task when the output is dropped
    inject_cancel: CancellationToken,
    prepared_encoder: Box<dyn PreparedEncoder>,
    /// Present exactly while open
    encoder: Option<Box<dyn Encoder>>,
    /// Present exactly while open
    timer: Option<PaceTimer>,
    /// Input fed to the encoder since it last produced output
    unflushed_input: usize,
    pause: bool,
    bound: Option<Bound>,
}

impl std::fmt::Debug for SnapcastOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapcastOutput").finish_non_exhaustive()
    }
}

impl SnapcastOutput {
    /// Create an output streaming WAV on the given runtime
    ///
    /// Fails on unparseable configuration. The output starts closed and
    /// unbound.
    pub fn new(handle: Handle, config: SnapcastConfig) -> Result<Self> {
        Self::with_encoder(handle, config, Box::new(WavePrepared::new()))
    }

    /// Create an output using a specific prepared codec
    pub fn with_encoder(
        handle: Handle,
        config: SnapcastConfig,
        prepared_encoder: Box<dyn PreparedEncoder>,
    ) -> Result<Self> {
        config.validate()?;

        let shared = OutputShared::new();
        let inject_cancel = CancellationToken::new();

        {
            let shared = Arc::clone(&shared);
            let cancel = inject_cancel.clone();
            handle.spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = shared.inject.notified() => shared.deliver_chunks(),
                    }
                }
            });
        }

        Ok(Self {
            handle,
            config,
            shared,
            inject_cancel,
            prepared_encoder,
            encoder: None,
            timer: None,
            unflushed_input: 0,
            pause: false,
            bound: None,
        })
    }

    /// Whether a stream is open
    pub fn is_open(&self) -> bool {
        self.encoder.is_some()
    }

    /// The port the listener actually bound, once enabled
    pub fn bound_port(&self) -> Option<u16> {
        self.bound.as_ref().map(|b| b.port)
    }

    /// Number of live client sessions
    pub fn client_count(&self) -> usize {
        self.shared.state.lock().clients.len()
    }

    /// Open the listener sockets and, if configured, the mDNS advertisement
    pub fn bind(&mut self) -> Result<()> {
        if self.bound.is_some() {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        let cancel = CancellationToken::new();
        let accept_cancel = cancel.clone();

        let bound = self.handle.block_on(async move {
            let listener = Listener::bind(&config).await?;
            let port = listener.port();
            listener.spawn_accept_loops(shared, accept_cancel);

            #[cfg(feature = "zeroconf")]
            let advertiser = if config.zeroconf {
                // Advertisement is best effort: a missing mDNS stack must
                // not take the listener down with it
                match ZeroconfService::register(port) {
                    Ok(service) => Some(service),
                    Err(e) => {
                        warn!(error = %e, "zeroconf registration failed");
                        None
                    }
                }
            } else {
                None
            };

            Ok::<_, OutputError>(Bound {
                cancel,
                port,
                #[cfg(feature = "zeroconf")]
                advertiser,
            })
        })?;

        info!(port = bound.port, "snapcast output enabled");
        self.bound = Some(bound);
        Ok(())
    }

    /// Tear down the advertisement and the listener sockets
    ///
    /// The output must be closed first.
    pub fn unbind(&mut self) {
        debug_assert!(!self.is_open());

        let Some(bound) = self.bound.take() else {
            return;
        };

        self.handle.block_on(async move {
            #[cfg(feature = "zeroconf")]
            drop(bound.advertiser);

            bound.cancel.cancel();
        });

        info!("snapcast output disabled");
    }

    /// Start a stream: open the encoder and capture its header
    pub fn open(&mut self, format: &mut AudioFormat) -> Result<()> {
        if self.encoder.is_some() {
            return Err(OutputError::AlreadyOpen);
        }

        let mut encoder = self.prepared_encoder.open(format)?;

        // The prelude the codec emits before any audio is written becomes
        // the header every new client receives first
        let mut buf = [0u8; 4096];
        let n = encoder.read(&mut buf);
        let codec_header = Bytes::copy_from_slice(&buf[..n]);

        self.unflushed_input = 0;
        self.timer = Some(PaceTimer::new(format));

        let mut state = self.shared.state.lock();
        debug_assert!(state.clients.is_empty());
        state.codec_header = codec_header;
        state.open = true;
        drop(state);

        self.encoder = Some(encoder);
        self.pause = false;

        info!(%format, "snapcast output open");
        Ok(())
    }

    /// End the stream, dropping every client
    pub fn close(&mut self) {
        if self.encoder.is_none() {
            return;
        }

        self.timer = None;

        let shared = Arc::clone(&self.shared);
        self.handle.block_on(async move {
            let mut state = shared.state.lock();
            state.open = false;
            for client in state.clients.drain(..) {
                client.shutdown();
            }
            state.chunks.clear();
            state.codec_header = Bytes::new();
        });

        self.encoder = None;

        info!("snapcast output closed");
    }

    /// Submit PCM from the playback thread
    ///
    /// Always consumes all of `src`: the stream is paced by the caller
    /// sleeping [`delay`](Self::delay), not by blocking here. With no
    /// clients connected the timer still advances but nothing is encoded.
    pub fn play(&mut self, src: &[u8]) -> Result<usize> {
        let (Some(encoder), Some(timer)) = (self.encoder.as_mut(), self.timer.as_mut()) else {
            return Err(OutputError::NotOpen);
        };

        let now = Instant::now();
        self.pause = false;

        if !timer.is_started() {
            timer.start();
        }
        timer.add(src.len());

        if !self.shared.has_clients() {
            return Ok(src.len());
        }

        if let Err(e) = encoder.write(src) {
            // An occasional codec hiccup must not tear down the stream
            warn!(error = %e, "encoder write failed");
        }
        self.unflushed_input += src.len();

        if self.unflushed_input >= FLUSH_THRESHOLD {
            // Plenty of input went in without anything coming out; force
            // it out to avoid client-side underruns
            if let Err(e) = encoder.flush() {
                warn!(error = %e, "encoder flush failed");
            }
            self.unflushed_input = 0;
        }

        loop {
            let mut buf = [0u8; CHUNK_READ_SIZE];
            let n = encoder.read(&mut buf);
            if n == 0 {
                break;
            }

            self.unflushed_input = 0;

            let chunk = Arc::new(Chunk::new(now, Bytes::copy_from_slice(&buf[..n])));

            let mut state = self.shared.state.lock();
            if state.chunks.is_empty() {
                self.shared.inject.notify_one();
            }
            state.chunks.push_back(chunk);
        }

        Ok(src.len())
    }

    /// How long the caller should sleep before the next `play`
    pub fn delay(&mut self) -> Duration {
        if self.pause {
            // Pause submits nothing and never advances the timer, so
            // re-anchor it here
            if let Some(timer) = self.timer.as_mut() {
                timer.reset();
            }
            return PAUSE_DELAY;
        }

        match &self.timer {
            Some(timer) if timer.is_started() => timer.delay(),
            _ => Duration::ZERO,
        }
    }

    /// Pause the stream; [`delay`](Self::delay) governs the poll rate
    pub fn pause(&mut self) -> bool {
        self.pause = true;
        true
    }

    /// Block until the queue is empty and every client has written out
    /// its backlog
    pub fn drain(&self) {
        let mut state = self.shared.state.lock();
        while !OutputShared::is_drained(&state) {
            self.shared.drain_cond.wait(&mut state);
        }
    }

    /// Discard buffered audio everywhere, keeping clients connected
    ///
    /// Used when the pipeline flushes, e.g. on seek.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        state.chunks.clear();
        for client in &state.clients {
            client.cancel_pending();
        }
    }

    /// Project a tag record and send it to every client
    pub fn send_tag(&self, tag: &Tag) {
        if !self.shared.has_clients() {
            return;
        }

        let Some(json) = stream_tags_json(tag) else {
            return;
        };
        let json = Bytes::from(json);

        let state = self.shared.state.lock();
        for client in &state.clients {
            client.send_stream_tags(&json);
        }
    }
}

impl Drop for SnapcastOutput {
    fn drop(&mut self) {
        self.inject_cancel.cancel();

        if let Some(bound) = self.bound.take() {
            bound.cancel.cancel();
        }

        let mut state = self.shared.state.lock();
        state.open = false;
        for client in state.clients.drain(..) {
            client.shutdown();
        }
        state.chunks.clear();
    }
}

impl AudioOutput for SnapcastOutput {
    fn flags(&self) -> u32 {
        FLAG_ENABLE_DISABLE | FLAG_PAUSE | FLAG_NEED_FULLY_DEFINED_AUDIO_FORMAT
    }

    fn enable(&mut self) -> Result<()> {
        self.bind()
    }

    fn disable(&mut self) {
        self.unbind();
    }

    fn open(&mut self, format: &mut AudioFormat) -> Result<()> {
        SnapcastOutput::open(self, format)
    }

    fn close(&mut self) {
        SnapcastOutput::close(self);
    }

    fn delay(&mut self) -> Duration {
        SnapcastOutput::delay(self)
    }

    fn play(&mut self, src: &[u8]) -> Result<usize> {
        SnapcastOutput::play(self, src)
    }

    fn pause(&mut self) -> bool {
        SnapcastOutput::pause(self)
    }

    fn drain(&mut self) {
        SnapcastOutput::drain(self);
    }

    fn cancel(&mut self) {
        SnapcastOutput::cancel(self);
    }

    fn send_tag(&mut self, tag: &Tag) {
        SnapcastOutput::send_tag(self, tag);
    }
}

#[cfg(test)]
#[path = "output_test.rs"]
mod tests;
