//! Per-connection client sessions
//!
//! A session starts in awaiting-hello: inbound data is parsed but nothing
//! is written until the Snapcast `Hello` arrives. The handshake queues the
//! codec header ahead of any chunks that piled up, after which the writer
//! flushes the pending queue in order whenever it is woken.
//!
//! A session ends when the peer disconnects, on a write or protocol error,
//! when the output closes, or when its backlog exceeds the per-client cap:
//! slow clients are dropped rather than allowed to stall the stream.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use chorale_protocol::{
    codec_header_frame, stream_tags_frame, wire_chunk_frame, Frame, Hello, MessageKind, TimeVal,
};

use crate::chunk::Chunk;
use crate::output::{OutputShared, CODEC_NAME};

/// Maximum chunks a session may have pending before it is dropped
pub(crate) const PENDING_CHUNK_CAP: usize = 16;

/// Read buffer size per connection
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Counter for generating session ids
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// One outbound item awaiting write
enum Outbound {
    /// The stream prelude, queued once at handshake
    CodecHeader {
        header: Bytes,
        refers_to: u16,
        received: TimeVal,
    },
    /// One shared audio chunk
    Chunk(Arc<Chunk>),
    /// A stream-tags JSON payload
    Tags(Bytes),
}

struct ClientQueue {
    pending: VecDeque<Outbound>,
    /// Chunks currently in `pending` (tag frames don't count toward the cap)
    pending_chunks: usize,
    closing: bool,
}

/// Shared handle to one client session
///
/// The connection task owns the socket; everything here may be touched by
/// the fan-out paths under the session's own lock.
pub(crate) struct ClientHandle {
    id: u64,
    peer: SocketAddr,
    queue: Mutex<ClientQueue>,
    /// Wakes the connection task to flush `pending`
    wake: Notify,
    /// Tears the session down
    cancel: CancellationToken,
    /// Handshake completed
    ready: AtomicBool,
    /// Pending empty and writer idle
    drained: AtomicBool,
    /// Client-supplied name, known after the handshake
    identity: Mutex<Option<String>>,
}

impl ClientHandle {
    pub(crate) fn new(peer: SocketAddr) -> Arc<Self> {
        Arc::new(Self {
            id: CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            peer,
            queue: Mutex::new(ClientQueue {
                pending: VecDeque::new(),
                pending_chunks: 0,
                closing: false,
            }),
            wake: Notify::new(),
            cancel: CancellationToken::new(),
            ready: AtomicBool::new(false),
            drained: AtomicBool::new(true),
            identity: Mutex::new(None),
        })
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn is_drained(&self) -> bool {
        self.drained.load(Ordering::Relaxed)
    }

    /// Append a chunk to the session's pending queue
    ///
    /// Exceeding the backlog cap marks the session closing; the chunk that
    /// crossed the line and everything after it will never be written.
    pub(crate) fn push(&self, chunk: &Arc<Chunk>) {
        let mut queue = self.queue.lock();
        if queue.closing {
            return;
        }

        queue.pending.push_back(Outbound::Chunk(Arc::clone(chunk)));
        queue.pending_chunks += 1;
        self.drained.store(false, Ordering::Relaxed);

        if queue.pending_chunks > PENDING_CHUNK_CAP {
            queue.closing = true;
            drop(queue);
            warn!(id = self.id, peer = %self.peer, "client too slow, dropping");
            self.cancel.cancel();
            return;
        }

        drop(queue);
        self.wake.notify_one();
    }

    /// Append a stream-tags message; dropped until the handshake completes
    pub(crate) fn send_stream_tags(&self, json: &Bytes) {
        if !self.is_ready() {
            return;
        }

        let mut queue = self.queue.lock();
        if queue.closing {
            return;
        }
        queue.pending.push_back(Outbound::Tags(json.clone()));
        self.drained.store(false, Ordering::Relaxed);
        drop(queue);

        self.wake.notify_one();
    }

    /// Discard everything pending, keeping the connection alive
    ///
    /// The next real chunk resumes delivery.
    pub(crate) fn cancel_pending(&self) {
        let mut queue = self.queue.lock();
        queue.pending.clear();
        queue.pending_chunks = 0;
        drop(queue);

        // Let the writer observe the empty queue and report drained
        self.wake.notify_one();
    }

    /// Tear the session down
    pub(crate) fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Complete the handshake: queue the codec header ahead of anything
    /// already pending and unblock the writer
    fn begin_streaming(&self, header: Bytes, hello: &Frame) {
        let mut queue = self.queue.lock();
        queue.pending.push_front(Outbound::CodecHeader {
            header,
            refers_to: hello.header.id,
            received: hello.header.sent,
        });
        self.drained.store(false, Ordering::Relaxed);
        self.ready.store(true, Ordering::Relaxed);
        drop(queue);

        self.wake.notify_one();
    }

    fn set_identity(&self, name: &str) {
        *self.identity.lock() = Some(name.to_owned());
    }

    fn identity(&self) -> String {
        self.identity.lock().clone().unwrap_or_default()
    }
}

/// Drive one client connection until it ends
///
/// Runs on the runtime; owns the socket. On return the session has been
/// unlinked from the output.
pub(crate) async fn run_connection(
    shared: Arc<OutputShared>,
    client: Arc<ClientHandle>,
    stream: TcpStream,
) {
    if let Err(e) = configure_socket(&stream) {
        debug!(peer = %client.peer, error = %e, "socket configuration failed");
    }

    let (mut reader, mut writer) = stream.into_split();
    let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);

    loop {
        tokio::select! {
            _ = client.cancel.cancelled() => break,

            result = reader.read_buf(&mut buf) => {
                match result {
                    Ok(0) => break, // peer closed
                    Ok(_) => {
                        if !process_inbound(&shared, &client, &mut buf) {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!(peer = %client.peer, error = %e, "client read error");
                        break;
                    }
                }
            }

            _ = client.wake.notified() => {
                if let Err(e) = flush_pending(&shared, &client, &mut writer).await {
                    debug!(peer = %client.peer, error = %e, "client write error");
                    break;
                }
            }
        }
    }

    shared.remove_client(client.id);
    debug!(
        id = client.id,
        peer = %client.peer,
        identity = %client.identity(),
        "client session ended"
    );
}

/// Parse and dispatch all complete inbound frames
///
/// Returns false when the session must close (protocol violation).
fn process_inbound(shared: &Arc<OutputShared>, client: &Arc<ClientHandle>, buf: &mut BytesMut) -> bool {
    loop {
        let frame = match Frame::try_parse(buf) {
            Ok(Some(frame)) => frame,
            Ok(None) => return true,
            Err(e) => {
                debug!(peer = %client.peer, error = %e, "client protocol error");
                return false;
            }
        };

        if !client.is_ready() {
            if !handle_hello(shared, client, frame) {
                return false;
            }
            continue;
        }

        // Anything beyond delivery (time sync etc.) is not served here
        trace!(peer = %client.peer, kind = frame.header.kind, "ignoring client message");
    }
}

/// Handle the first message of a session
///
/// Returns false unless it is a parseable `Hello` and the output is still
/// open for streaming.
fn handle_hello(shared: &Arc<OutputShared>, client: &Arc<ClientHandle>, frame: Frame) -> bool {
    let kind = match frame.known_kind() {
        Ok(kind) => kind,
        Err(e) => {
            debug!(peer = %client.peer, error = %e, "client protocol error");
            return false;
        }
    };

    if kind != MessageKind::Hello {
        debug!(
            peer = %client.peer,
            kind = frame.header.kind,
            "expected Hello, closing session"
        );
        return false;
    }

    let hello = match Hello::parse(frame.payload.clone()) {
        Ok(hello) => hello,
        Err(e) => {
            debug!(peer = %client.peer, error = %e, "bad Hello payload");
            return false;
        }
    };

    let Some(header) = shared.codec_header() else {
        // Output closed between accept and handshake
        return false;
    };

    client.set_identity(hello.identity());
    client.begin_streaming(header, &frame);

    debug!(
        id = client.id,
        peer = %client.peer,
        identity = hello.identity(),
        version = %hello.version,
        "client handshake complete"
    );

    true
}

/// Write out the pending queue in order
///
/// Holds frames back until the handshake completes. Frames are built at
/// write time so `sent` carries the actual send timestamp.
async fn flush_pending(
    shared: &Arc<OutputShared>,
    client: &Arc<ClientHandle>,
    writer: &mut OwnedWriteHalf,
) -> std::io::Result<()> {
    while client.is_ready() {
        let item = {
            let mut queue = client.queue.lock();
            match queue.pending.pop_front() {
                Some(item) => {
                    if matches!(item, Outbound::Chunk(_)) {
                        queue.pending_chunks -= 1;
                    }
                    item
                }
                None => break,
            }
        };

        let frame = match item {
            Outbound::CodecHeader {
                header,
                refers_to,
                received,
            } => codec_header_frame(CODEC_NAME, &header, refers_to, received),
            Outbound::Chunk(chunk) => wire_chunk_frame(chunk.wire_timestamp(), chunk.payload()),
            Outbound::Tags(json) => stream_tags_frame(&json),
        };

        writer.write_all(&frame).await?;
    }

    // Report drained under the queue lock so a concurrent push can't be
    // overwritten by a stale "empty" observation
    let now_drained = {
        let queue = client.queue.lock();
        if queue.pending.is_empty() {
            client.drained.store(true, Ordering::Relaxed);
            true
        } else {
            false
        }
    };

    if now_drained {
        shared.notify_drain();
    }

    Ok(())
}

/// Tune the accepted socket for low-latency streaming
fn configure_socket(stream: &TcpStream) -> std::io::Result<()> {
    let sock = SockRef::from(stream);

    sock.set_tcp_nodelay(true)?;

    // Detect dead clients; without this a vanished peer holds its session
    // until the kernel gives up on retransmits
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(60))
        .with_interval(Duration::from_secs(10));
    sock.set_tcp_keepalive(&keepalive)?;

    Ok(())
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
