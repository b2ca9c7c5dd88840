//! The session handle owned by the game loop.
//!
//! A [`Session`] owns one socket at a time plus the background tasks that
//! serve it: an accept or connect task that turns into the receive loop once
//! the peer is reached, and a writer task fed by an outbound queue. None of
//! the public calls block the caller except [`Session::disconnect`], which
//! waits for those tasks to finish.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::error::SessionError;
use super::mailbox::{GoalChannel, MailboxSet};
use crate::core::WIRE_VERSION;
use crate::transport::{
    ConnectionRole, ConnectionState, Frame, FrameReader, FrameWriter, RoleCell, StateCell,
    TransportError, accept_peer, bind_listener, connect_peer, resolve, wait_for_stop,
};
use crate::wire::{
    ConnectRequest, ConnectResponse, DisconnectNotice, GameStateUpdate, GoalEvent, Message,
    PlatformStateUpdate, PlayerInputSnapshot, StageSelection, WirePayload,
};

/// Connection-change notification: `true` on connect, `false` on loss.
pub type ConnectionCallback = Arc<dyn Fn(bool) + Send + Sync + 'static>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the game-loop thread and the background tasks.
struct Shared {
    config: SessionConfig,
    role: RoleCell,
    state: StateCell,
    should_stop: AtomicBool,
    stop_tx: watch::Sender<bool>,
    mailboxes: Mutex<MailboxSet>,
    goals: Mutex<GoalChannel>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    callback: Mutex<Option<ConnectionCallback>>,
    local_addr: Mutex<Option<SocketAddr>>,
    peer_addr: Mutex<Option<SocketAddr>>,
    peer_version: Mutex<Option<u16>>,
}

impl Shared {
    fn notify(&self, connected: bool) {
        let callback = lock(&self.callback).clone();
        if let Some(callback) = callback {
            callback(connected);
        }
    }

    fn register(&self, handle: JoinHandle<()>) {
        lock(&self.tasks).push(handle);
    }

    fn enqueue(&self, frame: Frame) -> Result<(), SessionError> {
        match lock(&self.outbound).as_ref() {
            Some(tx) => tx.send(frame).map_err(|_| SessionError::SendQueueClosed),
            None => Err(SessionError::NotConnected),
        }
    }

    /// Connected -> Disconnected after an I/O failure or peer shutdown.
    ///
    /// A local `disconnect` in progress owns the transition instead.
    fn mark_lost(&self, reason: &str) {
        if self.should_stop.load(Ordering::Acquire) {
            return;
        }
        if self
            .state
            .transition(ConnectionState::Connected, ConnectionState::Disconnected)
        {
            lock(&self.outbound).take();
            info!(role = %self.role.load(), reason, "connection lost");
            self.notify(false);
        }
    }

    /// Listening/Connecting -> Disconnected after a setup failure.
    fn fail_pending(&self) {
        let current = self.state.load();
        if current.is_pending()
            && self
                .state
                .transition(current, ConnectionState::Disconnected)
        {
            self.notify(false);
        }
    }

    async fn run_connection(
        self: Arc<Self>,
        stream: TcpStream,
        peer: SocketAddr,
        stop: watch::Receiver<bool>,
    ) {
        if self.should_stop.load(Ordering::Acquire) {
            return;
        }

        let (read_half, write_half) = stream.into_split();
        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.outbound) = Some(tx);
        *lock(&self.peer_addr) = Some(peer);

        let writer = FrameWriter::new(write_half);
        let writer = tokio::spawn(Arc::clone(&self).send_loop(writer, rx));
        self.register(writer);

        let pending = self.state.load();
        if !pending.is_pending()
            || !self
                .state
                .transition(pending, ConnectionState::Connected)
        {
            lock(&self.outbound).take();
            return;
        }

        let role = self.role.load();
        info!(%peer, %role, "session connected");
        self.notify(true);

        if role == ConnectionRole::Client {
            let hello = Frame::from_payload(&ConnectRequest {
                version: WIRE_VERSION,
            });
            match hello {
                Ok(frame) => {
                    if let Err(e) = self.enqueue(frame) {
                        warn!("failed to queue hello: {}", e);
                    }
                }
                Err(e) => warn!("failed to encode hello: {}", e),
            }
        }

        let reader = FrameReader::with_max_payload(read_half, self.config.max_payload_size);
        self.receive_loop(reader, stop).await;
    }

    async fn receive_loop(
        &self,
        mut reader: FrameReader<OwnedReadHalf>,
        mut stop: watch::Receiver<bool>,
    ) {
        loop {
            let result = tokio::select! {
                biased;
                _ = wait_for_stop(&mut stop) => break,
                result = reader.read_frame() => result,
            };

            match result {
                Ok(frame) => {
                    if !self.dispatch(frame) {
                        break;
                    }
                }
                Err(e) if e.is_frame_violation() => {
                    warn!("discarding frame: {}", e);
                }
                Err(TransportError::ConnectionClosed) => {
                    self.mark_lost("peer closed the connection");
                    break;
                }
                Err(e) => {
                    warn!("receive failed: {}", e);
                    self.mark_lost("receive error");
                    break;
                }
            }
        }
        debug!("receive loop stopped");
    }

    /// File one frame. Returns `false` when the loop should stop.
    fn dispatch(&self, frame: Frame) -> bool {
        let message = match frame.decode() {
            Ok(message) => message,
            Err(e) => {
                warn!(kind = %frame.kind, "discarding undecodable payload: {}", e);
                return true;
            }
        };

        match message {
            Message::PlayerInput(input) => {
                if lock(&self.mailboxes).player_input.put(input) {
                    debug!("unread player input overwritten");
                }
            }
            Message::GameState(update) => {
                if lock(&self.mailboxes).game_state.put(update) {
                    debug!("unread game state overwritten");
                }
            }
            Message::PlatformState(update) => {
                if lock(&self.mailboxes).platform_state.put(update) {
                    debug!("unread platform state overwritten");
                }
            }
            Message::StageSelect(selection) => {
                // A goal still pending here belongs to the race this stage ends.
                if lock(&self.goals).take().is_some() {
                    debug!(stage = selection.stage, "stale goal event discarded");
                }
                lock(&self.mailboxes).stage_selection.put(selection);
            }
            Message::Goal(event) => {
                if !lock(&self.goals).offer(event) {
                    warn!(
                        player_id = event.player_id,
                        "goal event already pending; dropping duplicate"
                    );
                }
            }
            Message::ConnectRequest(request) => {
                *lock(&self.peer_version) = Some(request.version);
                let accepted = request.version == WIRE_VERSION;
                if !accepted {
                    warn!(
                        peer = request.version,
                        local = WIRE_VERSION,
                        "peer wire version differs"
                    );
                }
                let reply = Frame::from_payload(&ConnectResponse {
                    version: WIRE_VERSION,
                    accepted,
                })
                .map_err(SessionError::from);
                if let Err(e) = reply.and_then(|f| self.enqueue(f)) {
                    warn!("failed to answer hello: {}", e);
                }
            }
            Message::ConnectResponse(response) => {
                *lock(&self.peer_version) = Some(response.version);
                if !response.accepted {
                    warn!(
                        peer = response.version,
                        local = WIRE_VERSION,
                        "host reports incompatible wire version"
                    );
                }
            }
            Message::Disconnect => {
                self.mark_lost("peer disconnected");
                return false;
            }
        }
        true
    }

    async fn send_loop(
        self: Arc<Self>,
        mut writer: FrameWriter<OwnedWriteHalf>,
        mut rx: mpsc::UnboundedReceiver<Frame>,
    ) {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = writer.write_frame(&frame).await {
                warn!(kind = %frame.kind, "send failed: {}", e);
                self.mark_lost("send error");
                return;
            }
        }
        let _ = writer.shutdown().await;
        debug!("send loop stopped");
    }
}

/// One end of a two-player session.
///
/// Constructed explicitly and owned by the game loop. Must be driven from a
/// synchronous thread: `disconnect` (and therefore `drop`) blocks on the
/// session's own runtime.
///
/// # Example
///
/// ```no_run
/// use tandem_sync::session::{Session, SessionConfig};
///
/// let mut host = Session::new(SessionConfig::default())?;
/// host.set_connection_callback(|connected| println!("connected: {connected}"));
/// host.start_host(12345)?;
///
/// // every tick:
/// if let Some(input) = host.try_take_player_input() {
///     // simulate the remote player with `input`
/// }
/// # Ok::<(), tandem_sync::session::SessionError>(())
/// ```
pub struct Session {
    runtime: Runtime,
    shared: Arc<Shared>,
}

impl Session {
    /// Create an idle session with its background runtime.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.runtime_threads.max(1))
            .thread_name("tandem-net")
            .enable_all()
            .build()
            .map_err(SessionError::Runtime)?;

        let (stop_tx, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            config,
            role: RoleCell::default(),
            state: StateCell::default(),
            should_stop: AtomicBool::new(false),
            stop_tx,
            mailboxes: Mutex::new(MailboxSet::default()),
            goals: Mutex::new(GoalChannel::new()),
            outbound: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            callback: Mutex::new(None),
            local_addr: Mutex::new(None),
            peer_addr: Mutex::new(None),
            peer_version: Mutex::new(None),
        });

        Ok(Self { runtime, shared })
    }

    /// Register the connection-change notification.
    ///
    /// Called from a background thread; keep it short.
    pub fn set_connection_callback<F>(&self, callback: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        *lock(&self.shared.callback) = Some(Arc::new(callback));
    }

    /// Listen on `port` and return immediately.
    ///
    /// Bind/listen failures are returned here. The single peer is accepted
    /// in the background; the callback fires with `true` once it arrives.
    /// Port 0 picks an ephemeral port, see [`Session::local_addr`].
    pub fn start_host(&mut self, port: u16) -> Result<(), SessionError> {
        self.disconnect();
        self.reset();

        let addr = SocketAddr::new(self.shared.config.bind_ip, port);
        let listener = {
            let _guard = self.runtime.enter();
            bind_listener(addr)
                .and_then(TcpListener::from_std)
                .map_err(|source| SessionError::Bind { addr, source })?
        };
        let local = listener
            .local_addr()
            .map_err(|source| SessionError::Bind { addr, source })?;
        *lock(&self.shared.local_addr) = Some(local);

        self.shared.role.store(ConnectionRole::Host);
        self.shared.state.swap(ConnectionState::Listening);
        info!(%local, "hosting; waiting for client connection");

        let shared = Arc::clone(&self.shared);
        let mut stop = self.shared.stop_tx.subscribe();
        let handle = self.runtime.spawn(async move {
            let progress = shared.config.progress_log_interval;
            match accept_peer(listener, progress, &mut stop).await {
                Ok(Some((stream, peer))) => shared.run_connection(stream, peer, stop).await,
                Ok(None) => {}
                Err(e) => {
                    warn!("accept failed: {}", e);
                    shared.fail_pending();
                }
            }
        });
        self.shared.register(handle);
        Ok(())
    }

    /// Start connecting to `host:port` and return immediately.
    ///
    /// The callback fires with `true` on success, or with `false` if the
    /// host refuses, cannot be resolved, or does not answer within the
    /// configured timeout.
    pub fn connect_to_host(&mut self, host: &str, port: u16) -> Result<(), SessionError> {
        let host = host.trim();
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(SessionError::InvalidAddress(host.to_string()));
        }

        self.disconnect();
        self.reset();

        self.shared.role.store(ConnectionRole::Client);
        self.shared.state.swap(ConnectionState::Connecting);
        info!(host, port, "connecting to host");

        let shared = Arc::clone(&self.shared);
        let mut stop = self.shared.stop_tx.subscribe();
        let host = host.to_string();
        let handle = self.runtime.spawn(async move {
            let config = &shared.config;
            let attempt = async {
                let addr = resolve(&host, port).await?;
                let stream = connect_peer(
                    addr,
                    config.connect_timeout,
                    config.progress_log_interval,
                    &mut stop,
                )
                .await?;
                Ok::<_, TransportError>(stream.map(|s| (s, addr)))
            };
            match attempt.await {
                Ok(Some((stream, addr))) => {
                    let stop = shared.stop_tx.subscribe();
                    Arc::clone(&shared).run_connection(stream, addr, stop).await
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(%host, port, "connect failed: {}", e);
                    shared.fail_pending();
                }
            }
        });
        self.shared.register(handle);
        Ok(())
    }

    /// Close the connection and stop every background task.
    ///
    /// Blocks until the tasks have finished. Safe to call repeatedly or
    /// before any connection; the callback fires with `false` only when a
    /// live connection is actually torn down here.
    pub fn disconnect(&mut self) {
        let shared = &self.shared;
        shared.should_stop.store(true, Ordering::Release);

        if shared.state.load() == ConnectionState::Connected {
            if let Ok(frame) = Frame::from_payload(&DisconnectNotice) {
                let _ = shared.enqueue(frame);
            }
        }
        // Dropping the sender lets the writer flush and exit.
        lock(&shared.outbound).take();
        shared.stop_tx.send_replace(true);

        self.join_tasks();

        let previous = shared.state.swap(ConnectionState::Disconnected);
        shared.role.store(ConnectionRole::Unset);
        *lock(&shared.local_addr) = None;
        *lock(&shared.peer_addr) = None;

        if previous == ConnectionState::Connected {
            info!("disconnected");
            shared.notify(false);
        }
    }

    fn join_tasks(&self) {
        let linger = self.shared.config.disconnect_linger;
        loop {
            let handles = std::mem::take(&mut *lock(&self.shared.tasks));
            if handles.is_empty() {
                break;
            }
            self.runtime.block_on(async move {
                for mut handle in handles {
                    if tokio::time::timeout(linger, &mut handle).await.is_err() {
                        warn!("background task did not stop in time; aborting it");
                        handle.abort();
                    }
                }
            });
        }
    }

    fn reset(&mut self) {
        let shared = &self.shared;
        shared.should_stop.store(false, Ordering::Release);
        shared.stop_tx.send_replace(false);
        lock(&shared.mailboxes).clear();
        lock(&shared.goals).clear();
        *lock(&shared.peer_version) = None;
    }

    /// Whether a peer is connected.
    pub fn is_connected(&self) -> bool {
        self.shared.state.load() == ConnectionState::Connected
    }

    /// Whether this session was started with [`Session::start_host`].
    pub fn is_host(&self) -> bool {
        self.shared.role.load() == ConnectionRole::Host
    }

    /// Current role.
    pub fn role(&self) -> ConnectionRole {
        self.shared.role.load()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state.load()
    }

    /// Address the host is listening on.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *lock(&self.shared.local_addr)
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        *lock(&self.shared.peer_addr)
    }

    /// Wire version announced by the peer during the hello, once known.
    pub fn peer_version(&self) -> Option<u16> {
        *lock(&self.shared.peer_version)
    }

    /// Outward-facing address to show players who want to join.
    pub fn advertised_ip(&self) -> Option<IpAddr> {
        crate::transport::local_ip_address()
    }

    fn send<P: WirePayload>(&self, payload: &P) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.shared.enqueue(Frame::from_payload(payload)?)
    }

    /// Queue the local input for this tick.
    pub fn try_send_player_input(&self, input: &PlayerInputSnapshot) -> Result<(), SessionError> {
        self.send(input)
    }

    /// Queue both players' authoritative state. Host-only by convention.
    pub fn try_send_game_state(&self, update: &GameStateUpdate) -> Result<(), SessionError> {
        self.send(update)
    }

    /// Queue every dynamic platform's state. Host-only by convention.
    pub fn try_send_platform_states(
        &self,
        update: &PlatformStateUpdate,
    ) -> Result<(), SessionError> {
        self.send(update)
    }

    /// Queue a race result. Host-only by convention; send once per race.
    pub fn try_send_goal_reached(&self, event: &GoalEvent) -> Result<(), SessionError> {
        self.send(event)
    }

    /// Queue the chosen stage. Host-only by convention.
    pub fn try_send_stage_selection(
        &self,
        selection: &StageSelection,
    ) -> Result<(), SessionError> {
        self.send(selection)
    }

    /// Newest unread client input, if any.
    pub fn try_take_player_input(&self) -> Option<PlayerInputSnapshot> {
        lock(&self.shared.mailboxes).player_input.take()
    }

    /// Newest unread authoritative player state, if any.
    pub fn try_take_game_state(&self) -> Option<GameStateUpdate> {
        lock(&self.shared.mailboxes).game_state.take()
    }

    /// Newest unread platform state, if any.
    pub fn try_take_platform_states(&self) -> Option<PlatformStateUpdate> {
        lock(&self.shared.mailboxes).platform_state.take()
    }

    /// Newest unread stage choice, if any.
    pub fn try_take_stage_selection(&self) -> Option<StageSelection> {
        lock(&self.shared.mailboxes).stage_selection.take()
    }

    /// The pending goal event, consumed exactly once.
    pub fn try_take_goal_reached(&self) -> Option<GoalEvent> {
        lock(&self.shared.goals).take()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role())
            .field("state", &self.state())
            .field("local_addr", &self.local_addr())
            .field("peer_addr", &self.peer_addr())
            .finish()
    }
}
