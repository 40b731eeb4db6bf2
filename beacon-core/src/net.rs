//! Network peer state: UDP socket ownership and the re-bind-before-send rule

use core::net::Ipv4Addr;

/// Stack status codes. Zero is success, negative is failure, matching the
/// signed-status convention of the underlying connection stack.
pub const STATUS_OK: i32 = 0;
/// Outbound queue full
pub const ERR_MEM: i32 = -6;
/// Socket pool exhausted
pub const ERR_MAXNUM: i32 = -7;
/// No remote endpoint bound at send time
pub const ERR_ARG: i32 = -12;
/// Link down
pub const ERR_IF: i32 = -14;

/// Error types for network operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NetError {
    /// The stack's finite socket pool has no free slot. Fatal at setup;
    /// there is no recovery path.
    ResourceExhausted,
    /// The stack rejected a send. Non-fatal: the next periodic tick is the
    /// retry mechanism.
    TransmitError(i32),
}

impl NetError {
    /// Signed status code for the debug sink
    pub const fn code(&self) -> i32 {
        match self {
            NetError::ResourceExhausted => ERR_MAXNUM,
            NetError::TransmitError(code) => *code,
        }
    }
}

#[cfg(feature = "std")]
impl core::fmt::Display for NetError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NetError::ResourceExhausted => write!(f, "Socket pool exhausted"),
            NetError::TransmitError(code) => write!(f, "Send rejected by stack ({})", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NetError {}

/// Transient result of one send attempt, consumed by the tick handler for
/// the debug sink and not persisted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SendOutcome {
    /// Stack status code; negative means the send was rejected
    pub status_code: i32,
    /// Bytes handed to the stack (0 on rejection)
    pub byte_count: u16,
}

impl SendOutcome {
    pub const fn success(byte_count: u16) -> Self {
        Self {
            status_code: STATUS_OK,
            byte_count,
        }
    }

    pub const fn failure(status_code: i32) -> Self {
        Self {
            status_code,
            byte_count: 0,
        }
    }

    pub const fn is_ok(&self) -> bool {
        self.status_code >= 0
    }
}

/// One UDP socket of the underlying stack.
///
/// The stack's send primitive transmits to whatever remote endpoint is set
/// at call time and does not guarantee that endpoint survives between
/// sends; callers re-assert it through `UdpPeer::bind_remote` before every
/// send.
pub trait UdpSocket {
    /// Overwrite the remote endpoint the next send will use
    fn set_remote(&mut self, addr: Ipv4Addr, port: u16);

    /// Queue a datagram to the currently set remote endpoint. Returns the
    /// number of bytes queued. Non-blocking.
    fn send(&mut self, payload: &[u8]) -> Result<u16, NetError>;

    /// Poll for the asynchronous sent-notification of an earlier send.
    /// Returns the confirmed byte count, at most once per send.
    fn poll_sent(&mut self) -> Option<u16>;

    /// Local port the socket is bound to
    fn local_port(&self) -> u16;
}

/// Socket allocation out of the stack's finite pool.
pub trait UdpStack {
    type Socket: UdpSocket;

    /// Allocate a socket bound to `local_port`; 0 requests a stack-chosen
    /// ephemeral port. Fails with `ResourceExhausted` when the pool is dry.
    fn open(&mut self, local_port: u16) -> Result<Self::Socket, NetError>;
}

/// Owns one UDP socket and the remote endpoint it beacons to.
///
/// The socket handle is created once at setup and never duplicated; all
/// sends route through this owner so the endpoint re-assert and the send
/// stay adjacent.
pub struct UdpPeer<S> {
    socket: S,
    remote_addr: Ipv4Addr,
    remote_port: u16,
    sent_hook: Option<fn(u16)>,
}

impl<S> UdpPeer<S>
where
    S: UdpSocket,
{
    /// Allocate the socket from the stack's pool. Setup-time only; a
    /// `ResourceExhausted` here halts initialization.
    pub fn create<T>(stack: &mut T, local_port: u16) -> Result<Self, NetError>
    where
        T: UdpStack<Socket = S>,
    {
        let socket = stack.open(local_port)?;

        #[cfg(feature = "defmt")]
        defmt::info!("udp peer bound to local port {=u16}", socket.local_port());

        Ok(Self {
            socket,
            remote_addr: Ipv4Addr::UNSPECIFIED,
            remote_port: 0,
            sent_hook: None,
        })
    }

    /// (Re-)write the destination into the stack. Idempotent, and called
    /// again before every send: the stack does not keep the endpoint
    /// across sends, so this is never a one-time bind.
    pub fn bind_remote(&mut self, addr: Ipv4Addr, port: u16) {
        self.remote_addr = addr;
        self.remote_port = port;
        self.socket.set_remote(addr, port);
    }

    /// Transmit to the currently bound remote endpoint
    pub fn send(&mut self, payload: &[u8]) -> Result<u16, NetError> {
        self.socket.send(payload)
    }

    /// Register the sent-notification hook. One invocation per send, after
    /// the datagram is physically queued. The hook gets only the byte
    /// count, so it cannot re-enter `send`; re-entry into the same tick is
    /// undefined on this platform.
    pub fn on_sent(&mut self, hook: fn(u16)) {
        self.sent_hook = Some(hook);
    }

    /// Deliver a pending sent-notification to the registered hook, if any.
    /// Called from the cooperative loop between ticks.
    pub fn poll_sent(&mut self) -> Option<u16> {
        let bytes = self.socket.poll_sent()?;
        if let Some(hook) = self.sent_hook {
            hook(bytes);
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("sent-notification: {=u16} bytes on the air", bytes);

        Some(bytes)
    }

    /// Remote endpoint this peer re-asserts before each send
    pub fn remote(&self) -> (Ipv4Addr, u16) {
        (self.remote_addr, self.remote_port)
    }

    /// Local port of the owned socket
    pub fn local_port(&self) -> u16 {
        self.socket.local_port()
    }

    /// Access the owned socket (tests inspect the mock through this)
    pub fn socket_mut(&mut self) -> &mut S {
        &mut self.socket
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock UDP stack for testing

    use super::*;
    use heapless::Deque;
    use heapless::Vec;

    /// First port the mock hands out for ephemeral (port 0) binds
    pub const EPHEMERAL_BASE: u16 = 49152;

    /// One datagram the mock stack accepted
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentDatagram {
        pub addr: Ipv4Addr,
        pub port: u16,
        pub payload: Vec<u8, 64>,
    }

    /// Mock socket. Deliberately forgets the remote endpoint after every
    /// send, modelling the documented stack behaviour that peer state does
    /// not survive between sends; a caller that skips the re-bind fails
    /// with `ERR_ARG` on its next send.
    #[derive(Debug, Default)]
    pub struct MockSocket {
        local_port: u16,
        remote: Option<(Ipv4Addr, u16)>,
        sent: Vec<SentDatagram, 16>,
        pending_sent: Deque<u16, 16>,
        fail_next: Option<i32>,
    }

    impl MockSocket {
        /// Every datagram accepted so far, oldest first
        pub fn sent(&self) -> &[SentDatagram] {
            &self.sent
        }

        /// Remote endpoint currently set in the stack, if any
        pub fn remote(&self) -> Option<(Ipv4Addr, u16)> {
            self.remote
        }

        /// Reject the next send with the given status code
        pub fn fail_next_send(&mut self, code: i32) {
            self.fail_next = Some(code);
        }
    }

    impl UdpSocket for MockSocket {
        fn set_remote(&mut self, addr: Ipv4Addr, port: u16) {
            self.remote = Some((addr, port));
        }

        fn send(&mut self, payload: &[u8]) -> Result<u16, NetError> {
            if let Some(code) = self.fail_next.take() {
                return Err(NetError::TransmitError(code));
            }
            let (addr, port) = self.remote.ok_or(NetError::TransmitError(ERR_ARG))?;

            let mut copy = Vec::new();
            copy.extend_from_slice(payload)
                .map_err(|_| NetError::TransmitError(ERR_MEM))?;
            self.sent
                .push(SentDatagram {
                    addr,
                    port,
                    payload: copy,
                })
                .ok();
            self.pending_sent.push_back(payload.len() as u16).ok();

            // The stack forgets the peer once the datagram is queued
            self.remote = None;

            Ok(payload.len() as u16)
        }

        fn poll_sent(&mut self) -> Option<u16> {
            self.pending_sent.pop_front()
        }

        fn local_port(&self) -> u16 {
            self.local_port
        }
    }

    /// Mock stack with a finite socket pool
    #[derive(Debug)]
    pub struct MockStack {
        pool_size: usize,
        opened: usize,
    }

    impl MockStack {
        pub fn new(pool_size: usize) -> Self {
            Self {
                pool_size,
                opened: 0,
            }
        }

        pub fn sockets_open(&self) -> usize {
            self.opened
        }
    }

    impl UdpStack for MockStack {
        type Socket = MockSocket;

        fn open(&mut self, local_port: u16) -> Result<MockSocket, NetError> {
            if self.opened >= self.pool_size {
                return Err(NetError::ResourceExhausted);
            }
            let port = if local_port == 0 {
                EPHEMERAL_BASE + self.opened as u16
            } else {
                local_port
            };
            self.opened += 1;
            Ok(MockSocket {
                local_port: port,
                ..MockSocket::default()
            })
        }
    }
}
