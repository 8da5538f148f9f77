use anyhow::{anyhow, Context, Result};
use std::{
    env, fs,
    os::unix::net::UnixDatagram,
    path::{Path, PathBuf},
};
use tracing::warn;

/// Every command is exactly two little-endian i64s: opcode, argument.
pub const MESSAGE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Handshake,
    PlayPause,
    Stop,
    Next,
    Prev,
    Add,
    Rewind,
}

impl Opcode {
    pub fn as_i64(self) -> i64 {
        match self {
            Opcode::Handshake => 0,
            Opcode::PlayPause => 10,
            Opcode::Stop => 11,
            Opcode::Next => 12,
            Opcode::Prev => 13,
            Opcode::Add => 20,
            Opcode::Rewind => 30,
        }
    }

    pub fn from_i64(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(Opcode::Handshake),
            10 => Some(Opcode::PlayPause),
            11 => Some(Opcode::Stop),
            12 => Some(Opcode::Next),
            13 => Some(Opcode::Prev),
            20 => Some(Opcode::Add),
            30 => Some(Opcode::Rewind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub opcode: Opcode,
    pub argument: i64,
}

impl Message {
    pub fn new(opcode: Opcode) -> Self {
        Message { opcode, argument: 0 }
    }

    pub fn with_arg(opcode: Opcode, argument: i64) -> Self {
        Message { opcode, argument }
    }

    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        let mut buf = [0u8; MESSAGE_LEN];
        buf[..8].copy_from_slice(&self.opcode.as_i64().to_le_bytes());
        buf[8..].copy_from_slice(&self.argument.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < MESSAGE_LEN {
            return Err(anyhow!("short datagram: {} bytes", buf.len()));
        }

        let raw_op = i64::from_le_bytes(buf[..8].try_into()?);
        let argument = i64::from_le_bytes(buf[8..MESSAGE_LEN].try_into()?);

        let opcode =
            Opcode::from_i64(raw_op).ok_or_else(|| anyhow!("unknown opcode: {raw_op}"))?;
        Ok(Message { opcode, argument })
    }
}

/// Deterministic per-user socket path. One server per user: a second
/// `start` finds the address occupied and backs off.
pub fn socket_path() -> PathBuf {
    if let Some(runtime) = dirs::runtime_dir() {
        return runtime.join("troubadour.sock");
    }

    let user = env::var("USER")
        .or_else(|_| env::var("LOGNAME"))
        .unwrap_or_else(|_| "default".to_string());
    env::temp_dir().join(format!("troubadour.{user}"))
}

/// Sibling of the socket path for the now-playing file. The suffix is
/// appended rather than swapped in for the extension, which would
/// clobber the per-user `troubadour.{user}` fallback name.
pub fn now_playing_path() -> PathBuf {
    let socket = socket_path();
    let mut name = socket.file_name().unwrap_or_default().to_os_string();
    name.push(".now");
    socket.with_file_name(name)
}

/// Bound server endpoint. Unlinks the socket path on drop so a crashed
/// predecessor's stale path never wedges the next start.
pub struct ServerSocket {
    socket: UnixDatagram,
    path: PathBuf,
}

impl ServerSocket {
    pub fn bind() -> Result<Self> {
        Self::bind_at(socket_path())
    }

    fn bind_at(path: PathBuf) -> Result<Self> {
        // A leftover path from an unclean shutdown would fail the bind.
        // Liveness was already probed via connect before we got here.
        let _ = fs::remove_file(&path);
        let socket = UnixDatagram::bind(&path)
            .with_context(|| format!("could not bind control socket {}", path.display()))?;
        Ok(ServerSocket { socket, path })
    }

    pub fn try_clone(&self) -> Result<UnixDatagram> {
        Ok(self.socket.try_clone()?)
    }

    /// Blocking read of one datagram. Malformed messages are dropped with
    /// a warning; only a socket-level failure is an error.
    pub fn recv_message(socket: &UnixDatagram) -> Result<Option<Message>> {
        let mut buf = [0u8; 64];
        let len = socket.recv(&mut buf)?;
        match Message::decode(&buf[..len]) {
            Ok(message) => Ok(Some(message)),
            Err(e) => {
                warn!("dropping malformed command: {e}");
                Ok(None)
            }
        }
    }
}

impl Drop for ServerSocket {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Client endpoint. Connecting doubles as the liveness probe; the
/// handshake that follows validates the channel end to end.
#[derive(Debug)]
pub struct ClientSocket {
    socket: UnixDatagram,
}

impl ClientSocket {
    pub fn connect() -> Result<Self> {
        Self::connect_to(&socket_path())
    }

    fn connect_to(path: &Path) -> Result<Self> {
        let socket = UnixDatagram::unbound()?;
        socket.connect(path).context("no server is running")?;

        let client = ClientSocket { socket };
        client.send(Message::new(Opcode::Handshake))?;
        Ok(client)
    }

    pub fn send(&self, message: Message) -> Result<()> {
        let buf = message.encode();
        let sent = self.socket.send(&buf)?;
        if sent != MESSAGE_LEN {
            return Err(anyhow!("partial command write: {sent} bytes"));
        }
        Ok(())
    }
}

/// True when another process already holds the per-user address.
pub fn server_is_running() -> bool {
    ClientSocket::connect().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_message_survives_the_wire() {
        let msg = Message::with_arg(Opcode::Add, 42);
        let decoded = Message::decode(&msg.encode()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn short_datagrams_are_rejected() {
        let msg = Message::new(Opcode::Stop);
        assert!(Message::decode(&msg.encode()[..15]).is_err());
        assert!(Message::decode(&[]).is_err());
    }

    #[test]
    fn unknown_opcodes_are_rejected() {
        let mut buf = [0u8; MESSAGE_LEN];
        buf[..8].copy_from_slice(&99i64.to_le_bytes());
        assert!(Message::decode(&buf).is_err());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut buf = [0u8; 32];
        buf[..MESSAGE_LEN].copy_from_slice(&Message::new(Opcode::Next).encode());
        let decoded = Message::decode(&buf).unwrap();
        assert_eq!(decoded.opcode, Opcode::Next);
    }

    #[test]
    fn handshake_then_command_over_a_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctl.sock");

        let server = ServerSocket::bind_at(path.clone()).unwrap();
        let client = ClientSocket::connect_to(&path).unwrap();

        // connect_to already pushed the handshake
        let socket = server.try_clone().unwrap();
        let hs = ServerSocket::recv_message(&socket).unwrap().unwrap();
        assert_eq!(hs.opcode, Opcode::Handshake);

        client.send(Message::with_arg(Opcode::Add, 7)).unwrap();
        let msg = ServerSocket::recv_message(&socket).unwrap().unwrap();
        assert_eq!(msg, Message::with_arg(Opcode::Add, 7));
    }

    #[test]
    fn connect_fails_without_a_server() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientSocket::connect_to(&dir.path().join("absent.sock")).unwrap_err();
        assert_eq!(err.to_string(), "no server is running");
        // The underlying io error stays in the chain for diagnosis.
        assert!(err.chain().any(|cause| cause.is::<std::io::Error>()));
    }

    #[test]
    fn now_playing_file_sits_next_to_the_socket() {
        let socket = socket_path();
        let now = now_playing_path();
        assert_eq!(now.parent(), socket.parent());

        // The full socket file name is kept, suffix appended. An
        // extension swap would truncate the `troubadour.{user}` form.
        let socket_name = socket.file_name().unwrap().to_string_lossy().into_owned();
        let now_name = now.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(now_name, format!("{socket_name}.now"));
    }

    #[test]
    fn stale_path_is_replaced_on_bind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctl.sock");
        std::fs::write(&path, b"stale").unwrap();

        let _server = ServerSocket::bind_at(path.clone()).unwrap();
        assert!(path.exists());
    }
}
