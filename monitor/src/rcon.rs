//! Live game-server probe over the Source RCON protocol
//!
//! Wire format, all integers little-endian:
//!
//! ```text
//! i32 length | i32 request id | i32 type | body (ASCII) | 0x00 | 0x00
//! ```
//!
//! `length` counts everything after itself. The server answers a failed
//! login with request id -1.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::{ProbeError, ProbeResult};
use crate::probe::ApplicationProbe;
use crate::snapshot::{ApplicationReading, NOMINAL_TICK_RATE};

pub const SERVERDATA_AUTH: i32 = 3;
pub const SERVERDATA_AUTH_RESPONSE: i32 = 2;
pub const SERVERDATA_EXECCOMMAND: i32 = 2;
pub const SERVERDATA_RESPONSE_VALUE: i32 = 0;

/// Smallest legal length field: id + type + two terminators
const MIN_PACKET_LENGTH: i32 = 10;
const MAX_PACKET_LENGTH: i32 = 4096 * 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl Packet {
    pub fn new(id: i32, kind: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let body = self.body.as_bytes();
        let length = (body.len() + MIN_PACKET_LENGTH as usize) as i32;

        let mut buf = Vec::with_capacity(length as usize + 4);
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(&[0, 0]);
        buf
    }

    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> ProbeResult<()> {
        writer.write_all(&self.encode()).await?;
        writer.flush().await?;
        Ok(())
    }

    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> ProbeResult<Self> {
        let length = reader.read_i32_le().await?;
        if !(MIN_PACKET_LENGTH..=MAX_PACKET_LENGTH).contains(&length) {
            return Err(ProbeError::MalformedPacket {
                reason: format!("length {} out of range", length),
            });
        }

        let mut payload = vec![0u8; length as usize];
        reader.read_exact(&mut payload).await?;

        let id = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let kind = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);

        let body_bytes = &payload[8..];
        if body_bytes.len() < 2 || body_bytes[body_bytes.len() - 2..] != [0, 0] {
            return Err(ProbeError::MalformedPacket {
                reason: "missing body terminator".to_string(),
            });
        }
        let body = String::from_utf8_lossy(&body_bytes[..body_bytes.len() - 2]).into_owned();

        Ok(Self { id, kind, body })
    }
}

/// Authenticated RCON session over any byte stream
pub struct RconClient<S = TcpStream> {
    stream: S,
    next_id: i32,
}

impl RconClient<TcpStream> {
    pub async fn connect(address: &str, password: &str) -> ProbeResult<Self> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| ProbeError::ConnectionFailed {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        let mut client = RconClient::new(stream);
        client.authenticate(address, password).await?;
        Ok(client)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> RconClient<S> {
    pub fn new(stream: S) -> Self {
        Self { stream, next_id: 1 }
    }

    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = if self.next_id == i32::MAX { 1 } else { self.next_id + 1 };
        id
    }

    pub async fn authenticate(&mut self, address: &str, password: &str) -> ProbeResult<()> {
        let id = self.allocate_id();
        Packet::new(id, SERVERDATA_AUTH, password)
            .write_to(&mut self.stream)
            .await?;

        // Some servers send an empty RESPONSE_VALUE before the auth response.
        loop {
            let packet = Packet::read_from(&mut self.stream).await?;
            if packet.kind != SERVERDATA_AUTH_RESPONSE {
                continue;
            }
            if packet.id == -1 {
                return Err(ProbeError::AuthenticationFailed {
                    address: address.to_string(),
                });
            }
            if packet.id == id {
                return Ok(());
            }
        }
    }

    /// Execute a console command and return its (single packet) response
    pub async fn command(&mut self, command: &str) -> ProbeResult<String> {
        let id = self.allocate_id();
        Packet::new(id, SERVERDATA_EXECCOMMAND, command)
            .write_to(&mut self.stream)
            .await?;

        loop {
            let packet = Packet::read_from(&mut self.stream).await?;
            if packet.id == id && packet.kind == SERVERDATA_RESPONSE_VALUE {
                return Ok(packet.body);
            }
        }
    }
}

/// Drop `§x` formatting codes from a response
fn strip_color_codes(response: &str) -> String {
    let mut clean = String::with_capacity(response.len());
    let mut chars = response.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            clean.push(c);
        }
    }
    clean
}

fn player_counts() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"There are (\d+)(?: of a max(?: of)? |/)(\d+) players online").ok()
    })
    .as_ref()
}

fn decimal() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").ok()).as_ref()
}

/// Parse the `list` response into (online, max)
pub fn parse_player_list(response: &str) -> Option<(u32, u32)> {
    let clean = strip_color_codes(response);
    let caps = player_counts()?.captures(&clean)?;
    let online = caps.get(1)?.as_str().parse().ok()?;
    let max = caps.get(2)?.as_str().parse().ok()?;
    Some((online, max))
}

/// Parse the first tick rate out of a `tps` response.
///
/// Accepts both `TPS: 19.8` and Paper's
/// `TPS from last 1m, 5m, 15m: 19.8, 20.0, 20.0`.
pub fn parse_tick_rate(response: &str) -> Option<f64> {
    let clean = strip_color_codes(response);
    let start = clean.find("TPS")?;
    let rest = &clean[start..];
    let values = match rest.find(':') {
        Some(colon) => &rest[colon + 1..],
        None => &rest[3..],
    };
    let value: f64 = decimal()?.find(values)?.as_str().parse().ok()?;
    // Paper prefixes a capped value with '*'
    Some(value.min(NOMINAL_TICK_RATE))
}

/// Probe backed by a persistent RCON session.
///
/// The session is opened lazily and dropped on any error, so the next
/// status call reconnects. RCON does not expose uptime, chunk or entity
/// counts; those are reported as 0.
pub struct RconProbe {
    address: String,
    password: String,
    step_timeout: Duration,
    session: Mutex<Option<RconClient>>,
}

impl RconProbe {
    pub fn new(host: &str, port: u16, password: impl Into<String>, step_timeout: Duration) -> Self {
        Self {
            address: format!("{}:{}", host, port),
            password: password.into(),
            step_timeout,
            session: Mutex::new(None),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn bounded<T, F>(&self, fut: F) -> ProbeResult<T>
    where
        F: std::future::Future<Output = ProbeResult<T>>,
    {
        timeout(self.step_timeout, fut)
            .await
            .map_err(|_| ProbeError::Timeout {
                seconds: self.step_timeout.as_secs(),
            })?
    }

    async fn query(&self, session: &mut Option<RconClient>) -> ProbeResult<ApplicationReading> {
        if session.is_none() {
            let client = self
                .bounded(RconClient::connect(&self.address, &self.password))
                .await?;
            tracing::info!(address = %self.address, "RCON session established");
            *session = Some(client);
        }
        let client = session.as_mut().ok_or(ProbeError::NotConnected)?;

        let list = self.bounded(client.command("list")).await?;
        let (players_online, players_max) =
            parse_player_list(&list).ok_or_else(|| ProbeError::UnexpectedResponse {
                command: "list".to_string(),
                response: list.clone(),
            })?;

        let tps = self.bounded(client.command("tps")).await?;
        let tick_rate = parse_tick_rate(&tps).unwrap_or_else(|| {
            tracing::debug!(response = %tps, "Server does not report TPS, assuming nominal");
            NOMINAL_TICK_RATE
        });

        Ok(ApplicationReading {
            online: true,
            players_online,
            players_max,
            tick_rate,
            uptime_secs: 0,
            chunks_loaded: 0,
            entities: 0,
        })
    }
}

#[async_trait]
impl ApplicationProbe for RconProbe {
    async fn status(&self) -> ProbeResult<ApplicationReading> {
        let mut session = self.session.lock().await;
        let result = self.query(&mut session).await;
        if result.is_err() {
            *session = None;
        }
        result
    }

    fn name(&self) -> &str {
        "rcon"
    }
}
