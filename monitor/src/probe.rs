//! Application probes
//!
//! A probe reports the status of the monitored application (a game server).
//! The collector treats probe failures as a degraded reading and substitutes
//! [`ApplicationReading::placeholder`]; probes never stall the sampler beyond
//! their own timeouts.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, ProbeResult};
use crate::snapshot::ApplicationReading;

#[async_trait]
pub trait ApplicationProbe: Send + Sync {
    /// Current application status
    async fn status(&self) -> ProbeResult<ApplicationReading>;

    /// Short name used in log lines
    fn name(&self) -> &str;
}

/// Detailed server status as reported by the simulated server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub online: bool,
    pub players_online: u32,
    pub players_max: u32,
    pub player_names: Vec<String>,
    pub version: String,
    pub motd: String,
    pub tick_rate: f64,
}

/// Game server stand-in with fixed readings.
///
/// Mirrors a live RCON connection: it must be connected before it reports
/// status, and it answers the `list` and `tps` console commands.
pub struct SimulatedGameServer {
    address: String,
    connected: AtomicBool,
}

impl SimulatedGameServer {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connected: AtomicBool::new(false),
        }
    }

    /// Create an already connected server
    pub fn connected(address: impl Into<String>) -> Self {
        let server = Self::new(address);
        server.connect();
        server
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn connect(&self) -> bool {
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!(address = %self.address, "Simulated game server connected");
        true
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn server_status(&self) -> ProbeResult<ServerStatus> {
        self.ensure_connected()?;
        Ok(ServerStatus {
            online: true,
            players_online: 12,
            players_max: 20,
            player_names: vec![
                "Player1".to_string(),
                "Player2".to_string(),
                "Player3".to_string(),
            ],
            version: "1.20.1".to_string(),
            motd: "SparkPanel Minecraft Server".to_string(),
            tick_rate: 19.8,
        })
    }

    /// Run a console command against the simulated server
    pub fn send_command(&self, command: &str) -> ProbeResult<String> {
        self.ensure_connected()?;
        let response = match command.trim() {
            "list" => {
                "There are 12 of a max 20 players online: Player1, Player2, Player3".to_string()
            }
            "tps" => "TPS: 19.8".to_string(),
            other => format!("Command '{}' executed", other),
        };
        Ok(response)
    }

    fn ensure_connected(&self) -> ProbeResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ProbeError::NotConnected)
        }
    }
}

#[async_trait]
impl ApplicationProbe for SimulatedGameServer {
    async fn status(&self) -> ProbeResult<ApplicationReading> {
        let status = self.server_status()?;
        Ok(ApplicationReading {
            online: status.online,
            players_online: status.players_online,
            players_max: status.players_max,
            tick_rate: status.tick_rate,
            uptime_secs: 3600,
            chunks_loaded: 1250,
            entities: 450,
        })
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
