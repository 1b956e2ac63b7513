use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sparkpanel_monitor::rcon::{
    Packet, SERVERDATA_AUTH, SERVERDATA_AUTH_RESPONSE, SERVERDATA_EXECCOMMAND,
    SERVERDATA_RESPONSE_VALUE,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct FakeRconOptions {
    pub password: String,
    pub responses: HashMap<String, String>,
    /// Accept commands but never answer them
    pub stall_commands: bool,
}

impl Default for FakeRconOptions {
    fn default() -> Self {
        let mut responses = HashMap::new();
        responses.insert(
            "list".to_string(),
            "There are 7 of a max of 30 players online: alex, steve".to_string(),
        );
        responses.insert(
            "tps".to_string(),
            "§6TPS from last 1m, 5m, 15m: §a19.5, §a19.9, §a20.0".to_string(),
        );
        Self {
            password: "hunter2".to_string(),
            responses,
            stall_commands: false,
        }
    }
}

/// Minimal RCON server on an ephemeral localhost port
pub struct FakeRconServer {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    commands: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl FakeRconServer {
    pub async fn start(options: FakeRconOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let connections = Arc::new(AtomicUsize::new(0));
        let commands = Arc::new(AtomicUsize::new(0));

        let options = Arc::new(options);
        let conn_counter = connections.clone();
        let cmd_counter = commands.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                conn_counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(stream, options.clone(), cmd_counter.clone()));
            }
        });

        Ok(Self {
            addr,
            connections,
            commands,
            handle,
        })
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }
}

impl Drop for FakeRconServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(mut stream: TcpStream, options: Arc<FakeRconOptions>, commands: Arc<AtomicUsize>) {
    let mut authenticated = false;

    while let Ok(packet) = Packet::read_from(&mut stream).await {
        match packet.kind {
            SERVERDATA_AUTH => {
                if packet.body == options.password {
                    authenticated = true;
                    // Real servers send an empty value packet ahead of the auth result
                    let empty = Packet::new(packet.id, SERVERDATA_RESPONSE_VALUE, "");
                    let ok = Packet::new(packet.id, SERVERDATA_AUTH_RESPONSE, "");
                    if empty.write_to(&mut stream).await.is_err()
                        || ok.write_to(&mut stream).await.is_err()
                    {
                        return;
                    }
                } else {
                    let _ = Packet::new(-1, SERVERDATA_AUTH_RESPONSE, "")
                        .write_to(&mut stream)
                        .await;
                    return;
                }
            }
            SERVERDATA_EXECCOMMAND if authenticated => {
                commands.fetch_add(1, Ordering::SeqCst);
                if options.stall_commands {
                    std::future::pending::<()>().await;
                }
                let body = options
                    .responses
                    .get(packet.body.trim())
                    .cloned()
                    .unwrap_or_else(|| "Unknown or incomplete command".to_string());
                if Packet::new(packet.id, SERVERDATA_RESPONSE_VALUE, body)
                    .write_to(&mut stream)
                    .await
                    .is_err()
                {
                    return;
                }
            }
            _ => return,
        }
    }
}
