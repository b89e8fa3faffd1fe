// src/reload/server.rs

use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tiny_http::Server;
use tracing::{debug, info, warn};
use tungstenite::{Message, WebSocket};

use super::ReloadNotifier;
use super::client::RELOAD_MESSAGE;
use super::http::handle_request;
use crate::config::ServeSection;

/// Ports tried after the configured one is taken.
const MAX_PORT_RETRIES: u16 = 10;

/// Longest a single reload frame may block on a client.
const CLIENT_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Dev server plus reload socket. Both run on background threads for as
/// long as this value lives.
pub struct LiveReloadServer {
    http: Arc<Server>,
    http_addr: SocketAddr,
    ws_addr: SocketAddr,
    clients: Clients,
}

impl std::fmt::Debug for LiveReloadServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveReloadServer")
            .field("http_addr", &self.http_addr)
            .field("ws_addr", &self.ws_addr)
            .finish_non_exhaustive()
    }
}

impl LiveReloadServer {
    /// Serve `base_dir` on `[serve].host:port` and accept reload sockets on
    /// `reload_port`. Port 0 picks a free port.
    pub fn start(base_dir: impl Into<PathBuf>, serve: &ServeSection) -> Result<Self> {
        let base_dir = base_dir.into();
        let host: IpAddr = serve
            .host
            .parse()
            .with_context(|| format!("invalid [serve].host '{}'", serve.host))?;

        let listener = bind_ws_with_retry(host, serve.reload_port)?;
        let ws_addr = listener.local_addr()?;
        let clients: Clients = Arc::new(Mutex::new(Vec::new()));

        let (http, http_addr) = bind_http_with_retry(host, serve.port)?;
        let http = Arc::new(http);

        {
            let clients = Arc::clone(&clients);
            thread::Builder::new()
                .name("assetpipe-ws".into())
                .spawn(move || accept_loop(listener, clients))?;
        }

        {
            let http = Arc::clone(&http);
            let ws_port = ws_addr.port();
            thread::Builder::new()
                .name("assetpipe-http".into())
                .spawn(move || {
                    for request in http.incoming_requests() {
                        let url = request.url().to_string();
                        if let Err(err) = handle_request(request, &base_dir, ws_port) {
                            warn!(url = %url, error = %err, "request failed");
                        }
                    }
                    debug!("http request loop finished");
                })?;
        }

        info!(http = %http_addr, reload = %ws_addr, "dev server listening");

        Ok(Self {
            http,
            http_addr,
            ws_addr,
            clients,
        })
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn ws_addr(&self) -> SocketAddr {
        self.ws_addr
    }

    pub fn client_count(&self) -> usize {
        lock(&self.clients).len()
    }
}

impl ReloadNotifier for LiveReloadServer {
    fn notify(&self) -> usize {
        let mut clients = lock(&self.clients);
        clients.retain_mut(|ws| match ws.send(Message::Text(RELOAD_MESSAGE.to_string().into())) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "dropping reload client");
                false
            }
        });
        let reached = clients.len();
        info!(clients = reached, "reload broadcast");
        reached
    }
}

impl Drop for LiveReloadServer {
    fn drop(&mut self) {
        self.http.unblock();
    }
}

fn lock(clients: &Clients) -> MutexGuard<'_, Vec<WebSocket<TcpStream>>> {
    clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn accept_loop(listener: TcpListener, clients: Clients) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                debug!(error = %err, "reload socket accept failed");
                continue;
            }
        };
        // A client that stops reading must not hold up broadcasts.
        if let Err(err) = stream.set_write_timeout(Some(CLIENT_WRITE_TIMEOUT)) {
            debug!(error = %err, "could not set reload client write timeout");
        }
        match tungstenite::accept(stream) {
            Ok(ws) => {
                let mut clients = lock(&clients);
                clients.push(ws);
                debug!(total = clients.len(), "reload client connected");
            }
            Err(err) => debug!(error = %err, "reload handshake failed"),
        }
    }
}

fn port_candidates(base_port: u16) -> impl Iterator<Item = u16> {
    let tries = if base_port == 0 { 1 } else { MAX_PORT_RETRIES };
    (0..tries).map(move |offset| base_port.saturating_add(offset))
}

fn bind_ws_with_retry(host: IpAddr, base_port: u16) -> Result<TcpListener> {
    let mut last_err = None;
    for port in port_candidates(base_port) {
        match TcpListener::bind(SocketAddr::new(host, port)) {
            Ok(listener) => {
                if port != base_port {
                    info!(requested = base_port, port, "reload port in use; using another");
                }
                return Ok(listener);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(anyhow!(
        "failed to bind reload socket near port {base_port}: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}

fn bind_http_with_retry(host: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_err = String::new();
    for port in port_candidates(base_port) {
        match Server::http(SocketAddr::new(host, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(host, port));
                if port != base_port {
                    info!(requested = base_port, port, "http port in use; using another");
                }
                return Ok((server, addr));
            }
            Err(err) => last_err = err.to_string(),
        }
    }
    Err(anyhow!(
        "failed to bind http server near port {base_port}: {last_err}"
    ))
}
