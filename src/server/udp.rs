use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::command::{Command, Request};
use super::error::ServerError;
use super::response::{self, HUH, LISTING_END};
use crate::catalog::{Catalog, Qth};
use crate::lock;
use crate::predict::quick::{quick_find, quick_predict};
use crate::predict::PredictError;
use crate::tracker::{SatSnapshot, SharedState};

/// Default port of the `predict` service.
pub const DEFAULT_PORT: u16 = 1210;

const MAX_DATAGRAM: usize = 1024;

type Listing = fn(&mut Catalog, &[String], i64) -> Result<Vec<String>, PredictError>;

/// What request handlers can see.
#[derive(Clone)]
pub struct ServerContext {
    pub catalog: Arc<Mutex<Catalog>>,
    pub shared: SharedState,
    pub qth: Qth,
}

impl ServerContext {
    pub fn new(catalog: Arc<Mutex<Catalog>>, shared: SharedState) -> Self {
        let qth = lock(&catalog).qth().clone();
        Self {
            catalog,
            shared,
            qth,
        }
    }
}

/// UDP server answering tracking clients from the shared snapshot table.
pub struct UdpServer {
    socket: Arc<UdpSocket>,
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl UdpServer {
    /// Bind to address and start serving.
    pub async fn start(addr: SocketAddr, ctx: ServerContext) -> io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let recv_socket = socket.clone();
        let join = tokio::spawn(async move {
            let mut buf = [0u8; MAX_DATAGRAM];
            loop {
                tokio::select! {
                    res = recv_socket.recv_from(&mut buf) => {
                        match res {
                            Ok((size, peer)) => {
                                handle(&recv_socket, &ctx, &buf[..size], peer).await
                            }
                            Err(e) => log::error!("UDP receive error: {}", e),
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        log::info!("UDP server shutting down");
                        break;
                    }
                }
            }
        });

        log::info!("UDP server listening on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            shutdown_tx,
            join,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.join.await;
    }
}

async fn handle(socket: &Arc<UdpSocket>, ctx: &ServerContext, data: &[u8], peer: SocketAddr) {
    let request = match Request::parse(data) {
        Ok(request) => request,
        Err(e) => {
            log::debug!("{}: {}", peer, e);
            send(socket, HUH, peer).await;
            return;
        }
    };
    log::debug!("{} {:?} from {}", request.command, request.argument, peer);

    let listing: Option<Listing> = match request.command {
        Command::GetSatPos => Some(quick_find as Listing),
        Command::Predict => Some(quick_predict as Listing),
        _ => None,
    };
    if let Some(listing) = listing {
        spawn_listing(socket.clone(), ctx.catalog.clone(), listing, request.arguments(), peer);
        return;
    }

    let body = reply(ctx, &request).unwrap_or_else(|e| {
        log::debug!("{}: {}", peer, e);
        HUH.to_string()
    });
    send(socket, &body, peer).await;
}

async fn send(socket: &UdpSocket, body: &str, peer: SocketAddr) -> bool {
    match socket.send_to(body.as_bytes(), peer).await {
        Ok(_) => true,
        Err(e) => {
            log::warn!("UDP send to {} failed: {}", peer, e);
            false
        }
    }
}

fn snapshot(ctx: &ServerContext, request: &Request) -> Result<SatSnapshot, ServerError> {
    let key = request.satellite();
    lock(&ctx.shared)
        .find(&key)
        .cloned()
        .ok_or(ServerError::UnknownSatellite(key))
}

/// Body of a single datagram reply.
fn reply(ctx: &ServerContext, request: &Request) -> Result<String, ServerError> {
    let now = Utc::now();
    let body = match request.command {
        Command::GetSat => response::sat(&snapshot(ctx, request)?),
        Command::GetDoppler => response::doppler(snapshot(ctx, request)?.doppler100),
        Command::GetTle => response::tle(&snapshot(ctx, request)?.tle),
        Command::GetList => {
            let shared = lock(&ctx.shared);
            response::list(shared.snapshots.iter().map(|s| s.name.as_str()))
        }
        Command::ReloadTle => {
            lock(&ctx.shared).reload_requested = true;
            log::info!("TLE reload requested");
            String::new()
        }
        Command::GetSun => response::sun(&lock(&ctx.shared).sun),
        Command::GetMoon => response::moon(&lock(&ctx.shared).moon),
        Command::GetMode => format!("{}\n", lock(&ctx.shared).mode_name()),
        Command::GetVersion => format!("{}\n", env!("CARGO_PKG_VERSION")),
        Command::GetQth => response::qth(&ctx.qth),
        Command::GetTime => response::time(&now),
        Command::GetTimeString => response::time_string(&now),
        // streamed by `spawn_listing`
        Command::GetSatPos | Command::Predict => {
            return Err(ServerError::UnknownCommand(request.command.to_string()))
        }
    };
    Ok(body)
}

/// Runs a listing on a blocking worker against a copy of the catalog and
/// streams it back one line per datagram, then the terminator.
fn spawn_listing(
    socket: Arc<UdpSocket>,
    catalog: Arc<Mutex<Catalog>>,
    listing: Listing,
    args: Vec<String>,
    peer: SocketAddr,
) {
    tokio::spawn(async move {
        let now = Utc::now().timestamp();
        let result = tokio::task::spawn_blocking(move || {
            let mut catalog = lock(&catalog).clone();
            listing(&mut catalog, &args, now)
        })
        .await;

        let lines = match result {
            Ok(Ok(lines)) => lines,
            Ok(Err(e)) => {
                log::warn!("listing for {}: {}", peer, e);
                Vec::new()
            }
            Err(e) => {
                log::error!("listing task failed: {}", e);
                Vec::new()
            }
        };

        for line in lines.iter().map(String::as_str).chain([LISTING_END]) {
            if !send(&socket, line, peer).await {
                return;
            }
        }
    });
}
