//! The tracker and the UDP server running together, driven by a client
//! socket the way tracking clients talk to the service.

use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sat_predict::catalog::{Catalog, CatalogPaths};
use sat_predict::server::{ServerContext, UdpServer};
use sat_predict::tracker::{Shared, Tracker, TrackerMode};
use tempfile::TempDir;
use tokio::net::UdpSocket;
use tokio::time::timeout;

const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

fn load_station() -> (TempDir, Catalog) {
    let dir = tempfile::tempdir().unwrap();
    let paths = CatalogPaths {
        tle: dir.path().join("predict.tle"),
        qth: dir.path().join("predict.qth"),
        db: None,
    };
    fs::write(&paths.qth, "W1AW\n41.714775\n72.727260\n25\n").unwrap();
    fs::write(
        &paths.tle,
        format!("ISS\n{ISS_LINE1}\n{ISS_LINE2}\nZARYA\n{ISS_LINE1}\n{ISS_LINE2}\n"),
    )
    .unwrap();
    let catalog = Catalog::load(paths).unwrap();
    (dir, catalog)
}

async fn ask(client: &UdpSocket, request: &str) -> String {
    client.send(request.as_bytes()).await.unwrap();
    let mut buf = [0u8; 1024];
    let size = timeout(Duration::from_secs(10), client.recv(&mut buf))
        .await
        .expect("no reply")
        .unwrap();
    String::from_utf8_lossy(&buf[..size]).into_owned()
}

#[tokio::test]
async fn tracked_satellites_are_served() {
    let (_dir, catalog) = load_station();
    let shared = Arc::new(Mutex::new(Shared::new(&catalog)));
    let catalog = Arc::new(Mutex::new(catalog));

    let mut tracker = Tracker::new(catalog.clone(), shared.clone(), Duration::from_millis(20));
    tracker.start(TrackerMode::Multi).unwrap();

    let server = UdpServer::start(
        "127.0.0.1:0".parse().unwrap(),
        ServerContext::new(catalog, shared),
    )
    .await
    .unwrap();
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.connect(server.local_addr().unwrap()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(ask(&client, "GET_LIST\n").await, "ISS\nZARYA\n");
    assert_eq!(ask(&client, "GET_MODE\n").await, "MULTI\n");
    assert_eq!(ask(&client, "GET_QTH\n").await, "W1AW\n41.7148\n72.7273\n25\n");

    let reply = ask(&client, "GET_SAT ZARYA\n").await;
    let lines: Vec<&str> = reply.lines().collect();
    assert_eq!(lines.len(), 15);
    assert_eq!(lines[0], "ZARYA");
    let azimuth: f64 = lines[3].trim().parse().unwrap();
    let elevation: f64 = lines[4].trim().parse().unwrap();
    assert!((0.0..=360.0).contains(&azimuth));
    assert!((-90.0..=90.0).contains(&elevation));

    let sun = ask(&client, "GET_SUN\n").await;
    let sun_elevation: f64 = sun.lines().nth(1).unwrap().trim().parse().unwrap();
    assert!((-90.0..=90.0).contains(&sun_elevation));

    assert_eq!(ask(&client, "GET_SAT\n").await, "Huh?\n");

    server.shutdown().await;
    tracker.stop().await;
    assert!(!tracker.is_running());
}

#[tokio::test]
async fn single_mode_reports_the_tracked_name() {
    let (_dir, catalog) = load_station();
    let shared = Arc::new(Mutex::new(Shared::new(&catalog)));
    let catalog = Arc::new(Mutex::new(catalog));

    let mut tracker = Tracker::new(catalog.clone(), shared.clone(), Duration::from_millis(20));
    tracker.start(TrackerMode::Single("ZARYA".into())).unwrap();

    let server = UdpServer::start(
        "127.0.0.1:0".parse().unwrap(),
        ServerContext::new(catalog, shared),
    )
    .await
    .unwrap();
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.connect(server.local_addr().unwrap()).await.unwrap();

    assert_eq!(ask(&client, "GET_MODE\n").await, "ZARYA\n");

    server.shutdown().await;
    tracker.stop().await;
    assert_eq!(tracker.shared().lock().unwrap().mode_name(), "NONE");
}
