//! End-to-end: raw bytes in through a provider, JSON out of the status endpoint

use piste_bridge::providers::ReplayProvider;
use piste_bridge::{IngestOptions, PisteConnection, spawn_status_server};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn lights(window: &[u8; 8]) -> Vec<u8> {
    let mut frame = vec![0x01, 0x14];
    frame.extend_from_slice(window);
    frame.push(0x04);
    frame
}

fn timer(status: u8, clock: &[u8; 8]) -> Vec<u8> {
    let mut frame = vec![0x01, 0x13, status, 0x02];
    frame.extend_from_slice(clock);
    frame.push(0x04);
    frame
}

async fn get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", path);
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    raw
}

fn json_body(raw: &str) -> serde_json::Value {
    let (_, body) = raw.split_once("\r\n\r\n").unwrap();
    serde_json::from_str(body).unwrap()
}

/// Poll the endpoint until the lights counter reaches `count`
async fn wait_for_lights(addr: SocketAddr, count: u64) -> serde_json::Value {
    for _ in 0..200 {
        let json = json_body(&get(addr, "/data.json").await);
        if json["m1_msg_counter"] == count {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("lights counter never reached {}", count);
}

#[tokio::test]
async fn serves_merged_state_over_http() {
    let (mut device, reader) = tokio::io::duplex(1024);
    let connection = PisteConnection::from_provider(
        ReplayProvider::from_reader(reader, "pipe"),
        IngestOptions::default(),
    );
    let server = spawn_status_server(
        "127.0.0.1:0".parse().unwrap(),
        "/data.json",
        connection.reader(),
        connection.cancel_token(),
    )
    .await
    .unwrap();
    let addr = server.local_addr();

    let empty = json_body(&get(addr, "/data.json").await);
    assert_eq!(empty, serde_json::json!({"m1_msg_counter": 0, "m2_msg_counter": 0, "m3_msg_counter": 0}));

    // Noise, an unrecognized frame, then two valid messages
    let mut bytes = vec![0xFF, 0x00, 0x01, 0x13, b'?', 0x04];
    bytes.extend(timer(b'R', b"02:45.1 "));
    bytes.extend(lights(b"R1G0W0w0"));
    device.write_all(&bytes).await.unwrap();

    let json = wait_for_lights(addr, 1).await;
    assert_eq!(json["m2_msg_counter"], 1);
    assert_eq!(json["m2_timer_status"], "R");
    assert_eq!(json["m2_timer_mmssdc"], "02:45.1 ");
    assert_eq!(json["m1_lights"], "R1G0W0w0");

    let raw = get(addr, "/data.json").await;
    let body = raw.split_once("\r\n\r\n").unwrap().1;
    assert!(body.starts_with("{\"m1_msg_counter\":1,\"m2_msg_counter\":1,\"m3_msg_counter\":0"));

    assert!(get(addr, "/health").await.ends_with("OK"));
    assert!(get(addr, "/nothing").await.starts_with("HTTP/1.1 404"));

    let stats = connection.shutdown().await.unwrap();
    assert_eq!(stats.decoded, 2);
    assert_eq!(stats.unrecognized, 1);
    server.stopped().await;
}

#[tokio::test]
async fn replayed_capture_leaves_final_state() {
    let dir = tempfile::tempdir().unwrap();
    let capture = dir.path().join("bout.bin");
    let log = dir.path().join("data_log.txt");

    let mut bytes = Vec::new();
    for window in [b"R0G0W0w0", b"R1G0W0w0", b"R1G1W0w0"] {
        bytes.extend(lights(window));
    }
    std::fs::write(&capture, &bytes).unwrap();

    let options = IngestOptions { diagnostic_log: Some(log.clone()), ..IngestOptions::default() };
    let mut connection = piste_bridge::PisteBridge::replay(&capture, options).await.unwrap();
    let stats = connection.join().await.unwrap();

    assert_eq!(stats.lights, 3);
    let snapshot = connection.snapshot();
    assert_eq!(snapshot.counters.lights, 3);
    assert_eq!(snapshot.to_json().unwrap(), concat!(
        r#"{"m1_msg_counter":3,"m2_msg_counter":0,"m3_msg_counter":0,"#,
        r#""m1_lights":"R1G1W0w0"}"#
    ));

    let logged = std::fs::read_to_string(&log).unwrap();
    assert_eq!(logged.matches("m1_lights").count(), 3);
    assert!(logged.contains(">>>R1G1W0w0<<<"));
}
