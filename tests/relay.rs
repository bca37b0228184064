//! End-to-end relay behaviour over loopback TCP

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use chat_relay::{ChatServer, ConnectionId, ServerConfig};

const TIMEOUT: Duration = Duration::from_secs(5);

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }

    async fn recv(&mut self) -> String {
        let mut line = String::new();
        tokio::time::timeout(TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a line")
            .unwrap();
        line
    }

    async fn expect_silence(&mut self) {
        let mut line = String::new();
        let result =
            tokio::time::timeout(Duration::from_millis(200), self.reader.read_line(&mut line)).await;
        assert!(result.is_err(), "unexpected data: {:?}", line);
    }
}

async fn start() -> (Arc<ChatServer>, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(ChatServer::new(ServerConfig::default()));

    let handle = Arc::clone(&server);
    tokio::spawn(async move {
        let _ = handle.serve(listener).await;
    });

    (server, addr)
}

async fn wait_for_count(server: &ChatServer, expected: usize) {
    tokio::time::timeout(TIMEOUT, async {
        while server.registry().len().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("registry never reached expected size");
}

#[tokio::test]
async fn test_three_client_scenario() {
    let (server, addr) = start().await;

    let mut c1 = Client::connect(addr).await;
    c1.send("one\r\n").await;
    assert_eq!(c1.recv().await, "Welcome. Your Client Id is: 1\r\n");

    let mut c2 = Client::connect(addr).await;
    c2.send("two\r\n").await;
    assert_eq!(c2.recv().await, "Welcome. Your Client Id is: 2\r\n");
    assert_eq!(c1.recv().await, "[Client 2] two\r\n");
    assert_eq!(c1.recv().await, "[Client 2] Is now connected\r\n");

    let mut c3 = Client::connect(addr).await;
    c3.send("three\r\n").await;
    assert_eq!(c3.recv().await, "Welcome. Your Client Id is: 3\r\n");
    for peer in [&mut c1, &mut c2] {
        assert_eq!(peer.recv().await, "[Client 3] three\r\n");
        assert_eq!(peer.recv().await, "[Client 3] Is now connected\r\n");
    }

    c2.send("hi\r\n").await;
    assert_eq!(c1.recv().await, "[Client 2] hi\r\n");
    assert_eq!(c3.recv().await, "[Client 2] hi\r\n");
    c2.expect_silence().await;

    drop(c2);
    assert_eq!(c1.recv().await, "[Client 2] Closed connection\r\n");
    assert_eq!(c3.recv().await, "[Client 2] Closed connection\r\n");
    wait_for_count(&server, 2).await;
    assert!(!server.registry().contains(ConnectionId::new(2)).await);

    c3.send("bye\r\n").await;
    assert_eq!(c1.recv().await, "[Client 3] bye\r\n");
    c3.expect_silence().await;
}

#[tokio::test]
async fn test_suppressed_chunks_are_not_relayed() {
    let (_server, addr) = start().await;

    let mut listener = Client::connect(addr).await;
    listener.send("here\r\n").await;
    assert_eq!(listener.recv().await, "Welcome. Your Client Id is: 1\r\n");

    let mut talker = Client::connect(addr).await;

    // Telnet negotiation: no welcome, nothing relayed
    talker
        .writer
        .write_all(&[0xFF, 0xFB, 0x18, 0xFF, 0xFB, 0x1F])
        .await
        .unwrap();
    talker.expect_silence().await;
    listener.expect_silence().await;

    // Arrow key escape sequence
    talker.send("\x1b[A").await;
    talker.expect_silence().await;
    listener.expect_silence().await;

    talker.send("real text\r\n").await;
    assert_eq!(talker.recv().await, "Welcome. Your Client Id is: 2\r\n");
    assert_eq!(listener.recv().await, "[Client 2] real text\r\n");
    assert_eq!(listener.recv().await, "[Client 2] Is now connected\r\n");
}

#[tokio::test]
async fn test_ids_keep_increasing_after_disconnects() {
    let (server, addr) = start().await;

    for expected in 1..=3u64 {
        let mut client = Client::connect(addr).await;
        client.send("ping\r\n").await;
        assert_eq!(
            client.recv().await,
            format!("Welcome. Your Client Id is: {}\r\n", expected)
        );
        drop(client);
        wait_for_count(&server, 0).await;
    }
}
