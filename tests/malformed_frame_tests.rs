use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::time::Duration;
use xiangqi_sync::transport::tcp::{read_frame, write_frame};
use xiangqi_sync::{GameId, Message, Square, TcpTransport, Transport, PROTOCOL_VERSION};

const MAX: u32 = 10_000_000;

/// Accept one connection, write `bytes` raw, then hold the socket briefly.
async fn serve_raw(bytes: Vec<u8>) -> anyhow::Result<(TcpTransport, tokio::task::JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(&bytes).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    });
    Ok((TcpTransport::connect(addr).await?, server))
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_length_prefix_is_refused() -> anyhow::Result<()> {
    let (mut transport, server) = serve_raw(vec![0xFF, 0xFF, 0xFF, 0xFF]).await?;
    let err = transport.recv().await.unwrap_err();
    assert!(err.to_string().contains("too large"));
    server.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn truncated_frame_fails() -> anyhow::Result<()> {
    let mut bytes = 100u32.to_be_bytes().to_vec();
    bytes.extend_from_slice(&[0u8; 10]);
    let (mut transport, server) = serve_raw(bytes).await?;
    let result = tokio::time::timeout(Duration::from_secs(2), transport.recv()).await;
    assert!(result.is_err() || result.unwrap().is_err());
    server.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn garbage_payload_fails_to_decode() -> anyhow::Result<()> {
    let garbage = vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
    let mut bytes = (garbage.len() as u32).to_be_bytes().to_vec();
    bytes.extend_from_slice(&garbage);
    let (mut transport, server) = serve_raw(bytes).await?;
    let err = transport.recv().await.unwrap_err();
    assert!(err.to_string().contains("Deserialization error"));
    server.await?;
    Ok(())
}

#[tokio::test]
async fn off_board_square_is_rejected_on_decode() -> anyhow::Result<()> {
    let msg = Message::LegalMovesFor {
        version: PROTOCOL_VERSION,
        seq: 1,
        game_id: GameId("g".into()),
        square: Square::new(9, 8).unwrap(),
    };
    let mut body = bincode::serialize(&msg)?;
    // the square is the trailing (row, col) pair
    let n = body.len();
    body[n - 2] = 12;
    body[n - 1] = 3;

    let (mut a, mut b) = tokio::io::duplex(1024);
    a.write_all(&(body.len() as u32).to_be_bytes()).await?;
    a.write_all(&body).await?;
    let err = read_frame(&mut b, MAX).await.unwrap_err();
    assert!(err.to_string().contains("Deserialization error"));
    Ok(())
}

#[tokio::test]
async fn frames_larger_than_the_limit_are_not_written() {
    let (mut a, _b) = tokio::io::duplex(1024);
    let msg = Message::ErrorResp {
        version: PROTOCOL_VERSION,
        seq: 0,
        reason: "x".repeat(256),
    };
    let err = write_frame(&mut a, &msg, 64).await.unwrap_err();
    assert!(err.to_string().contains("too large"));
}

#[tokio::test(flavor = "multi_thread")]
async fn shut_down_transport_refuses_traffic() -> anyhow::Result<()> {
    let (mut transport, server) = serve_raw(Vec::new()).await?;
    transport.shutdown();
    assert!(transport.is_shutdown());
    let err = transport
        .send(Message::FetchState {
            version: PROTOCOL_VERSION,
            seq: 0,
            game_id: GameId("g".into()),
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("shut down"));
    server.await?;
    Ok(())
}
