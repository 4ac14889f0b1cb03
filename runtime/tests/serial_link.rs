use std::time::Duration;

use loralink_runtime::{
    Endpoint,
    LinkConfig,
    SerialModem,
};
use tokio::io::{
    AsyncBufReadExt,
    AsyncWriteExt,
    BufReader,
    DuplexStream,
};

/// Stand-in for the radio module: `+OK` to every command, and for each data
/// packet sent to `peer`, a receive report acknowledging it.
async fn fake_modem(stream: DuplexStream, peer: u16) -> std::io::Result<Vec<String>> {
    let (r, mut w) = tokio::io::split(stream);
    let mut lines = BufReader::new(r).lines();
    let mut seen = vec![];

    while let Some(line) = lines.next_line().await? {
        w.write_all(b"+OK\r\n").await?;

        if let Some(rest) = line.strip_prefix(&format!("AT+SEND={},", peer)) {
            let data = rest.splitn(2, ',').nth(1).unwrap_or_default();
            let seq = data.split('|').next().unwrap_or_default();
            let ack = format!("ACK|{}", seq);

            w.write_all(format!("+RCV={},{},{},-40,9\r\n", peer, ack.len(), ack).as_bytes()).await?;
        }

        seen.push(line);
    }

    Ok(seen)
}

#[tokio::test(start_paused = true)]
async fn initialize_and_send_over_serial() -> eyre::Result<()> {
    let (local, remote) = tokio::io::duplex(4096);
    let modem_task = tokio::spawn(fake_modem(remote, 2));

    let (r, w) = tokio::io::split(local);
    let mut endpoint = Endpoint::new(SerialModem::new(r, w), LinkConfig::default());

    assert!(endpoint.initialize().await?);
    assert!(endpoint.send_packet("HELLO", true).await?);
    assert!(endpoint.send_packet("a,b|c", true).await?);

    drop(endpoint);

    let seen = modem_task.await??;
    assert_eq!(seen[..5], ["AT", "AT+ADDRESS=1", "AT+NETWORKID=6", "AT+BAND=915000000", "AT+PARAMETER=9,7,1,12"]);
    assert_eq!(seen[5], "AT+SEND=2,18,1|HELLO|3242484790");
    assert!(seen[6].starts_with("AT+SEND=2,"));
    assert!(seen[6].contains(",2|a,b|c|"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn noisy_ack_before_ok_is_kept() -> eyre::Result<()> {
    let (local, remote) = tokio::io::duplex(4096);
    let (remote_r, mut remote_w) = tokio::io::split(remote);

    let modem_task = tokio::spawn(async move {
        let mut lines = BufReader::new(remote_r).lines();
        let mut seen = vec![];

        while let Some(line) = lines.next_line().await? {
            if let Some(data) = line.strip_prefix("AT+SEND=2,").and_then(|rest| rest.splitn(2, ',').nth(1)) {
                let seq = data.split('|').next().unwrap_or_default();
                let ack = format!("ACK|{}", seq);

                remote_w.write_all(format!("\0+RCV=2,{},{},-40,9\r\n", ack.len(), ack).as_bytes()).await?;
            }

            remote_w.write_all(b"+OK\r\n").await?;
            seen.push(line);
        }

        Ok::<_, std::io::Error>(seen)
    });

    let (r, w) = tokio::io::split(local);
    let mut endpoint = Endpoint::new(SerialModem::new(r, w), LinkConfig::default());

    assert!(endpoint.send_packet("HELLO", true).await?);

    let stats = endpoint.stats();
    assert_eq!((stats.sent, stats.acked), (1, 1));

    drop(endpoint);

    assert_eq!(modem_task.await??, ["AT+SEND=2,18,1|HELLO|3242484790"]);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn receive_over_serial() -> eyre::Result<()> {
    let (local, remote) = tokio::io::duplex(4096);
    let (remote_r, mut remote_w) = tokio::io::split(remote);

    let (r, w) = tokio::io::split(local);
    let mut endpoint = Endpoint::new(SerialModem::new(r, w), LinkConfig {
        address: 2,
        peer: 1,
        ..Default::default()
    });

    remote_w.write_all(b"+RCV=1,18,5|HELLO|3242484790,-55,10\r\n").await?;

    let responder = tokio::spawn(async move {
        let mut lines = BufReader::new(remote_r).lines();
        let ack = lines.next_line().await?;
        remote_w.write_all(b"+OK\r\n").await?;

        Ok::<_, std::io::Error>(ack)
    });

    let payload = endpoint.receive_packet(Duration::from_secs(5)).await?;
    assert_eq!(payload.as_deref(), Some("HELLO"));

    assert_eq!(responder.await??.as_deref(), Some("AT+SEND=1,5,ACK|5"));
    assert_eq!(endpoint.stats().acks_sent, 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unplugged_modem_surfaces_fatal_error() {
    let (local, remote) = tokio::io::duplex(64);
    drop(remote);

    let (r, w) = tokio::io::split(local);
    let mut endpoint = Endpoint::new(SerialModem::new(r, w), LinkConfig::default());

    let err = endpoint.receive_packet(Duration::from_secs(1)).await.unwrap_err();
    assert!(err.is_fatal());
}
