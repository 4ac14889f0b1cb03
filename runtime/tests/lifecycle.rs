mod common;

use std::time::Duration;

use common::*;
use loralink_runtime::{
    health::COMMAND_STALENESS,
    Endpoint,
    Fault,
    Health,
    LinkConfig,
};

const INIT_SEQUENCE: [&str; 5] = ["AT", "AT+ADDRESS=1", "AT+NETWORKID=6", "AT+BAND=915000000", "AT+PARAMETER=9,7,1,12"];

#[tokio::test(start_paused = true)]
async fn initialize_configures_modem() -> eyre::Result<()> {
    let mut endpoint = sender(MockModem::new());

    assert!(endpoint.initialize().await?);
    assert_eq!(endpoint.transport().commands, INIT_SEQUENCE);
    assert_eq!(endpoint.health(), Health::Healthy);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn initialize_with_factory_reset() -> eyre::Result<()> {
    let mut endpoint = Endpoint::new(MockModem::new(), LinkConfig {
        factory_reset: true,
        ..Default::default()
    });

    assert!(endpoint.initialize().await?);
    assert_eq!(endpoint.transport().commands[0], "AT+FACTORY");
    assert_eq!(endpoint.transport().commands[1..], INIT_SEQUENCE);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn silent_modem_fails_init() -> eyre::Result<()> {
    let mut endpoint = sender(MockModem::with_responder(|_, _| None));

    for _ in 0..Fault::Init.threshold() {
        assert!(!endpoint.initialize().await?);
    }

    // liveness check fails before any configuration is attempted
    assert!(endpoint.transport().commands.iter().all(|c| c == "AT"));
    assert!(matches!(endpoint.health(), Health::Degraded(_)));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn rejected_parameter_fails_init() -> eyre::Result<()> {
    let modem = MockModem::with_responder(|command, _| {
        if command.starts_with("AT+PARAMETER") {
            return Some("+ERR=18".to_owned());
        }

        Some("+OK".to_owned())
    });

    let mut endpoint = sender(modem);

    assert!(!endpoint.initialize().await?);
    assert_eq!(endpoint.health_monitor().fault_count(Fault::Init), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn recover_resets_and_reconfigures() -> eyre::Result<()> {
    let mut endpoint = sender(MockModem::new());

    endpoint.send_packet("a", false).await?;
    endpoint.send_packet("b", true).await?;
    assert_eq!(endpoint.health_monitor().fault_count(Fault::NoAck), 3);

    endpoint.transport_mut().commands.clear();

    assert!(endpoint.recover().await?);

    let commands = &endpoint.transport().commands;
    assert_eq!(commands[..2], ["AT+FACTORY", "AT+RESET"]);
    assert_eq!(commands[2..], INIT_SEQUENCE);

    assert_eq!(endpoint.send_seq(), 0);
    assert_eq!(endpoint.last_received(), None);
    assert_eq!(endpoint.health_monitor().fault_count(Fault::NoAck), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn firmware_version_parsed() -> eyre::Result<()> {
    let modem = MockModem::with_responder(|command, _| match command {
        "AT+VER?" => Some("+VER=RYLR998_REYAX_V1.2.2".to_owned()),
        _ => Some("+OK".to_owned()),
    });

    let mut endpoint = sender(modem);

    assert_eq!(endpoint.firmware_version().await?.as_deref(), Some("RYLR998_REYAX_V1.2.2"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn idle_link_goes_stale() -> eyre::Result<()> {
    let mut endpoint = sender(MockModem::new());

    assert!(endpoint.initialize().await?);
    assert!(endpoint.health().is_healthy());

    tokio::time::advance(COMMAND_STALENESS + Duration::from_secs(1)).await;
    assert!(!endpoint.health().is_healthy());

    endpoint.send_packet("ping", false).await?;
    assert!(endpoint.health().is_healthy());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ping_refreshes_command_success() -> eyre::Result<()> {
    let mut endpoint = sender(MockModem::new());

    tokio::time::advance(COMMAND_STALENESS + Duration::from_secs(1)).await;
    assert!(!endpoint.health().is_healthy());

    assert!(endpoint.ping().await?);
    assert!(endpoint.health().is_healthy());
    assert_eq!(endpoint.transport().commands, ["AT"]);

    Ok(())
}
