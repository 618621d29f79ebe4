//! End-to-end session tests against a scripted mock device.
//!
//! The mock listens on a loopback TCP port, plays a greeting, then answers
//! each expected command line with a canned response, the way a Telnet VTY
//! line would.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use l2probe::config::TelnetConfig;
use l2probe::error::Error;
use l2probe::transport::telnet::TelnetTransport;
use l2probe::transport::{DeviceMode, Transport};

struct MockDevice {
    port: u16,
    handle: JoinHandle<()>,
}

/// Spawns a one-connection mock that sends `greeting`, then for each
/// `(expect, respond)` step waits for that exact command line and replies.
/// Bare newlines (wake-up nudges) between steps are ignored.
async fn mock_device(greeting: &'static str, steps: Vec<(&'static str, &'static str)>) -> MockDevice {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        serve(socket, greeting, steps).await;
    });

    MockDevice { port, handle }
}

async fn serve(socket: TcpStream, greeting: &str, steps: Vec<(&str, &str)>) {
    let (read_half, mut write_half) = socket.into_split();
    write_half.write_all(greeting.as_bytes()).await.unwrap();
    write_half.flush().await.unwrap();

    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    for (expect, respond) in steps {
        loop {
            line.clear();
            let n = reader.read_line(&mut line).await.unwrap();
            assert!(n > 0, "client closed while waiting for {expect:?}");
            let got = line.trim_end();
            if got == expect {
                break;
            }
            assert!(got.is_empty(), "expected {expect:?}, got {got:?}");
        }
        write_half.write_all(respond.as_bytes()).await.unwrap();
        write_half.flush().await.unwrap();
    }

    // Absorb teardown commands until the client hangs up.
    let mut rest = Vec::new();
    let _ = reader.read_to_end(&mut rest).await;
}

fn telnet_config(port: u16, password: Option<&str>, timeout: u64) -> TelnetConfig {
    TelnetConfig {
        host: "127.0.0.1".to_string(),
        username: None,
        password: password.map(str::to_string),
        port,
        timeout,
    }
}

#[tokio::test]
async fn full_session_with_password_and_enable() {
    let mock = mock_device(
        "\r\nUser Access Verification\r\n\r\nPassword: ",
        vec![
            ("cisco", "\r\nSwitch>"),
            ("enable", "\r\nPassword: "),
            ("cisco", "\r\nSwitch#"),
            ("terminal length 0", "terminal length 0\r\nSwitch#"),
            ("terminal width 0", "terminal width 0\r\nSwitch#"),
            (
                "show vlan brief",
                "show vlan brief\r\nVLAN Name     Status\r\n1    default  active\r\nSwitch#",
            ),
            (
                "configure terminal",
                "configure terminal\r\nEnter configuration commands, one per line.\r\nSwitch(config)#",
            ),
            ("vlan 10", "vlan 10\r\nSwitch(config-vlan)#"),
            ("router ospf 1", "router ospf 1\r\nSwitch(config-router)#"),
            ("end", "end\r\nSwitch#"),
        ],
    )
    .await;

    let mut transport = TelnetTransport::new(telnet_config(mock.port, Some("cisco"), 5));
    transport.connect().await.unwrap();
    assert!(transport.is_connected());
    assert_eq!(transport.mode(), Some(DeviceMode::Enable));

    let output = transport.send_command("show vlan brief").await.unwrap();
    assert!(output.contains("1    default  active"));
    assert!(!output.contains("Switch#"));
    assert!(!output.contains("show vlan brief"));

    transport.send_command("configure terminal").await.unwrap();
    assert_eq!(transport.mode(), Some(DeviceMode::Config));

    let output = transport.send_command("vlan 10").await.unwrap();
    assert!(output.is_empty());
    assert_eq!(transport.mode(), Some(DeviceMode::Config));

    // Submodes outside the fixed prompt set keep the session in
    // configuration mode.
    let output = transport.send_command("router ospf 1").await.unwrap();
    assert!(output.is_empty());
    assert_eq!(transport.mode(), Some(DeviceMode::Config));

    transport.send_command("end").await.unwrap();
    assert_eq!(transport.mode(), Some(DeviceMode::Enable));

    transport.disconnect().await;
    assert!(!transport.is_connected());
    mock.handle.await.unwrap();
}

#[tokio::test]
async fn session_tolerates_missing_enable_mode() {
    // The device never grants privileged mode; the session falls back to
    // user mode and still runs commands.
    let mock = mock_device(
        "\r\nSwitch>",
        vec![
            ("enable", "\r\nSwitch>"),
            ("terminal length 0", "terminal length 0\r\nSwitch>"),
            ("terminal width 0", "terminal width 0\r\nSwitch>"),
            ("show clock", "show clock\r\n*00:01:02.003 UTC\r\nSwitch>"),
        ],
    )
    .await;

    let mut transport = TelnetTransport::new(telnet_config(mock.port, None, 1));
    transport.connect().await.unwrap();
    assert_eq!(transport.mode(), Some(DeviceMode::User));

    let output = transport.send_command("show clock").await.unwrap();
    assert!(output.contains("00:01:02.003 UTC"));

    transport.disconnect().await;
    mock.handle.await.unwrap();
}

#[tokio::test]
async fn open_line_with_press_return_banner() {
    // No credentials configured at all; the device wants a RETURN first.
    let mock = mock_device(
        "\r\nPress RETURN to get started.\r\n",
        vec![
            // First empty line is the connect nudge, second answers the
            // banner.
            ("", ""),
            ("", "\r\nSwitch>"),
            ("enable", "\r\nSwitch#"),
            ("terminal length 0", "terminal length 0\r\nSwitch#"),
            ("terminal width 0", "terminal width 0\r\nSwitch#"),
        ],
    )
    .await;

    let mut transport = TelnetTransport::new(telnet_config(mock.port, None, 5));
    transport.connect().await.unwrap();
    assert_eq!(transport.mode(), Some(DeviceMode::Enable));

    transport.disconnect().await;
    mock.handle.await.unwrap();
}

#[tokio::test]
async fn password_prompt_without_configured_password_gets_bare_newline() {
    // A line that asks for a password the configuration does not have is
    // answered with a bare newline; an open line accepts it.
    let mock = mock_device(
        "\r\nUser Access Verification\r\n\r\nPassword: ",
        vec![
            // First empty line is the connect nudge, second is the bare
            // newline sent for the password.
            ("", ""),
            ("", "\r\nSwitch>"),
            ("enable", "\r\nSwitch#"),
            ("terminal length 0", "terminal length 0\r\nSwitch#"),
            ("terminal width 0", "terminal width 0\r\nSwitch#"),
        ],
    )
    .await;

    let mut transport = TelnetTransport::new(telnet_config(mock.port, None, 5));
    transport.connect().await.unwrap();
    assert_eq!(transport.mode(), Some(DeviceMode::Enable));

    transport.disconnect().await;
    mock.handle.await.unwrap();
}

#[tokio::test]
async fn send_before_connect_is_not_connected() {
    let mut transport = TelnetTransport::new(telnet_config(9, None, 1));
    let err = transport.send_command("show version").await.unwrap_err();
    assert!(matches!(err, Error::NotConnected));
}

#[tokio::test]
async fn disconnect_without_connection_is_a_no_op() {
    let mut transport = TelnetTransport::new(telnet_config(9, None, 1));
    transport.disconnect().await;
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn connect_to_closed_port_fails_with_connect_error() {
    // Bind then drop a listener so the port is closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut transport = TelnetTransport::new(telnet_config(port, None, 1));
    let err = transport.connect().await.unwrap_err();
    assert!(matches!(err, Error::Connect(_)));
    assert!(!transport.is_connected());
}
