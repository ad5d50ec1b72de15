#![cfg(unix)]

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serialpeer::frame::{
    build, checksum, decode_frame, encode, parse, FrameError, InputState, SetupCommand,
    HEADER_SIZE, SETUP, SETUP_PAYLOAD_LEN,
};
use serialpeer::session::{ExchangeConfig, Session, SessionConfig, SessionError};

// Reply ids picked for the simulated peer. The firmware's own numbering is
// not part of this crate, so nothing here depends on the real values.
const ACK: u8 = 0x03;
const ERROR: u8 = 0x04;
const TXT: u8 = 0x05;
const INPUTS: u8 = 0x06;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn session_pair() -> (Session<UnixStream>, UnixStream) {
    let (left, right) = UnixStream::pair().expect("socket pair should open");
    let config = SessionConfig {
        settle_delay: Duration::from_millis(1),
        resync_on_open: true,
        ..SessionConfig::default()
    };
    let session = Session::open_channel(left, config).expect("session should open");
    (session, right)
}

fn read_delimited(stream: &mut UnixStream) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte) {
            Ok(0) | Err(_) => return None,
            Ok(_) if byte[0] == 0 => return Some(body),
            Ok(_) => body.push(byte[0]),
        }
    }
}

fn wire(command_id: u8, payload: &[u8]) -> Vec<u8> {
    let raw = build(command_id, payload).expect("reply should build");
    encode(&raw).expect("reply should encode").to_vec()
}

fn send_reply(stream: &mut UnixStream, command_id: u8, payload: &[u8]) {
    stream
        .write_all(&wire(command_id, payload))
        .expect("reply should write");
}

/// Simulated peer following the firmware's reply rules: setup frames are
/// acknowledged, a setup of the wrong size gets a text reply and then an
/// error, frames with a bad length or checksum get a text error, lone
/// delimiters and one-byte messages are ignored.
fn spawn_firmware(mut stream: UnixStream, replies: usize) -> JoinHandle<Vec<SetupCommand>> {
    thread::spawn(move || {
        let mut received = Vec::new();
        let mut answered = 0;
        while answered < replies {
            let Some(body) = read_delimited(&mut stream) else {
                break;
            };
            let Ok(raw) = decode_frame(&body) else {
                continue;
            };
            if raw.len() <= 1 {
                continue;
            }

            let stated = raw.get(1).copied().unwrap_or(0) as usize;
            let payload = raw.get(HEADER_SIZE..).unwrap_or(&[]);
            if raw.len() < HEADER_SIZE || payload.len() != stated {
                let text = format!(" # LENGHT ERROR / header.length: {stated} / len: {}", raw.len());
                send_reply(&mut stream, ERROR, text.as_bytes());
            } else if checksum(payload) != raw[2] {
                let text = format!(
                    " # CRC ERROR / header.crc: {} / calc crc: {}",
                    raw[2],
                    checksum(payload)
                );
                send_reply(&mut stream, ERROR, text.as_bytes());
            } else if raw[0] == SETUP && payload.len() == SETUP_PAYLOAD_LEN {
                received.push(SetupCommand::from_payload(payload).expect("setup should decode"));
                send_reply(&mut stream, ACK, &[]);
            } else if raw[0] == SETUP {
                // Both replies leave in one write, as the firmware emits them
                // back to back.
                let text = format!(" # LENGHT ERROR / header.length: {stated} / len: {}", raw.len());
                let mut both = wire(TXT, b" test \0");
                both.extend(wire(ERROR, text.as_bytes()));
                stream.write_all(&both).expect("replies should write");
            } else {
                let text = format!(" # UNKNOWN PACKET ERROR / header.type: {}", raw[0]);
                send_reply(&mut stream, ERROR, text.as_bytes());
            }
            answered += 1;
        }
        received
    })
}

#[test]
fn setup_command_is_acknowledged() {
    init_tracing();
    let (mut session, peer) = session_pair();
    let firmware = spawn_firmware(peer, 1);

    let setup = SetupCommand {
        pulse_hz: 30,
        pulse_limit: 900,
        delay_us: 2_000_000,
    };
    let reply = session
        .exchange(SETUP, &setup.to_payload(), &ExchangeConfig::default())
        .expect("exchange should succeed");

    assert_eq!(reply.command_id, ACK);
    assert!(reply.payload.is_empty());

    session.close();
    assert_eq!(firmware.join().expect("firmware thread"), vec![setup]);
}

#[test]
fn unknown_command_gets_text_error_reply() {
    init_tracing();
    let (mut session, peer) = session_pair();
    let firmware = spawn_firmware(peer, 1);

    let config = ExchangeConfig {
        max_attempts: 5,
        per_attempt_timeout: Duration::from_millis(200),
    };
    let reply = session
        .exchange(0x42, b"hi", &config)
        .expect("exchange should succeed");

    assert_eq!(reply.command_id, ERROR);
    assert!(reply.payload_text().contains("UNKNOWN PACKET ERROR / header.type: 66"));

    session.close();
    assert!(firmware.join().expect("firmware thread").is_empty());
}

#[test]
fn peer_reports_bad_checksum() {
    init_tracing();
    let (mut session, peer) = session_pair();
    let firmware = spawn_firmware(peer, 1);

    // Hand-built setup frame whose header checksum is off by one.
    let mut raw = build(SETUP, &SetupCommand::default().to_payload())
        .expect("frame should build")
        .to_vec();
    raw[2] = 0x01;
    session
        .send(&encode(&raw).expect("frame should encode"))
        .expect("send should succeed");

    let body = session
        .receive_until_delimiter(Duration::from_secs(2))
        .expect("receive should succeed")
        .expect("peer should answer");
    let reply = parse(&decode_frame(&body).expect("reply should decode")).expect("reply should parse");

    assert_eq!(reply.command_id, ERROR);
    assert_eq!(
        reply.payload_text(),
        " # CRC ERROR / header.crc: 1 / calc crc: 0"
    );

    session.close();
    let _ = firmware.join();
}

#[test]
fn garbage_before_reply_is_skipped() {
    init_tracing();
    let (mut session, mut peer) = session_pair();

    let noisy = thread::spawn(move || {
        let _ = read_delimited(&mut peer); // resync delimiter
        let _ = read_delimited(&mut peer); // request
        peer.write_all(&[0x7F, 0x7F, 0x00]).expect("noise should write");
        send_reply(&mut peer, ACK, &[]);
        peer
    });

    let reply = session
        .exchange(SETUP, &SetupCommand::default().to_payload(), &ExchangeConfig::default())
        .expect("exchange should succeed");
    assert_eq!(reply.command_id, ACK);

    let _peer = noisy.join().expect("peer thread");
}

#[test]
fn silent_peer_yields_no_response() {
    init_tracing();
    let (mut session, _peer) = session_pair();

    let config = ExchangeConfig {
        max_attempts: 2,
        per_attempt_timeout: Duration::from_millis(25),
    };
    let err = session
        .exchange(SETUP, &SetupCommand::default().to_payload(), &config)
        .expect_err("nobody answers");

    assert!(matches!(err, SessionError::NoResponse { attempts: 2, .. }));
}

#[test]
fn payload_over_header_limit_is_rejected() {
    let (mut session, _peer) = session_pair();
    let err = session
        .exchange(SETUP, &[0u8; 256], &ExchangeConfig::default())
        .expect_err("payload is too large");

    assert!(matches!(
        err,
        SessionError::Frame(FrameError::PayloadTooLarge { size: 256, max: 255 })
    ));
}

#[test]
fn second_reply_to_short_setup_does_not_leak_into_next_exchange() {
    init_tracing();
    let (mut session, peer) = session_pair();
    let firmware = spawn_firmware(peer, 2);

    let config = ExchangeConfig {
        max_attempts: 3,
        per_attempt_timeout: Duration::from_millis(300),
    };
    let first = session
        .exchange(SETUP, &[0x01, 0x02], &config)
        .expect("exchange should succeed");
    assert_eq!(first.command_id, TXT);

    let second = session
        .exchange(0x42, b"ping", &config)
        .expect("exchange should succeed");
    assert_eq!(second.command_id, ERROR);
    assert!(second.payload_text().contains("UNKNOWN PACKET ERROR"));

    session.close();
    assert!(firmware.join().expect("firmware thread").is_empty());
}

#[test]
fn unprompted_input_report_is_decoded() {
    init_tracing();
    let (mut session, mut peer) = session_pair();

    let report = InputState {
        uptime_us: 4_000_123,
        pulse_id: 12,
        inputs_state: 0b10,
    };
    let reporter = thread::spawn(move || {
        let _ = read_delimited(&mut peer); // resync delimiter
        send_reply(&mut peer, INPUTS, &report.to_payload());
        peer
    });

    let body = session
        .receive_until_delimiter(Duration::from_secs(2))
        .expect("receive should succeed")
        .expect("peer should report");
    let frame = parse(&decode_frame(&body).expect("report should decode")).expect("report should parse");

    assert_eq!(frame.command_id, INPUTS);
    let state = InputState::from_payload(&frame.payload).expect("input state should decode");
    assert_eq!(state, report);
    assert!(state.is_set(1));

    let _peer = reporter.join().expect("peer thread");
}
