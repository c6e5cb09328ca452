//! Session and façade tests against a scripted in-memory link.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use super::client::MatrixDisplay;
use super::error::{TransportError, ValidationError};
use super::io::{Connector, Session, Timeouts};
use super::protocol::{CMD_DRAW_BITMAP, CMD_FILL_SCREEN, CMD_PRINT, CMD_SET_SPRITE, Rgb, build_frame};

/// One observed operation on a scripted link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Write(Vec<u8>),
    /// Bytes handed to a read call.
    Read(usize),
    Timeout,
}

#[derive(Debug, Default)]
pub(crate) struct LinkLog {
    pub events: Vec<Event>,
    pub closed: bool,
}

impl LinkLog {
    pub fn writes(&self) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn written(&self) -> Vec<u8> {
        self.writes().concat()
    }
}

/// In-memory link: answers reads from a byte script, times out when the
/// script runs dry, and records every write as a separate event.
pub(crate) struct ScriptedLink {
    input: VecDeque<u8>,
    broken: bool,
    log: Rc<RefCell<LinkLog>>,
}

impl ScriptedLink {
    pub fn new(input: &[u8]) -> Self {
        Self::with_log(input, Rc::default())
    }

    fn with_log(input: &[u8], log: Rc<RefCell<LinkLog>>) -> Self {
        Self {
            input: input.iter().copied().collect(),
            broken: false,
            log,
        }
    }

    pub fn log(&self) -> Rc<RefCell<LinkLog>> {
        Rc::clone(&self.log)
    }
}

impl Read for ScriptedLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.broken {
            return Err(io::Error::new(ErrorKind::BrokenPipe, "device unplugged"));
        }
        if self.input.is_empty() {
            self.log.borrow_mut().events.push(Event::Timeout);
            return Err(io::Error::new(ErrorKind::TimedOut, "read timed out"));
        }

        let n = buf.len().min(self.input.len());
        for (slot, byte) in buf.iter_mut().zip(self.input.drain(..n)) {
            *slot = byte;
        }
        self.log.borrow_mut().events.push(Event::Read(n));
        Ok(n)
    }
}

impl Write for ScriptedLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.log.borrow_mut().events.push(Event::Write(buf.to_vec()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ScriptedLink {
    fn drop(&mut self) {
        self.log.borrow_mut().closed = true;
    }
}

/// Hands out one scripted link per `open`, in order.
#[derive(Default)]
pub(crate) struct ScriptedConnector {
    scripts: RefCell<VecDeque<Vec<u8>>>,
    links: RefCell<Vec<Rc<RefCell<LinkLog>>>>,
    timeouts: RefCell<Vec<Duration>>,
    unavailable: bool,
    broken: bool,
}

impl ScriptedConnector {
    pub fn new(scripts: Vec<Vec<u8>>) -> Self {
        Self {
            scripts: RefCell::new(scripts.into()),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.links.borrow().len()
    }

    pub fn link(&self, index: usize) -> Rc<RefCell<LinkLog>> {
        Rc::clone(&self.links.borrow()[index])
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.borrow().clone()
    }
}

impl Connector for ScriptedConnector {
    type Link = ScriptedLink;

    fn open(&self, timeout: Duration) -> Result<Self::Link, TransportError> {
        if self.unavailable {
            return Err(TransportError::Io(io::Error::new(ErrorKind::NotFound, "no such port")));
        }

        let script = self.scripts.borrow_mut().pop_front().unwrap_or_default();
        let mut link = ScriptedLink::with_log(&script, Rc::default());
        link.broken = self.broken;
        self.links.borrow_mut().push(link.log());
        self.timeouts.borrow_mut().push(timeout);
        Ok(link)
    }

    fn target(&self) -> String {
        "scripted".to_string()
    }
}

fn ack_frame(cmd: u8, success: bool, message: &str) -> Vec<u8> {
    let mut frame = vec![0xAA, 0xAC, cmd, u8::from(success), message.len() as u8];
    frame.extend_from_slice(message.as_bytes());
    frame
}

fn display(scripts: Vec<Vec<u8>>) -> MatrixDisplay<ScriptedConnector> {
    MatrixDisplay::with_connector(ScriptedConnector::new(scripts))
}

// --- Session ---

#[test]
fn test_chunked_send_waits_between_chunks() {
    let mut script = vec![0xFF, 0xFF];
    script.extend(ack_frame(CMD_DRAW_BITMAP, true, ""));
    let link = ScriptedLink::new(&script);
    let log = link.log();

    let header = build_frame(CMD_DRAW_BITMAP, &[0, 0, 10, 15]);
    let payload = vec![0x11u8; 300];

    let mut session = Session::new(link, "draw_bitmap");
    session.send_chunked(&header, &payload, 128).unwrap();
    let ack = session.read_ack(CMD_DRAW_BITMAP).unwrap();
    assert!(ack.success);

    let log = log.borrow();
    assert_eq!(
        log.events[..6],
        [
            Event::Write(header.clone()),
            Event::Write(vec![0x11; 128]),
            Event::Read(1),
            Event::Write(vec![0x11; 128]),
            Event::Read(1),
            Event::Write(vec![0x11; 44]),
        ]
    );
    // No ready byte is awaited after the last chunk; the next read is the ACK.
    assert_eq!(log.events[6], Event::Read(1));
    let chunk_sizes: Vec<usize> = log.writes()[1..].iter().map(|w| w.len()).collect();
    assert_eq!(chunk_sizes, vec![128, 128, 44]);
}

#[test]
fn test_chunked_send_exact_multiple() {
    let link = ScriptedLink::new(&[0xFF]);
    let log = link.log();

    let mut session = Session::new(link, "set_sprite");
    session.send_chunked(&[0xAA, CMD_SET_SPRITE, 0], &[0u8; 256], 128).unwrap();

    let log = log.borrow();
    let reads = log.events.iter().filter(|e| matches!(e, Event::Read(_))).count();
    assert_eq!(reads, 1);
    assert_eq!(log.writes().len(), 3);
}

#[test]
fn test_chunked_send_rejects_wrong_ready_byte() {
    let link = ScriptedLink::new(&[0x00, 0xFF]);
    let log = link.log();

    let mut session = Session::new(link, "draw_bitmap");
    let err = session.send_chunked(&[0xAA, CMD_DRAW_BITMAP, 0], &[0u8; 300], 128).unwrap_err();
    assert!(matches!(err, TransportError::FlowControl(Some(0x00))));

    // Aborted after the first chunk.
    assert_eq!(log.borrow().writes().len(), 2);
}

#[test]
fn test_chunked_send_times_out_waiting_for_ready() {
    let link = ScriptedLink::new(&[]);
    let mut session = Session::new(link, "draw_bitmap");
    let err = session.send_chunked(&[0xAA, CMD_DRAW_BITMAP, 0], &[0u8; 200], 128).unwrap_err();
    assert!(matches!(err, TransportError::FlowControl(None)));
}

#[test]
fn test_simple_send_writes_header_then_payload() {
    let link = ScriptedLink::new(&[]);
    let log = link.log();

    let mut session = Session::new(link, "print");
    session.send_simple(&[0xAA, CMD_PRINT, 0], Some(&[1, 2, 3])).unwrap();

    assert_eq!(log.borrow().writes(), vec![&[0xAA, CMD_PRINT, 0][..], &[1, 2, 3][..]]);
}

#[test]
fn test_session_drop_closes_link() {
    let link = ScriptedLink::new(&[]);
    let log = link.log();
    {
        let _session = Session::new(link, "clear");
        assert!(!log.borrow().closed);
    }
    assert!(log.borrow().closed);
}

// --- Façade ---

#[test]
fn test_fill_screen_round_trip() {
    let display = display(vec![ack_frame(CMD_FILL_SCREEN, true, "Screen filled")]);

    let ack = display.fill_screen(Rgb::new(255, 128, 0)).unwrap();
    assert!(ack.success);
    assert_eq!(ack.message, "Screen filled");
    assert_eq!(ack.command, Some(CMD_FILL_SCREEN));

    let connector = display.connector();
    assert_eq!(connector.opens(), 1);
    assert_eq!(connector.timeouts(), vec![Duration::from_secs(2)]);
    let link = connector.link(0);
    assert!(link.borrow().closed);
    assert_eq!(link.borrow().written(), vec![0xAA, CMD_FILL_SCREEN, 3, 255, 128, 0]);
}

#[test]
fn test_each_command_opens_its_own_link() {
    let display = display(vec![ack_frame(0x06, true, "Screen cleared"), ack_frame(0x07, true, "Brightness set")]);

    assert!(display.clear().unwrap().success);
    assert!(display.set_brightness(40).unwrap().success);

    let connector = display.connector();
    assert_eq!(connector.opens(), 2);
    assert!(connector.link(0).borrow().closed);
    assert!(connector.link(1).borrow().closed);
    assert_eq!(connector.link(0).borrow().written(), vec![0xAA, 0x06, 0]);
    assert_eq!(connector.link(1).borrow().written(), vec![0xAA, 0x07, 1, 40]);
}

#[test]
fn test_draw_bitmap_sends_wire_pixels() {
    let mut script = vec![0xFF];
    script.extend(ack_frame(CMD_DRAW_BITMAP, true, ""));
    let display = display(vec![script]);

    // 10x10 = 300 RGB888 bytes -> 200 wire bytes -> chunks of 128 + 72
    let pixels = vec![255u8; 10 * 10 * 3];
    let ack = display.draw_bitmap(2, 3, 10, 10, &pixels).unwrap();
    assert!(ack.success);

    let connector = display.connector();
    assert_eq!(connector.timeouts(), vec![Duration::from_secs(10)]);
    let link = connector.link(0);
    let log = link.borrow();
    let writes = log.writes();
    assert_eq!(writes[0], &[0xAA, CMD_DRAW_BITMAP, 4, 2, 3, 10, 10][..]);
    assert_eq!(writes[1].len(), 128);
    assert_eq!(writes[2].len(), 72);
    let payload_len: usize = writes[1..].iter().map(|w| w.len()).sum();
    assert_eq!(payload_len, 2 * 10 * 10);
    assert!(log.closed);
}

#[test]
fn test_set_sprite_frame() {
    let display = display(vec![ack_frame(CMD_SET_SPRITE, true, "Sprite set")]);

    let pixels = vec![0u8; 4 * 4 * 3];
    let ack = display.set_sprite(15, 1, 2, 4, 4, &pixels).unwrap();
    assert!(ack.success);

    let link = display.connector().link(0);
    let log = link.borrow();
    let writes = log.writes();
    assert_eq!(writes[0], &[0xAA, CMD_SET_SPRITE, 5, 15, 1, 2, 4, 4][..]);
    assert_eq!(writes[1].len(), 32);
}

#[test]
fn test_print_text_counts_text_in_length_byte() {
    let display = display(vec![ack_frame(CMD_PRINT, true, "Text printed")]);

    display.print_text("Hi").unwrap();

    let link = display.connector().link(0);
    assert_eq!(link.borrow().written(), vec![0xAA, CMD_PRINT, 2, b'H', b'i']);
}

#[test]
fn test_pixel_buffer_mismatch_rejected_before_io() {
    let display = display(vec![]);

    let pixels = vec![0u8; 40];
    let err = display.draw_bitmap(0, 0, 4, 4, &pixels).unwrap_err();
    assert_eq!(err, ValidationError::PixelBufferSize { expected: 48, actual: 40 });

    let err = display.set_sprite(0, 0, 0, 4, 4, &pixels).unwrap_err();
    assert_eq!(err, ValidationError::PixelBufferSize { expected: 48, actual: 40 });

    assert_eq!(display.connector().opens(), 0);
}

#[test]
fn test_sprite_id_rejected_before_io() {
    let display = display(vec![]);
    let pixels = [0u8; 3];

    assert_eq!(display.set_sprite(16, 0, 0, 1, 1, &pixels), Err(ValidationError::SpriteId(16)));
    assert_eq!(display.clear_sprite(16), Err(ValidationError::SpriteId(16)));
    assert_eq!(display.draw_sprite(16, 0, 0), Err(ValidationError::SpriteId(16)));
    assert_eq!(display.move_sprite(16, 0, 0), Err(ValidationError::SpriteId(16)));

    assert_eq!(display.connector().opens(), 0);
}

#[test]
fn test_sprite_id_bounds_accepted() {
    let display = display(vec![
        ack_frame(0x10, true, "Sprite drawn"),
        ack_frame(0x11, true, "Sprite moved"),
    ]);

    assert!(display.draw_sprite(0, 5, 5).unwrap().success);
    assert!(display.move_sprite(15, 6, 6).unwrap().success);
    assert_eq!(display.connector().opens(), 2);
}

#[test]
fn test_device_failure_is_reported() {
    let display = display(vec![ack_frame(0x10, false, "Sprite not active")]);

    let ack = display.draw_sprite(3, 0, 0).unwrap();
    assert!(!ack.success);
    assert!(!ack.is_local_failure());
    assert_eq!(ack.message, "Sprite not active");
}

#[test]
fn test_flow_control_failure_becomes_failed_ack() {
    let mut script = vec![0x42];
    script.extend(ack_frame(CMD_DRAW_BITMAP, true, ""));
    let display = display(vec![script]);

    let pixels = vec![0u8; 10 * 10 * 3];
    let ack = display.draw_bitmap(0, 0, 10, 10, &pixels).unwrap();
    assert!(!ack.success);
    assert!(ack.is_local_failure());
    assert!(ack.message.starts_with("Flow control error"));

    let link = display.connector().link(0);
    let log = link.borrow();
    assert!(log.closed);
    // Header + first chunk + the single ready-byte read; no ACK read.
    assert_eq!(log.events.len(), 3);
}

#[test]
fn test_ack_timeout_becomes_failed_ack() {
    let display = display(vec![vec![]]);

    let ack = display.clear().unwrap();
    assert!(!ack.success);
    assert_eq!(ack.message, "Invalid response start byte");
    assert!(display.connector().link(0).borrow().closed);
}

#[test]
fn test_incomplete_ack_message() {
    let mut script = vec![0xAA, 0xAC, 0x07, 0x01, 0x05];
    script.extend_from_slice(b"Bri");
    let display = display(vec![script]);

    let ack = display.set_brightness(10).unwrap();
    assert!(!ack.success);
    assert!(ack.message.contains("Incomplete message"));
}

#[test]
fn test_unavailable_port_becomes_failed_ack() {
    let display = MatrixDisplay::with_connector(ScriptedConnector::unavailable());

    let ack = display.clear().unwrap();
    assert!(!ack.success);
    assert!(ack.message.contains("no such port"));
}

#[test]
fn test_broken_link_becomes_failed_ack() {
    let display = MatrixDisplay::with_connector(ScriptedConnector::broken());

    let ack = display.set_cursor(1, 1).unwrap();
    assert!(!ack.success);
    assert!(ack.message.contains("device unplugged"));
    assert!(display.connector().link(0).borrow().closed);
}

#[test]
fn test_custom_timeouts_and_chunk_size() {
    let mut script = vec![0xFF];
    script.extend(ack_frame(CMD_DRAW_BITMAP, true, ""));
    let timeouts = Timeouts {
        command: Duration::from_millis(500),
        bulk: Duration::from_secs(3),
    };
    let display = display(vec![script]).with_timeouts(timeouts).with_chunk_size(64);

    // 8x8 -> 128 wire bytes -> 2 chunks of 64
    let pixels = vec![0u8; 8 * 8 * 3];
    assert!(display.draw_bitmap(0, 0, 8, 8, &pixels).unwrap().success);

    let connector = display.connector();
    assert_eq!(connector.timeouts(), vec![Duration::from_secs(3)]);
    let link = connector.link(0);
    let sizes: Vec<usize> = link.borrow().writes()[1..].iter().map(|w| w.len()).collect();
    assert_eq!(sizes, vec![64, 64]);
}

// Integration tests require a real device, mark as ignored
#[test]
#[ignore]
fn test_real_device_fill() {
    let port = std::env::var("MATRIX_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());
    let display = MatrixDisplay::new(&port);

    let ack = display.fill_screen(Rgb::new(0, 0, 32)).expect("valid arguments");
    println!("fill_screen: {ack}");
    assert!(ack.success, "device rejected fill: {}", ack.message);
}
