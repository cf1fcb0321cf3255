use elma::rec::{Event, EventType, Frame, Replay};
use elma::{ElmaError, Position};

/// A single-player replay laid out the way the game writes it, one frame and two events.
fn game_bytes() -> Vec<u8> {
    let mut bytes = vec![];
    bytes.extend_from_slice(&1i32.to_le_bytes());
    bytes.extend_from_slice(&0x83i32.to_le_bytes());
    bytes.extend_from_slice(&0i32.to_le_bytes());
    bytes.extend_from_slice(&0i32.to_le_bytes());
    bytes.extend_from_slice(&2_549_082_363u32.to_le_bytes());
    bytes.extend_from_slice(b"tutor14.lev\0");
    bytes.extend_from_slice(&0i32.to_le_bytes());

    // Frame columns.
    bytes.extend_from_slice(&34.30250f32.to_le_bytes());
    bytes.extend_from_slice(&(-1.1253119f32).to_le_bytes());
    for value in [-850i16, -524, 849, -524, 0, 439, 10000].iter() {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes.push(250);
    bytes.push(0);
    // Throttle, with garbage in the upper bits.
    bytes.push(0b1010_0001);
    bytes.extend_from_slice(&5120i16.to_le_bytes());

    bytes.extend_from_slice(&2i32.to_le_bytes());
    bytes.extend_from_slice(&1.57728480001688f64.to_le_bytes());
    bytes.extend_from_slice(&(-1i16).to_le_bytes());
    bytes.extend_from_slice(&[6, 0]);
    bytes.extend_from_slice(&0x3F7D_70A4u32.to_le_bytes());
    bytes.extend_from_slice(&6.398683200001716f64.to_le_bytes());
    bytes.extend_from_slice(&3i16.to_le_bytes());
    bytes.extend_from_slice(&[0, 0]);
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.extend_from_slice(&0x0049_2F75i32.to_le_bytes());
    bytes
}

// Offset of the flags column in `game_bytes`.
const FLAGS_OFFSET: usize = 36 + 4 + 4 + 2 * 7 + 2;

fn frame(x: f32, throttle: bool, right: bool) -> Frame {
    Frame {
        bike: Position { x, y: -x },
        left_wheel: Position { x: -850, y: -524 },
        right_wheel: Position { x: 849, y: -524 },
        head: Position { x: 0, y: 439 },
        rotation: 10000,
        left_wheel_rotation: 12,
        right_wheel_rotation: 200,
        throttle,
        right,
        volume: 5120,
    }
}

fn event(time: f64, event_type: EventType) -> Event {
    Event { time, event_type }
}

#[test]
fn rec_default_values() {
    let replay = Replay::new();
    assert!(!replay.multi);
    assert!(!replay.flag_tag);
    assert_eq!(replay.level, "");
    assert_eq!(replay.frames, vec![]);
    assert_eq!(replay.events, vec![]);
    assert_eq!(replay.frames_2, vec![]);
    assert_eq!(replay.events_2, vec![]);
}

#[test]
fn parse_game_layout() {
    let replay = Replay::from_bytes(&game_bytes()).unwrap();
    assert!(!replay.multi);
    assert!(!replay.flag_tag);
    assert_eq!(replay.link, 2_549_082_363);
    assert_eq!(replay.level, "tutor14.lev");

    assert_eq!(replay.frames.len(), 1);
    assert_eq!(
        replay.frames[0],
        Frame {
            bike: Position { x: 34.30250, y: -1.1253119 },
            left_wheel: Position { x: -850, y: -524 },
            right_wheel: Position { x: 849, y: -524 },
            head: Position { x: 0, y: 439 },
            rotation: 10000,
            left_wheel_rotation: 250,
            right_wheel_rotation: 0,
            throttle: true,
            right: false,
            volume: 5120,
        }
    );

    assert_eq!(
        replay.events,
        vec![
            event(1.57728480001688, EventType::VoltRight),
            event(6.398683200001716, EventType::Touch { index: 3 }),
        ]
    );
}

#[test]
fn write_matches_game_layout() {
    let original = game_bytes();
    let replay = Replay::from_bytes(&original).unwrap();
    let written = replay.to_bytes().unwrap();

    assert_eq!(written.len(), original.len());
    // Only the meaningful bits of the flags are preserved.
    assert_eq!(written[FLAGS_OFFSET] & 0b11, 0b01);
    assert_eq!(&written[..FLAGS_OFFSET], &original[..FLAGS_OFFSET]);
    assert_eq!(&written[FLAGS_OFFSET + 1..], &original[FLAGS_OFFSET + 1..]);
}

#[test]
fn all_event_types_survive() {
    let mut replay = Replay::new();
    replay.level = String::from("QWQUU001.LEV");
    replay.frames = vec![frame(1.0, true, true), frame(2.0, false, true), frame(3.0, false, false)];
    replay.events = vec![
        event(0.1, EventType::Ground { alternative: false }),
        event(0.2, EventType::Ground { alternative: true }),
        event(0.3, EventType::Turn),
        event(0.4, EventType::VoltRight),
        event(0.5, EventType::VoltLeft),
        event(0.6, EventType::Touch { index: 12 }),
    ];

    let parsed = Replay::from_bytes(&replay.to_bytes().unwrap()).unwrap();
    assert_eq!(parsed, replay);
}

#[test]
fn save_and_load_multi() {
    let mut replay = Replay::new();
    replay.multi = true;
    replay.flag_tag = true;
    replay.level = String::from("flagtag.lev");
    replay.frames = (0..40).map(|n| frame(n as f32, n % 2 == 0, n % 3 == 0)).collect();
    replay.events = vec![event(1.0, EventType::Turn)];
    replay.frames_2 = (0..25).map(|n| frame(-(n as f32), n % 5 == 0, true)).collect();
    replay.events_2 = vec![
        event(0.5, EventType::VoltLeft),
        event(2.0, EventType::Touch { index: 0 }),
    ];

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("multi.rec");
    replay.save(&path).unwrap();

    let loaded = Replay::load(&path).unwrap();
    assert_eq!(loaded, replay);
}

#[test]
fn invalid_event_type() {
    let mut bytes = game_bytes();
    // Type byte of the first event.
    let offset = 36 + 27 + 4 + 10;
    assert_eq!(bytes[offset], 6);
    bytes[offset] = 3;
    assert_eq!(Replay::from_bytes(&bytes), Err(ElmaError::InvalidEvent(3)));
}

#[test]
fn end_of_replay_mismatch() {
    let mut bytes = game_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    assert_eq!(Replay::from_bytes(&bytes), Err(ElmaError::EORMismatch));
}

#[test]
fn truncated_replay() {
    let bytes = game_bytes();
    for len in [0, 10, 36, 50, bytes.len() - 1].iter() {
        assert_eq!(
            Replay::from_bytes(&bytes[..*len]),
            Err(ElmaError::Io(std::io::ErrorKind::UnexpectedEof)),
            "length {}",
            len
        );
    }
}

#[test]
fn negative_frame_count() {
    let mut bytes = game_bytes();
    bytes[..4].copy_from_slice(&(-1i32).to_le_bytes());
    assert_eq!(Replay::from_bytes(&bytes), Err(ElmaError::InvalidCount(-1)));
}

#[test]
fn multi_flag_requires_second_player() {
    let mut bytes = game_bytes();
    bytes[8] = 1;
    assert_eq!(
        Replay::from_bytes(&bytes),
        Err(ElmaError::Io(std::io::ErrorKind::UnexpectedEof))
    );
}

#[test]
fn level_name_must_fit() {
    let mut replay = Replay::new();
    replay.level = String::from("much_too_long.lev");
    assert_eq!(replay.to_bytes(), Err(ElmaError::PaddingTooShort(-5)));

    replay.level = String::from("ÆØÅ.lev");
    assert_eq!(replay.to_bytes(), Err(ElmaError::NonASCII));
}

#[test]
fn finished_time() {
    let replay = Replay::from_bytes(&game_bytes()).unwrap();
    let mut replay = Replay {
        frames: vec![Frame::new(); 440],
        ..replay
    };
    assert_eq!(replay.get_time_ms(), (14649, true));
    assert_eq!(replay.get_time_hs(), (1464, true));

    // Riding on well past the touch.
    replay.frames = vec![Frame::new(); 600];
    assert_eq!(replay.get_time_ms(), (20000, false));
}

#[test]
fn unfinished_time() {
    let mut replay = Replay::new();
    replay.frames = vec![Frame::new(); 100];
    replay.events = vec![event(1.0, EventType::Touch { index: 1 }), event(2.0, EventType::Turn)];
    assert_eq!(replay.get_time_ms(), (3333, false));
    assert_eq!(replay.get_time_hs(), (333, false));

    assert_eq!(Replay::new().get_time_ms(), (0, false));
}

#[test]
fn multi_time_uses_later_player() {
    let mut replay = Replay::new();
    replay.multi = true;
    replay.frames = vec![Frame::new(); 100];
    replay.events = vec![event(1.0, EventType::Touch { index: 0 })];
    replay.frames_2 = vec![Frame::new(); 440];
    replay.events_2 = vec![event(6.398683200001716, EventType::Touch { index: 2 })];
    assert_eq!(replay.get_time_ms(), (14649, true));
}
