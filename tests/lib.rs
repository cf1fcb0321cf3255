use elma::{string_null_pad, time_format, trim_string, ElmaError};

#[test]
fn trim_drops_garbage_after_nul() {
    assert_eq!(trim_string(b"Elma\0\0\0~~~").unwrap(), "Elma");
    assert_eq!(trim_string(b"no terminator").unwrap(), "no terminator");
    assert_eq!(trim_string(b"\0Elma").unwrap(), "");
    assert_eq!(trim_string(&[0x45, 0xFF, 0x00]), Err(ElmaError::StringFromUtf8(1)));
}

#[test]
fn pad_to_width() {
    assert_eq!(string_null_pad("", 3).unwrap(), vec![0, 0, 0]);
    assert_eq!(string_null_pad("sky", 3).unwrap(), b"sky".to_vec());
    assert_eq!(string_null_pad("ground", 3), Err(ElmaError::PaddingTooShort(-3)));
    assert_eq!(string_null_pad("Åre", 10), Err(ElmaError::NonASCII));
}

#[test]
fn format_times() {
    assert_eq!(time_format(0).unwrap(), "00:00,00");
    assert_eq!(time_format(7).unwrap(), "00:00,07");
    assert_eq!(time_format(2039).unwrap(), "00:20,39");
    assert_eq!(time_format(125_959).unwrap(), "12:59,59");
    assert_eq!(time_format(595_999).unwrap(), "59:59,99");
}

#[test]
fn format_times_out_of_range() {
    // Seven digits saturate.
    assert_eq!(time_format(1_000_000).unwrap(), "59:59,99");
    // Sixty seconds or minutes are not valid clock digits.
    assert_eq!(time_format(6_000), Err(ElmaError::InvalidTimeFormat));
    assert_eq!(time_format(600_000), Err(ElmaError::InvalidTimeFormat));
    assert_eq!(time_format(-1), Err(ElmaError::InvalidTimeFormat));
}

#[test]
fn errors_display() {
    assert_eq!(ElmaError::InvalidEvent(9).to_string(), "invalid replay event type 9");
    let io: ElmaError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
    assert_eq!(io, ElmaError::Io(std::io::ErrorKind::NotFound));
}
