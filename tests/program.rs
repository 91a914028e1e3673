use pretty_assertions::assert_eq;
use risky_asm::{
    encode_instruction, encode_program, EncodeError, Encoder, EncoderConfig, FieldPolicy, Malformed,
    IMAGE_BYTES, PROGRAM_WORDS,
};

fn source(text: &str) -> Vec<Vec<&str>> {
    text.lines().map(|l| l.split_whitespace().collect()).collect()
}

const COUNTDOWN: &str = "\
set 0 10
set 1 1
sub 0 0 1
grt 2 0 3
jif 2 0 4
jmp 0 0
";

#[test]
fn padding_law() {
    let lines = source(COUNTDOWN);
    let image = encode_program(&lines).unwrap();
    let bytes = image.to_bytes();
    assert_eq!(bytes.len(), IMAGE_BYTES);
    assert_eq!(image.len(), PROGRAM_WORDS);
    assert_eq!(image.instruction_count(), lines.len());

    let mut expected = Vec::new();
    for l in &lines {
        expected.extend_from_slice(&encode_instruction(l).unwrap().to_bytes());
    }
    assert_eq!(&bytes[..expected.len()], &expected[..]);
    assert!(bytes[expected.len()..].iter().all(|&b| b == 0));
}

#[test]
fn countdown_program_bytes() {
    let image = encode_program(&source(COUNTDOWN)).unwrap();
    assert_eq!(
        &image.to_bytes()[..12],
        &[0xB0, 0x0A, 0xB1, 0x01, 0x10, 0x01, 0xF2, 0x03, 0xD2, 0x04, 0xC0, 0x00]
    );
}

#[test]
fn encoding_is_deterministic() {
    let lines = source(COUNTDOWN);
    let a = encode_program(&lines).unwrap().to_bytes();
    let b = encode_program(&lines).unwrap().to_bytes();
    assert_eq!(a, b);
}

#[test]
fn full_page_gets_no_padding() {
    let lines = vec![vec!["jmp", "1", "2"]; PROGRAM_WORDS];
    let image = encode_program(&lines).unwrap();
    assert_eq!(image.padding(), 0);
    assert!(!image.is_oversized());
    assert_eq!(image.byte_len(), IMAGE_BYTES);
    assert_eq!(&image.to_bytes()[IMAGE_BYTES - 2..], &[0xC0, 0x12]);
}

#[test]
fn oversized_program_keeps_every_word() {
    let lines = vec![vec!["set", "1", "1"]; PROGRAM_WORDS + 1];
    let image = encode_program(&lines).unwrap();
    assert!(image.is_oversized());
    assert_eq!(image.byte_len(), IMAGE_BYTES + 2);
}

#[test]
fn blank_line_is_malformed() {
    let lines = source("add 1 2 3\n\nadd 1 2 3");
    assert_eq!(
        encode_program(&lines),
        Err(EncodeError::MalformedInstruction { line: 1, reason: Malformed::Empty })
    );
}

#[test]
fn strict_encoder_reports_first_overflow() {
    let strict = Encoder::new(EncoderConfig { field_policy: FieldPolicy::Strict });
    let lines = source("set 1 200\nset 1 300\nset 16 0");
    let err = strict.encode_program(&lines).unwrap_err();
    assert_eq!(err.line(), 1);
    assert!(err.to_string().starts_with("line 2: malformed instruction: literal value 300"));

    // the same source wraps silently by default
    let image = encode_program(&lines).unwrap();
    assert_eq!(&image.to_bytes()[..6], &[0xB1, 0xC8, 0xB1, 0x2C, 0xB0, 0x00]);
}
