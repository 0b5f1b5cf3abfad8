//! Trained dictionaries and solid streams.

use oxilzma_codec::{EncoderConfig, LzmaDecoder, LzmaEncoder, compress};
use std::io::Cursor;

const DICTIONARY: &[u8] = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\
User-Agent: oxilzma-test\r\nAccept: text/html,application/xhtml+xml\r\n\
Accept-Language: en-US,en;q=0.9\r\nConnection: keep-alive\r\n\r\n";

const MESSAGE: &[u8] = b"GET /about.html HTTP/1.1\r\nHost: example.com\r\n\
User-Agent: oxilzma-test\r\nAccept: text/html,application/xhtml+xml\r\n\
Connection: keep-alive\r\n\r\n";

fn config() -> EncoderConfig {
    EncoderConfig::default().with_dictionary_size(1 << 16)
}

fn decode(decoder: &mut LzmaDecoder, stream: &[u8], len: usize) -> oxilzma_core::Result<Vec<u8>> {
    let mut out = Vec::new();
    decoder.decode(Cursor::new(stream), &mut out, Some(len as u64))?;
    Ok(out)
}

#[test]
fn test_trained_roundtrip() {
    let mut encoder = LzmaEncoder::new(config()).unwrap();
    assert_eq!(encoder.train(DICTIONARY), DICTIONARY.len());
    let mut stream = Vec::new();
    encoder.encode(MESSAGE, &mut stream).unwrap();

    let untrained = compress(&config(), MESSAGE).unwrap();
    assert!(stream.len() < untrained.len());

    let mut decoder = LzmaDecoder::new(config().properties).unwrap();
    assert_eq!(decoder.train(DICTIONARY), DICTIONARY.len());
    assert_eq!(decode(&mut decoder, &stream, MESSAGE.len()).unwrap(), MESSAGE);
}

#[test]
fn test_trained_stream_needs_dictionary() {
    let mut encoder = LzmaEncoder::new(config()).unwrap();
    encoder.train(DICTIONARY);
    let mut stream = Vec::new();
    encoder.encode(MESSAGE, &mut stream).unwrap();

    let mut decoder = LzmaDecoder::new(config().properties).unwrap();
    match decode(&mut decoder, &stream, MESSAGE.len()) {
        Ok(out) => assert_ne!(out, MESSAGE),
        Err(e) => assert!(e.is_data_error()),
    }
}

#[test]
fn test_wrong_dictionary() {
    let mut encoder = LzmaEncoder::new(config()).unwrap();
    encoder.train(DICTIONARY);
    let mut stream = Vec::new();
    encoder.encode(MESSAGE, &mut stream).unwrap();

    let mut other = DICTIONARY.to_vec();
    other.reverse();
    let mut decoder = LzmaDecoder::new(config().properties).unwrap();
    decoder.train(&other);
    match decode(&mut decoder, &stream, MESSAGE.len()) {
        Ok(out) => assert_ne!(out, MESSAGE),
        Err(e) => assert!(e.is_data_error()),
    }
}

#[test]
fn test_training_keeps_tail() {
    // Only the last window-size bytes of a long dictionary are reachable.
    let config = config().with_dictionary_size(4096);
    let mut dictionary = vec![0u8; 10_000];
    dictionary[10_000 - 4096..].copy_from_slice(&MESSAGE.repeat(4096 / MESSAGE.len() + 1)[..4096]);

    let mut encoder = LzmaEncoder::new(config).unwrap();
    let mut decoder = LzmaDecoder::new(config.properties).unwrap();
    assert_eq!(encoder.train(&dictionary), 4096);
    assert_eq!(decoder.train(&dictionary), 4096);

    let mut stream = Vec::new();
    encoder.encode(MESSAGE, &mut stream).unwrap();
    assert_eq!(decode(&mut decoder, &stream, MESSAGE.len()).unwrap(), MESSAGE);
}

#[test]
fn test_solid_chaining() {
    let parts: [&[u8]; 3] = [DICTIONARY, MESSAGE, MESSAGE];

    let mut encoder = LzmaEncoder::new(config()).unwrap();
    encoder.set_solid(true);
    let streams: Vec<Vec<u8>> = parts
        .iter()
        .map(|part| {
            let mut stream = Vec::new();
            encoder.encode(part, &mut stream).unwrap();
            stream
        })
        .collect();

    // The repeated part costs almost nothing once chained.
    assert!(streams[2].len() < streams[1].len());
    assert!(streams[2].len() < 20);

    let mut decoder = LzmaDecoder::new(config().properties).unwrap();
    decoder.set_solid(true);
    for (part, stream) in parts.iter().zip(&streams) {
        assert_eq!(decode(&mut decoder, stream, part.len()).unwrap(), *part);
    }
}

#[test]
fn test_leaving_solid_mode() {
    let mut encoder = LzmaEncoder::new(config()).unwrap();
    encoder.train(DICTIONARY);
    encoder.set_solid(false);
    let mut stream = Vec::new();
    encoder.encode(MESSAGE, &mut stream).unwrap();
    assert_eq!(stream, compress(&config(), MESSAGE).unwrap());

    let mut decoder = LzmaDecoder::new(config().properties).unwrap();
    decoder.train(DICTIONARY);
    decoder.set_solid(false);
    assert_eq!(decode(&mut decoder, &stream, MESSAGE.len()).unwrap(), MESSAGE);
}

#[test]
fn test_plain_stream_ignores_training() {
    // Bytes chosen so that a literal coded against the wrong previous byte
    // decodes differently.
    let input = b"a\x00b\x00c\x01d\x02e";
    let stream = compress(&config(), input).unwrap();

    let mut plain = LzmaDecoder::new(config().properties).unwrap();
    assert_eq!(decode(&mut plain, &stream, input.len()).unwrap(), input);

    let mut trained = LzmaDecoder::new(config().properties).unwrap();
    trained.train(&[0xFF; 64]);
    assert_eq!(decode(&mut trained, &stream, input.len()).unwrap(), input);

    // Same for a longer stream with real matches.
    let stream = compress(&config(), MESSAGE).unwrap();
    let mut trained = LzmaDecoder::new(config().properties).unwrap();
    trained.train(DICTIONARY);
    assert_eq!(decode(&mut trained, &stream, MESSAGE.len()).unwrap(), MESSAGE);
}

#[test]
fn test_trained_pass_opens_with_literal() {
    // Input identical to the dictionary still starts with a literal, so the
    // first byte decodes on its own.
    let mut encoder = LzmaEncoder::new(config()).unwrap();
    encoder.train(DICTIONARY);
    let mut stream = Vec::new();
    encoder.encode(DICTIONARY, &mut stream).unwrap();

    let mut decoder = LzmaDecoder::new(config().properties).unwrap();
    decoder.train(DICTIONARY);
    assert_eq!(decode(&mut decoder, &stream, 1).unwrap(), &DICTIONARY[..1]);
}
