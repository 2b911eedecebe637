//! `format=protobuf` render bodies (carbonapi v2 `MultiFetchResponse`).
//!
//! The message set is small and fixed, so decoding is a plain tag/length
//! reader over `prost::encoding` primitives. Timestamps are not on the wire;
//! sample `i` is at `startTime + i * stepTime`.

use bytes::Buf;
use prost::encoding::{decode_key, decode_varint, WireType};
use prost::Message;

use crate::models::{Series, Value};
use crate::proto::{fetch_response, multi_fetch_response, FetchResponse, MultiFetchResponse};
use crate::{GraphiteError, Result};

pub fn decode(mut body: &[u8]) -> Result<Vec<Series>> {
    let mut series = Vec::new();
    while body.has_remaining() {
        let (tag, wire_type) = decode_key(&mut body)?;
        if tag == multi_fetch_response::METRICS {
            expect_wire_type(tag, wire_type, WireType::LengthDelimited)?;
            let record = take_length_delimited(&mut body)?;
            series.push(decode_fetch_response(record)?);
        } else {
            skip_field(wire_type, &mut body)?;
        }
    }
    Ok(series)
}

#[derive(Default)]
struct FetchFields {
    name: String,
    start: i32,
    step: i32,
    values: Vec<f64>,
    is_absent: Vec<bool>,
}

impl FetchFields {
    fn into_series(self) -> Result<Series> {
        if !self.is_absent.is_empty() && self.is_absent.len() != self.values.len() {
            return Err(malformed(format!(
                "{}: {} absence flags for {} values",
                self.name,
                self.is_absent.len(),
                self.values.len()
            )));
        }

        let is_absent = self.is_absent;
        let values = self.values.into_iter().enumerate().map(|(i, v)| {
            if is_absent.get(i).copied().unwrap_or(false) {
                Value::Absent
            } else {
                Value::from_f64(v)
            }
        });
        Ok(Series::from_step(
            self.name,
            i64::from(self.start),
            i64::from(self.step),
            values,
        ))
    }
}

fn decode_fetch_response(mut buf: &[u8]) -> Result<Series> {
    let mut fields = FetchFields::default();
    while buf.has_remaining() {
        let (tag, wire_type) = decode_key(&mut buf)?;
        match tag {
            fetch_response::NAME => {
                expect_wire_type(tag, wire_type, WireType::LengthDelimited)?;
                let raw = take_length_delimited(&mut buf)?;
                fields.name = std::str::from_utf8(raw)
                    .map_err(|e| malformed(format!("series name is not utf-8: {e}")))?
                    .to_string();
            }
            fetch_response::START_TIME => fields.start = read_int32(tag, wire_type, &mut buf)?,
            fetch_response::STOP_TIME => {
                read_int32(tag, wire_type, &mut buf)?;
            }
            fetch_response::STEP_TIME => fields.step = read_int32(tag, wire_type, &mut buf)?,
            fetch_response::VALUES => match wire_type {
                WireType::LengthDelimited => {
                    let mut packed = take_length_delimited(&mut buf)?;
                    if packed.len() % 8 != 0 {
                        return Err(malformed(format!(
                            "packed values length {} is not a multiple of 8",
                            packed.len()
                        )));
                    }
                    fields.values.reserve(packed.len() / 8);
                    while packed.has_remaining() {
                        fields.values.push(packed.get_f64_le());
                    }
                }
                WireType::SixtyFourBit => {
                    ensure_remaining(&buf, 8)?;
                    fields.values.push(buf.get_f64_le());
                }
                other => return Err(unexpected_wire_type(tag, other)),
            },
            fetch_response::IS_ABSENT => match wire_type {
                WireType::LengthDelimited => {
                    let mut packed = take_length_delimited(&mut buf)?;
                    while packed.has_remaining() {
                        fields.is_absent.push(decode_varint(&mut packed)? != 0);
                    }
                }
                WireType::Varint => fields.is_absent.push(decode_varint(&mut buf)? != 0),
                other => return Err(unexpected_wire_type(tag, other)),
            },
            _ => skip_field(wire_type, &mut buf)?,
        }
    }
    fields.into_series()
}

fn read_int32(tag: u32, wire_type: WireType, buf: &mut &[u8]) -> Result<i32> {
    expect_wire_type(tag, wire_type, WireType::Varint)?;
    // int32 negatives are sign-extended to ten bytes; truncation undoes it.
    Ok(decode_varint(buf)? as i32)
}

fn take_length_delimited<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = decode_varint(buf)?;
    let len = usize::try_from(len)
        .ok()
        .filter(|len| *len <= buf.len())
        .ok_or_else(|| malformed(format!("length {len} exceeds remaining {} bytes", buf.len())))?;
    let data: &'a [u8] = *buf;
    let (field, rest) = data.split_at(len);
    *buf = rest;
    Ok(field)
}

fn skip_field(wire_type: WireType, buf: &mut &[u8]) -> Result<()> {
    match wire_type {
        WireType::Varint => {
            decode_varint(buf)?;
        }
        WireType::SixtyFourBit => {
            ensure_remaining(buf, 8)?;
            buf.advance(8);
        }
        WireType::ThirtyTwoBit => {
            ensure_remaining(buf, 4)?;
            buf.advance(4);
        }
        WireType::LengthDelimited => {
            take_length_delimited(buf)?;
        }
        WireType::StartGroup | WireType::EndGroup => {
            return Err(malformed("group wire types are not supported"));
        }
    }
    Ok(())
}

fn ensure_remaining(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        return Err(malformed(format!(
            "need {needed} bytes, {} remaining",
            buf.len()
        )));
    }
    Ok(())
}

fn expect_wire_type(tag: u32, actual: WireType, expected: WireType) -> Result<()> {
    if actual != expected {
        return Err(unexpected_wire_type(tag, actual));
    }
    Ok(())
}

fn unexpected_wire_type(tag: u32, wire_type: WireType) -> GraphiteError {
    malformed(format!("unexpected wire type {wire_type:?} for field {tag}"))
}

fn malformed(msg: impl Into<String>) -> GraphiteError {
    GraphiteError::MalformedResponse(msg.into())
}

impl TryFrom<&Series> for FetchResponse {
    type Error = GraphiteError;

    fn try_from(series: &Series) -> Result<Self> {
        let unencodable = |msg: String| GraphiteError::Unencodable(format!("{}: {msg}", series.name));

        let timestamps: Vec<i64> = series.samples.iter().map(|s| s.timestamp).collect();
        let step = match timestamps.as_slice() {
            [first, second, ..] => second - first,
            _ => 0,
        };
        if timestamps.windows(2).any(|w| w[1] - w[0] != step) {
            return Err(unencodable("samples are not evenly spaced".to_string()));
        }

        let to_i32 = |v: i64| {
            i32::try_from(v).map_err(|_| unencodable(format!("{v} does not fit in int32")))
        };

        Ok(FetchResponse {
            name: series.name.clone(),
            start_time: to_i32(timestamps.first().copied().unwrap_or(0))?,
            stop_time: to_i32(timestamps.last().copied().unwrap_or(0))?,
            step_time: to_i32(step)?,
            values: series.samples.iter().map(|s| s.value.get().unwrap_or(0.0)).collect(),
            is_absent: series.samples.iter().map(|s| s.value.is_absent()).collect(),
        })
    }
}

pub fn encode(series: &[Series]) -> Result<Vec<u8>> {
    let metrics = series
        .iter()
        .map(FetchResponse::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok(MultiFetchResponse { metrics }.encode_to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;
    use prost::encoding::{encode_key, encode_varint};
    use pretty_assertions::assert_eq;

    fn key(buf: &mut Vec<u8>, tag: u32, wire_type: WireType) {
        encode_key(tag, wire_type, buf);
    }

    fn length_delimited(buf: &mut Vec<u8>, tag: u32, payload: &[u8]) {
        key(buf, tag, WireType::LengthDelimited);
        encode_varint(payload.len() as u64, buf);
        buf.extend_from_slice(payload);
    }

    fn varint(buf: &mut Vec<u8>, tag: u32, value: u64) {
        key(buf, tag, WireType::Varint);
        encode_varint(value, buf);
    }

    /// Writes a record field by field, the way graphite backends stream them.
    fn record(name: &str, start: u64, stop: u64, step: u64, values: &[f64]) -> Vec<u8> {
        let mut body = Vec::new();
        length_delimited(&mut body, fetch_response::NAME, name.as_bytes());
        varint(&mut body, fetch_response::START_TIME, start);
        varint(&mut body, fetch_response::STOP_TIME, stop);
        varint(&mut body, fetch_response::STEP_TIME, step);

        let mut packed = Vec::new();
        let mut flags = Vec::new();
        for v in values {
            if v.is_nan() {
                packed.extend_from_slice(&0f64.to_le_bytes());
                flags.push(1);
            } else {
                packed.extend_from_slice(&v.to_le_bytes());
                flags.push(0);
            }
        }
        length_delimited(&mut body, fetch_response::VALUES, &packed);
        length_delimited(&mut body, fetch_response::IS_ABSENT, &flags);

        let mut out = Vec::new();
        length_delimited(&mut out, multi_fetch_response::METRICS, &body);
        out
    }

    #[test]
    fn test_decode_streamed_records() {
        let mut body = record("TEST.1", 1643964180, 1643964240, 60, &[10.0, 5.0]);
        body.extend(record("TEST.2", 1643964180, 1643964240, 60, &[1.0, f64::NAN]));

        let series = decode(&body).unwrap();
        assert_eq!(
            series,
            vec![
                Series::new(
                    "TEST.1",
                    vec![Sample::present(1643964180, 10.0), Sample::present(1643964240, 5.0)]
                ),
                Series::new(
                    "TEST.2",
                    vec![Sample::present(1643964180, 1.0), Sample::absent(1643964240)]
                ),
            ]
        );
    }

    #[test]
    fn test_decode_matches_prost() {
        let message = MultiFetchResponse {
            metrics: vec![FetchResponse {
                name: "servers.web1.cpu".to_string(),
                start_time: 1000,
                stop_time: 1020,
                step_time: 10,
                values: vec![0.5, 0.0, -3.25],
                is_absent: vec![false, true, false],
            }],
        };
        let series = decode(&message.encode_to_vec()).unwrap();
        assert_eq!(
            series,
            vec![Series::new(
                "servers.web1.cpu",
                vec![
                    Sample::present(1000, 0.5),
                    Sample::absent(1010),
                    Sample::present(1020, -3.25),
                ]
            )]
        );

        let round_trip = MultiFetchResponse::decode(encode(&series).unwrap().as_slice()).unwrap();
        assert_eq!(round_trip, message);
    }

    #[test]
    fn test_absence_flag_overrides_value_bits() {
        let message = MultiFetchResponse {
            metrics: vec![FetchResponse {
                name: "a".to_string(),
                start_time: 60,
                step_time: 60,
                values: vec![42.0],
                is_absent: vec![true],
                ..Default::default()
            }],
        };
        let series = decode(&message.encode_to_vec()).unwrap();
        assert_eq!(series[0].samples, vec![Sample::absent(60)]);
    }

    #[test]
    fn test_unpacked_and_unknown_fields() {
        let mut body = Vec::new();
        length_delimited(&mut body, fetch_response::NAME, b"a");
        varint(&mut body, fetch_response::START_TIME, 100);
        varint(&mut body, fetch_response::STEP_TIME, 10);
        varint(&mut body, 9, 12345);
        length_delimited(&mut body, 10, b"ignored");
        for v in [1.0f64, 2.0] {
            key(&mut body, fetch_response::VALUES, WireType::SixtyFourBit);
            body.extend_from_slice(&v.to_le_bytes());
        }
        varint(&mut body, fetch_response::IS_ABSENT, 0);
        varint(&mut body, fetch_response::IS_ABSENT, 1);
        key(&mut body, 11, WireType::ThirtyTwoBit);
        body.extend_from_slice(&[0, 0, 0, 0]);

        let mut out = Vec::new();
        length_delimited(&mut out, multi_fetch_response::METRICS, &body);
        varint(&mut out, 2, 7);

        let series = decode(&out).unwrap();
        assert_eq!(
            series,
            vec![Series::new("a", vec![Sample::present(100, 1.0), Sample::absent(110)])]
        );
    }

    #[test]
    fn test_negative_start_time() {
        let message = MultiFetchResponse {
            metrics: vec![FetchResponse {
                name: "a".to_string(),
                start_time: -120,
                step_time: 60,
                values: vec![1.0, 2.0],
                is_absent: vec![false, false],
                ..Default::default()
            }],
        };
        let series = decode(&message.encode_to_vec()).unwrap();
        let timestamps: Vec<i64> = series[0].samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![-120, -60]);
    }

    #[test]
    fn test_missing_flags_fall_back_to_nan() {
        let message = MultiFetchResponse {
            metrics: vec![FetchResponse {
                name: "a".to_string(),
                start_time: 60,
                step_time: 60,
                values: vec![f64::NAN, 3.0],
                ..Default::default()
            }],
        };
        let series = decode(&message.encode_to_vec()).unwrap();
        assert_eq!(series[0].samples, vec![Sample::absent(60), Sample::present(120, 3.0)]);
    }

    #[test]
    fn test_malformed_bodies() {
        let good = record("TEST.1", 60, 120, 60, &[1.0, 2.0]);

        let mut flag_mismatch = Vec::new();
        let message = MultiFetchResponse {
            metrics: vec![FetchResponse {
                name: "a".to_string(),
                values: vec![1.0, 2.0],
                is_absent: vec![false],
                ..Default::default()
            }],
        };
        message.encode(&mut flag_mismatch).unwrap();

        let mut bad_name = Vec::new();
        let mut inner = Vec::new();
        length_delimited(&mut inner, fetch_response::NAME, &[0xff, 0xfe]);
        length_delimited(&mut bad_name, multi_fetch_response::METRICS, &inner);

        let mut odd_values = Vec::new();
        let mut inner = Vec::new();
        length_delimited(&mut inner, fetch_response::VALUES, &[0; 7]);
        length_delimited(&mut odd_values, multi_fetch_response::METRICS, &inner);

        let mut wrong_wire_type = Vec::new();
        varint(&mut wrong_wire_type, multi_fetch_response::METRICS, 3);

        let mut group = Vec::new();
        key(&mut group, 7, WireType::StartGroup);

        let cases: Vec<(&str, Vec<u8>)> = vec![
            ("truncated record", good[..good.len() - 3].to_vec()),
            ("truncated varint", vec![0x0a, 0x80]),
            ("flag count mismatch", flag_mismatch),
            ("invalid utf-8 name", bad_name),
            ("partial double", odd_values),
            ("metrics as varint", wrong_wire_type),
            ("group", group),
            ("zero tag", vec![0x00]),
        ];
        for (name, body) in cases {
            let err = decode(&body).unwrap_err();
            assert!(
                matches!(err, GraphiteError::MalformedResponse(_)),
                "{name}: got {err}"
            );
        }
    }

    #[test]
    fn test_encode_rejects_uneven_spacing() {
        let series = vec![Series::new(
            "a",
            vec![Sample::present(0, 1.0), Sample::present(60, 1.0), Sample::present(180, 1.0)],
        )];
        let err = encode(&series).unwrap_err();
        assert!(matches!(err, GraphiteError::Unencodable(_)), "got {err}");
    }

    #[test]
    fn test_encode_rejects_wide_timestamps() {
        let series = vec![Series::new("a", vec![Sample::present(i64::from(i32::MAX) + 1, 1.0)])];
        let err = encode(&series).unwrap_err();
        assert!(matches!(err, GraphiteError::Unencodable(_)), "got {err}");
    }
}
