//! Encode/decode benchmarks for the runtime facade, shaped like the code
//! wiretag-gen emits.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use wiretag::{FieldContext, MarshalerPool};

static MARSHALER_POOL: MarshalerPool = MarshalerPool::new();

#[derive(Debug, Default, Clone, PartialEq)]
struct Sample {
    value: f64,
    timestamp: i64,
}

impl Sample {
    fn marshal_fields(&self, mm: &mut wiretag::MessageMarshaler<'_>) {
        if self.value != 0.0 {
            mm.append_double(1u32, self.value);
        }
        if self.timestamp != 0 {
            mm.append_int64(2u32, self.timestamp);
        }
    }

    fn unmarshal_protobuf(&mut self, src: &[u8]) -> Result<(), wiretag::DecodeError> {
        let mut src = src;
        while !src.is_empty() {
            let (fc, rest) = FieldContext::next_field(src)?;
            src = rest;
            match fc.field_num {
                1u32 => {
                    self.value = fc
                        .double()
                        .ok_or(wiretag::DecodeError::field("Sample", "value"))?;
                }
                2u32 => {
                    self.timestamp = fc
                        .int64()
                        .ok_or(wiretag::DecodeError::field("Sample", "timestamp"))?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Timeseries {
    name: String,
    samples: Vec<Sample>,
    buckets: Vec<i64>,
}

impl Timeseries {
    fn marshal_protobuf(&self, dst: Vec<u8>) -> Vec<u8> {
        let mut m = MARSHALER_POOL.get();
        let mut mm = m.message_marshaler();
        self.marshal_fields(&mut mm);
        let dst = m.marshal(dst);
        MARSHALER_POOL.put(m);
        dst
    }

    fn marshal_fields(&self, mm: &mut wiretag::MessageMarshaler<'_>) {
        if !self.name.is_empty() {
            mm.append_string(1u32, &self.name);
        }
        for value in &self.samples {
            mm.append_message(2u32, |mm| value.marshal_fields(mm));
        }
        if !self.buckets.is_empty() {
            mm.append_int64s(3u32, &self.buckets);
        }
    }

    fn unmarshal_protobuf(&mut self, src: &[u8]) -> Result<(), wiretag::DecodeError> {
        let mut src = src;
        while !src.is_empty() {
            let (fc, rest) = FieldContext::next_field(src)?;
            src = rest;
            match fc.field_num {
                1u32 => {
                    self.name = fc
                        .string()
                        .ok_or(wiretag::DecodeError::field("Timeseries", "name"))?
                        .to_owned();
                }
                2u32 => {
                    let data = fc
                        .message_data()
                        .ok_or(wiretag::DecodeError::field("Timeseries", "samples"))?;
                    let mut value = Sample::default();
                    value.unmarshal_protobuf(data)?;
                    self.samples.push(value);
                }
                3u32 => {
                    if fc.unpack_int64s(&mut self.buckets).is_none() {
                        self.buckets.push(
                            fc.int64()
                                .ok_or(wiretag::DecodeError::field("Timeseries", "buckets"))?,
                        );
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn test_series() -> Timeseries {
    Timeseries {
        name: "node_cpu_seconds_total{mode=\"idle\"}".to_string(),
        samples: (0..64)
            .map(|i| Sample {
                value: i as f64 * 0.25,
                timestamp: 1_700_000_000 + i,
            })
            .collect(),
        buckets: (0..128).collect(),
    }
}

fn bench_codec(c: &mut Criterion) {
    let series = test_series();
    let encoded = series.marshal_protobuf(Vec::new());

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(encoded.len() as u64));

    group.bench_function("encode", |b| {
        let mut buf = Vec::with_capacity(encoded.len());
        b.iter(|| {
            buf.clear();
            buf = series.marshal_protobuf(std::mem::take(&mut buf));
        });
    });

    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut decoded = Timeseries::default();
            decoded.unmarshal_protobuf(&encoded).unwrap();
            decoded
        });
    });

    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
