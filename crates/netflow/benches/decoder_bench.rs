//! 디코더 벤치마크
//!
//! v5 고정 레이아웃과 v9 템플릿 디코딩의 처리량을 측정합니다.

use std::net::SocketAddr;

use bytes::{BufMut, Bytes, BytesMut};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use flowpost_netflow::{Decoder, DecoderBuilder};

fn exporter() -> SocketAddr {
    SocketAddr::from(([192, 0, 2, 1], 2055))
}

fn v5_packet(count: u16) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u16(5);
    buf.put_u16(count);
    buf.put_u32(360_000);
    buf.put_u32(1_700_000_000);
    buf.put_u32(0);
    buf.put_u32(1);
    buf.put_u32(0);
    for i in 0..count {
        buf.put_slice(&[10, 0, (i >> 8) as u8, i as u8]);
        buf.put_slice(&[198, 51, 100, 20]);
        buf.put_slice(&[10, 0, 0, 254]);
        buf.put_u16(1);
        buf.put_u16(2);
        buf.put_u32(10);
        buf.put_u32(1_500);
        buf.put_u32(100);
        buf.put_u32(200);
        buf.put_u16(40_000 + i);
        buf.put_u16(443);
        buf.put_slice(&[0, 0x18, 6, 0]);
        buf.put_u16(64_512);
        buf.put_u16(65_001);
        buf.put_slice(&[24, 24, 0, 0]);
    }
    buf.freeze()
}

fn v9_header(buf: &mut BytesMut, sequence: u32) {
    buf.put_u16(9);
    buf.put_u16(0);
    buf.put_u32(1_000);
    buf.put_u32(1_700_000_000);
    buf.put_u32(sequence);
    buf.put_u32(1);
}

/// 템플릿 300: 주소 2개, 포트 2개, 프로토콜, 바이트/패킷 카운터
fn v9_template_packet() -> Bytes {
    let fields: [(u16, u16); 7] = [(8, 4), (12, 4), (7, 2), (11, 2), (4, 1), (1, 8), (2, 8)];
    let mut buf = BytesMut::new();
    v9_header(&mut buf, 0);
    buf.put_u16(0);
    buf.put_u16((8 + fields.len() * 4) as u16);
    buf.put_u16(300);
    buf.put_u16(fields.len() as u16);
    for (id, len) in fields {
        buf.put_u16(id);
        buf.put_u16(len);
    }
    buf.freeze()
}

fn v9_data_packet(records: usize) -> Bytes {
    const RECORD_LEN: usize = 29;
    let mut buf = BytesMut::new();
    v9_header(&mut buf, 1);
    let len = 4 + records * RECORD_LEN;
    let padded = len.div_ceil(4) * 4;
    buf.put_u16(300);
    buf.put_u16(padded as u16);
    for i in 0..records {
        buf.put_slice(&[10, 0, 0, i as u8]);
        buf.put_slice(&[198, 51, 100, 20]);
        buf.put_u16(40_000);
        buf.put_u16(443);
        buf.put_u8(6);
        buf.put_u64(1_500);
        buf.put_u64(10);
    }
    buf.put_bytes(0, padded - len);
    buf.freeze()
}

fn primed_v9_decoder() -> Decoder {
    let decoder = DecoderBuilder::new().build().unwrap();
    decoder.read(v9_template_packet(), exporter()).unwrap();
    decoder
}

fn bench_v5(c: &mut Criterion) {
    let decoder = DecoderBuilder::new().build().unwrap();
    let mut group = c.benchmark_group("v5");

    for count in [1u16, 10, 30] {
        let packet = v5_packet(count);
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_with_input(BenchmarkId::new("records", count), &packet, |b, packet| {
            b.iter(|| decoder.read(black_box(packet.clone()), exporter()).unwrap())
        });
    }

    group.finish();
}

fn bench_v9(c: &mut Criterion) {
    let decoder = primed_v9_decoder();
    let mut group = c.benchmark_group("v9");

    for count in [1usize, 20, 45] {
        let packet = v9_data_packet(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("records", count), &packet, |b, packet| {
            b.iter(|| decoder.read(black_box(packet.clone()), exporter()).unwrap())
        });
    }

    group.bench_function("template_set", |b| {
        let packet = v9_template_packet();
        b.iter(|| decoder.read(black_box(packet.clone()), exporter()).unwrap())
    });

    group.finish();
}

fn bench_record_json(c: &mut Criterion) {
    let decoder = primed_v9_decoder();
    let records = decoder.read(v9_data_packet(1), exporter()).unwrap();

    c.bench_function("record_to_json", |b| {
        b.iter(|| black_box(&records[0]).to_json().unwrap())
    });
}

criterion_group!(benches, bench_v5, bench_v9, bench_record_json);
criterion_main!(benches);
