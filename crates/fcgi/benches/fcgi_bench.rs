use bytes::BytesMut;
use criterion::{criterion_group, criterion_main, Criterion};
use futures::executor::block_on;
use micro_fcgi::codec::pairs::encode_pair;
use micro_fcgi::codec::{OutRecord, PairsDecoder, RecordDecoder, RecordEncoder};
use micro_fcgi::connection::{Connection, FcgiClient, StreamWriter};
use micro_fcgi::protocol::{EndRequestBody, ProtocolStatus, RecordType};
use std::{
    hint::black_box,
    io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::codec::{Decoder, Encoder};

const STATUS_PAGE: &[u8] = b"pool: www\nprocess manager: dynamic\nstart time: 18/Oct/2026:10:00:00 +0000\n\
accepted conn: 12073\nlisten queue: 0\nmax listen queue: 1\nidle processes: 4\nactive processes: 1\n";

const PARAMS: [(&str, &str); 6] = [
    ("GATEWAY_INTERFACE", "FastCGI/1.0"),
    ("REQUEST_METHOD", "GET"),
    ("SCRIPT_NAME", "/status"),
    ("SCRIPT_FILENAME", "/status"),
    ("QUERY_STRING", "full"),
    ("SERVER_SOFTWARE", "micro-fcgi"),
];

// Mock IO replaying a recorded php-fpm reply
struct MockIO {
    read_data: Vec<u8>,
    read_pos: usize,
}

impl MockIO {
    fn new(read_data: Vec<u8>) -> Self {
        Self { read_data, read_pos: 0 }
    }
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = std::cmp::min(remaining.len(), buf.remaining());
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

fn status_reply() -> Vec<u8> {
    let mut bytes = BytesMut::new();
    let end = EndRequestBody::new(0, ProtocolStatus::RequestComplete).encode();
    let mut encoder = RecordEncoder::new();
    encoder.encode(OutRecord::new(RecordType::Stdout, 1, STATUS_PAGE), &mut bytes).unwrap();
    encoder.encode(OutRecord::new(RecordType::Stdout, 1, &b""[..]), &mut bytes).unwrap();
    encoder.encode(OutRecord::new(RecordType::EndRequest, 1, &end[..]), &mut bytes).unwrap();
    bytes.to_vec()
}

fn bench_record_decoder(c: &mut Criterion) {
    let reply = status_reply();

    c.bench_function("decode_status_reply", |b| {
        b.iter(|| {
            let mut decoder = RecordDecoder::new();
            let mut bytes = BytesMut::from(&reply[..]);
            while let Some(record) = decoder.decode(&mut bytes).unwrap() {
                black_box(record);
            }
        });
    });
}

fn bench_pairs(c: &mut Criterion) {
    c.bench_function("encode_params", |b| {
        b.iter(|| {
            let mut bytes = BytesMut::with_capacity(256);
            for (name, value) in PARAMS {
                encode_pair(&mut bytes, name, value).unwrap();
            }
            black_box(bytes);
        });
    });

    let mut encoded = BytesMut::new();
    for (name, value) in PARAMS {
        encode_pair(&mut encoded, name, value).unwrap();
    }
    c.bench_function("decode_params", |b| {
        b.iter(|| {
            let mut bytes = encoded.clone();
            let mut decoder = PairsDecoder::new();
            while let Some(pair) = decoder.decode(&mut bytes).unwrap() {
                black_box(pair);
            }
        });
    });
}

fn bench_stream_writer(c: &mut Criterion) {
    let body = vec![b'x'; 256 * 1024];

    c.bench_function("write_stdin_stream", |b| {
        b.iter(|| {
            let connection = Connection::new(Vec::with_capacity(body.len() + 64));
            block_on(async {
                let mut writer = StreamWriter::new(&connection, RecordType::Stdin, 1);
                writer.write(&body).await.unwrap();
                writer.close().await.unwrap();
            });
            black_box(connection.into_inner());
        });
    });
}

fn bench_status_request(c: &mut Criterion) {
    let reply = status_reply();

    c.bench_function("process_status_request", |b| {
        b.iter(|| {
            let mut client = FcgiClient::new(MockIO::new(reply.clone()), Vec::new());
            black_box(block_on(client.request(PARAMS, b"")).unwrap());
        });
    });
}

criterion_group!(benches, bench_record_decoder, bench_pairs, bench_stream_writer, bench_status_request);
criterion_main!(benches);
