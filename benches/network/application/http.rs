use airclock_net::network::application::http::url;
use airclock_net::network::application::http::{
    Framing, Method, RequestDescriptor, Response, ResponseHandler,
};
use criterion::{BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

const TIME_SERVER: &str = "http://worldclockapi.com/api/json/cet/now";

struct Discard;

impl ResponseHandler for Discard {
    fn on_success(&self, _body: &[u8]) {}
    fn on_error(&self, _code: i32) {}
}

fn response() -> Vec<u8> {
    let mut response = b"HTTP/1.1 200 OK\r\nContent-Type: application/json; charset=utf-8\r\nServer: bench\r\n\r\n".to_vec();
    response.extend(std::iter::repeat_n(b'x', 1500));
    response
}

/// Splits `bytes` the way a socket might hand them over.
fn random_reads(bytes: &[u8], max: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut reads = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let (read, tail) = rest.split_at(rng.gen_range(1..=rest.len().min(max)));
        reads.push(read.to_vec());
        rest = tail;
    }
    reads
}

pub fn bench_url_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("url_parse");
    group.throughput(Throughput::Bytes(TIME_SERVER.len() as u64));
    group.bench_function("time_server", |b| {
        b.iter(|| url::parse(black_box(TIME_SERVER)).unwrap())
    });
    group.finish();
}

pub fn bench_format_request(c: &mut Criterion) {
    let handler = Discard;
    let mut request = RequestDescriptor::new(&handler);
    request.configure(TIME_SERVER, 80, Method::Get).unwrap();

    c.bench_function("format_request", |b| {
        b.iter(|| {
            let bytes = request.format_request().unwrap();
            black_box(bytes.len())
        })
    });
}

pub fn bench_framing(c: &mut Criterion) {
    let response = response();
    let mut group = c.benchmark_group("framing");
    group.throughput(Throughput::Bytes(response.len() as u64));

    for max_read in [16usize, 512] {
        let reads = random_reads(&response, max_read, 7);
        for framing in [Framing::PerChunk, Framing::CarryOver] {
            group.bench_with_input(
                BenchmarkId::new(format!("{framing:?}"), max_read),
                &reads,
                |b, reads| {
                    b.iter(|| {
                        let mut received = Response::default();
                        for read in reads {
                            received.push_chunk(read, framing).unwrap();
                        }
                        black_box(received.len())
                    })
                },
            );
        }
    }
    group.finish();
}
