use criterion::{criterion_group, criterion_main};

mod network;

criterion_group!(
    benches,
    network::application::http::bench_url_parse,
    network::application::http::bench_format_request,
    network::application::http::bench_framing
);
criterion_main!(benches);
