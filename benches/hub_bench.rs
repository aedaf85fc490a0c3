//! Benchmarks for the chat-hub event hub
//!
//! Run with: cargo bench

use chat_hub::hub::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

fn draft(limits: &MessageLimits) -> MessageDraft {
    MessageDraft::new(Some("bench"), "the quick brown fox jumps over the lazy dog", limits).unwrap()
}

fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");

    let message = ChatMessage {
        id: "bench".to_string(),
        user: "bench".to_string(),
        text: "hello".to_string(),
        created_at: 0,
    };

    group.bench_function("append_at_capacity", |b| {
        let mut log = HistoryLog::new(DEFAULT_HISTORY_CAPACITY);
        for _ in 0..DEFAULT_HISTORY_CAPACITY {
            log.append(message.clone());
        }

        b.iter(|| log.append(black_box(message.clone())));
    });

    group.bench_function("snapshot_full", |b| {
        let mut log = HistoryLog::new(DEFAULT_HISTORY_CAPACITY);
        for _ in 0..DEFAULT_HISTORY_CAPACITY {
            log.append(message.clone());
        }

        b.iter(|| black_box(log.snapshot()));
    });

    group.finish();
}

fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish");

    for subscribers in [0, 10, 100, 1000] {
        let hub = EventHub::new(HubConfig {
            // Large enough that no subscriber stalls during the run
            sink_buffer: 1 << 16,
            ..Default::default()
        });
        let limits = hub.config().limits;

        let mut receivers = Vec::with_capacity(subscribers);
        for _ in 0..subscribers {
            let (sink, rx) = ChannelSink::new(hub.config().sink_buffer);
            let subscriber = Subscriber::new(sink);
            hub.attach_and_prime_history(&subscriber).unwrap();
            receivers.push(rx);
        }

        group.throughput(Throughput::Elements(subscribers.max(1) as u64));
        group.bench_with_input(
            BenchmarkId::new("fan_out", subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    hub.publish(black_box(draft(&limits)));
                    for rx in receivers.iter_mut() {
                        while rx.try_recv().is_ok() {}
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_attach(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach");

    let hub = Arc::new(EventHub::new(HubConfig::default()));
    let limits = hub.config().limits;
    for _ in 0..DEFAULT_HISTORY_CAPACITY {
        hub.publish(draft(&limits));
    }

    group.bench_function("prime_and_detach_full_history", |b| {
        b.iter(|| {
            let (sink, _rx) = ChannelSink::new(16);
            let subscriber = Subscriber::new(sink);
            hub.attach_and_prime_history(black_box(&subscriber)).unwrap();
            hub.detach(&subscriber);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_history, bench_publish, bench_attach);
criterion_main!(benches);
