//! Performance benchmarks for the call relay hot paths
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;
use waav_call_relay::core::link::channel_link;
use waav_call_relay::core::realtime::{ClientEvent, ServerEvent};
use waav_call_relay::core::relay::{AiEvent, RelayState, plan_barge_in};
use waav_call_relay::core::telephony::{TelephonyCommand, TelephonyInbound};
use waav_call_relay::core::transcript::GoodbyeDetector;

/// About 20ms of 8kHz mu-law, base64 encoded
fn media_payload() -> String {
    "/".repeat(216)
}

/// Benchmark parsing of inbound media stream frames
fn bench_telephony_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("telephony_parsing");
    group.measurement_time(Duration::from_secs(5));

    let media = format!(
        r#"{{"event":"media","sequenceNumber":"42","media":{{"track":"inbound","chunk":"41","timestamp":"820","payload":"{}"}},"streamSid":"MZ123"}}"#,
        media_payload()
    );
    let mark = r#"{"event":"mark","sequenceNumber":"43","streamSid":"MZ123","mark":{"name":"responsePart"}}"#;

    group.throughput(Throughput::Bytes(media.len() as u64));
    group.bench_with_input(BenchmarkId::new("media", media.len()), &media, |b, msg| {
        b.iter(|| TelephonyInbound::parse(black_box(msg)).map(TelephonyInbound::into_event));
    });

    group.throughput(Throughput::Bytes(mark.len() as u64));
    group.bench_with_input(BenchmarkId::new("mark", mark.len()), &mark, |b, msg| {
        b.iter(|| TelephonyInbound::parse(black_box(msg)).map(TelephonyInbound::into_event));
    });

    group.finish();
}

/// Benchmark parsing of realtime server events, including delta payload validation
fn bench_realtime_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("realtime_parsing");

    let delta = format!(
        r#"{{"type":"response.audio.delta","event_id":"ev_1","response_id":"resp_1","item_id":"item_1","output_index":0,"content_index":0,"delta":"{}"}}"#,
        media_payload()
    );
    let done = r#"{"type":"response.done","response":{"id":"resp_1","status":"completed","output":[{"id":"item_1","type":"message","role":"assistant","content":[{"type":"audio","transcript":"Sure, I can help with that. Anything else?"}]}]}}"#;

    group.throughput(Throughput::Bytes(delta.len() as u64));
    group.bench_function("audio_delta", |b| {
        b.iter(|| {
            ServerEvent::parse(black_box(&delta))
                .ok()
                .and_then(|e| e.into_event().ok())
        });
    });

    group.throughput(Throughput::Bytes(done.len() as u64));
    group.bench_function("response_done", |b| {
        b.iter(|| {
            ServerEvent::parse(black_box(done))
                .ok()
                .and_then(|e| e.into_event().ok())
        });
    });

    group.finish();
}

/// Benchmark serialization of outbound commands
fn bench_command_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_serialization");

    let media = TelephonyCommand::media("MZ123", media_payload());
    let append = ClientEvent::InputAudioBufferAppend {
        audio: media_payload(),
    };

    group.bench_function("telephony_media", |b| {
        b.iter(|| serde_json::to_string(black_box(&media)))
    });
    group.bench_function("audio_append", |b| {
        b.iter(|| serde_json::to_string(black_box(&append)))
    });

    group.finish();
}

/// Benchmark relay state bookkeeping per assistant chunk and barge-in
fn bench_relay_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay_state");

    group.bench_function("delta_then_ack", |b| {
        let mut state = RelayState::new();
        state.set_stream_id("MZ123");
        let mut ts = 0;
        b.iter(|| {
            ts += 20;
            state.record_media(ts);
            let commands = state.record_audio_delta("resp_1", "item_1", String::from("AAAA"));
            state.acknowledge();
            black_box(commands)
        });
    });

    for queued in [1usize, 50, 500] {
        group.bench_with_input(
            BenchmarkId::new("barge_in", queued),
            &queued,
            |b, &queued| {
                b.iter_batched(
                    || {
                        let mut state = RelayState::new();
                        state.set_stream_id("MZ123");
                        for i in 0..queued {
                            state.record_media(i as u64 * 20);
                            state.record_audio_delta("resp_1", "item_1", String::from("AAAA"));
                        }
                        state
                    },
                    |mut state| plan_barge_in(&mut state),
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark goodbye phrase matching on typical assistant lines
fn bench_goodbye_detection(c: &mut Criterion) {
    let detector = GoodbyeDetector::default();
    let miss = "Your appointment is confirmed for Tuesday at three in the afternoon.";
    let hit = "You're all set. Thanks for calling and take care!";

    c.bench_function("goodbye_miss", |b| b.iter(|| detector.matches(black_box(miss))));
    c.bench_function("goodbye_hit", |b| b.iter(|| detector.matches(black_box(hit))));
}

/// Benchmark an event round trip through an in-process link
fn bench_link_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("link_round_trip", |b| {
        b.to_async(&rt).iter(|| async {
            let (link, mut peer) = channel_link::<ClientEvent, AiEvent>(8);
            let (sender, mut events) = link.into_parts();
            peer.events.send(Ok(AiEvent::SpeechStarted)).await.unwrap();
            sender.send(ClientEvent::ResponseCreate).await.unwrap();
            let event = futures::StreamExt::next(&mut events).await;
            let command = peer.commands.recv().await;
            black_box((event, command))
        });
    });
}

criterion_group!(
    benches,
    bench_telephony_parsing,
    bench_realtime_parsing,
    bench_command_serialization,
    bench_relay_state,
    bench_goodbye_detection,
    bench_link_round_trip,
);

criterion_main!(benches);
