//! Performance benchmarks for transcript reconciliation and event routing
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::json;
use std::time::Duration;

use coach_realtime::api::BackendTool;
use coach_realtime::core::realtime::{EventRouter, TransportEvent};
use coach_realtime::core::tools::ToolCompiler;
use coach_realtime::core::transcript::{Transcript, TranscriptRole};

/// Benchmark event decoding
fn bench_event_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_decoding");
    group.measurement_time(Duration::from_secs(5));

    let delta = r#"{"type":"response.audio_transcript.delta","response_id":"resp_1","item_id":"item_1","output_index":0,"content_index":0,"delta":"Hello there"}"#;
    let snapshot = json!({
        "type": "history_updated",
        "items": (0..20).map(|i| json!({
            "itemId": format!("item_{i}"),
            "type": "message",
            "role": if i % 2 == 0 { "user" } else { "assistant" },
            "content": [{"type": "output_audio", "transcript": "Some transcribed sentence."}]
        })).collect::<Vec<_>>()
    })
    .to_string();
    let unknown = r#"{"type":"rate_limits.updated","rate_limits":[{"name":"tokens","limit":1000}]}"#;

    for (name, text) in [("delta", delta), ("history_updated", snapshot.as_str()), ("unknown", unknown)] {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new(name, text.len()), &text, |b, text| {
            b.iter(|| TransportEvent::from_text(black_box(text)));
        });
    }

    group.finish();
}

/// Benchmark a streaming agent turn: many deltas then completion
fn bench_streaming_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming_turn");

    for deltas in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(deltas as u64));
        group.bench_with_input(BenchmarkId::from_parameter(deltas), &deltas, |b, &deltas| {
            b.iter(|| {
                let mut transcript = Transcript::new();
                for _ in 0..deltas {
                    transcript.apply_delta("a1", black_box("word "));
                }
                transcript.apply_completion("a1", "final", TranscriptRole::Assistant);
                transcript
            });
        });
    }

    group.finish();
}

/// Benchmark routing a long conversation through the router
fn bench_conversation_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversation_routing");

    let events: Vec<TransportEvent> = (0..200)
        .flat_map(|turn| {
            let id = format!("item_{turn}");
            vec![
                TransportEvent::from_json(json!({
                    "type": "history_added",
                    "item": {"itemId": id, "type": "message", "role": "assistant", "content": []}
                })),
                TransportEvent::from_json(json!({
                    "type": "response.audio_transcript.delta", "item_id": id, "delta": "Partial "
                })),
                TransportEvent::from_json(json!({
                    "type": "response.audio_transcript.done", "item_id": id, "transcript": "Partial answer."
                })),
            ]
        })
        .collect();

    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("200_turns", |b| {
        b.iter(|| {
            let router = EventRouter::new(Transcript::shared());
            for event in events.iter().cloned() {
                router.route(event);
            }
            router.transcript().read().len()
        });
    });

    group.finish();
}

/// Benchmark tool compilation
fn bench_tool_compilation(c: &mut Criterion) {
    let declarations: Vec<BackendTool> = serde_json::from_value(json!((0..25)
        .map(|i| json!({
            "name": format!("tool_{i}"),
            "description": "Generated tool",
            "parameters": {"type": "object", "properties": {
                "text": {"type": "string", "required": true},
                "level": {"type": "string", "enum": ["low", "mid", "high"]},
                "score": {"type": "number"}
            }}
        }))
        .collect::<Vec<_>>()))
    .unwrap_or_default();

    let compiler = ToolCompiler::default();
    c.bench_function("compile_25_tools", |b| {
        b.iter(|| compiler.compile(black_box(&declarations)));
    });
}

criterion_group!(
    benches,
    bench_event_decoding,
    bench_streaming_turn,
    bench_conversation_routing,
    bench_tool_compilation
);
criterion_main!(benches);
