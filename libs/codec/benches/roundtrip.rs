//! Hot-path benchmark: marshal/parse and byte-level round trips of a
//! representative CALL message across the serializer families.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wamp_codec::messages::{AppPayload, Call};
use wamp_codec::{decode, Message, Serializer, WampMessage};
use wamp_types::{PayloadSerializerId, Uri, Value, WampId};

fn sample_call() -> Message {
    Message::Call(Call::new(
        WampId::try_new(123).unwrap(),
        Uri::unchecked("com.example.add"),
        AppPayload::structured(
            Some(vec![Value::Integer(2), Value::Integer(3)]),
            Some([("mode".to_string(), Value::from("sync"))].into()),
        ),
    ))
}

fn bench_marshal_parse(c: &mut Criterion) {
    let message = sample_call();
    let wire = message.marshal();

    c.bench_function("call_marshal", |b| {
        b.iter(|| black_box(&message).marshal())
    });
    c.bench_function("call_parse", |b| {
        b.iter(|| Message::parse(black_box(&wire)).unwrap())
    });
}

fn bench_serializers(c: &mut Criterion) {
    let serializers = [
        ("json", Serializer::Json),
        ("msgpack", Serializer::Msgpack),
        ("cbor", Serializer::Cbor),
        (
            "binary",
            Serializer::Binary {
                payload: PayloadSerializerId::Cbor,
            },
        ),
    ];

    for (name, serializer) in serializers {
        let message = WampMessage::new(sample_call());
        let bytes = message.serialize(&serializer).unwrap();

        c.bench_function(&format!("call_encode_{name}"), |b| {
            b.iter(|| {
                // fresh wrapper so the encoding cache cannot short-circuit
                WampMessage::new(sample_call())
                    .serialize(black_box(&serializer))
                    .unwrap()
            })
        });
        c.bench_function(&format!("call_decode_{name}"), |b| {
            b.iter(|| decode(black_box(&bytes), &serializer).unwrap())
        });
    }

    let message = WampMessage::new(sample_call());
    let serializer = Serializer::Json;
    message.serialize(&serializer).unwrap();
    c.bench_function("call_encode_cached", |b| {
        b.iter(|| message.serialize(black_box(&serializer)).unwrap())
    });
}

criterion_group!(benches, bench_marshal_parse, bench_serializers);
criterion_main!(benches);
