use criterion::{black_box, criterion_group, criterion_main, Criterion};

use elma::lev::{Level, Object, ObjectType, Polygon, Top10Save};
use elma::rec::{Event, EventType, Frame, Replay};
use elma::Position;

fn replay() -> Replay {
    let mut replay = Replay::new();
    replay.level = String::from("bench.lev");
    replay.frames = (0..3_000)
        .map(|n| Frame {
            bike: Position { x: n as f32 * 0.1, y: 1.0 },
            throttle: n % 2 == 0,
            ..Frame::new()
        })
        .collect();
    replay.events = (0..200i32)
        .map(|n| Event {
            time: f64::from(n) * 0.05,
            event_type: EventType::Turn,
        })
        .collect();
    replay
}

fn level() -> Level {
    let mut level = Level::new();
    level.polygons = (0..50i32)
        .map(|p| Polygon {
            grass: p % 7 == 0,
            vertices: (0..40i32)
                .map(|v| Position { x: f64::from(p * 40 + v), y: f64::from(v) })
                .collect(),
        })
        .collect();
    level.objects = (0..100i32)
        .map(|n| Object {
            position: Position { x: f64::from(n), y: 0.0 },
            object_type: ObjectType::Killer,
        })
        .collect();
    level
}

fn codec(c: &mut Criterion) {
    let replay = replay();
    let replay_bytes = replay.to_bytes().unwrap();
    c.bench_function("replay encode", |b| b.iter(|| black_box(&replay).to_bytes().unwrap()));
    c.bench_function("replay decode", |b| {
        b.iter(|| Replay::from_bytes(black_box(&replay_bytes)).unwrap())
    });

    let level = level();
    let level_bytes = level.to_bytes(Top10Save::Yes).unwrap();
    c.bench_function("level encode", |b| {
        b.iter(|| black_box(&level).to_bytes(Top10Save::Yes).unwrap())
    });
    c.bench_function("level decode", |b| {
        b.iter(|| Level::from_bytes(black_box(&level_bytes)).unwrap())
    });
}

criterion_group!(benches, codec);
criterion_main!(benches);
