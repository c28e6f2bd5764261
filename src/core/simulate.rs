//! Seeded synthetic gesture traces.
//!
//! Used by the CLI's `simulate` command and by tests that need realistic
//! event sequences. The same seed always yields the same trace.

use crate::collector::types::{GestureEvent, ModalityHint};
use crate::core::engine::TargetBounds;
use rand::distributions::Distribution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::LogNormal;
use std::f64::consts::PI;

/// Frame period of the scripted driver (ms).
pub const SCRIPTED_FRAME_MS: f64 = 1000.0 / 60.0;

/// Kind of trace to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Human,
    Scripted,
}

impl TraceKind {
    pub fn generate(self, seed: u64, target: &TargetBounds) -> Vec<GestureEvent> {
        match self {
            TraceKind::Human => human_trace(seed, target),
            TraceKind::Scripted => scripted_trace(seed, target),
        }
    }
}

/// A hand-like drag towards the target: hesitant start, bell-shaped speed,
/// a curved path, irregular report timing and the occasional pause.
pub fn human_trace(seed: u64, target: &TargetBounds) -> Vec<GestureEvent> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let hint = ModalityHint::Pointer;
    let (cx, cy) = target.center();

    let angle = rng.gen_range(0.6 * PI..1.4 * PI);
    let reach = rng.gen_range(220.0..420.0);
    let (sx, sy) = (cx + reach * angle.cos(), cy + reach * angle.sin());

    let mut events = Vec::new();
    let entry_t = rng.gen_range(0.0..50.0);
    events.push(GestureEvent::entry(sx, sy, entry_t, hint));

    let press_t = entry_t + rng.gen_range(380.0..900.0);
    events.push(GestureEvent::press(sx, sy, press_t, hint));

    // Report intervals centred on ~15 ms with a long right tail
    let intervals = LogNormal::new(15.0_f64.ln(), 0.35).ok();
    let duration = rng.gen_range(750.0..1250.0);
    let bow = rng.gen_range(-0.18..0.18) * reach;
    let (nx, ny) = (-(cy - sy) / reach, (cx - sx) / reach);

    let mut elapsed = 0.0;
    while elapsed < duration {
        let mut step = intervals
            .as_ref()
            .map_or(15.0, |d| d.sample(&mut rng))
            .clamp(4.0, 60.0);
        if rng.gen_bool(0.03) {
            step += rng.gen_range(90.0..220.0);
        }
        elapsed = (elapsed + step).min(duration);

        let tau = elapsed / duration;
        let progress = minimum_jerk(tau);
        let lateral = bow * (PI * progress).sin();
        let x = sx + (cx - sx) * progress + nx * lateral + rng.gen_range(-1.2..1.2);
        let y = sy + (cy - sy) * progress + ny * lateral + rng.gen_range(-1.2..1.2);
        events.push(GestureEvent::movement(x, y, press_t + elapsed, hint));
    }

    let settle = rng.gen_range(20.0..90.0);
    events.push(GestureEvent::release(
        cx + rng.gen_range(-3.0..3.0),
        cy + rng.gen_range(-3.0..3.0),
        press_t + duration + settle,
        hint,
    ));
    events
}

/// An automation-style drag: instant reaction, a straight constant-speed
/// path, and moves locked to a 60 Hz frame clock.
pub fn scripted_trace(seed: u64, target: &TargetBounds) -> Vec<GestureEvent> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let hint = ModalityHint::Pointer;
    let (cx, cy) = target.center();
    let sx = cx - rng.gen_range(250.0..400.0);
    let sy = cy;

    let mut events = vec![
        GestureEvent::entry(sx, sy, 0.0, hint),
        GestureEvent::press(sx, sy, 40.0, hint),
    ];

    let frames = rng.gen_range(40..70);
    for i in 1..=frames {
        let progress = i as f64 / frames as f64;
        let t = 40.0 + i as f64 * SCRIPTED_FRAME_MS;
        events.push(GestureEvent::movement(sx + (cx - sx) * progress, sy, t, hint));
    }
    let end_t = 40.0 + frames as f64 * SCRIPTED_FRAME_MS;
    events.push(GestureEvent::release(cx, cy, end_t, hint));
    events
}

/// Position along a minimum-jerk profile for normalized time `tau`.
fn minimum_jerk(tau: f64) -> f64 {
    let tau = tau.clamp(0.0, 1.0);
    10.0 * tau.powi(3) - 15.0 * tau.powi(4) + 6.0 * tau.powi(5)
}
