//! Replay a recorded landmark stream through a fresh detector.
//!
//! Input: JSON array of frames
//! `[{"session_id": 1, "exercise": "squat", "landmarks": [{"name": "LEFT_HIP", "x": 0.5, "y": 0.6}, ...], "timestamp_ms": 0}, ...]`

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::time::Instant;

use rep_tracker::config::Config;
use rep_tracker::keyframe::{KeyframeDetector, SessionId};
use rep_tracker::protocol::FrameMessage;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        bail!("usage: {} <frames.json> [config.toml]", args[0]);
    }
    let config = Config::load_or_default(args.get(2).map(String::as_str).unwrap_or(CONFIG_PATH));

    let content = std::fs::read_to_string(&args[1])
        .with_context(|| format!("failed to read {}", args[1]))?;
    let frames: Vec<FrameMessage> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", args[1]))?;

    println!("Replay: {} frames", frames.len());
    println!("Phase threshold: {}, plank interval: {}s",
        config.detector.phase_threshold, config.detector.plank_interval_secs);
    println!();

    let detector = KeyframeDetector::from_config(&config.detector);
    let base = Instant::now();
    let mut keyframes: BTreeMap<u64, usize> = BTreeMap::new();

    for (i, frame) in frames.iter().enumerate() {
        let landmarks = match frame.landmark_set() {
            Ok(set) => set,
            Err(e) => {
                println!("#{:<5} session {:<4} skipped: {}", i, frame.session_id, e);
                continue;
            }
        };
        let id = SessionId(frame.session_id);
        let signal = detector.process_frame(id, &frame.exercise(), &landmarks, frame.instant(base));

        let kind = signal.keyframe.map(|k| k.as_str()).unwrap_or("-");
        if signal.keyframe.is_some() {
            *keyframes.entry(frame.session_id).or_default() += 1;
        }
        println!(
            "#{:<5} session {:<4} t={:>8}ms {:<8} keyframe={:<15}{}",
            i,
            frame.session_id,
            frame.timestamp_ms,
            frame.exercise,
            kind,
            if signal.rep_completed {
                format!(" REP #{}", detector.get_rep_count(id))
            } else {
                String::new()
            }
        );
    }

    println!();
    println!("Summary:");
    let mut sessions: Vec<u64> = frames.iter().map(|f| f.session_id).collect();
    sessions.sort_unstable();
    sessions.dedup();
    for session_id in sessions {
        println!(
            "  session {}: reps={} keyframes={}",
            session_id,
            detector.get_rep_count(SessionId(session_id)),
            keyframes.get(&session_id).copied().unwrap_or(0)
        );
    }

    Ok(())
}
