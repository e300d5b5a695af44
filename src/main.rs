use anyhow::Result;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use rep_tracker::config::Config;
use rep_tracker::keyframe::{Exercise, KeyframeDetector, SessionId};
use rep_tracker::pose::{Landmark, LandmarkSet};

const CONFIG_PATH: &str = "config.toml";
const SESSION: SessionId = SessionId(0);

const HELP: &str = "\
コマンド:
  f <種目> <primary_y> <secondary_y> <t_ms>  - フレームを入力 (例: f squat 0.6 0.5 1000)
  c                                          - レップ数を表示
  r                                          - セッションをリセット
  q                                          - 終了";

/// primary / secondary のY座標だけを持つフレームを作る
fn make_frame(exercise: &Exercise, primary_y: f64, secondary_y: f64) -> Result<LandmarkSet> {
    let Some((primary, secondary)) = exercise.primary_pair() else {
        return Ok(LandmarkSet::empty());
    };
    Ok(LandmarkSet::new(vec![
        Landmark::named(primary, 0.5, primary_y),
        Landmark::named(secondary, 0.5, secondary_y),
    ])?)
}

fn main() -> Result<()> {
    env_logger::init();
    let config = Config::load_or_default(CONFIG_PATH);

    println!("=== Rep Tracker - 検出器テスト ===");
    println!("位相判定の閾値: {}", config.detector.phase_threshold);
    println!("プランク間隔: {}秒", config.detector.plank_interval_secs);
    println!();
    println!("{}", HELP);
    println!();

    let detector = KeyframeDetector::from_config(&config.detector);
    let base = Instant::now();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "f" if parts.len() == 5 => {
                let exercise = Exercise::parse(parts[1]);
                let primary_y: f64 = parts[2].parse()?;
                let secondary_y: f64 = parts[3].parse()?;
                let t_ms: u64 = parts[4].parse()?;
                let landmarks = match make_frame(&exercise, primary_y, secondary_y) {
                    Ok(set) => set,
                    Err(e) => {
                        println!("不正なフレーム: {}", e);
                        continue;
                    }
                };
                let signal = detector.process_frame(
                    SESSION,
                    &exercise,
                    &landmarks,
                    base + Duration::from_millis(t_ms),
                );
                println!(
                    "キーフレーム: {}  レップ完了: {}  レップ数: {}",
                    signal.keyframe.map(|k| k.as_str()).unwrap_or("なし"),
                    signal.rep_completed,
                    detector.get_rep_count(SESSION)
                );
            }
            "c" => {
                println!("レップ数: {}", detector.get_rep_count(SESSION));
            }
            "r" => {
                detector.reset_session(SESSION);
                println!("セッションをリセットしました");
            }
            "q" => {
                println!("終了します");
                break;
            }
            _ => {
                println!("不明なコマンド: {}", parts[0]);
            }
        }
    }

    Ok(())
}
