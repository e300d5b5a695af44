//! Detector server: receives landmark frames over TCP, runs the keyframe
//! detector and answers with keyframe kind and rep count.
//!
//! One task per connection; all connections share a single detector, so a
//! session may be fed from several connections.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::StreamExt as _;

use rep_tracker::config::Config;
use rep_tracker::keyframe::KeyframeDetector;
use rep_tracker::protocol::{self, ClientMessage, ServerMessage};

const CONFIG_PATH: &str = "config.toml";

// ===========================================================================
// Logging
// ===========================================================================

type LogFile = Arc<Mutex<std::io::BufWriter<std::fs::File>>>;

fn open_log_file() -> Result<LogFile> {
    std::fs::create_dir_all("logs")?;
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("logs/detector_{}.log", ts);
    let file = std::fs::File::create(&path)?;
    eprintln!("Log: {}", path);
    Ok(Arc::new(Mutex::new(std::io::BufWriter::new(file))))
}

macro_rules! log {
    ($logfile:expr, $($arg:tt)*) => {{
        let msg = format!($($arg)*);
        eprintln!("{}", msg);
        if let Ok(mut f) = $logfile.lock() {
            let _ = writeln!(f, "{}", msg);
            let _ = f.flush();
        }
    }};
}

// ===========================================================================
// Connection loop
// ===========================================================================

async fn serve_connection(
    stream: tokio::net::TcpStream,
    addr: SocketAddr,
    detector: Arc<KeyframeDetector>,
    base: Instant,
    logfile: LogFile,
    verbose: bool,
) -> Result<()> {
    let framed = protocol::message_stream(stream);
    let (mut sink, mut reader) = framed.split();

    while let Some(result) = reader.next().await {
        let bytes = result?;
        let msg: ClientMessage = match bincode::deserialize(&bytes) {
            Ok(msg) => msg,
            Err(e) => {
                log!(logfile, "[{}] bad message: {}", addr, e);
                let reply = ServerMessage::Error { message: format!("bad message: {}", e) };
                protocol::send_to_sink(&mut sink, &reply).await?;
                continue;
            }
        };

        let reply = protocol::handle_message(&detector, base, msg);
        match &reply {
            ServerMessage::FrameResult { session_id, keyframe, rep_completed, rep_count } => {
                if *rep_completed {
                    log!(logfile, "[{}] session {}: rep #{}", addr, session_id, rep_count);
                } else if verbose {
                    if let Some(kind) = keyframe {
                        log!(logfile, "[{}] session {}: keyframe {}", addr, session_id, kind.as_str());
                    }
                }
            }
            ServerMessage::SessionReset { session_id } => {
                log!(logfile, "[{}] session {}: reset", addr, session_id);
            }
            ServerMessage::Error { message } => {
                log!(logfile, "[{}] rejected frame: {}", addr, message);
            }
            ServerMessage::RepCount { .. } => {}
        }
        protocol::send_to_sink(&mut sink, &reply).await?;
    }

    Ok(())
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load_or_default(CONFIG_PATH);
    let logfile = open_log_file()?;

    log!(logfile, "Detector Server ({})", env!("GIT_VERSION"));
    log!(logfile, "Listen: {}", config.server.listen_addr);
    log!(logfile, "Phase threshold: {}", config.detector.phase_threshold);
    log!(logfile, "Plank interval: {}s", config.detector.plank_interval_secs);
    if config.server.verbose { log!(logfile, "Verbose mode: ON"); }

    let detector = Arc::new(KeyframeDetector::from_config(&config.detector));
    let base = Instant::now();

    if let Some(idle_secs) = config.server.session_idle_secs {
        let max_idle = Duration::from_secs(idle_secs);
        let period = Duration::from_secs(config.server.evict_interval_secs.max(1));
        log!(logfile, "Idle eviction: {}s (every {}s)", idle_secs, period.as_secs());

        let detector = Arc::clone(&detector);
        let logfile = Arc::clone(&logfile);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = detector.evict_idle(Instant::now(), max_idle);
                if evicted > 0 {
                    log!(logfile, "Evicted {} idle session(s), {} active", evicted, detector.active_sessions());
                }
            }
        });
    }

    let bind_addr: SocketAddr = config.server.listen_addr.parse()
        .context("invalid listen_addr")?;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log!(logfile, "Listening on {}", bind_addr);
    log!(logfile, "");

    loop {
        let (tcp_stream, addr) = listener.accept().await?;
        tcp_stream.set_nodelay(true)?;
        log!(logfile, "Client connected: {}", addr);

        let detector = Arc::clone(&detector);
        let logfile = Arc::clone(&logfile);
        let verbose = config.server.verbose;
        tokio::spawn(async move {
            if let Err(e) = serve_connection(tcp_stream, addr, detector, base, Arc::clone(&logfile), verbose).await {
                log!(logfile, "[{}] connection error: {}", addr, e);
            }
            log!(logfile, "Client disconnected: {}", addr);
        });
    }
}
