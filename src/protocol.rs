//! TCP protocol between the serving layer and the detector server.
//!
//! Frames are length-delimited bincode payloads. Each `ClientMessage`
//! is answered with exactly one `ServerMessage`.

use bytes::Bytes;
use futures::{Sink, SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::keyframe::{Exercise, KeyframeDetector, KeyframeKind, SessionId};
use crate::pose::{Landmark, LandmarkError, LandmarkSet};

// --- Message types ---

/// One pose-estimation result for one session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrameMessage {
    pub session_id: u64,
    pub exercise: String,
    /// Empty when no body was detected.
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    /// Caller clock in milliseconds, monotonic per session.
    pub timestamp_ms: u64,
}

impl FrameMessage {
    pub fn landmark_set(&self) -> Result<LandmarkSet, LandmarkError> {
        LandmarkSet::new(self.landmarks.iter().cloned())
    }

    pub fn exercise(&self) -> Exercise {
        Exercise::parse(&self.exercise)
    }

    /// Map the caller clock onto `base`.
    pub fn instant(&self, base: Instant) -> Instant {
        base + Duration::from_millis(self.timestamp_ms)
    }
}

/// Serving layer → detector
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ClientMessage {
    ProcessFrame { frame: FrameMessage },
    GetRepCount { session_id: u64 },
    ResetSession { session_id: u64 },
}

/// Detector → serving layer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    FrameResult {
        session_id: u64,
        keyframe: Option<KeyframeKind>,
        rep_completed: bool,
        rep_count: u32,
    },
    RepCount { session_id: u64, count: u32 },
    SessionReset { session_id: u64 },
    Error { message: String },
}

/// Run one request against the detector.
pub fn handle_message(detector: &KeyframeDetector, base: Instant, msg: ClientMessage) -> ServerMessage {
    match msg {
        ClientMessage::ProcessFrame { frame } => {
            let landmarks = match frame.landmark_set() {
                Ok(set) => set,
                Err(e) => return ServerMessage::Error { message: e.to_string() },
            };
            let id = SessionId(frame.session_id);
            let signal = detector.process_frame(id, &frame.exercise(), &landmarks, frame.instant(base));
            ServerMessage::FrameResult {
                session_id: frame.session_id,
                keyframe: signal.keyframe,
                rep_completed: signal.rep_completed,
                rep_count: detector.get_rep_count(id),
            }
        }
        ClientMessage::GetRepCount { session_id } => ServerMessage::RepCount {
            session_id,
            count: detector.get_rep_count(SessionId(session_id)),
        },
        ClientMessage::ResetSession { session_id } => {
            detector.reset_session(SessionId(session_id));
            ServerMessage::SessionReset { session_id }
        }
    }
}

// --- TCP codec helpers ---

pub type MessageStream = Framed<TcpStream, LengthDelimitedCodec>;

/// Create a framed message stream with length-delimited framing.
pub fn message_stream(stream: TcpStream) -> MessageStream {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(16 * 1024 * 1024) // 16MB
        .new_codec();
    Framed::new(stream, codec)
}

/// Send a serializable message (bincode + length prefix).
pub async fn send_message<T: Serialize>(
    stream: &mut MessageStream,
    msg: &T,
) -> anyhow::Result<()> {
    send_to_sink(stream, msg).await
}

/// Send on any byte sink, e.g. the write half of a split stream.
pub async fn send_to_sink<S, T>(sink: &mut S, msg: &T) -> anyhow::Result<()>
where
    S: Sink<Bytes, Error = std::io::Error> + Unpin,
    T: Serialize,
{
    let data = bincode::serialize(msg)?;
    sink.send(Bytes::from(data)).await?;
    Ok(())
}

/// Receive and deserialize a message.
pub async fn recv_message<T: DeserializeOwned>(
    stream: &mut MessageStream,
) -> anyhow::Result<T> {
    match stream.next().await {
        Some(Ok(bytes)) => Ok(bincode::deserialize(&bytes)?),
        Some(Err(e)) => Err(e.into()),
        None => Err(anyhow::anyhow!("connection closed")),
    }
}
