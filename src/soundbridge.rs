//! Request bridge between the UI and the sound engine
//!
//! The UI side holds a [`SoundBridge`] and fires messages into a bounded
//! queue; the engine loop drains it with [`drain`]. Nothing flows back.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use sfx_audio::{Interaction, OutputDevice, SoundEngine};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// A message from the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeMessage {
    PlaySound { name: String },
    Interaction { kind: Interaction },
}

impl BridgeMessage {
    /// Parse one line of bridge input
    ///
    /// Accepts JSON (`{"type":"playSound","name":"win"}`) or plain text
    /// (`play win`, `click`, `key`, `touch`). Blank lines and `#` comments
    /// yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        if line.starts_with('{') {
            return Ok(Some(serde_json::from_str(line)?));
        }

        let mut words = line.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some("play"), Some(name), None) => Ok(Some(BridgeMessage::PlaySound {
                name: name.to_string(),
            })),
            (Some(word), None, None) => match word.parse::<Interaction>() {
                Ok(kind) => Ok(Some(BridgeMessage::Interaction { kind })),
                Err(_) => bail!("Unrecognized bridge message: {}", line),
            },
            _ => bail!("Unrecognized bridge message: {}", line),
        }
    }
}

/// Sending half of the bridge; cheap to clone
#[derive(Debug, Clone)]
pub struct SoundBridge {
    tx: mpsc::Sender<BridgeMessage>,
}

/// Create a bridge whose queue holds up to `capacity` pending messages
pub fn channel(capacity: usize) -> (SoundBridge, mpsc::Receiver<BridgeMessage>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (SoundBridge { tx }, rx)
}

impl SoundBridge {
    /// Ask the engine to play a sound; never blocks, never fails
    pub fn play_sound(&self, name: impl Into<String>) {
        self.send(BridgeMessage::PlaySound { name: name.into() });
    }

    /// Report a user interaction; never blocks, never fails
    pub fn interaction(&self, kind: Interaction) {
        self.send(BridgeMessage::Interaction { kind });
    }

    /// Queue a message, dropping it if the queue is full
    pub fn send(&self, message: BridgeMessage) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                tracing::debug!(?message, "bridge queue full; message dropped");
            }
            Err(TrySendError::Closed(message)) => {
                tracing::debug!(?message, "sound engine stopped; message dropped");
            }
        }
    }

    /// Queue a message, waiting for room
    pub async fn forward(&self, message: BridgeMessage) {
        if let Err(e) = self.tx.send(message).await {
            tracing::debug!(message = ?e.0, "sound engine stopped; message dropped");
        }
    }
}

/// Hand one message to the engine
pub fn dispatch<D: OutputDevice>(engine: &mut SoundEngine<D>, message: BridgeMessage) {
    match message {
        BridgeMessage::PlaySound { name } => {
            tracing::debug!(sound = %name, "play request");
            engine.play(&name);
        }
        BridgeMessage::Interaction { kind } => {
            engine.on_interaction(kind);
        }
    }
}

/// Run the engine loop until every bridge handle is dropped
pub async fn drain<D: OutputDevice>(mut rx: mpsc::Receiver<BridgeMessage>, engine: &mut SoundEngine<D>) {
    while let Some(message) = rx.recv().await {
        dispatch(engine, message);
    }
}

/// Feed bridge messages read line by line from `reader`
pub fn spawn_line_reader<R>(reader: R, bridge: SoundBridge) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match BridgeMessage::parse(&line) {
                    Ok(Some(message)) => bridge.forward(message).await,
                    Ok(None) => {}
                    Err(e) => tracing::warn!(error = %e, "ignoring bridge input"),
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read bridge input");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfx_audio::{AssetBase, EngineConfig, NullDevice, OutputState, SoundCatalog, SourceFetcher};
    use std::io::Cursor;
    use std::sync::Arc;

    fn wav_bytes() -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for i in 0..64 {
                writer.write_sample(if i % 2 == 0 { 8000i16 } else { -8000 }).unwrap();
            }
            writer.finalize().unwrap();
        }
        bytes
    }

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(
            BridgeMessage::parse("play button-click").unwrap(),
            Some(BridgeMessage::PlaySound {
                name: "button-click".to_string()
            })
        );
        assert_eq!(
            BridgeMessage::parse("  click ").unwrap(),
            Some(BridgeMessage::Interaction {
                kind: Interaction::Click
            })
        );
        assert_eq!(BridgeMessage::parse("").unwrap(), None);
        assert_eq!(BridgeMessage::parse("# comment").unwrap(), None);
        assert!(BridgeMessage::parse("dance").is_err());
        assert!(BridgeMessage::parse("play two words").is_err());
    }

    #[test]
    fn test_parse_json() {
        assert_eq!(
            BridgeMessage::parse(r#"{"type":"playSound","name":"win"}"#).unwrap(),
            Some(BridgeMessage::PlaySound {
                name: "win".to_string()
            })
        );
        assert_eq!(
            BridgeMessage::parse(r#"{"type":"interaction","kind":"keydown"}"#).unwrap(),
            Some(BridgeMessage::Interaction {
                kind: Interaction::KeyDown
            })
        );
        assert!(BridgeMessage::parse(r#"{"type":"stop"}"#).is_err());
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let (bridge, mut rx) = channel(1);
        bridge.play_sound("win");
        bridge.play_sound("lose");

        drop(bridge);
        assert_eq!(
            rx.recv().await,
            Some(BridgeMessage::PlaySound {
                name: "win".to_string()
            })
        );
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_closed_engine_does_not_panic() {
        let (bridge, rx) = channel(4);
        drop(rx);
        bridge.play_sound("win");
        bridge.forward(BridgeMessage::Interaction { kind: Interaction::Click }).await;
    }

    #[tokio::test]
    async fn test_bridge_drives_engine() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("click.wav"), wav_bytes()).unwrap();

        let base = AssetBase::Dir(dir.path().to_path_buf());
        let catalog =
            Arc::new(SoundCatalog::from_table(&base, &[("click", "click.wav", Some(0.2))], 0.5).unwrap());
        let mut engine = SoundEngine::new(
            catalog,
            Arc::new(SourceFetcher::new()),
            NullDevice::new(false),
            EngineConfig::default(),
        );
        engine.loader().all_settled().await;
        assert_eq!(engine.state(), OutputState::Suspended);

        let (bridge, rx) = channel(8);
        bridge.interaction(Interaction::Click);
        bridge.play_sound("click");
        bridge.play_sound("click");
        bridge.play_sound("missing");
        drop(bridge);

        drain(rx, &mut engine).await;

        assert_eq!(engine.state(), OutputState::Running);
        assert_eq!(engine.output().device().voices_started(), 2);
    }

    #[tokio::test]
    async fn test_line_reader_forwards_messages() {
        let input = "click\n\nplay win\nnonsense here\n{\"type\":\"playSound\",\"name\":\"lose\"}\n";
        let (bridge, mut rx) = channel(1);

        let reader = spawn_line_reader(Cursor::new(input.as_bytes().to_vec()), bridge);

        let mut received = Vec::new();
        while let Some(message) = rx.recv().await {
            received.push(message);
        }
        reader.await.unwrap();

        assert_eq!(
            received,
            vec![
                BridgeMessage::Interaction {
                    kind: Interaction::Click
                },
                BridgeMessage::PlaySound {
                    name: "win".to_string()
                },
                BridgeMessage::PlaySound {
                    name: "lose".to_string()
                },
            ]
        );
    }
}
