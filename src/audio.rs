//! Audio system: short synthesized beeps for game feedback

use expertris::{Command, GameEvent};
use rodio::source::SineWave;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::time::Duration;
use tracing::{debug, warn};

/// Loudness of a beep at full volume
const BEEP_AMPLITUDE: f32 = 0.2;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Beep {
    Start,
    Move,
    Rotate,
    SoftDrop,
    HardDrop,
    Lock,
    Clear,
    LevelUp,
    GameOver,
}

impl Beep {
    /// (frequency in Hz, duration in ms) played back to back
    fn tones(&self) -> &'static [(f32, u64)] {
        match self {
            Beep::Start => &[(660.0, 80)],
            Beep::Move => &[(320.0, 30)],
            Beep::Rotate => &[(520.0, 50)],
            Beep::SoftDrop => &[(240.0, 20)],
            Beep::HardDrop => &[(160.0, 60)],
            Beep::Lock => &[(200.0, 50)],
            Beep::Clear => &[(880.0, 80)],
            Beep::LevelUp => &[(700.0, 60), (900.0, 60)],
            Beep::GameOver => &[(200.0, 200), (120.0, 300)],
        }
    }

    /// Beep for a command that went through
    pub fn for_command(command: Command) -> Option<Beep> {
        match command {
            Command::MoveLeft | Command::MoveRight => Some(Beep::Move),
            Command::Rotate => Some(Beep::Rotate),
            Command::SoftDrop => Some(Beep::SoftDrop),
            _ => None,
        }
    }

    /// Beep for a session event
    pub fn for_event(event: &GameEvent) -> Option<Beep> {
        match event {
            GameEvent::Started => Some(Beep::Start),
            GameEvent::HardDropped(_) => Some(Beep::HardDrop),
            GameEvent::PieceLocked(_) => Some(Beep::Lock),
            GameEvent::LinesCleared(_) => Some(Beep::Clear),
            GameEvent::LevelUp(_) => Some(Beep::LevelUp),
            GameEvent::GameOver(_) => Some(Beep::GameOver),
            _ => None,
        }
    }
}

/// Audio manager handles all sound playback
pub struct AudioManager {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    volume: f32,
}

impl AudioManager {
    /// Open the default output device, `None` when there is no audio
    pub fn new() -> Option<Self> {
        match OutputStream::try_default() {
            Ok((stream, stream_handle)) => Some(Self {
                _stream: stream,
                stream_handle,
                volume: 0.5,
            }),
            Err(e) => {
                warn!("audio disabled: {}", e);
                None
            }
        }
    }

    /// Set volume (0.0 to 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn play(&self, beep: Beep) {
        if self.volume <= 0.0 {
            return;
        }
        let Ok(sink) = Sink::try_new(&self.stream_handle) else {
            debug!("no sink for {:?}", beep);
            return;
        };

        sink.set_volume(self.volume);
        for &(freq, ms) in beep.tones() {
            sink.append(
                SineWave::new(freq)
                    .take_duration(Duration::from_millis(ms))
                    .amplify(BEEP_AMPLITUDE),
            );
        }
        sink.detach(); // Let it play and clean up automatically
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expertris::tetromino::TetrominoType;

    #[test]
    fn test_event_beeps() {
        assert_eq!(Beep::for_event(&GameEvent::LinesCleared(2)), Some(Beep::Clear));
        assert_eq!(
            Beep::for_event(&GameEvent::PieceLocked(TetrominoType::T)),
            Some(Beep::Lock)
        );
        assert_eq!(Beep::for_event(&GameEvent::Paused), None);
    }

    #[test]
    fn test_multi_tone_beeps() {
        assert_eq!(Beep::LevelUp.tones().len(), 2);
        assert_eq!(Beep::GameOver.tones()[1], (120.0, 300));
        assert_eq!(Beep::for_command(Command::Start), None);
    }
}
