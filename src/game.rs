//! Core game state and logic

use crate::advisor::{self, Placement};
use crate::bag::PieceGenerator;
use crate::board::{Board, Row, BOARD_HEIGHT};
use crate::error::{Container, GameError};
use crate::mode::Rules;
use crate::piece::PieceController;
use crate::queue::PieceQueue;
use crate::reserve::ReserveStack;
use crate::score::{Achievement, Hint, PlayOrigin, ScoringEngine, StatsReport};
use crate::tetromino::{Piece, Rotation, Shape, TetrominoType};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Ready,
    Playing,
    Paused,
    Over,
}

/// Input intents the session can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    HardDrop,
    PauseToggle,
    Start,
    Reset,
    TransferToReserve,
    UseReserve,
    GenerateNext,
    ShowStats,
    OptimizeQueue,
    Suggest,
}

/// Non-fatal conditions the player should be told about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Warning {
    ReserveFull,
    QueueFull,
}

/// Notifications for feedback, audio and animation
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Started,
    Paused,
    Resumed,
    Reset,
    PieceLocked(TetrominoType),
    HardDropped(u32),
    LinesCleared(u32),
    LevelUp(u32),
    Combo(u32),
    GameOver(u64),
    NewRecord(u64),
    AchievementUnlocked(Achievement),
    Warning(Warning),
    QueueOptimized { moved: usize },
    Stats(StatsReport),
    Suggestion(Placement),
}

/// The piece waiting to spawn next and where it came from
#[derive(Debug, Clone, Copy)]
struct Staged {
    piece: Piece,
    origin: PlayOrigin,
}

/// Falling piece as seen by renderers
#[derive(Debug, Clone, Serialize)]
pub struct ActiveView {
    pub kind: TetrominoType,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
    pub rotation: Rotation,
    /// Row the piece would land on
    pub ghost_y: i32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PendingView {
    pub kind: TetrominoType,
    pub origin: PlayOrigin,
}

/// Read-only copy of everything a presentation layer needs
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub state: SessionState,
    pub board: [Row; BOARD_HEIGHT],
    pub active: Option<ActiveView>,
    pub pending: Option<PendingView>,
    /// Front first
    pub queue: Vec<TetrominoType>,
    /// Top first
    pub reserve: Vec<TetrominoType>,
    pub score: u64,
    pub level: u32,
    pub lines: u32,
    pub combo: u32,
    pub efficiency: u32,
    pub total_plays: u32,
    pub piece_counts: Vec<(TetrominoType, u32)>,
    pub expert_points: u64,
    pub interval_ms: u64,
    pub personal_best: u64,
    pub achievements: Vec<Achievement>,
    pub hint: Hint,
}

/// One game of expertris: owns every component and drives the tick
pub struct Session {
    rules: Rules,
    board: Board,
    queue: PieceQueue,
    reserve: ReserveStack,
    engine: ScoringEngine,
    controller: PieceController,
    generator: PieceGenerator,
    pending: Option<Staged>,
    state: SessionState,
    /// Current gravity interval
    interval: Duration,
    /// The single scheduled tick, if any
    next_tick: Option<Instant>,
    events: Vec<GameEvent>,
}

impl Session {
    pub fn new(rules: Rules) -> Self {
        let generator = PieceGenerator::new(rules.generator, rules.seed);
        let interval = rules.drop_interval(1);
        let mut session = Self {
            rules,
            board: Board::new(),
            queue: PieceQueue::new(),
            reserve: ReserveStack::new(),
            engine: ScoringEngine::new(),
            controller: PieceController::new(),
            generator,
            pending: None,
            state: SessionState::Ready,
            interval,
            next_tick: None,
            events: Vec::new(),
        };
        session.prepare_pieces();
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn queue(&self) -> &PieceQueue {
        &self.queue
    }

    pub fn reserve(&self) -> &ReserveStack {
        &self.reserve
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Carry over the best score saved by earlier runs
    pub fn set_personal_best(&mut self, best: u64) {
        self.engine.set_personal_best(best);
    }

    /// Kind of the piece that spawns next, if one is staged
    pub fn pending(&self) -> Option<TetrominoType> {
        self.pending.map(|staged| staged.piece.kind)
    }

    /// Dispatch a command to the matching operation
    pub fn apply(&mut self, command: Command) -> Result<(), GameError> {
        match command {
            Command::MoveLeft => self.move_horizontal(-1),
            Command::MoveRight => self.move_horizontal(1),
            Command::SoftDrop => self.soft_drop(),
            Command::Rotate => self.rotate(),
            Command::HardDrop => self.hard_drop(),
            Command::PauseToggle => self.toggle_pause(),
            Command::Start => self.start(),
            Command::Reset => {
                self.reset();
                Ok(())
            }
            Command::TransferToReserve => self.transfer_to_reserve(),
            Command::UseReserve => self.use_reserve(),
            Command::GenerateNext => self.generate_next(),
            Command::ShowStats => {
                self.show_stats();
                Ok(())
            }
            Command::OptimizeQueue => {
                self.optimize_queue();
                Ok(())
            }
            Command::Suggest => {
                self.suggest();
                Ok(())
            }
        }
    }

    /// Begin playing; a finished game is reset first
    pub fn start(&mut self) -> Result<(), GameError> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Over => self.reset(),
            state => return Err(GameError::InvalidState(state)),
        }

        info!("game started");
        self.state = SessionState::Playing;
        self.next_tick = None;
        self.events.push(GameEvent::Started);
        self.spawn_next()
    }

    pub fn toggle_pause(&mut self) -> Result<(), GameError> {
        match self.state {
            SessionState::Playing => {
                self.state = SessionState::Paused;
                self.next_tick = None;
                self.events.push(GameEvent::Paused);
                debug!("paused");
            }
            SessionState::Paused => {
                self.state = SessionState::Playing;
                self.events.push(GameEvent::Resumed);
                debug!("resumed");
            }
            state => return Err(GameError::InvalidState(state)),
        }
        Ok(())
    }

    /// Rebuild the game, keeping only the personal best
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.queue.clear();
        self.reserve = ReserveStack::new();
        self.engine.reset();
        self.controller.clear();
        self.pending = None;
        self.state = SessionState::Ready;
        self.interval = self.rules.drop_interval(1);
        self.next_tick = None;
        self.prepare_pieces();
        self.events.push(GameEvent::Reset);
        info!("game reset");
    }

    /// Advance the tick scheduler to `now`
    ///
    /// At most one deadline exists. It is armed `interval` after the call that
    /// finds none, fires once when due, and is dropped whenever the session is
    /// not playing, so pauses never leave ticks owed.
    pub fn update(&mut self, now: Instant) {
        if self.state != SessionState::Playing {
            self.next_tick = None;
            return;
        }

        match self.next_tick {
            None => self.next_tick = Some(now + self.interval),
            Some(deadline) if now >= deadline => {
                self.tick();
                self.next_tick =
                    (self.state == SessionState::Playing).then(|| now + self.interval);
            }
            Some(_) => {}
        }
    }

    /// Time left before the scheduled tick
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.next_tick
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// One gravity step
    pub fn tick(&mut self) {
        if self.state != SessionState::Playing || !self.controller.has_active() {
            return;
        }
        if !self.controller.try_move(0, 1, &self.board) {
            self.lock_active();
        }
    }

    fn move_horizontal(&mut self, dx: i32) -> Result<(), GameError> {
        self.require_playing()?;
        if self.controller.try_move(dx, 0, &self.board) {
            Ok(())
        } else {
            Err(GameError::InvalidPosition)
        }
    }

    fn soft_drop(&mut self) -> Result<(), GameError> {
        self.require_playing()?;
        if !self.controller.has_active() {
            return Ok(());
        }
        if !self.controller.try_move(0, 1, &self.board) {
            self.lock_active();
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<(), GameError> {
        self.require_playing()?;
        if self.controller.try_rotate(&self.board) {
            Ok(())
        } else {
            Err(GameError::InvalidPosition)
        }
    }

    fn hard_drop(&mut self) -> Result<(), GameError> {
        self.require_playing()?;
        if !self.controller.has_active() {
            return Ok(());
        }
        let distance = self.controller.hard_drop(&self.board);
        self.events.push(GameEvent::HardDropped(distance));
        if self.rules.hard_drop_bonus {
            self.engine
                .add_drop_bonus(u64::from(distance) * self.rules.hard_drop_points_per_cell);
        }
        self.lock_active();
        Ok(())
    }

    /// Move the pending piece onto the reserve stack
    pub fn transfer_to_reserve(&mut self) -> Result<(), GameError> {
        self.require_not_over()?;
        let Some(staged) = self.pending else {
            return Err(GameError::NoPendingPiece);
        };
        if self.reserve.is_full() {
            self.events.push(GameEvent::Warning(Warning::ReserveFull));
            return Err(GameError::CapacityExceeded(Container::Reserve));
        }

        self.reserve.push(staged.piece)?;
        self.pending = None;
        self.engine.register_reserve(staged.piece.kind);
        Ok(())
    }

    /// Make the top of the reserve the next piece to spawn
    pub fn use_reserve(&mut self) -> Result<(), GameError> {
        self.require_not_over()?;
        if self.pending.is_some() {
            return Err(GameError::PieceAlreadyPending);
        }

        let piece = self.reserve.pop()?;
        self.pending = Some(Staged {
            piece,
            origin: PlayOrigin::Reserve,
        });
        self.register_play(piece.kind, PlayOrigin::Reserve);
        Ok(())
    }

    /// Stage the queue front and generate a fresh piece behind the rest
    pub fn generate_next(&mut self) -> Result<(), GameError> {
        self.require_not_over()?;
        if self.pending.is_some() {
            return Err(GameError::PieceAlreadyPending);
        }

        let front = self.next_from_queue();
        self.pending = Some(Staged {
            piece: front,
            origin: PlayOrigin::Queue,
        });
        let piece = self.generator.next_piece();
        if self.queue.enqueue(piece).is_err() {
            self.events.push(GameEvent::Warning(Warning::QueueFull));
        }
        self.fill_queue();
        Ok(())
    }

    pub fn optimize_queue(&mut self) {
        let moved = self.queue.reorder_by_value();
        self.events.push(GameEvent::QueueOptimized { moved });
    }

    pub fn show_stats(&mut self) {
        self.events.push(GameEvent::Stats(self.engine.report()));
    }

    /// Ask the advisor where the falling (or next) piece should go
    pub fn suggest(&mut self) {
        let kind = self
            .controller
            .active()
            .map(|piece| piece.kind)
            .or(self.pending());
        if let Some(placement) = kind.and_then(|kind| advisor::best_placement(&self.board, kind)) {
            self.events.push(GameEvent::Suggestion(placement));
        }
    }

    /// Take every event raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        let active = self.controller.active().map(|piece| ActiveView {
            kind: piece.kind,
            shape: piece.shape.clone(),
            x: piece.x,
            y: piece.y,
            rotation: piece.rotation,
            ghost_y: self.controller.ghost_y(&self.board).unwrap_or(piece.y),
        });
        let report = self.engine.report();

        Snapshot {
            state: self.state,
            board: *self.board.cells(),
            active,
            pending: self.pending.map(|staged| PendingView {
                kind: staged.piece.kind,
                origin: staged.origin,
            }),
            queue: self.queue.iter().map(|p| p.kind).collect(),
            reserve: self.reserve.iter().map(|p| p.kind).collect(),
            score: report.score,
            level: report.level,
            lines: report.lines,
            combo: report.combo,
            efficiency: report.efficiency,
            total_plays: report.total_plays,
            piece_counts: report.piece_counts,
            expert_points: report.expert_points,
            interval_ms: self.interval.as_millis() as u64,
            personal_best: report.personal_best,
            achievements: report.achievements,
            hint: self.engine.hint(&self.queue, &self.reserve),
        }
    }

    fn require_playing(&self) -> Result<(), GameError> {
        match self.state {
            SessionState::Playing => Ok(()),
            state => Err(GameError::InvalidState(state)),
        }
    }

    fn require_not_over(&self) -> Result<(), GameError> {
        match self.state {
            SessionState::Over => Err(GameError::InvalidState(SessionState::Over)),
            _ => Ok(()),
        }
    }

    /// Fill the queue and stage the first piece
    fn prepare_pieces(&mut self) {
        self.fill_queue();
        self.stage_from_queue();
    }

    fn fill_queue(&mut self) {
        while !self.queue.is_full() {
            if self.queue.enqueue(self.generator.next_piece()).is_err() {
                break;
            }
        }
    }

    fn stage_from_queue(&mut self) {
        let piece = self.next_from_queue();
        self.pending = Some(Staged {
            piece,
            origin: PlayOrigin::Queue,
        });
        self.fill_queue();
    }

    fn next_from_queue(&mut self) -> Piece {
        match self.queue.dequeue() {
            Ok(piece) => piece,
            Err(_) => self.generator.next_piece(),
        }
    }

    /// Bring the next piece into play
    fn spawn_next(&mut self) -> Result<(), GameError> {
        let staged = match self.pending.take() {
            Some(staged) => staged,
            None => Staged {
                piece: self.next_from_queue(),
                origin: PlayOrigin::Queue,
            },
        };
        self.fill_queue();
        if self.pending.is_none() {
            self.stage_from_queue();
        }

        if let Err(e) = self.controller.spawn(&staged.piece, &self.board) {
            info!("spawn blocked for {:?}", staged.piece.kind);
            self.game_over();
            return Err(e);
        }
        // Reserve plays were counted when the piece left the reserve
        if staged.origin == PlayOrigin::Queue {
            self.register_play(staged.piece.kind, PlayOrigin::Queue);
        }
        Ok(())
    }

    fn register_play(&mut self, kind: TetrominoType, origin: PlayOrigin) {
        let outcome = self.engine.register_play(kind, origin);
        if outcome.combo > 0 {
            self.events.push(GameEvent::Combo(outcome.combo));
        }
        self.events.extend(
            outcome
                .achievements
                .into_iter()
                .map(GameEvent::AchievementUnlocked),
        );
    }

    /// Lock the falling piece, score the result and continue or end the game
    fn lock_active(&mut self) {
        let Some(lock) = self.controller.lock_into_board(&mut self.board) else {
            return;
        };
        self.events.push(GameEvent::PieceLocked(lock.kind));

        let full = self.board.find_full_rows();
        let cleared = self.board.clear_rows(&full) as u32;
        let outcome = self.engine.register_line_clear(cleared);
        if cleared > 0 {
            self.events.push(GameEvent::LinesCleared(cleared));
        }
        if outcome.leveled_up() {
            self.interval = self.rules.drop_interval(outcome.level_after);
            self.events.push(GameEvent::LevelUp(outcome.level_after));
        }
        self.events.extend(
            outcome
                .achievements
                .into_iter()
                .map(GameEvent::AchievementUnlocked),
        );

        if self.board.is_top_blocked() {
            self.game_over();
            return;
        }
        // A blocked spawn has already ended the game
        let _ = self.spawn_next();
    }

    fn game_over(&mut self) {
        self.state = SessionState::Over;
        self.next_tick = None;
        self.controller.clear();

        let score = self.engine.score();
        info!("game over with {} points", score);
        self.events.push(GameEvent::GameOver(score));
        if self.engine.finish_game(score) {
            self.events.push(GameEvent::NewRecord(score));
        }
    }

    #[cfg(test)]
    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Replace the falling piece with `kind` in the given orientation at the top
    #[cfg(test)]
    fn force_active(&mut self, kind: TetrominoType, rotation: Rotation, x: i32) {
        self.controller.place(crate::piece::ActivePiece {
            kind,
            shape: kind.shape_at(rotation),
            x,
            y: 0,
            rotation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BOARD_WIDTH;
    use crate::mode::GameMode;
    use crate::queue::QUEUE_CAPACITY;

    fn seeded() -> Session {
        Session::new(Rules {
            seed: Some(7),
            ..Rules::default()
        })
    }

    fn started() -> Session {
        let mut session = seeded();
        session.start().unwrap();
        session.drain_events();
        session
    }

    #[test]
    fn test_new_session_is_ready_with_full_queue() {
        let session = seeded();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.queue().len(), QUEUE_CAPACITY);
        assert!(session.pending().is_some());
        assert!(session.board().is_empty());
        assert!(session.snapshot().active.is_none());
    }

    #[test]
    fn test_start_spawns_pending_piece() {
        let mut session = seeded();
        let first = session.pending().unwrap();
        let second = session.queue().peek_at(0).unwrap().kind;

        session.start().unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, SessionState::Playing);
        assert_eq!(snapshot.active.map(|a| a.kind), Some(first));
        assert_eq!(session.pending(), Some(second));
        assert_eq!(snapshot.queue.len(), QUEUE_CAPACITY);
        assert_eq!(session.engine().queue_plays(), 1);
        assert_eq!(session.drain_events(), vec![GameEvent::Started]);
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut session = started();
        assert_eq!(
            session.start(),
            Err(GameError::InvalidState(SessionState::Playing))
        );
    }

    #[test]
    fn test_line_clear_from_four_i_pieces() {
        let mut session = started();
        let level = session.engine().level();
        let score = session.engine().score();

        // Two flat bars fill columns 0-7, two upright bars fill 8 and 9
        session.force_active(TetrominoType::I, Rotation::North, 0);
        session.apply(Command::HardDrop).unwrap();
        session.force_active(TetrominoType::I, Rotation::North, 4);
        session.apply(Command::HardDrop).unwrap();
        session.force_active(TetrominoType::I, Rotation::East, 8);
        session.apply(Command::HardDrop).unwrap();
        assert_eq!(session.engine().lines(), 0);
        session.force_active(TetrominoType::I, Rotation::East, 9);
        session.apply(Command::HardDrop).unwrap();

        assert_eq!(session.engine().score(), score + 100 * u64::from(level));
        assert_eq!(session.engine().lines(), 1);
        assert_eq!(session.state(), SessionState::Playing);
        // What was above the cleared row dropped one row
        assert_eq!(session.board().filled_count(), 6);
        let bottom = BOARD_HEIGHT as i32 - 1;
        assert!(session.board().get(bottom, 8).is_some_and(|c| c != 0));
        assert_eq!(session.board().get(bottom, 0), Some(0));

        let events = session.drain_events();
        assert!(events.contains(&GameEvent::LinesCleared(1)));
        assert!(events.contains(&GameEvent::AchievementUnlocked(Achievement::FirstLine)));
    }

    #[test]
    fn test_blocked_spawn_ends_game_without_touching_board() {
        let mut session = seeded();
        for row in 0..2 {
            for col in 0..BOARD_WIDTH as i32 {
                session.board_mut().set(row, col, TetrominoType::O.cell_id());
            }
        }
        let before = session.board().clone();

        assert_eq!(session.start(), Err(GameError::BlockedSpawn));
        assert_eq!(session.state(), SessionState::Over);
        assert_eq!(session.board(), &before);
        assert!(session.snapshot().active.is_none());
        assert!(
            session
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::GameOver(0)))
        );
    }

    #[test]
    fn test_start_after_game_over_resets() {
        let mut session = seeded();
        session.board_mut().set(0, 4, 1);
        session.board_mut().set(1, 4, 1);
        let _ = session.start();
        assert_eq!(session.state(), SessionState::Over);

        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.board().filled_count(), 0);
    }

    #[test]
    fn test_update_arms_single_deadline_and_ticks() {
        let mut session = started();
        let t0 = Instant::now();
        let interval = session.interval();
        let y0 = session.snapshot().active.unwrap().y;

        session.update(t0);
        assert_eq!(session.time_until_tick(t0), Some(interval));
        // Re-arming while a deadline is pending is a no-op
        session.update(t0 + interval / 2);
        assert_eq!(session.time_until_tick(t0), Some(interval));

        session.update(t0 + interval);
        assert_eq!(session.snapshot().active.unwrap().y, y0 + 1);
        assert_eq!(
            session.time_until_tick(t0 + interval),
            Some(interval)
        );
    }

    #[test]
    fn test_pause_halts_ticks_without_debt() {
        let mut session = started();
        let t0 = Instant::now();
        let interval = session.interval();
        let y0 = session.snapshot().active.unwrap().y;
        session.update(t0);

        session.apply(Command::PauseToggle).unwrap();
        assert_eq!(session.state(), SessionState::Paused);
        session.update(t0 + interval * 10);
        assert_eq!(session.time_until_tick(t0), None);
        assert_eq!(session.snapshot().active.unwrap().y, y0);
        assert_eq!(
            session.apply(Command::MoveLeft),
            Err(GameError::InvalidState(SessionState::Paused))
        );

        session.apply(Command::PauseToggle).unwrap();
        let resume = t0 + interval * 10;
        session.update(resume);
        // Fresh deadline, nothing owed from the pause
        assert_eq!(session.snapshot().active.unwrap().y, y0);
        assert_eq!(session.time_until_tick(resume), Some(interval));
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::Paused, GameEvent::Resumed]
        );
    }

    #[test]
    fn test_pause_rejected_when_ready() {
        let mut session = seeded();
        assert_eq!(
            session.toggle_pause(),
            Err(GameError::InvalidState(SessionState::Ready))
        );
    }

    #[test]
    fn test_transfer_and_use_reserve() {
        let mut session = started();
        let pending = session.pending().unwrap();

        session.apply(Command::TransferToReserve).unwrap();
        assert_eq!(session.pending(), None);
        assert_eq!(session.reserve().peek_top().map(|p| p.kind), Some(pending));
        assert_eq!(session.engine().reserved_count(), 1);
        assert_eq!(
            session.apply(Command::TransferToReserve),
            Err(GameError::NoPendingPiece)
        );

        session.apply(Command::UseReserve).unwrap();
        assert_eq!(session.pending(), Some(pending));
        assert!(session.reserve().is_empty());
        assert_eq!(session.engine().reserve_plays(), 1);
        assert_eq!(
            session.apply(Command::UseReserve),
            Err(GameError::PieceAlreadyPending)
        );

        // The reserve play is not counted again when it spawns
        let plays = session.engine().total_plays();
        session.apply(Command::HardDrop).unwrap();
        assert_eq!(session.engine().total_plays(), plays);
        assert_eq!(session.snapshot().active.map(|a| a.kind), Some(pending));
    }

    #[test]
    fn test_transfer_to_full_reserve_warns_without_change() {
        let mut session = started();
        for _ in 0..3 {
            session.transfer_to_reserve().unwrap();
            session.generate_next().unwrap();
        }
        session.drain_events();
        let pending = session.pending();

        assert_eq!(
            session.transfer_to_reserve(),
            Err(GameError::CapacityExceeded(Container::Reserve))
        );
        assert_eq!(session.pending(), pending);
        assert_eq!(session.reserve().len(), 3);
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::Warning(Warning::ReserveFull)]
        );
    }

    #[test]
    fn test_use_empty_reserve() {
        let mut session = started();
        session.pending = None;
        assert_eq!(
            session.use_reserve(),
            Err(GameError::Empty(Container::Reserve))
        );
        assert_eq!(session.pending(), None);
    }

    #[test]
    fn test_generate_next_stages_queue_front() {
        let mut session = started();
        assert_eq!(
            session.generate_next(),
            Err(GameError::PieceAlreadyPending)
        );

        session.transfer_to_reserve().unwrap();
        session.drain_events();
        let front = session.queue().peek_at(0).map(|p| p.kind);
        let second = session.queue().peek_at(1).map(|p| p.kind);
        let fresh = session.generator.clone().next_kind();

        session.generate_next().unwrap();
        assert_eq!(session.pending(), front);
        assert_eq!(session.queue().len(), QUEUE_CAPACITY);
        assert_eq!(session.queue().peek_at(0).map(|p| p.kind), second);
        assert_eq!(
            session.queue().peek_at(QUEUE_CAPACITY - 1).map(|p| p.kind),
            Some(fresh)
        );
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_optimize_queue_reports_moves() {
        let mut session = seeded();
        session.optimize_queue();
        let values: Vec<u32> = session
            .queue()
            .iter()
            .map(|p| p.kind.queue_value())
            .collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
        assert!(matches!(
            session.drain_events().as_slice(),
            [GameEvent::QueueOptimized { .. }]
        ));
    }

    #[test]
    fn test_show_stats_and_suggest_emit_events() {
        let mut session = started();
        session.apply(Command::ShowStats).unwrap();
        session.apply(Command::Suggest).unwrap();
        let events = session.drain_events();
        assert!(matches!(&events[0], GameEvent::Stats(report) if report.total_plays == 1));
        assert!(matches!(&events[1], GameEvent::Suggestion(_)));
    }

    #[test]
    fn test_soft_drop_locks_on_floor() {
        let mut session = started();
        session.force_active(TetrominoType::O, Rotation::North, 0);
        for _ in 0..BOARD_HEIGHT {
            session.apply(Command::SoftDrop).unwrap();
        }
        assert_eq!(session.board().filled_count(), 4);
        assert!(
            session
                .drain_events()
                .contains(&GameEvent::PieceLocked(TetrominoType::O))
        );
    }

    #[test]
    fn test_hard_drop_bonus_only_when_enabled() {
        let mut session = started();
        session.force_active(TetrominoType::O, Rotation::North, 0);
        session.hard_drop().unwrap();
        assert_eq!(session.engine().score(), 0);

        let mut session = Session::new(Rules {
            hard_drop_bonus: true,
            seed: Some(3),
            ..Rules::default()
        });
        session.start().unwrap();
        session.force_active(TetrominoType::O, Rotation::North, 0);
        session.hard_drop().unwrap();
        // O falls from row 0 to row 18
        assert_eq!(session.engine().score(), 18 * 2);
    }

    fn fill_column_from(session: &mut Session, col: i32, top: i32) {
        for row in top..BOARD_HEIGHT as i32 {
            session.board_mut().set(row, col, TetrominoType::I.cell_id());
        }
    }

    #[test]
    fn test_top_out_after_lock() {
        let mut session = started();
        fill_column_from(&mut session, 0, 4);
        session.force_active(TetrominoType::I, Rotation::East, 0);
        session.hard_drop().unwrap();

        assert_eq!(session.state(), SessionState::Over);
        assert_eq!(session.time_until_tick(Instant::now()), None);
        assert!(session.snapshot().active.is_none());
        assert!(
            session
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::GameOver(_)))
        );
    }

    #[test]
    fn test_reset_keeps_personal_best() {
        let mut session = started();
        let bottom = BOARD_HEIGHT as i32 - 1;
        for col in 4..BOARD_WIDTH as i32 {
            session.board_mut().set(bottom, col, TetrominoType::T.cell_id());
        }
        session.force_active(TetrominoType::I, Rotation::North, 0);
        session.hard_drop().unwrap();
        assert_eq!(session.engine().score(), 100);

        fill_column_from(&mut session, 0, 4);
        session.force_active(TetrominoType::I, Rotation::East, 0);
        session.hard_drop().unwrap();
        assert_eq!(session.state(), SessionState::Over);
        assert_eq!(session.engine().personal_best(), 100);
        assert!(session.drain_events().contains(&GameEvent::NewRecord(100)));

        session.apply(Command::Reset).unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, SessionState::Ready);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.personal_best, 100);
        assert_eq!(snapshot.queue.len(), QUEUE_CAPACITY);
        assert!(snapshot.pending.is_some());
        assert!(snapshot.reserve.is_empty());
        assert!(session.board().is_empty());
    }

    #[test]
    fn test_level_up_shortens_interval() {
        let mut session = started();
        let bottom = BOARD_HEIGHT as i32 - 1;
        for _ in 0..10 {
            for col in 4..BOARD_WIDTH as i32 {
                session.board_mut().set(bottom, col, TetrominoType::S.cell_id());
            }
            session.force_active(TetrominoType::I, Rotation::North, 0);
            session.hard_drop().unwrap();
        }
        assert_eq!(session.engine().lines(), 10);
        assert_eq!(session.engine().level(), 2);
        assert_eq!(session.interval(), Duration::from_millis(950));
        assert!(session.drain_events().contains(&GameEvent::LevelUp(2)));
    }

    #[test]
    fn test_relax_mode_keeps_interval() {
        let mut session = Session::new(Rules {
            mode: GameMode::Relax,
            seed: Some(1),
            ..Rules::default()
        });
        session.start().unwrap();
        let bottom = BOARD_HEIGHT as i32 - 1;
        for _ in 0..10 {
            for col in 4..BOARD_WIDTH as i32 {
                session.board_mut().set(bottom, col, TetrominoType::Z.cell_id());
            }
            session.force_active(TetrominoType::I, Rotation::North, 0);
            session.hard_drop().unwrap();
        }
        assert_eq!(session.engine().level(), 2);
        assert_eq!(session.interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_snapshot_serializes() {
        let session = started();
        let json = serde_json::to_string(&session.snapshot()).unwrap();
        assert!(json.contains("\"state\":\"Playing\""));
    }
}
