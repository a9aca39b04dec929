//! Expert scoring system: play scores, statistics, combos, line clears and levels

use crate::queue::PieceQueue;
use crate::reserve::ReserveStack;
use crate::tetromino::TetrominoType;
use serde::Serialize;
use tracing::{debug, info};

/// Lines needed per level
pub const LINES_PER_LEVEL: u32 = 10;

/// Where a played piece came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayOrigin {
    Queue,
    Reserve,
}

/// Milestones unlocked during a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Achievement {
    FirstLine,
    Tetris,
    ComboStreak,
    LevelFive,
    Balanced,
    Centurion,
}

impl Achievement {
    pub fn name(&self) -> &'static str {
        match self {
            Achievement::FirstLine => "First Line",
            Achievement::Tetris => "Tetris",
            Achievement::ComboStreak => "Combo Streak",
            Achievement::LevelFive => "Level 5",
            Achievement::Balanced => "Balanced",
            Achievement::Centurion => "Centurion",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::FirstLine => "Clear your first line",
            Achievement::Tetris => "Clear 4 lines at once",
            Achievement::ComboStreak => "Play the same piece 4 times in a row",
            Achievement::LevelFive => "Reach level 5",
            Achievement::Balanced => "Keep efficiency at 90% or more after 10 plays",
            Achievement::Centurion => "Play 100 pieces",
        }
    }
}

/// Rule-based advice for the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Hint {
    UseReserve,
    SaveIPiece,
    Balance,
    ChaseCombo,
    OptimizeQueue,
}

impl Hint {
    pub fn message(&self) -> &'static str {
        match self {
            Hint::UseReserve => "Use the reserve stack for strategic pieces!",
            Hint::SaveIPiece => "I pieces are ideal for multiple lines!",
            Hint::Balance => "Keep a balance between queue and reserve!",
            Hint::ChaseCombo => "Combos increase your score!",
            Hint::OptimizeQueue => "Optimize the queue to maximize efficiency!",
        }
    }
}

/// Result of registering one play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOutcome {
    /// Expert points awarded for the play
    pub points: u64,
    pub combo: u32,
    pub achievements: Vec<Achievement>,
}

/// Result of scoring a line clear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineClearOutcome {
    pub points: u64,
    pub level_before: u32,
    pub level_after: u32,
    pub achievements: Vec<Achievement>,
}

impl LineClearOutcome {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Full statistics, as shown in the stats panel and logged at game end
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub score: u64,
    pub level: u32,
    pub lines: u32,
    pub total_plays: u32,
    pub queue_plays: u32,
    pub reserve_plays: u32,
    pub reserved_count: u32,
    pub efficiency: u32,
    pub combo: u32,
    pub expert_points: u64,
    pub piece_counts: Vec<(TetrominoType, u32)>,
    pub achievements: Vec<Achievement>,
    pub personal_best: u64,
}

/// Statistics and scoring state for one game
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    total_plays: u32,
    queue_plays: u32,
    reserve_plays: u32,
    reserved_count: u32,
    /// Plays per kind, indexed by [`TetrominoType::index`]
    piece_counts: [u32; 7],
    combo: u32,
    last_kind: Option<TetrominoType>,
    /// Percent, 0-100
    efficiency: u32,
    score: u64,
    level: u32,
    lines: u32,
    /// Sum of every play score
    expert_points: u64,
    achievements: Vec<Achievement>,
    /// Survives `reset`
    personal_best: u64,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self {
            total_plays: 0,
            queue_plays: 0,
            reserve_plays: 0,
            reserved_count: 0,
            piece_counts: [0; 7],
            combo: 0,
            last_kind: None,
            efficiency: 0,
            score: 0,
            level: 1,
            lines: 0,
            expert_points: 0,
            achievements: Vec::new(),
            personal_best: 0,
        }
    }

    pub fn total_plays(&self) -> u32 {
        self.total_plays
    }

    pub fn queue_plays(&self) -> u32 {
        self.queue_plays
    }

    pub fn reserve_plays(&self) -> u32 {
        self.reserve_plays
    }

    pub fn reserved_count(&self) -> u32 {
        self.reserved_count
    }

    pub fn piece_count(&self, kind: TetrominoType) -> u32 {
        self.piece_counts[kind.index()]
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn efficiency(&self) -> u32 {
        self.efficiency
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn expert_points(&self) -> u64 {
        self.expert_points
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn personal_best(&self) -> u64 {
        self.personal_best
    }

    /// `floor(base × (1 + total×0.01) × (1 + combo×0.1))` in integer arithmetic
    pub fn play_score(kind: TetrominoType, total_plays: u32, combo: u32) -> u64 {
        let base = u64::from(kind.base_score());
        base * (100 + u64::from(total_plays)) * (10 + u64::from(combo)) / 1000
    }

    /// Score the next play of `kind` would earn right now
    pub fn compute_play_score(&self, kind: TetrominoType) -> u64 {
        Self::play_score(kind, self.total_plays, self.combo)
    }

    pub fn register_play(&mut self, kind: TetrominoType, origin: PlayOrigin) -> PlayOutcome {
        let points = self.compute_play_score(kind);

        self.total_plays += 1;
        match origin {
            PlayOrigin::Queue => self.queue_plays += 1,
            PlayOrigin::Reserve => self.reserve_plays += 1,
        }
        self.piece_counts[kind.index()] += 1;

        if self.last_kind == Some(kind) {
            self.combo += 1;
        } else {
            self.combo = 0;
        }
        self.last_kind = Some(kind);
        self.efficiency = self.compute_efficiency();
        self.expert_points += points;

        let mut achievements = Vec::new();
        if self.combo >= 3 {
            self.unlock(Achievement::ComboStreak, &mut achievements);
        }
        if self.efficiency >= 90 && self.total_plays >= 10 {
            self.unlock(Achievement::Balanced, &mut achievements);
        }
        if self.total_plays >= 100 {
            self.unlock(Achievement::Centurion, &mut achievements);
        }

        debug!(
            "play {:?} from {:?}: {} points, combo {}, total {}",
            kind, origin, points, self.combo, self.total_plays
        );
        PlayOutcome {
            points,
            combo: self.combo,
            achievements,
        }
    }

    pub fn register_reserve(&mut self, kind: TetrominoType) {
        self.reserved_count += 1;
        debug!("reserved {:?}, {} reserved so far", kind, self.reserved_count);
    }

    /// How close the play mix is to 70% queue / 30% reserve
    ///
    /// Computed exactly: `floor((max(0, 100 - |q - 0.7|×100) + max(0, 100 - |r - 0.3|×100)) / 2)`
    /// with both terms scaled by the total play count.
    fn compute_efficiency(&self) -> u32 {
        let total = u64::from(self.total_plays);
        if total == 0 {
            return 0;
        }
        let term = |plays: u32, target_percent: u64| {
            let deviation = (u64::from(plays) * 100).abs_diff(target_percent * total);
            (100 * total).saturating_sub(deviation)
        };
        let sum = term(self.queue_plays, 70) + term(self.reserve_plays, 30);
        (sum / (2 * total)) as u32
    }

    /// Classic line clear points
    pub fn score_line_clear(lines: u32, level: u32) -> u64 {
        let base = match lines {
            1 => 100,
            2 => 300,
            3 => 500,
            4 => 800,
            _ => 0,
        };
        base * u64::from(level)
    }

    pub fn level_for_lines(total_lines: u32) -> u32 {
        total_lines / LINES_PER_LEVEL + 1
    }

    /// Gravity interval for a level in milliseconds
    pub fn drop_speed_ms(level: u32) -> u64 {
        let reduction = u64::from(level.saturating_sub(1)) * 50;
        1000u64.saturating_sub(reduction).max(100)
    }

    pub fn register_line_clear(&mut self, count: u32) -> LineClearOutcome {
        let level_before = self.level;
        let points = Self::score_line_clear(count, level_before);
        self.score += points;
        self.lines += count;
        self.level = Self::level_for_lines(self.lines);

        let mut achievements = Vec::new();
        if count > 0 {
            self.unlock(Achievement::FirstLine, &mut achievements);
        }
        if count == 4 {
            self.unlock(Achievement::Tetris, &mut achievements);
        }
        if self.level >= 5 {
            self.unlock(Achievement::LevelFive, &mut achievements);
        }

        if count > 0 {
            debug!("{} lines for {} points, level {}", count, points, self.level);
        }
        if self.level > level_before {
            info!("level up: {}", self.level);
        }
        LineClearOutcome {
            points,
            level_before,
            level_after: self.level,
            achievements,
        }
    }

    pub fn add_drop_bonus(&mut self, points: u64) {
        self.score += points;
    }

    /// Seed the best score from an earlier run
    pub fn set_personal_best(&mut self, best: u64) {
        self.personal_best = self.personal_best.max(best);
    }

    /// Record the final score, returns true on a new personal best
    pub fn finish_game(&mut self, final_score: u64) -> bool {
        if final_score > self.personal_best {
            info!("new personal best: {}", final_score);
            self.personal_best = final_score;
            return true;
        }
        false
    }

    /// Pick the most relevant tip for the current state
    pub fn hint(&self, queue: &PieceQueue, reserve: &ReserveStack) -> Hint {
        if self.total_plays >= 10 && self.efficiency < 70 {
            return Hint::Balance;
        }
        if self.combo > 0 {
            return Hint::ChaseCombo;
        }
        let best_value = queue.iter().map(|p| p.kind.queue_value()).max();
        let front_value = queue.peek_at(0).map(|p| p.kind.queue_value());
        if front_value < best_value {
            return Hint::OptimizeQueue;
        }
        if reserve.is_empty() {
            return Hint::UseReserve;
        }
        if queue.iter().any(|p| p.kind == TetrominoType::I) {
            return Hint::SaveIPiece;
        }
        Hint::Balance
    }

    pub fn report(&self) -> StatsReport {
        StatsReport {
            score: self.score,
            level: self.level,
            lines: self.lines,
            total_plays: self.total_plays,
            queue_plays: self.queue_plays,
            reserve_plays: self.reserve_plays,
            reserved_count: self.reserved_count,
            efficiency: self.efficiency,
            combo: self.combo,
            expert_points: self.expert_points,
            piece_counts: TetrominoType::all()
                .into_iter()
                .map(|kind| (kind, self.piece_count(kind)))
                .collect(),
            achievements: self.achievements.clone(),
            personal_best: self.personal_best,
        }
    }

    /// Start over, keeping only the personal best
    pub fn reset(&mut self) {
        *self = Self {
            personal_best: self.personal_best,
            ..Self::new()
        };
    }

    fn unlock(&mut self, achievement: Achievement, unlocked: &mut Vec<Achievement>) {
        if self.achievements.contains(&achievement) {
            return;
        }
        info!("achievement unlocked: {}", achievement.name());
        self.achievements.push(achievement);
        unlocked.push(achievement);
    }
}
