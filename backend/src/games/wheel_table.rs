use std::collections::HashMap;
use std::time::{Duration, Instant};

use shared::shared_wheel_game::*;
use shared::{Color, RandomSource, RequestError, WheelConfig, WheelRng};
use uuid::Uuid;

/// What the table last did, for status text.
#[derive(Debug, Clone, PartialEq)]
pub enum TableStatus {
    Idle,
    Selected(Color),
    Spinning,
    Settled(SpinOutcome),
    Bankrupt,
    Reset,
}

/// Identifies one started spin. A reset or a newer spin makes older
/// tickets stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinTicket(u64);

#[derive(Debug, Clone)]
struct PendingSpin {
    ticket: SpinTicket,
    outcome: SpinOutcome,
}

#[derive(Debug, Clone)]
pub struct StartedSpin {
    pub ticket: SpinTicket,
    pub outcome: SpinOutcome,
    pub target_rotation: f64,
}

/// One player's wheel: the game session plus what the client needs to
/// animate it.
#[derive(Debug, Clone)]
pub struct Table {
    session: Session,
    rotation: f64,
    generation: u64,
    pending: Option<PendingSpin>,
    last_outcome: Option<SpinOutcome>,
    status: TableStatus,
    last_active: Instant,
}

impl Table {
    pub fn new(config: &WheelConfig) -> Self {
        Self {
            session: Session::new(config),
            rotation: 0.0,
            generation: 0,
            pending: None,
            last_outcome: None,
            status: TableStatus::Idle,
            last_active: Instant::now(),
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_active = self.last_active.max(now);
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_outcome(&self) -> Option<&SpinOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn status(&self) -> &TableStatus {
        &self.status
    }

    pub fn is_bankrupt(&self) -> bool {
        self.session.is_bankrupt()
    }

    pub fn select_color(&mut self, config: &WheelConfig, color: Color) -> Result<(), RequestError> {
        self.session.select_color(config, color.clone())?;
        self.status = TableStatus::Selected(color);
        Ok(())
    }

    /// Debits the stake, draws and resolves the outcome, and advances the
    /// wheel rotation. The outcome is held until [`Table::settle`] is called
    /// with the returned ticket. Nothing changes if the request is refused,
    /// including the optional color switch.
    pub fn start_spin<R: RandomSource + ?Sized>(
        &mut self,
        config: &WheelConfig,
        color: Option<Color>,
        stake: &StakeInput,
        rng: &mut R,
    ) -> Result<StartedSpin, RequestError> {
        let mut session = self.session.clone();
        if let Some(color) = color {
            session.select_color(config, color)?;
        }
        let stake = session.begin_spin(stake)?;
        let chosen = session.chosen_color.clone().ok_or(RequestError::NoColorSelected)?;

        let outcome = resolve_spin(config, &chosen, stake, rng.unit_draw());
        let target_rotation = config.next_rotation(self.rotation, outcome.segment_index);

        self.generation += 1;
        let ticket = SpinTicket(self.generation);
        self.session = session;
        self.rotation = target_rotation;
        self.pending = Some(PendingSpin { ticket, outcome: outcome.clone() });
        self.status = TableStatus::Spinning;

        Ok(StartedSpin { ticket, outcome, target_rotation })
    }

    /// Applies the outcome held for `ticket`. Returns `None` when the spin
    /// was abandoned by a reset.
    pub fn settle(&mut self, ticket: SpinTicket) -> Option<SpinOutcome> {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => {}
            _ => return None,
        }
        let PendingSpin { outcome, .. } = self.pending.take()?;
        self.session.settle(&outcome);
        self.last_outcome = Some(outcome.clone());
        self.status = if self.session.is_bankrupt() {
            TableStatus::Bankrupt
        } else {
            TableStatus::Settled(outcome.clone())
        };
        Some(outcome)
    }

    /// Back to a fresh session. Any spin still in flight is abandoned.
    pub fn reset(&mut self, config: &WheelConfig) {
        self.session = reset_session(config);
        self.rotation = 0.0;
        self.generation += 1;
        self.pending = None;
        self.last_outcome = None;
        self.status = TableStatus::Reset;
    }

    /// Resets only if the table is still bankrupt and untouched since
    /// `generation` was observed.
    pub fn reset_if_bankrupt(&mut self, config: &WheelConfig, generation: u64) -> bool {
        if self.generation != generation || !self.is_bankrupt() {
            return false;
        }
        self.reset(config);
        true
    }
}

/// All live tables plus the generator that feeds their draws.
pub struct TableStore {
    pub tables: HashMap<Uuid, Table>,
    pub rng: WheelRng,
}

impl TableStore {
    pub fn new(rng: WheelRng) -> Self {
        Self {
            tables: HashMap::new(),
            rng,
        }
    }

    pub fn open(&mut self, config: &WheelConfig) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.insert(id, Table::new(config));
        id
    }

    /// Drops tables idle for at least `max_idle`. Tables with a spin in
    /// flight are kept. Returns how many were removed.
    pub fn cleanup_idle(&mut self, now: Instant, max_idle: Duration) -> usize {
        let before = self.tables.len();
        self.tables
            .retain(|_, table| table.session().is_spinning || table.idle_for(now) < max_idle);
        before - self.tables.len()
    }
}
