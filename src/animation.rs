//! Time-boxed rect interpolations grouped into events, and the manager that
//! advances them.
//!
//! Lifecycle per event: `Pending -> Running -> Finished | Canceled`. The manager
//! reports transitions as [`AnimationNotice`]s returned from the call that
//! caused them, so whoever drives the tick consumes them in order on the same
//! thread.

use crate::grid::{Grid, TileSlot};
use crate::tile::TileRect;

/// What an event means to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    TileDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventPhase {
    Pending,
    Running,
    Finished,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationNotice {
    Started { id: EventId, kind: AnimationKind },
    Finished { id: EventId, kind: AnimationKind },
    Canceled { id: EventId, kind: AnimationKind },
}

impl AnimationNotice {
    pub fn kind(&self) -> AnimationKind {
        match *self {
            Self::Started { kind, .. }
            | Self::Finished { kind, .. }
            | Self::Canceled { kind, .. } => kind,
        }
    }
}

/// Anything that owns the rects animations move.
pub trait AnimationTargets {
    fn rect_mut(&mut self, slot: TileSlot) -> Option<&mut TileRect>;
}

impl AnimationTargets for Grid {
    fn rect_mut(&mut self, slot: TileSlot) -> Option<&mut TileRect> {
        self.tile_mut(slot).map(|t| &mut t.rect)
    }
}

/// Seconds needed to travel from `from` to `to` at `units_per_sec`.
///
/// Zero distance, a non-positive rate, or an infinite rate all give 0.
pub fn movement_time(from: &TileRect, to: &TileRect, units_per_sec: f32) -> f32 {
    let distance = from.distance_to(to);
    if distance <= 0.0 || !units_per_sec.is_finite() || units_per_sec <= 0.0 {
        return 0.0;
    }
    distance / units_per_sec
}

/// Moves one target rect to `to` over `duration` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    target: TileSlot,
    /// Captured from the target the first time this animation runs.
    from: Option<TileRect>,
    to: TileRect,
    duration: f32,
    elapsed: f32,
}

impl Animation {
    pub fn new(target: TileSlot, to: TileRect, duration: f32) -> Self {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        Self {
            target,
            from: None,
            to,
            duration,
            elapsed: 0.0,
        }
    }

    /// Duration derived from the distance between `from` and `to`.
    pub fn with_speed(target: TileSlot, from: &TileRect, to: TileRect, units_per_sec: f32) -> Self {
        Self::new(target, to, movement_time(from, &to, units_per_sec))
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn is_finished(&self) -> bool {
        self.from.is_some() && self.elapsed >= self.duration
    }

    /// Spend up to `budget` seconds; returns what is left over once finished.
    fn advance<T: AnimationTargets + ?Sized>(&mut self, budget: f32, targets: &mut T) -> f32 {
        let rect = targets.rect_mut(self.target);
        let from = *self
            .from
            .get_or_insert_with(|| rect.as_deref().copied().unwrap_or(self.to));
        self.elapsed += budget;
        if self.elapsed >= self.duration {
            let leftover = self.elapsed - self.duration;
            self.elapsed = self.duration;
            if let Some(rect) = rect {
                *rect = self.to;
            }
            leftover
        } else {
            if let Some(rect) = rect {
                *rect = from.lerp(&self.to, self.elapsed / self.duration);
            }
            0.0
        }
    }
}

/// An ordered run of animations sharing one lifecycle.
#[derive(Debug, Clone)]
pub struct AnimationEvent {
    id: EventId,
    kind: AnimationKind,
    animations: Vec<Animation>,
    current: usize,
    phase: EventPhase,
}

impl AnimationEvent {
    pub fn new(kind: AnimationKind) -> Self {
        Self {
            id: EventId(0),
            kind,
            animations: Vec::new(),
            current: 0,
            phase: EventPhase::Pending,
        }
    }

    pub fn push(&mut self, animation: Animation) {
        self.animations.push(animation);
    }

    pub fn with(mut self, animation: Animation) -> Self {
        self.push(animation);
        self
    }

    /// Total seconds the event takes to play out.
    pub fn duration(&self) -> f32 {
        self.animations.iter().map(Animation::duration).sum()
    }

    fn notice(&self) -> Option<AnimationNotice> {
        let (id, kind) = (self.id, self.kind);
        match self.phase {
            EventPhase::Pending => None,
            EventPhase::Running => Some(AnimationNotice::Started { id, kind }),
            EventPhase::Finished => Some(AnimationNotice::Finished { id, kind }),
            EventPhase::Canceled => Some(AnimationNotice::Canceled { id, kind }),
        }
    }

    fn advance<T: AnimationTargets + ?Sized>(&mut self, dt: f32, targets: &mut T) {
        let mut budget = dt;
        while let Some(animation) = self.animations.get_mut(self.current) {
            budget = animation.advance(budget, targets);
            if !animation.is_finished() {
                return;
            }
            self.current += 1;
        }
        self.phase = EventPhase::Finished;
    }
}

#[derive(Debug, Default)]
pub struct AnimationManager {
    events: Vec<AnimationEvent>,
    next_id: u64,
}

impl AnimationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event. It starts on the next tick.
    pub fn add(&mut self, mut event: AnimationEvent) -> EventId {
        self.next_id += 1;
        event.id = EventId(self.next_id);
        event.phase = EventPhase::Pending;
        event.current = 0;
        let id = event.id;
        self.events.push(event);
        id
    }

    /// Flip pending events to running. No rect is touched here, so callers can
    /// react to `Started` before anything moves.
    pub fn start_pending(&mut self) -> Vec<AnimationNotice> {
        let mut notices = Vec::new();
        for event in &mut self.events {
            if event.phase == EventPhase::Pending {
                event.phase = EventPhase::Running;
                notices.extend(event.notice());
            }
        }
        notices
    }

    /// Advance running events by `dt` seconds and drop the ones that finish.
    /// Zero, negative, or NaN deltas make no progress.
    pub fn advance<T: AnimationTargets + ?Sized>(
        &mut self,
        dt: f32,
        targets: &mut T,
    ) -> Vec<AnimationNotice> {
        let dt = if dt > 0.0 { dt } else { 0.0 };
        let mut notices = Vec::new();
        for event in &mut self.events {
            if event.phase == EventPhase::Running {
                event.advance(dt, targets);
                if event.phase == EventPhase::Finished {
                    notices.extend(event.notice());
                }
            }
        }
        self.events.retain(|e| e.phase == EventPhase::Pending || e.phase == EventPhase::Running);
        notices
    }

    /// `start_pending` followed by `advance`.
    pub fn update<T: AnimationTargets + ?Sized>(
        &mut self,
        dt: f32,
        targets: &mut T,
    ) -> Vec<AnimationNotice> {
        let mut notices = self.start_pending();
        notices.extend(self.advance(dt, targets));
        notices
    }

    /// Remove an event before it completes.
    pub fn cancel(&mut self, id: EventId) -> Option<AnimationNotice> {
        let index = self.events.iter().position(|e| e.id == id)?;
        let mut event = self.events.remove(index);
        event.phase = EventPhase::Canceled;
        event.notice()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
