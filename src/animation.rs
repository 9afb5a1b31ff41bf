//! Slide driver for the one element that moves per turn.
//!
//! Reconciliation leaves the element held at its old position (`Pending`).
//! On the next render opportunity the hold is released and the transition
//! plays. Whichever comes first, the view's finished signal or the safety
//! timeout, settles it; the other one is then ignored.

use crate::reconcile::{ElementId, Scene, SlidePlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPhase {
    Pending,
    Playing,
    Settled,
    TimedOut,
}

/// Event that may end a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideSignal {
    /// The view reported the transition finished.
    Finished,
    /// The safety timer elapsed first.
    SafetyTimeout,
    /// A newer snapshot arrived before the slide ended.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideAnimation {
    serial: u64,
    plan: SlidePlan,
    phase: AnimationPhase,
}

impl SlideAnimation {
    pub fn new(serial: u64, plan: SlidePlan) -> Self {
        Self {
            serial,
            plan,
            phase: AnimationPhase::Pending,
        }
    }

    /// Distinguishes timers armed for earlier slides.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn element(&self) -> ElementId {
        self.plan.element
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.phase, AnimationPhase::Settled | AnimationPhase::TimedOut)
    }

    /// Pending -> Playing. Returns false if the slide already left Pending.
    pub fn start(&mut self, scene: &mut Scene) -> bool {
        if self.phase != AnimationPhase::Pending {
            return false;
        }
        scene.release_hold(self.plan.element);
        self.phase = AnimationPhase::Playing;
        true
    }

    /// End the slide. Returns true only for the call that actually settled it.
    pub fn finish(&mut self, scene: &mut Scene, signal: SlideSignal) -> bool {
        if self.is_settled() {
            return false;
        }
        if signal == SlideSignal::Finished && self.phase != AnimationPhase::Playing {
            // a finished signal can only come from a running transition
            return false;
        }
        scene.settle(self.plan.element);
        self.phase = match signal {
            SlideSignal::SafetyTimeout => AnimationPhase::TimedOut,
            SlideSignal::Finished | SlideSignal::Superseded => AnimationPhase::Settled,
        };
        true
    }
}
