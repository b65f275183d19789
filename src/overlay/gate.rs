/// The two media elements a correspondence overlay is paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaSlot {
    QueryImage,
    ResultVideo,
}

/// What the caller should do after feeding a signal into the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateSignal {
    /// Still waiting for the other medium.
    Waiting,
    /// Both media are ready: render now.
    Fire,
    /// The render for this cycle already happened.
    AlreadyFired,
    /// The signal belongs to an older cycle and must be ignored.
    Stale,
}

/// Waits for both the query image and the result video before letting a render
/// through. Every `arm` starts a new cycle; signals tagged with an older cycle
/// are dropped so that late loads from a superseded selection cannot draw.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    cycle: u64,
    armed: bool,
    image_ready: bool,
    video_ready: bool,
    fired: bool,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new render cycle and return its id.
    pub fn arm(&mut self) -> u64 {
        self.cycle += 1;
        self.armed = true;
        self.image_ready = false;
        self.video_ready = false;
        self.fired = false;
        self.cycle
    }

    /// Invalidate the current cycle without starting a new one.
    pub fn disarm(&mut self) {
        self.cycle += 1;
        self.armed = false;
        self.image_ready = false;
        self.video_ready = false;
        self.fired = false;
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_ready(&self) -> bool {
        self.armed && self.image_ready && self.video_ready
    }

    pub fn is_slot_ready(&self, slot: MediaSlot) -> bool {
        match slot {
            MediaSlot::QueryImage => self.image_ready,
            MediaSlot::ResultVideo => self.video_ready,
        }
    }

    /// Record that `slot` finished loading during `cycle`.
    pub fn mark_ready(&mut self, slot: MediaSlot, cycle: u64) -> GateSignal {
        if !self.armed || cycle != self.cycle {
            return GateSignal::Stale;
        }
        match slot {
            MediaSlot::QueryImage => self.image_ready = true,
            MediaSlot::ResultVideo => self.video_ready = true,
        }
        if !(self.image_ready && self.video_ready) {
            return GateSignal::Waiting;
        }
        if self.fired {
            return GateSignal::AlreadyFired;
        }
        self.fired = true;
        GateSignal::Fire
    }

    /// Layout changed: scale factors from the last render are no longer valid.
    /// Fires again when both media are already loaded, otherwise the pending
    /// render will pick up the new layout on its own.
    pub fn relayout(&mut self) -> GateSignal {
        if !self.armed {
            return GateSignal::Stale;
        }
        if self.image_ready && self.video_ready {
            self.fired = true;
            GateSignal::Fire
        } else {
            GateSignal::Waiting
        }
    }
}
