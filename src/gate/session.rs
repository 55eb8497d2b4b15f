use crate::timing::MediaTime;

/// One-shot holder of the recording origin
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    origin: Option<MediaTime>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the session at `timestamp`
    ///
    /// Returns `true` only for the call that opened it. Later calls change
    /// nothing.
    pub fn try_start(&mut self, timestamp: MediaTime) -> bool {
        if self.origin.is_some() {
            return false;
        }
        self.origin = Some(timestamp);
        true
    }

    pub fn is_started(&self) -> bool {
        self.origin.is_some()
    }

    pub fn origin(&self) -> Option<MediaTime> {
        self.origin
    }
}
