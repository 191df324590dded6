/// Track lifecycle state.
///
/// ```text
/// Active ──miss, persist──▶ Persisted ──match──▶ Active
/// Active ──miss, no persist──▶ Lost ──match──▶ Active
/// Active | Persisted | Lost ──expire──▶ Removed
/// ```
///
/// `Removed` is terminal: a removed id is never revived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Matched to a detection this frame
    #[default]
    Active,
    /// Missed this frame but kept alive by persist mode
    Persisted,
    /// Missed this frame without persist mode, still inside the staleness window
    Lost,
    /// Evicted from tracking
    Removed,
}

impl TrackState {
    pub fn on_match(self) -> Self {
        match self {
            TrackState::Removed => TrackState::Removed,
            _ => TrackState::Active,
        }
    }

    pub fn on_miss(self, persist: bool) -> Self {
        match self {
            TrackState::Removed => TrackState::Removed,
            _ if persist => TrackState::Persisted,
            _ => TrackState::Lost,
        }
    }

    pub fn on_expire(self) -> Self {
        TrackState::Removed
    }

    /// Whether tracks in this state are reported and extend their trail.
    pub fn is_reported(self) -> bool {
        matches!(self, TrackState::Active | TrackState::Persisted)
    }
}
