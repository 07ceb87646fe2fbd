// Panel state shared by the app and UI.
// Async loading states and request tickets for discarding superseded results.

/// Loading state for async data.
///
/// Loads are fail-soft, so a failed load arrives as `Loaded` with empty data.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadingState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
}

impl<T> LoadingState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadingState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self {
            LoadingState::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// Issues increasing tickets; only the latest ticket's result is applied.
#[derive(Debug, Clone, Default)]
pub struct RequestGuard {
    latest: u64,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding any earlier one.
    pub fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.latest
    }
}
