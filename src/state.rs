use crate::caption::Captioner;
use crate::extract::Extractor;

/// Shared application state injected into route handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Extractor,
    pub captioner: Captioner,
}

impl AppState {
    pub fn new(extractor: Extractor, captioner: Captioner) -> Self {
        Self {
            extractor,
            captioner,
        }
    }
}
