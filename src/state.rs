use crate::config::CodeSource;

pub struct AppState {
    pub source: Box<dyn CodeSource>,
}

impl AppState {
    pub fn new(source: impl CodeSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}
