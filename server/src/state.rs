use std::sync::Arc;

use farm_core::files::FileCache;
use farm_core::SessionStore;

use crate::broker::Broker;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub broker: Arc<Broker>,
    pub files: Arc<FileCache>,
}
