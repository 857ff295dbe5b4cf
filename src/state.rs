use crate::auth::authority::TokenAuthority;
use crate::config::Config;
use crate::pipeline::moderation::ModerationPipeline;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub authority: TokenAuthority,
    pub pipeline: ModerationPipeline,
    pub config: Config,
}
