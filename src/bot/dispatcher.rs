//! Message dispatcher setup.
//!
//! Builds the dispatcher with all command handlers and event handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::config::ModerationDefaults;
use crate::database::{BanRepository, ConfigRepository, Database, WarningRepository};
use crate::events;
use crate::moderation::{ContentClassifier, ModerationService, RateTracker};
use crate::permissions::Permissions;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Concrete moderation service over the MongoDB repositories.
pub type Moderation =
    ModerationService<ConfigRepository, WarningRepository, BanRepository, RateTracker>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Arc<Database>,

    /// Per-chat config repository (cached).
    pub configs: Arc<ConfigRepository>,

    /// Warning log repository.
    pub warnings: Arc<WarningRepository>,

    /// Ban log repository.
    pub bans: Arc<BanRepository>,

    /// Permission checker with admin caching.
    pub permissions: Permissions,

    /// The moderation pipeline.
    pub moderation: Arc<Moderation>,

    /// Owner user IDs (bypass all restrictions).
    pub owner_ids: Vec<u64>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        bot: ThrottledBot,
        db: Arc<Database>,
        defaults: ModerationDefaults,
        owner_ids: Vec<u64>,
        bot_user_id: u64,
        rate: RateTracker,
    ) -> Self {
        // Note: Permissions needs the inner Bot for API calls
        let permissions = Permissions::with_owners(bot.inner().clone(), owner_ids.clone());

        let configs = Arc::new(ConfigRepository::new(&db, defaults));
        let warnings = Arc::new(WarningRepository::new(&db));
        let bans = Arc::new(BanRepository::new(&db));

        let moderation = Arc::new(ModerationService::new(
            configs.clone(),
            warnings.clone(),
            bans.clone(),
            Arc::new(rate),
            ContentClassifier::default(),
            bot_user_id,
        ));

        Self {
            db,
            configs,
            warnings,
            bans,
            permissions,
            moderation,
            owner_ids,
        }
    }

    /// Check if a user is a bot owner.
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owner_ids.contains(&user_id)
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    db: Arc<Database>,
    defaults: ModerationDefaults,
    owner_ids: Vec<u64>,
    bot_user_id: u64,
    rate: RateTracker,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    let state = AppState::new(bot.clone(), db, defaults, owner_ids, bot_user_id, rate);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Message handlers: commands first, then moderation of ordinary messages
    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(events::message_event_handler());

    // Chat member events (welcome new members)
    let member_handler = Update::filter_chat_member().branch(events::event_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(member_handler)
}
