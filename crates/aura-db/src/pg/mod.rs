//! PostgreSQL repository implementations

mod conversation;
mod usage;
mod user;
mod verification;

pub use conversation::PgConversationRepository;
pub use usage::PgUsageRepository;
pub use user::PgUserRepository;
pub use verification::PgVerificationTokenRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub verification_tokens: PgVerificationTokenRepository,
    pub conversations: PgConversationRepository,
    pub usage: PgUsageRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            verification_tokens: PgVerificationTokenRepository::new(pool.clone()),
            conversations: PgConversationRepository::new(pool.clone()),
            usage: PgUsageRepository::new(pool),
        }
    }
}
