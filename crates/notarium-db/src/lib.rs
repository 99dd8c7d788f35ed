//! # notarium-db
//!
//! PostgreSQL store layer for notarium.
//!
//! This crate provides:
//! - Connection pool management
//! - Store implementations for every core trait
//! - Schema bootstrap for fresh databases
//!
//! ## Example
//!
//! ```rust,ignore
//! use notarium_db::{Database, RegisterRequest, UserStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/notarium").await?;
//!     db.bootstrap().await?;
//!
//!     let user = db.users.register(RegisterRequest {
//!         username: "ada".to_string(),
//!         password_hash: "<opaque credential>".to_string(),
//!     }).await?;
//!
//!     println!("Registered user: {}", user.id);
//!     Ok(())
//! }
//! ```

pub mod categories;
pub mod invitations;
mod lookups;
pub mod members;
pub mod notes;
pub mod pool;
pub mod recycle;
pub mod schema;
pub mod tags;
pub mod users;
pub mod workspaces;

// Test fixtures for integration tests
// Note: always compiled so integration tests (in tests/) can use
// DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use notarium_core::*;

// Re-export store implementations
pub use categories::PgCategoryStore;
pub use invitations::PgInvitationWorkflow;
pub use members::PgMembershipRegistry;
pub use notes::PgNoteStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use recycle::PgRecycleBin;
pub use schema::ensure_schema;
pub use tags::PgTagStore;
pub use users::PgUserStore;
pub use workspaces::PgWorkspaceStore;

/// Combined database context with all stores.
///
/// This is the composition root: every component receives its collaborators
/// here instead of through a registration framework.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::PgPool,
    /// User account store and registration.
    pub users: PgUserStore,
    /// Workspace manager.
    pub workspaces: PgWorkspaceStore,
    /// Membership registry.
    pub members: PgMembershipRegistry,
    /// Invitation workflow.
    pub invitations: PgInvitationWorkflow,
    /// Note store and access resolver.
    pub notes: PgNoteStore,
    /// Recycle bin over soft-deleted notes.
    pub recycle: PgRecycleBin,
    /// Per-user categories.
    pub categories: PgCategoryStore,
    /// Per-user tags and note↔tag bindings.
    pub tags: PgTagStore,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            users: PgUserStore::new(pool.clone()),
            workspaces: PgWorkspaceStore::new(pool.clone()),
            members: PgMembershipRegistry::new(pool.clone()),
            invitations: PgInvitationWorkflow::new(pool.clone()),
            notes: PgNoteStore::new(pool.clone()),
            recycle: PgRecycleBin::new(pool.clone()),
            categories: PgCategoryStore::new(pool.clone()),
            tags: PgTagStore::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Apply the schema to a fresh database.
    pub async fn bootstrap(&self) -> Result<()> {
        ensure_schema(&self.pool).await
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
