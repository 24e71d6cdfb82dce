pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{SeedResult, SupportSeedDataset, VerificationResult};
pub use repositories::{
    knowledge_base_counts, InMemoryLookupService, InMemoryTicketingService, KnowledgeBaseCounts,
    RepositoryError, SqlLookupService, SqlTicketingService,
};
