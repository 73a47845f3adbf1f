//! Business logic services

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod loans;
pub mod seed;
pub mod stats;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub accounts: accounts::AccountsService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            accounts: accounts::AccountsService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), config.loans.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
