//! Business logic services

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod loans;
pub mod members;

use crate::{config::AppConfig, models::loan::LoanPolicy, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub loans: loans::LoansService,
    pub dashboard: dashboard::DashboardService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let policy = LoanPolicy::from(&config.library);

        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), policy.clone()),
            dashboard: dashboard::DashboardService::new(repository.clone(), policy),
            repository,
        }
    }
}
