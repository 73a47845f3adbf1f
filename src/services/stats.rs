//! Statistics service

use crate::{error::AppResult, models::DashboardStats, repository::Repository};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Counters shown on the staff dashboard
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let mut uow = self.repository.begin().await?;
        uow.dashboard_stats().await
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::Fixture;

    #[tokio::test]
    async fn dashboard_follows_the_loan_lifecycle() {
        let fx = Fixture::new().await;
        let stats = &fx.services.stats;

        let before = stats.dashboard().await.unwrap();
        assert_eq!(before.total_students, 2);
        assert_eq!(before.total_clerks, 2);
        assert_eq!(before.total_books, 1);
        assert_eq!(before.total_copies, 2);
        assert_eq!(before.pending_requests, 0);
        assert_eq!(before.active_loans, 0);

        let loans = &fx.services.loans;
        let t = loans.request_loan(fx.student.id, fx.copy.id).await.unwrap();
        assert_eq!(stats.dashboard().await.unwrap().pending_requests, 1);

        loans.issue_loan(t.id, fx.clerk.id).await.unwrap();
        let issued = stats.dashboard().await.unwrap();
        assert_eq!((issued.pending_requests, issued.active_loans), (0, 1));

        loans.return_loan(t.id, None, None).await.unwrap();
        assert_eq!(stats.dashboard().await.unwrap().active_loans, 0);
    }
}
