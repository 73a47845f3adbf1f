//! Dashboard counters

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_students: i64,
    pub total_clerks: i64,
    pub total_books: i64,
    pub total_copies: i64,
    pub pending_requests: i64,
    /// Issued loans, plus approved ones without a return
    pub active_loans: i64,
}
