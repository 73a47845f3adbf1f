//! Dashboard counters

use sqlx::{PgConnection, Row};

use crate::{error::AppResult, models::DashboardStats};

pub async fn dashboard(conn: &mut PgConnection) -> AppResult<DashboardStats> {
    let row = sqlx::query(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users WHERE role = 'student') AS total_students,
            (SELECT COUNT(*) FROM clerks) AS total_clerks,
            (SELECT COUNT(*) FROM books) AS total_books,
            (SELECT COUNT(*) FROM book_copies) AS total_copies,
            (SELECT COUNT(*) FROM transactions WHERE status = 'pending') AS pending_requests,
            (SELECT COUNT(*) FROM transactions t
               WHERE t.status = 'issued'
                  OR (t.status = 'approved'
                      AND NOT EXISTS (SELECT 1 FROM returns r WHERE r.transaction_id = t.id))
            ) AS active_loans
        "#,
    )
    .fetch_one(conn)
    .await?;

    Ok(DashboardStats {
        total_students: row.get("total_students"),
        total_clerks: row.get("total_clerks"),
        total_books: row.get("total_books"),
        total_copies: row.get("total_copies"),
        pending_requests: row.get("pending_requests"),
        active_loans: row.get("active_loans"),
    })
}
