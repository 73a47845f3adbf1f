//! Requests, transactions and returns queries

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::conflict_on_unique;
use crate::{
    error::AppResult,
    models::{
        transaction::is_overdue, user::full_name, BookCopyStatus, Request, ReturnRecord, Transaction, TransactionDetails,
        TransactionStatus, UserShort,
    },
    repository::LoanFilter,
};

pub async fn insert_request(conn: &mut PgConnection, request: &Request) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO requests (id, user_id, book_id, book_copy_id, request_type, date_requested, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(request.id)
    .bind(request.user_id)
    .bind(request.book_id)
    .bind(request.book_copy_id)
    .bind(request.request_type)
    .bind(request.date_requested)
    .bind(request.status)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_request(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Request>> {
    let request = sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(request)
}

pub async fn update_request(conn: &mut PgConnection, request: &Request) -> AppResult<()> {
    sqlx::query("UPDATE requests SET status = $2 WHERE id = $1")
        .bind(request.id)
        .bind(request.status)
        .execute(conn)
        .await?;
    Ok(())
}

/// Transaction row, locked until the end of the surrounding transaction
pub async fn find_for_update(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Transaction>> {
    let transaction =
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(transaction)
}

pub async fn insert(conn: &mut PgConnection, transaction: &Transaction) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, user_id, book_copy_id, request_id, clerk_id, status,
            date_requested, date_issued, due_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(transaction.id)
    .bind(transaction.user_id)
    .bind(transaction.book_copy_id)
    .bind(transaction.request_id)
    .bind(transaction.clerk_id)
    .bind(transaction.status)
    .bind(transaction.date_requested)
    .bind(transaction.date_issued)
    .bind(transaction.due_date)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn update(conn: &mut PgConnection, transaction: &Transaction) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE transactions
        SET clerk_id = $2, status = $3, date_issued = $4, due_date = $5
        WHERE id = $1
        "#,
    )
    .bind(transaction.id)
    .bind(transaction.clerk_id)
    .bind(transaction.status)
    .bind(transaction.date_issued)
    .bind(transaction.due_date)
    .execute(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "Book copy is already issued"))?;
    Ok(())
}

pub async fn find_return(conn: &mut PgConnection, transaction_id: Uuid) -> AppResult<Option<ReturnRecord>> {
    let record = sqlx::query_as::<_, ReturnRecord>("SELECT * FROM returns WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

pub async fn insert_return(conn: &mut PgConnection, record: &ReturnRecord) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO returns (id, transaction_id, date_returned, fine_amount, remarks)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(record.id)
    .bind(record.transaction_id)
    .bind(record.date_returned)
    .bind(record.fine_amount)
    .bind(&record.remarks)
    .execute(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "This book was already returned"))?;
    Ok(())
}

const DETAILS_SELECT: &str = r#"
    SELECT t.id, t.status, t.date_requested, t.date_issued, t.due_date,
           t.user_id, u.first_name AS user_first_name, u.middle_name AS user_middle_name,
           u.last_name AS user_last_name, u.username,
           bc.id AS book_copy_id, bc.copy_number, bc.shelf_location, bc.status AS copy_status,
           b.id AS book_id, b.title AS book_title,
           t.clerk_id, c.first_name AS clerk_first_name, c.middle_name AS clerk_middle_name,
           c.last_name AS clerk_last_name,
           r.id AS return_id, r.date_returned, r.fine_amount, r.remarks
    FROM transactions t
    JOIN users u ON t.user_id = u.id
    JOIN book_copies bc ON t.book_copy_id = bc.id
    JOIN books b ON bc.book_id = b.id
    LEFT JOIN clerks c ON t.clerk_id = c.id
    LEFT JOIN returns r ON r.transaction_id = t.id
"#;

#[derive(FromRow)]
struct DetailsRow {
    id: Uuid,
    status: TransactionStatus,
    date_requested: DateTime<Utc>,
    date_issued: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
    user_id: Uuid,
    user_first_name: String,
    user_middle_name: Option<String>,
    user_last_name: String,
    username: String,
    book_copy_id: Uuid,
    copy_number: i32,
    shelf_location: String,
    copy_status: BookCopyStatus,
    book_id: Uuid,
    book_title: String,
    clerk_id: Option<Uuid>,
    clerk_first_name: Option<String>,
    clerk_middle_name: Option<String>,
    clerk_last_name: Option<String>,
    return_id: Option<Uuid>,
    date_returned: Option<DateTime<Utc>>,
    fine_amount: Option<Decimal>,
    remarks: Option<String>,
}

impl From<DetailsRow> for TransactionDetails {
    fn from(row: DetailsRow) -> Self {
        let is_overdue = is_overdue(row.status, row.due_date, Utc::now());

        let clerk_name = match (&row.clerk_first_name, &row.clerk_last_name) {
            (Some(first), Some(last)) => Some(full_name(first, row.clerk_middle_name.as_deref(), last)),
            _ => None,
        };

        let returned = match (row.return_id, row.date_returned) {
            (Some(id), Some(date_returned)) => Some(ReturnRecord {
                id,
                transaction_id: row.id,
                date_returned,
                fine_amount: row.fine_amount.unwrap_or_default(),
                remarks: row.remarks,
            }),
            _ => None,
        };

        TransactionDetails {
            id: row.id,
            status: row.status,
            date_requested: row.date_requested,
            date_issued: row.date_issued,
            due_date: row.due_date,
            borrower: UserShort {
                id: row.user_id,
                full_name: full_name(&row.user_first_name, row.user_middle_name.as_deref(), &row.user_last_name),
                username: row.username,
            },
            book_copy_id: row.book_copy_id,
            copy_number: row.copy_number,
            shelf_location: row.shelf_location,
            copy_status: row.copy_status,
            book_id: row.book_id,
            book_title: row.book_title,
            clerk_id: row.clerk_id,
            clerk_name,
            returned,
            is_overdue,
        }
    }
}

pub async fn details(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<TransactionDetails>> {
    let query = format!("{} WHERE t.id = $1", DETAILS_SELECT);
    let row = sqlx::query_as::<_, DetailsRow>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(TransactionDetails::from))
}

pub async fn list(conn: &mut PgConnection, filter: LoanFilter) -> AppResult<Vec<TransactionDetails>> {
    let rows = match filter {
        LoanFilter::Pending => {
            let query = format!(
                "{} WHERE t.status = 'pending' ORDER BY t.date_requested ASC",
                DETAILS_SELECT
            );
            sqlx::query_as::<_, DetailsRow>(&query).fetch_all(conn).await?
        }
        LoanFilter::Active => {
            let query = format!(
                "{} WHERE t.status = 'issued' OR (t.status = 'approved' AND r.id IS NULL) \
                 ORDER BY t.date_issued ASC NULLS FIRST",
                DETAILS_SELECT
            );
            sqlx::query_as::<_, DetailsRow>(&query).fetch_all(conn).await?
        }
        LoanFilter::ActiveForUser(user_id) => {
            let query = format!(
                "{} WHERE t.user_id = $1 AND t.status = 'issued' AND r.id IS NULL \
                 ORDER BY t.date_issued DESC NULLS LAST",
                DETAILS_SELECT
            );
            sqlx::query_as::<_, DetailsRow>(&query)
                .bind(user_id)
                .fetch_all(conn)
                .await?
        }
    };

    Ok(rows.into_iter().map(TransactionDetails::from).collect())
}
