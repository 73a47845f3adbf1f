//! Borrow transactions and their lifecycle.
//!
//! A transaction starts `Pending` when a borrower requests a copy, becomes
//! `Issued` when a clerk hands the copy out and ends `Returned` (with exactly
//! one [`ReturnRecord`]) or `Rejected`. Every transition checks all of its
//! preconditions before touching any field, so a failed transition leaves the
//! transaction and the copy exactly as they were.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::book::BookCopy;
use super::enums::{BookCopyStatus, RequestStatus, RequestType, TransactionStatus};
use super::user::UserShort;
use crate::error::{AppError, AppResult};

/// Borrower-initiated ask, paired 1:1 with the transaction it spawns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Request {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub book_copy_id: Uuid,
    pub request_type: RequestType,
    pub date_requested: DateTime<Utc>,
    pub status: RequestStatus,
}

impl Request {
    pub fn borrow(user_id: Uuid, copy: &BookCopy, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            book_id: copy.book_id,
            book_copy_id: copy.id,
            request_type: RequestType::Borrow,
            date_requested: now,
            status: RequestStatus::Pending,
        }
    }
}

/// Borrow episode of one copy by one borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_copy_id: Uuid,
    pub request_id: Option<Uuid>,
    pub clerk_id: Option<Uuid>,
    pub status: TransactionStatus,
    pub date_requested: DateTime<Utc>,
    pub date_issued: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Terminal record closing a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReturnRecord {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub date_returned: DateTime<Utc>,
    pub fine_amount: Decimal,
    pub remarks: Option<String>,
}

impl Transaction {
    /// New pending transaction for an available copy.
    pub fn request(
        user_id: Uuid,
        copy: &BookCopy,
        request: &Request,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        if !copy.is_available() {
            return Err(AppError::Conflict(format!(
                "Book copy {} is no longer available ({})",
                copy.id, copy.status
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            book_copy_id: copy.id,
            request_id: Some(request.id),
            clerk_id: None,
            status: TransactionStatus::Pending,
            date_requested: now,
            date_issued: None,
            due_date: None,
        })
    }

    /// Pending -> Issued; the copy becomes `Borrowed`.
    ///
    /// A due date set before issue is kept, otherwise it is `now + loan_period`.
    pub fn issue(
        &mut self,
        copy: &mut BookCopy,
        clerk_id: Uuid,
        now: DateTime<Utc>,
        loan_period: Duration,
    ) -> AppResult<()> {
        self.ensure_copy(copy)?;

        if self.status != TransactionStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Only pending requests can be issued (transaction is {})",
                self.status
            )));
        }
        if !copy.is_available() {
            return Err(AppError::Conflict(
                "Selected book copy is no longer available".to_string(),
            ));
        }

        self.status = TransactionStatus::Issued;
        self.clerk_id = Some(clerk_id);
        self.date_issued = Some(now);
        if self.due_date.is_none() {
            self.due_date = Some(now + loan_period);
        }
        copy.status = BookCopyStatus::Borrowed;
        Ok(())
    }

    /// Issued -> Returned; the copy becomes `Available` again and the returned
    /// record is the one to persist alongside.
    pub fn close(
        &mut self,
        copy: &mut BookCopy,
        existing_return: Option<&ReturnRecord>,
        requested_by: Option<Uuid>,
        remarks: Option<String>,
        now: DateTime<Utc>,
        fine_per_day: Decimal,
    ) -> AppResult<ReturnRecord> {
        self.ensure_copy(copy)?;

        if self.status != TransactionStatus::Issued {
            return Err(AppError::Conflict(
                "This book is not currently issued or has already been returned".to_string(),
            ));
        }
        if let Some(user_id) = requested_by {
            if user_id != self.user_id {
                return Err(AppError::Forbidden(
                    "This book was not borrowed under your account".to_string(),
                ));
            }
        }
        if existing_return.is_some() {
            return Err(AppError::Conflict("This book was already returned".to_string()));
        }

        let fine_amount = fine_for(self.due_date, now, fine_per_day);

        self.status = TransactionStatus::Returned;
        copy.status = BookCopyStatus::Available;

        Ok(ReturnRecord {
            id: Uuid::new_v4(),
            transaction_id: self.id,
            date_returned: now,
            fine_amount,
            remarks: remarks.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
        })
    }

    /// Any status -> Rejected. The copy is left alone: it was never reserved.
    pub fn reject(&mut self) {
        self.status = TransactionStatus::Rejected;
    }

    /// Override the due date of a transaction that is still open
    pub fn set_due_date(&mut self, due_date: DateTime<Utc>) -> AppResult<()> {
        match self.status {
            TransactionStatus::Pending | TransactionStatus::Issued => {
                if let Some(issued) = self.date_issued {
                    if due_date < issued {
                        return Err(AppError::Validation(
                            "Due date cannot precede the issue date".to_string(),
                        ));
                    }
                }
                self.due_date = Some(due_date);
                Ok(())
            }
            status => Err(AppError::Conflict(format!(
                "Cannot change the due date of a {} transaction",
                status
            ))),
        }
    }

    /// Counted as an active loan: issued, or approved with no return yet
    pub fn is_active(&self, has_return: bool) -> bool {
        match self.status {
            TransactionStatus::Issued => true,
            TransactionStatus::Approved => !has_return,
            _ => false,
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        is_overdue(self.status, self.due_date, now)
    }

    fn ensure_copy(&self, copy: &BookCopy) -> AppResult<()> {
        if copy.id != self.book_copy_id {
            return Err(AppError::Internal(format!(
                "Copy {} does not belong to transaction {}",
                copy.id, self.id
            )));
        }
        Ok(())
    }
}

/// Fine for every started day past the due date
pub fn fine_for(due_date: Option<DateTime<Utc>>, returned: DateTime<Utc>, fine_per_day: Decimal) -> Decimal {
    let Some(due) = due_date else {
        return Decimal::ZERO;
    };
    let late = returned - due;
    if late <= Duration::zero() {
        return Decimal::ZERO;
    }
    let days = (late.num_seconds() + 86_399) / 86_400;
    fine_per_day * Decimal::from(days)
}

/// An issued loan is overdue once its due date has passed
pub fn is_overdue(status: TransactionStatus, due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    status == TransactionStatus::Issued && due_date.map(|d| d < now).unwrap_or(false)
}

/// Transaction with everything a librarian or borrower needs to see
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionDetails {
    pub id: Uuid,
    pub status: TransactionStatus,
    pub date_requested: DateTime<Utc>,
    pub date_issued: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub borrower: UserShort,
    pub book_copy_id: Uuid,
    pub copy_number: i32,
    pub shelf_location: String,
    pub copy_status: BookCopyStatus,
    pub book_id: Uuid,
    pub book_title: String,
    pub clerk_id: Option<Uuid>,
    pub clerk_name: Option<String>,
    pub returned: Option<ReturnRecord>,
    pub is_overdue: bool,
}

/// Create loan (borrow request)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLoanRequest {
    /// Borrower; defaults to the authenticated student
    pub user_id: Option<Uuid>,
    pub book_copy_id: Uuid,
}

/// Return request body
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReturnLoanRequest {
    pub remarks: Option<String>,
}

/// Due date override body
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetDueDateRequest {
    pub due_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn copy(status: BookCopyStatus) -> BookCopy {
        BookCopy {
            id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            copy_number: 1,
            shelf_location: "A-1".to_string(),
            status,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn pending(copy: &BookCopy) -> Transaction {
        let borrower = Uuid::new_v4();
        let request = Request::borrow(borrower, copy, at(1, 9));
        Transaction::request(borrower, copy, &request, at(1, 9)).unwrap()
    }

    #[test]
    fn request_requires_an_available_copy() {
        let c = copy(BookCopyStatus::Damaged);
        let request = Request::borrow(Uuid::new_v4(), &c, at(1, 9));
        let err = Transaction::request(request.user_id, &c, &request, at(1, 9)).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn issue_sets_due_date_one_week_out() {
        let mut c = copy(BookCopyStatus::Available);
        let mut t = pending(&c);
        let clerk = Uuid::new_v4();

        t.issue(&mut c, clerk, at(2, 10), Duration::days(7)).unwrap();

        assert_eq!(t.status, TransactionStatus::Issued);
        assert_eq!(t.clerk_id, Some(clerk));
        assert_eq!(t.date_issued, Some(at(2, 10)));
        assert_eq!(t.due_date, Some(at(9, 10)));
        assert_eq!(c.status, BookCopyStatus::Borrowed);
    }

    #[test]
    fn issue_keeps_a_preset_due_date() {
        let mut c = copy(BookCopyStatus::Available);
        let mut t = pending(&c);
        t.set_due_date(at(20, 12)).unwrap();

        t.issue(&mut c, Uuid::new_v4(), at(2, 10), Duration::days(7)).unwrap();

        assert_eq!(t.due_date, Some(at(20, 12)));
    }

    #[test]
    fn failed_issue_changes_nothing() {
        let mut c = copy(BookCopyStatus::Available);
        let mut t = pending(&c);
        c.status = BookCopyStatus::Borrowed;
        let before = (t.clone(), c.clone());

        let err = t.issue(&mut c, Uuid::new_v4(), at(2, 10), Duration::days(7)).unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!((t, c), before);
    }

    #[test]
    fn close_checks_state_then_owner_then_existing_return() {
        let mut c = copy(BookCopyStatus::Available);
        let mut t = pending(&c);

        let err = t.close(&mut c, None, None, None, at(3, 9), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        t.issue(&mut c, Uuid::new_v4(), at(2, 10), Duration::days(7)).unwrap();

        let err = t
            .close(&mut c, None, Some(Uuid::new_v4()), None, at(3, 9), Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(t.status, TransactionStatus::Issued);
        assert_eq!(c.status, BookCopyStatus::Borrowed);

        let stale = ReturnRecord {
            id: Uuid::new_v4(),
            transaction_id: t.id,
            date_returned: at(3, 9),
            fine_amount: Decimal::ZERO,
            remarks: None,
        };
        let err = t
            .close(&mut c, Some(&stale), None, None, at(3, 9), Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let record = t
            .close(&mut c, None, Some(t.user_id), Some("  cover torn ".into()), at(3, 9), Decimal::ZERO)
            .unwrap();
        assert_eq!(record.transaction_id, t.id);
        assert_eq!(record.remarks.as_deref(), Some("cover torn"));
        assert_eq!(t.status, TransactionStatus::Returned);
        assert_eq!(c.status, BookCopyStatus::Available);
    }

    #[test]
    fn fine_counts_started_days_late() {
        let per_day = Decimal::new(50, 2);
        assert_eq!(fine_for(None, at(10, 0), per_day), Decimal::ZERO);
        assert_eq!(fine_for(Some(at(10, 0)), at(9, 0), per_day), Decimal::ZERO);
        assert_eq!(fine_for(Some(at(10, 0)), at(10, 1), per_day), Decimal::new(50, 2));
        assert_eq!(fine_for(Some(at(10, 0)), at(12, 0), per_day), Decimal::new(100, 2));
    }

    #[test]
    fn reject_leaves_copy_untouched() {
        let c = copy(BookCopyStatus::Available);
        let mut t = pending(&c);
        t.reject();
        assert_eq!(t.status, TransactionStatus::Rejected);
        assert!(c.is_available());
        assert!(t.set_due_date(at(20, 0)).is_err());
    }

    #[test]
    fn approved_without_return_counts_as_active() {
        let c = copy(BookCopyStatus::Available);
        let mut t = pending(&c);
        assert!(!t.is_active(false));
        t.status = TransactionStatus::Approved;
        assert!(t.is_active(false));
        assert!(!t.is_active(true));
    }

    #[test]
    fn only_issued_loans_past_due_are_overdue() {
        let mut c = copy(BookCopyStatus::Available);
        let mut t = pending(&c);
        t.set_due_date(at(5, 12)).unwrap();
        assert!(!t.is_overdue(at(6, 12)));

        t.issue(&mut c, Uuid::new_v4(), at(2, 10), Duration::days(7)).unwrap();
        assert!(!t.is_overdue(at(5, 12)));
        assert!(t.is_overdue(at(6, 12)));
        assert_eq!(is_overdue(t.status, t.due_date, at(6, 12)), t.is_overdue(at(6, 12)));
        assert!(!is_overdue(TransactionStatus::Returned, t.due_date, at(6, 12)));
    }
}
