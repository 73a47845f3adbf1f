//! Loan lifecycle service: request, issue, return and reject borrow
//! transactions.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::{
        transaction::{Request, Transaction, TransactionDetails},
        RequestStatus,
    },
    repository::{LoanFilter, Repository, UnitOfWork},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoansConfig,
}

impl LoansService {
    pub fn new(repository: Repository, config: LoansConfig) -> Self {
        Self { repository, config }
    }

    /// Request a copy for a borrower; creates a pending transaction.
    ///
    /// The copy stays `Available` until the request is issued, so several
    /// borrowers may hold pending requests for the same copy.
    pub async fn request_loan(&self, user_id: Uuid, book_copy_id: Uuid) -> AppResult<TransactionDetails> {
        let mut uow = self.repository.begin().await?;

        uow.find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let copy = uow
            .find_copy(book_copy_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book copy {} not found", book_copy_id)))?;

        let now = Utc::now();
        let request = Request::borrow(user_id, &copy, now);
        let transaction = Transaction::request(user_id, &copy, &request, now)?;

        uow.insert_request(&request).await?;
        uow.insert_transaction(&transaction).await?;
        let details = load_details(uow.as_mut(), transaction.id).await?;
        uow.commit().await?;

        tracing::info!(
            transaction_id = %transaction.id,
            user_id = %user_id,
            book_copy_id = %book_copy_id,
            "Loan requested"
        );
        Ok(details)
    }

    /// Hand a requested copy over to its borrower.
    pub async fn issue_loan(&self, transaction_id: Uuid, clerk_id: Uuid) -> AppResult<TransactionDetails> {
        let mut uow = self.repository.begin().await?;

        uow.find_clerk(clerk_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Clerk {} not found", clerk_id)))?;

        let mut transaction = find_transaction(uow.as_mut(), transaction_id).await?;
        let mut copy = uow.find_copy(transaction.book_copy_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Book copy {} not found", transaction.book_copy_id))
        })?;

        transaction.issue(
            &mut copy,
            clerk_id,
            Utc::now(),
            Duration::days(self.config.duration_days),
        )?;

        uow.update_transaction(&transaction).await?;
        uow.update_copy(&copy).await?;
        set_request_status(uow.as_mut(), &transaction, RequestStatus::Approved).await?;
        let details = load_details(uow.as_mut(), transaction.id).await?;
        uow.commit().await?;

        tracing::info!(
            transaction_id = %transaction.id,
            clerk_id = %clerk_id,
            due_date = ?transaction.due_date,
            "Loan issued"
        );
        Ok(details)
    }

    /// Close an issued loan. When `requested_by` is given it must be the
    /// borrower of the transaction.
    pub async fn return_loan(
        &self,
        transaction_id: Uuid,
        requested_by: Option<Uuid>,
        remarks: Option<String>,
    ) -> AppResult<TransactionDetails> {
        let mut uow = self.repository.begin().await?;

        let mut transaction = find_transaction(uow.as_mut(), transaction_id).await?;
        let mut copy = uow.find_copy(transaction.book_copy_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Book copy {} not found", transaction.book_copy_id))
        })?;
        let existing = uow.find_return(transaction.id).await?;

        let record = transaction
            .close(
                &mut copy,
                existing.as_ref(),
                requested_by,
                remarks,
                Utc::now(),
                self.config.fine_per_day,
            )
            .map_err(|e| {
                if matches!(e, AppError::Forbidden(_)) {
                    tracing::warn!(
                        transaction_id = %transaction_id,
                        requested_by = ?requested_by,
                        "Return refused: borrower mismatch"
                    );
                }
                e
            })?;

        uow.update_transaction(&transaction).await?;
        uow.update_copy(&copy).await?;
        uow.insert_return(&record).await?;
        let details = load_details(uow.as_mut(), transaction.id).await?;
        uow.commit().await?;

        tracing::info!(
            transaction_id = %transaction.id,
            fine = %record.fine_amount,
            "Loan returned"
        );
        Ok(details)
    }

    /// Reject a request. The copy status is not touched.
    pub async fn reject_request(&self, transaction_id: Uuid) -> AppResult<TransactionDetails> {
        let mut uow = self.repository.begin().await?;

        let mut transaction = find_transaction(uow.as_mut(), transaction_id).await?;
        let previous = transaction.status;
        transaction.reject();

        uow.update_transaction(&transaction).await?;
        set_request_status(uow.as_mut(), &transaction, RequestStatus::Rejected).await?;
        let details = load_details(uow.as_mut(), transaction.id).await?;
        uow.commit().await?;

        tracing::info!(transaction_id = %transaction.id, previous = %previous, "Request rejected");
        Ok(details)
    }

    /// Override the due date of a pending or issued transaction
    pub async fn set_due_date(
        &self,
        transaction_id: Uuid,
        due_date: DateTime<Utc>,
    ) -> AppResult<TransactionDetails> {
        let mut uow = self.repository.begin().await?;

        let mut transaction = find_transaction(uow.as_mut(), transaction_id).await?;
        transaction.set_due_date(due_date)?;

        uow.update_transaction(&transaction).await?;
        let details = load_details(uow.as_mut(), transaction.id).await?;
        uow.commit().await?;

        tracing::info!(transaction_id = %transaction.id, due_date = %due_date, "Due date changed");
        Ok(details)
    }

    /// Get one transaction with its details
    pub async fn get_transaction(&self, transaction_id: Uuid) -> AppResult<TransactionDetails> {
        let mut uow = self.repository.begin().await?;
        load_details(uow.as_mut(), transaction_id).await
    }

    /// Pending requests, oldest first
    pub async fn pending_requests(&self) -> AppResult<Vec<TransactionDetails>> {
        let mut uow = self.repository.begin().await?;
        uow.list_transactions(LoanFilter::Pending).await
    }

    /// All active loans
    pub async fn active_loans(&self) -> AppResult<Vec<TransactionDetails>> {
        let mut uow = self.repository.begin().await?;
        uow.list_transactions(LoanFilter::Active).await
    }

    /// Active loans of one borrower, most recently issued first
    pub async fn user_active_loans(&self, user_id: Uuid) -> AppResult<Vec<TransactionDetails>> {
        let mut uow = self.repository.begin().await?;

        // Verify user exists
        uow.find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        uow.list_transactions(LoanFilter::ActiveForUser(user_id)).await
    }
}

async fn find_transaction(uow: &mut dyn UnitOfWork, id: Uuid) -> AppResult<Transaction> {
    uow.find_transaction(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))
}

async fn load_details(uow: &mut dyn UnitOfWork, id: Uuid) -> AppResult<TransactionDetails> {
    uow.transaction_details(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))
}

async fn set_request_status(
    uow: &mut dyn UnitOfWork,
    transaction: &Transaction,
    status: RequestStatus,
) -> AppResult<()> {
    let Some(request_id) = transaction.request_id else {
        return Ok(());
    };
    if let Some(mut request) = uow.find_request(request_id).await? {
        request.status = status;
        uow.update_request(&request).await?;
    }
    Ok(())
}
