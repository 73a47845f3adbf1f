//! Student and staff account administration

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{CreateStaff, CreateStudent},
        Clerk, ClerkDetails, StaffAccount, User, UserRole,
    },
    repository::Repository,
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
}

/// Trimmed value, or a validation error naming the missing field
fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl AccountsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a student (borrower) account
    pub async fn create_student(&self, student: CreateStudent) -> AppResult<User> {
        let first_name = required(&student.first_name, "First name")?;
        let last_name = required(&student.last_name, "Last name")?;
        let username = required(&student.username, "Username")?;
        required(&student.password, "Password")?;
        let email = required(&student.email, "Email")?;
        student.validate()?;

        let mut uow = self.repository.begin().await?;

        if uow.student_exists(&username, &email).await? {
            return Err(AppError::Conflict("Username or email is already taken".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name,
            middle_name: optional(student.middle_name.as_deref()),
            last_name,
            email,
            contact_number: student.contact_number.trim().to_string(),
            address: student.address.trim().to_string(),
            college: student.college.trim().to_string(),
            department: student.department.trim().to_string(),
            username,
            password_hash: hash_password(&student.password)?,
            role: UserRole::Student,
            created_at: now,
            updated_at: now,
        };

        uow.insert_user(&user).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Student account created");
        Ok(user)
    }

    /// Create a clerk or admin account
    pub async fn create_staff(&self, staff: CreateStaff) -> AppResult<ClerkDetails> {
        let first_name = required(&staff.first_name, "First name")?;
        let last_name = required(&staff.last_name, "Last name")?;
        let username = required(&staff.username, "Username")?;
        required(&staff.password, "Password")?;
        staff.validate()?;

        if !staff.role.is_staff() {
            return Err(AppError::Validation(
                "Staff accounts must have the clerk or admin role".to_string(),
            ));
        }

        let mut uow = self.repository.begin().await?;

        if uow.staff_username_exists(&username).await? {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        let clerk = Clerk {
            id: Uuid::new_v4(),
            first_name,
            middle_name: optional(staff.middle_name.as_deref()),
            last_name,
            email: staff.email.trim().to_string(),
            contact_number: staff.contact_number.trim().to_string(),
        };
        let account = StaffAccount {
            id: Uuid::new_v4(),
            clerk_id: clerk.id,
            username,
            password_hash: hash_password(&staff.password)?,
            role: staff.role,
        };

        uow.insert_clerk(&clerk, &account).await?;
        uow.commit().await?;

        tracing::info!(clerk_id = %clerk.id, role = %account.role, "Staff account created");
        Ok(ClerkDetails {
            id: clerk.id,
            first_name: clerk.first_name,
            middle_name: clerk.middle_name,
            last_name: clerk.last_name,
            email: clerk.email,
            contact_number: clerk.contact_number,
            username: Some(account.username),
            role: Some(account.role),
        })
    }

    /// Students ordered by first then last name
    pub async fn list_students(&self) -> AppResult<Vec<User>> {
        let mut uow = self.repository.begin().await?;
        uow.list_students().await
    }

    /// Staff ordered by first name
    pub async fn list_clerks(&self) -> AppResult<Vec<ClerkDetails>> {
        let mut uow = self.repository.begin().await?;
        uow.list_clerks().await
    }
}
