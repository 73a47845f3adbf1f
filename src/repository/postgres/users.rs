//! Students and staff queries

use sqlx::PgConnection;
use uuid::Uuid;

use super::conflict_on_unique;
use crate::{
    error::AppResult,
    models::{Clerk, ClerkDetails, StaffAccount, User},
};

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

/// Student by username or email
pub async fn find_by_login(conn: &mut PgConnection, login: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)
        LIMIT 1
        "#,
    )
    .bind(login)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

pub async fn exists(conn: &mut PgConnection, username: &str, email: &str) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($2))",
    )
    .bind(username)
    .bind(email)
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

pub async fn insert(conn: &mut PgConnection, user: &User) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO users (
            id, first_name, middle_name, last_name, email, contact_number,
            address, college, department, username, password_hash, role,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(user.id)
    .bind(&user.first_name)
    .bind(&user.middle_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.contact_number)
    .bind(&user.address)
    .bind(&user.college)
    .bind(&user.department)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "Username or email is already taken"))?;
    Ok(())
}

pub async fn list_students(conn: &mut PgConnection) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE role = 'student' ORDER BY first_name, last_name",
    )
    .fetch_all(conn)
    .await?;
    Ok(users)
}

pub async fn find_clerk(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Clerk>> {
    let clerk = sqlx::query_as::<_, Clerk>("SELECT * FROM clerks WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(clerk)
}

pub async fn find_staff_by_username(
    conn: &mut PgConnection,
    username: &str,
) -> AppResult<Option<(StaffAccount, Clerk)>> {
    let account = sqlx::query_as::<_, StaffAccount>(
        "SELECT * FROM staff_accounts WHERE LOWER(username) = LOWER($1)",
    )
    .bind(username)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(account) = account else {
        return Ok(None);
    };

    let clerk = find_clerk(conn, account.clerk_id).await?;
    Ok(clerk.map(|c| (account, c)))
}

pub async fn staff_username_exists(conn: &mut PgConnection, username: &str) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM staff_accounts WHERE LOWER(username) = LOWER($1))",
    )
    .bind(username)
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

pub async fn insert_clerk(
    conn: &mut PgConnection,
    clerk: &Clerk,
    account: &StaffAccount,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO clerks (id, first_name, middle_name, last_name, email, contact_number)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(clerk.id)
    .bind(&clerk.first_name)
    .bind(&clerk.middle_name)
    .bind(&clerk.last_name)
    .bind(&clerk.email)
    .bind(&clerk.contact_number)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO staff_accounts (id, clerk_id, username, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(account.id)
    .bind(account.clerk_id)
    .bind(&account.username)
    .bind(&account.password_hash)
    .bind(account.role)
    .execute(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "Username is already taken"))?;

    Ok(())
}

pub async fn list_clerks(conn: &mut PgConnection) -> AppResult<Vec<ClerkDetails>> {
    let clerks = sqlx::query_as::<_, ClerkDetails>(
        r#"
        SELECT c.id, c.first_name, c.middle_name, c.last_name, c.email, c.contact_number,
               sa.username, sa.role
        FROM clerks c
        LEFT JOIN staff_accounts sa ON sa.clerk_id = c.id
        ORDER BY c.first_name
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(clerks)
}
