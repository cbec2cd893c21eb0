use tracing::{debug, info};

use crate::domain::{Caller, Role, UserId};

use super::error::RegistryError;
use super::password::{hash_password, new_session_token, verify_password};
use super::storage::{NewUser, RegistryTxn, StoredUser};
use super::types::LoginResponse;
use super::validation::normalize_email;

const LOG_TARGET: &str = "registry::sessions";

/// Verifies credentials and opens a session. Any session the user already
/// held is revoked, so one login at a time per account.
pub(super) async fn login(
    txn: &mut (dyn RegistryTxn + Send),
    email: &str,
    password: &str,
) -> Result<LoginResponse, RegistryError> {
    let email = normalize_email(email);
    let user = txn
        .load_user_by_email(&email)
        .await?
        .ok_or(RegistryError::InvalidCredentials)?;
    if !verify_password(password, &user.password_hash) {
        debug!(target: LOG_TARGET, %email, "rejected login");
        return Err(RegistryError::InvalidCredentials);
    }

    let revoked = txn.revoke_user_sessions(user.id).await?;
    let token = new_session_token();
    txn.insert_session(&token, user.id).await?;

    info!(
        target: LOG_TARGET,
        user_id = user.id,
        role = %user.role,
        revoked,
        "session opened"
    );

    Ok(LoginResponse {
        token,
        role: user.role,
        email: user.email,
        name: user.name,
    })
}

pub(super) async fn authenticate(
    txn: &mut (dyn RegistryTxn + Send),
    token: &str,
) -> Result<Caller, RegistryError> {
    let user_id = txn
        .load_session(token)
        .await?
        .ok_or(RegistryError::Unauthorized)?;
    let user = txn
        .load_user(user_id)
        .await?
        .ok_or(RegistryError::Unauthorized)?;
    Ok(caller_from(&user))
}

/// Creates the account unless the email is taken; returns the id and whether
/// a new row was written.
pub(super) async fn provision_account(
    txn: &mut (dyn RegistryTxn + Send),
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<(UserId, bool), RegistryError> {
    let email = normalize_email(email);
    if let Some(existing) = txn.load_user_by_email(&email).await? {
        return Ok((existing.id, false));
    }
    let id = txn
        .insert_user(NewUser {
            name: name.trim().to_string(),
            email,
            role,
            password_hash: hash_password(password),
            phone: None,
            academic_year: None,
            department: None,
        })
        .await?;
    Ok((id, true))
}

fn caller_from(user: &StoredUser) -> Caller {
    Caller {
        user_id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
    }
}
