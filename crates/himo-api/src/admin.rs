//! Moderation endpoint.
//!
//! Every action first passes [`require_admin`] for the acting `adminId`.
//! Reads come in as `GET` query parameters, writes as a `POST` JSON body, and
//! soft deletion as `DELETE` query parameters.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

use himo_db::models::CoinGrant;
use himo_db::{SUPER_ADMIN_ID, time};
use himo_types::api::{
    ActionResponse, AdminActionRequest, Report, ReportListResponse, UserListResponse,
    UserMessage, UserMessageListResponse,
};

use crate::access::require_admin;
use crate::auth::profile;
use crate::error::ApiError;
use crate::request::{parse_body, query_id};
use crate::response;
use crate::state::{AppState, with_store};

/// Cap on messages returned by `user_messages`.
pub const USER_HISTORY_LIMIT: u32 = 100;

/// Write actions carried by a `POST` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Moderation {
    Ban,
    Unban,
    MakeAdmin,
    RemoveAdmin,
    GiveCoins,
    Verify,
}

impl Moderation {
    fn parse(action: &str) -> Option<Self> {
        match action {
            "ban_user" => Some(Self::Ban),
            "unban_user" => Some(Self::Unban),
            "make_admin" => Some(Self::MakeAdmin),
            "remove_admin" => Some(Self::RemoveAdmin),
            "give_coins" => Some(Self::GiveCoins),
            "verify_user" => Some(Self::Verify),
            _ => None,
        }
    }
}

pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    match dispatch(&state, method, params, body).await {
        Ok(res) => res,
        Err(e) => e.into_response(),
    }
}

async fn dispatch(
    state: &AppState,
    method: Method,
    params: HashMap<String, String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.store()?;

    match method {
        Method::GET => {
            let admin_id = query_id(&params, "adminId")?
                .ok_or_else(|| ApiError::invalid("Admin ID required"))?;
            let action = params.get("action").cloned().unwrap_or_default();
            let target = query_id(&params, "userId")?;
            read(state, admin_id, action, target).await
        }
        Method::POST => {
            let req: AdminActionRequest = parse_body(&body)?;
            let admin_id = req
                .admin_id
                .ok_or_else(|| ApiError::invalid("Admin ID required"))?;
            write(state, admin_id, req).await
        }
        Method::DELETE => {
            let (Some(admin_id), Some(target)) =
                (query_id(&params, "adminId")?, query_id(&params, "userId")?)
            else {
                return Err(ApiError::invalid("Admin ID and user ID required"));
            };
            let action = params.get("action").cloned().unwrap_or_default();
            delete(state, admin_id, target, action).await
        }
        _ => Err(ApiError::MethodNotAllowed),
    }
}

async fn read(
    state: &AppState,
    admin_id: i64,
    action: String,
    target: Option<i64>,
) -> Result<Response, ApiError> {
    with_store(state, move |db| {
        require_admin(db, admin_id)?;

        match action.as_str() {
            "users" => {
                let users = db
                    .list_users()?
                    .iter()
                    .map(profile)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(response::json(StatusCode::OK, &UserListResponse { users }))
            }
            "reports" => {
                let reports = db
                    .list_reports()?
                    .into_iter()
                    .map(|row| -> anyhow::Result<Report> {
                        Ok(Report {
                            id: row.id,
                            reason: row.reason,
                            status: row.status,
                            created_at: time::from_db(&row.created_at)?,
                            reported_user: row.reported_user,
                            reported_by: row.reported_by,
                        })
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;
                Ok(response::json(StatusCode::OK, &ReportListResponse { reports }))
            }
            "user_messages" => {
                let target = target.ok_or_else(|| ApiError::invalid("Target user ID required"))?;
                let messages = db
                    .get_user_messages(target, USER_HISTORY_LIMIT)?
                    .into_iter()
                    .map(|row| -> anyhow::Result<UserMessage> {
                        Ok(UserMessage {
                            id: row.id,
                            text: row.text,
                            created_at: time::from_db(&row.created_at)?,
                            chat_name: row.chat_name,
                        })
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;
                Ok(response::json(
                    StatusCode::OK,
                    &UserMessageListResponse { messages },
                ))
            }
            _ => Err(ApiError::MethodNotAllowed),
        }
    })
    .await
}

async fn write(
    state: &AppState,
    admin_id: i64,
    req: AdminActionRequest,
) -> Result<Response, ApiError> {
    let message = with_store(state, move |db| {
        require_admin(db, admin_id)?;

        let target = req
            .user_id
            .ok_or_else(|| ApiError::invalid("Target user ID required"))?;
        let action = req
            .action
            .as_deref()
            .and_then(Moderation::parse)
            .ok_or(ApiError::MethodNotAllowed)?;

        let (changed, message) = match action {
            // Ban and demote silently skip the super-admin
            Moderation::Ban => (db.ban_user(target)?, "User banned".to_string()),
            Moderation::Unban => (db.unban_user(target)?, "User unbanned".to_string()),
            Moderation::MakeAdmin => (db.promote_admin(target)?, "User promoted to admin".to_string()),
            Moderation::RemoveAdmin => (db.demote_admin(target)?, "Admin rights removed".to_string()),
            Moderation::Verify => (db.verify_user(target)?, "User verified".to_string()),
            Moderation::GiveCoins => {
                let amount = req.amount.unwrap_or(0);
                if amount <= 0 {
                    return Err(ApiError::invalid("Invalid amount"));
                }
                let changed = match db.grant_coins(target, amount)? {
                    CoinGrant::Granted(_) => 1,
                    CoinGrant::NoSuchUser => 0,
                    CoinGrant::Overflow => return Err(ApiError::invalid("Invalid amount")),
                };
                (changed, format!("Gave {} coins", amount))
            }
        };

        info!(
            "Admin {} applied {:?} to user {} ({} row(s) changed)",
            admin_id, action, target, changed
        );
        Ok(message)
    })
    .await?;

    Ok(response::json(
        StatusCode::OK,
        &ActionResponse {
            success: true,
            message,
        },
    ))
}

async fn delete(
    state: &AppState,
    admin_id: i64,
    target: i64,
    action: String,
) -> Result<Response, ApiError> {
    with_store(state, move |db| {
        require_admin(db, admin_id)?;

        if action != "delete_user" {
            return Err(ApiError::MethodNotAllowed);
        }
        if target == SUPER_ADMIN_ID {
            return Err(ApiError::invalid("Cannot delete main admin"));
        }

        let changed = db.soft_delete_user(target)?;
        info!("Admin {} deleted user {} ({} row(s) changed)", admin_id, target, changed);
        Ok(())
    })
    .await?;

    Ok(response::json(
        StatusCode::OK,
        &ActionResponse {
            success: true,
            message: "User deleted".to_string(),
        },
    ))
}
