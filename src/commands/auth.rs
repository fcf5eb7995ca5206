//! Session commands

use crate::app::AppState;
use crate::auth::Registration;
use crate::error::ChatError;

pub async fn login(state: &AppState, username: &str, password: &str) -> Result<String, String> {
    let user = state
        .session
        .login(username, password)
        .await
        .map_err(|e| e.to_string())?;
    state.on_signed_in().await;
    Ok(format!("Signed in as {} (balance {})", user.username, user.balance))
}

pub async fn register(
    state: &AppState,
    username: String,
    password: String,
    email: Option<String>,
) -> Result<String, String> {
    let form = Registration {
        username,
        password,
        email,
        attribution: state.attribution.clone(),
    };
    let user = state.session.register(form).await.map_err(|e| e.to_string())?;
    state.on_signed_in().await;
    Ok(format!("Welcome, {}! Balance: {}", user.username, user.balance))
}

pub fn logout(state: &AppState) -> String {
    state.session.logout();
    state.on_signed_out();
    "Signed out".to_string()
}

pub async fn me(state: &AppState) -> Result<String, String> {
    let result = state.session.fetch_user().await;
    if matches!(result, Err(ChatError::Unauthorized)) {
        state.on_signed_out();
    }
    let user = result.map_err(|e| e.to_string())?;
    let mut lines = vec![
        format!("User:    {} (#{})", user.username, user.id),
        format!("Balance: {}", user.balance),
    ];
    if let Some(email) = &user.email {
        lines.push(format!("Email:   {}", email));
    }
    if let Some(plan) = &user.subscription_plan {
        lines.push(format!("Plan:    {}", plan));
    }
    if user.is_admin {
        lines.push("Role:    admin".to_string());
    }
    Ok(lines.join("\n"))
}
