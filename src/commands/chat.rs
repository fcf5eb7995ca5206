//! Conversation, model and attachment commands

use std::path::Path;

use crate::api::Role;
use crate::app::AppState;
use crate::chat::Message;
use crate::models::{catalog, ModelCapabilities};

fn render_message(message: &Message) -> String {
    match message.role {
        Role::User => format!("you> {}", message.content),
        Role::Assistant => {
            let model = message
                .model
                .as_deref()
                .map(catalog::display_name)
                .unwrap_or_else(|| "assistant".to_string());
            format!("{}> {}", model, message.content)
        }
    }
}

pub async fn send_message(state: &AppState, text: &str) -> Result<String, String> {
    let receipt = state
        .orchestrator
        .submit(text)
        .await
        .map_err(|e| e.to_string())?;

    let conversation = state.conversation.state();
    let reply = conversation
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(render_message)
        .unwrap_or_default();

    let mut footer = Vec::new();
    if let Some(coins) = receipt.coins_spent {
        footer.push(format!("-{} coins", coins));
    }
    if let Some(balance) = receipt.balance_remaining {
        footer.push(format!("balance {}", balance));
    }
    if footer.is_empty() {
        Ok(reply)
    } else {
        Ok(format!("{}\n[{}]", reply, footer.join(", ")))
    }
}

pub fn new_conversation(state: &AppState) -> String {
    state.conversation.new_conversation();
    "Started a new conversation".to_string()
}

pub async fn list_conversations(state: &AppState) -> Result<String, String> {
    let list = state
        .conversation
        .load_conversations()
        .await
        .map_err(|e| e.to_string())?;
    if list.is_empty() {
        return Ok("No conversations yet".to_string());
    }
    Ok(list
        .iter()
        .map(|c| {
            let updated = c
                .updated_at
                .or(c.created_at)
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            format!("#{:<6} {:<50} {:>3} msgs  {}", c.id, c.title, c.message_count, updated)
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

pub async fn load_conversation(state: &AppState, id: i64) -> Result<String, String> {
    state
        .conversation
        .load_conversation(id)
        .await
        .map_err(|e| e.to_string())?;
    Ok(history(state))
}

pub async fn delete_conversation(state: &AppState, id: i64) -> Result<String, String> {
    state
        .conversation
        .delete_conversation(id)
        .await
        .map_err(|e| e.to_string())?;
    Ok(format!("Deleted conversation #{}", id))
}

pub fn history(state: &AppState) -> String {
    let conversation = state.conversation.state();
    let header = match (conversation.conversation_id, &conversation.title) {
        (Some(id), Some(title)) => format!("#{} {}", id, title),
        (Some(id), None) => format!("#{}", id),
        (None, _) => "New conversation".to_string(),
    };
    std::iter::once(header)
        .chain(conversation.messages.iter().map(render_message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn show_model(state: &AppState) -> String {
    let model = state.conversation.selected_model();
    let caps = ModelCapabilities::for_model(&model);
    let uploads = if caps.can_upload() {
        caps.accepted_content_types().join(", ")
    } else {
        "none".to_string()
    };
    format!(
        "Model: {} ({})\nAttachments: {}",
        catalog::display_name(&model),
        model,
        uploads
    )
}

/// The pending attachment is re-checked against the new model
pub fn select_model(state: &AppState, model: &str) -> Result<String, String> {
    state.conversation.select_model(model);
    let mut text = show_model(state);
    if let Err(e) = state.composer.revalidate(model) {
        text.push_str(&format!("\nWarning: {} (use /detach)", e));
    }
    Ok(text)
}

pub async fn list_models(state: &AppState) -> Result<String, String> {
    let token = state.session.require_token().map_err(|e| e.to_string())?;
    let selected = state.conversation.selected_model();
    let models = catalog::load_models(state.backend.as_ref(), &token).await;
    Ok(models
        .iter()
        .map(|m| {
            let marker = if m.model_id == selected { "*" } else { " " };
            format!(
                "{} {:<40} {:<10} {:>6} / 1M tokens",
                marker,
                m.model_id,
                catalog::provider(&m.model_id),
                catalog::format_price(m.price_per_1m_tokens)
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

pub async fn attach(state: &AppState, path: &Path) -> Result<String, String> {
    let model = state.conversation.selected_model();
    let attachment = state
        .composer
        .upload_path(path, &model)
        .await
        .map_err(|e| e.to_string())?;
    Ok(format!(
        "Attached {} ({}, {} bytes)",
        attachment.filename, attachment.kind, attachment.size
    ))
}

pub fn detach(state: &AppState) -> String {
    match state.composer.remove() {
        Some(attachment) => format!("Removed {}", attachment.filename),
        None => "No attachment".to_string(),
    }
}
