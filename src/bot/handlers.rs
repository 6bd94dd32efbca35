//! Update handlers: registration, AI chat, file analysis, web search.

use std::path::Path;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ButtonRequest, KeyboardButton, KeyboardMarkup};
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use crate::bot::download;
use crate::bot::extract::{self, ExtractError, Extraction, FileKind};
use crate::bot::search;
use crate::bot::store::ChatTurn;
use crate::bot::{AppContext, PendingAction};
use crate::gemini::GeminiError;
use crate::sentiment::{self, SentimentLabel};

const REGISTRATION_PROMPT: &str = "Please share your phone number to complete registration.";
const REGISTRATION_COMPLETE: &str = "✅ Registration complete! Thank you.";
const OWN_NUMBER_WARNING: &str = "⚠️ Please share your own phone number.";
const NO_FILE_WARNING: &str = "⚠️ No valid file received. Please send an image or document.";
const NO_TEXT_IN_IMAGE: &str = "⚠️ No text found in the image.";
const SEARCH_QUERY_PROMPT: &str = "🔍 Please enter your search query:";
const NO_RESULTS: &str = "❌ No results found. Please try again later.";
const AI_UNAVAILABLE: &str = "❌ AI service is currently unavailable. Please try again later.";
const FILE_FAILURE: &str = "❌ Error processing the file. Please try again later.";
const SERVICE_FAILURE: &str = "❌ Something went wrong. Please try again later.";

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "register, or say hello again.")]
    Start,
    #[command(description = "search the web and summarize the results.")]
    Websearch,
    #[command(description = "show this help.")]
    Help,
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<AppContext>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(bot, msg, ctx).await,
        Command::Websearch => handle_websearch(bot, msg, ctx).await,
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
            Ok(())
        }
    }
}

/// `/start`: create a pending-phone user row, or greet a returning user.
async fn handle_start(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    let from = msg.from.as_ref();
    let first_name = from.map(|u| u.first_name.as_str()).unwrap_or("there").to_string();
    let username = from.and_then(|u| u.username.clone());

    match ctx.store.find_user(chat_id) {
        Ok(Some(user)) => {
            bot.send_message(
                msg.chat.id,
                format!("Hello again, {}! You're already registered.", user.first_name),
            )
            .await?;
        }
        Ok(None) => {
            if let Err(e) = ctx.store.create_user(chat_id, &first_name, username.as_deref()) {
                warn!("Failed to create user record: {e}");
                bot.send_message(msg.chat.id, SERVICE_FAILURE).await?;
                return Ok(());
            }

            let button = KeyboardButton::new("📞 Share Phone Number").request(ButtonRequest::Contact);
            let keyboard = KeyboardMarkup::new([[button]])
                .one_time_keyboard()
                .resize_keyboard();

            bot.send_message(msg.chat.id, REGISTRATION_PROMPT)
                .reply_markup(keyboard)
                .await?;
        }
        Err(e) => {
            warn!("User lookup failed: {e}");
            bot.send_message(msg.chat.id, SERVICE_FAILURE).await?;
        }
    }
    Ok(())
}

/// `/websearch`: arm the pending-query slot and prompt for the query.
async fn handle_websearch(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> ResponseResult<()> {
    if !ctx.search_enabled {
        warn!("/websearch requested but search credentials are not configured");
        bot.send_message(msg.chat.id, NO_RESULTS).await?;
        return Ok(());
    }

    ctx.set_pending(msg.chat.id.0, PendingAction::AwaitingSearchQuery).await;
    bot.send_message(msg.chat.id, SEARCH_QUERY_PROMPT).await?;
    Ok(())
}

/// Contact share: capture the phone number if the contact is the sender's own.
pub async fn handle_contact(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> ResponseResult<()> {
    let Some(contact) = msg.contact() else {
        return Ok(());
    };
    let chat_id = msg.chat.id.0;
    let sender_id = msg.from.as_ref().map(|u| u.id);
    let own_number =
        matches!((contact.user_id, sender_id), (Some(cid), Some(sid)) if cid == sid);

    if !own_number {
        bot.send_message(msg.chat.id, OWN_NUMBER_WARNING).await?;
        return Ok(());
    }

    match ctx.store.record_phone(chat_id, &contact.phone_number) {
        Ok(()) => {
            info!("📞 Captured phone number for chat {chat_id}");
            bot.send_message(msg.chat.id, REGISTRATION_COMPLETE).await?;
        }
        Err(e) => {
            warn!("Failed to record phone number: {e}");
            bot.send_message(msg.chat.id, SERVICE_FAILURE).await?;
        }
    }
    Ok(())
}

/// Free text: a pending `/websearch` query, otherwise AI chat.
pub async fn handle_text(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> ResponseResult<()> {
    let Some(text) = msg.text().map(|t| t.to_string()) else {
        return Ok(());
    };
    let chat_id = msg.chat.id.0;

    if let Some(PendingAction::AwaitingSearchQuery) = ctx.take_pending(chat_id).await {
        return run_web_search(&bot, &msg, &ctx, &text).await;
    }
    run_ai_chat(&bot, &msg, &ctx, &text).await
}

async fn run_ai_chat(bot: &Bot, msg: &Message, ctx: &AppContext, text: &str) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    let label = sentiment::classify(text);
    info!("💬 Chat message from {chat_id} (sentiment: {label})");

    bot.send_message(msg.chat.id, "🤖 Thinking...").await?;
    bot.send_message(msg.chat.id, format!("🤖 Analyzing sentiment: {label}..."))
        .await?;

    let reply = match ctx.gemini.generate(text).await {
        Ok(completion) => compose_reply(label, &completion),
        Err(e) => {
            warn!("Gemini request failed: {e}");
            bot.send_message(msg.chat.id, AI_UNAVAILABLE).await?;
            return Ok(());
        }
    };

    let turn = ChatTurn {
        chat_id,
        user_input: text.to_string(),
        bot_response: reply.clone(),
        sentiment: label,
    };
    if let Err(e) = ctx.store.insert_chat_turn(&turn) {
        warn!("Failed to persist chat turn: {e}");
        bot.send_message(msg.chat.id, AI_UNAVAILABLE).await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Prefix the AI completion according to the sentiment tag.
pub fn compose_reply(label: SentimentLabel, completion: &str) -> String {
    match label {
        SentimentLabel::Negative => format!("😞 I'm here for you. {completion}"),
        SentimentLabel::Positive => format!("😊 That sounds great! {completion}"),
        SentimentLabel::Neutral => completion.to_string(),
    }
}

async fn run_web_search(
    bot: &Bot,
    msg: &Message,
    ctx: &AppContext,
    query: &str,
) -> ResponseResult<()> {
    info!("🔍 Web search from chat {}: \"{query}\"", msg.chat.id.0);
    bot.send_message(msg.chat.id, "🔍 Searching the web...").await?;

    let results = match ctx.search.search(query).await {
        Ok(results) => results,
        Err(e) => {
            warn!("Web search failed: {e}");
            Vec::new()
        }
    };

    if results.is_empty() {
        bot.send_message(msg.chat.id, NO_RESULTS).await?;
        return Ok(());
    }

    match ctx.gemini.generate(&search::summary_prompt(&results)).await {
        Ok(summary) => {
            bot.send_message(msg.chat.id, format!("🔍 Search Results Summary:\n\n{summary}"))
                .await?;
        }
        Err(e) => {
            warn!("Gemini summarization failed: {e}");
            bot.send_message(msg.chat.id, AI_UNAVAILABLE).await?;
        }
    }
    Ok(())
}

/// Photo or document attachment: download, extract, analyze, persist.
pub async fn handle_file(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;

    // A document wins over photo sizes; photos use the largest rendition.
    let (file_id, file_name, kind) = if let Some(doc) = msg.document() {
        let name = doc.file_name.clone().unwrap_or_else(|| "document".to_string());
        let mime = doc.mime_type.as_ref().map(|m| m.to_string());
        (doc.file.id.clone(), name, FileKind::classify(false, mime.as_deref()))
    } else if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        (photo.file.id.clone(), "image.jpg".to_string(), FileKind::Image)
    } else {
        bot.send_message(msg.chat.id, NO_FILE_WARNING).await?;
        return Ok(());
    };

    info!("📎 File from chat {chat_id}: {file_name} ({kind:?})");

    let downloaded =
        match download::fetch_to_dir(&bot, file_id, &ctx.download_dir, &file_name).await {
            Ok(file) => file,
            Err(e) => {
                warn!("Download failed: {e}");
                bot.send_message(msg.chat.id, FILE_FAILURE).await?;
                return Ok(());
            }
        };

    bot.send_message(msg.chat.id, "🔍 Analyzing the file...").await?;

    // `downloaded` drops on every path below, removing the file.
    let analysis = match analyze_file(&ctx, kind, downloaded.path()).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("File analysis failed: {e}");
            bot.send_message(msg.chat.id, FILE_FAILURE).await?;
            return Ok(());
        }
    };

    if let Err(e) = ctx.store.insert_file_analysis(chat_id, &file_name, &analysis) {
        warn!("Failed to persist file analysis: {e}");
        bot.send_message(msg.chat.id, FILE_FAILURE).await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, format!("📄 File: {file_name}\n\n📝 Analysis: {analysis}"))
        .await?;
    Ok(())
}

#[derive(Debug)]
enum AnalysisError {
    Extract(ExtractError),
    Ai(GeminiError),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Extract(e) => write!(f, "{e}"),
            AnalysisError::Ai(e) => write!(f, "{e}"),
        }
    }
}

async fn analyze_file(
    ctx: &AppContext,
    kind: FileKind,
    path: &Path,
) -> Result<String, AnalysisError> {
    match extract::extract(kind, path, &ctx.ocr).map_err(AnalysisError::Extract)? {
        Extraction::Text(text) => ctx.gemini.generate(&text).await.map_err(AnalysisError::Ai),
        Extraction::NoText => Ok(NO_TEXT_IN_IMAGE.to_string()),
        // unsupported types leave the analysis as initialized: empty
        Extraction::Skipped => Ok(String::new()),
    }
}
