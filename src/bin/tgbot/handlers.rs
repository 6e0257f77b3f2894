use std::sync::Arc;

use restaurant_finder::bot::{parse_near, App, Callback, Reply};
use restaurant_finder::client::RadiusQuery;
use restaurant_finder::image::is_image_mime;
use restaurant_finder::view;
use teloxide::{
    dispatching::UpdateHandler,
    net::Download,
    prelude::*,
    types::{Document, InlineKeyboardButton, InlineKeyboardMarkup, Location, PhotoSize},
    utils::command::BotCommands,
};

macro_rules! send {
    ([$bot:expr, $msg:expr], $text:expr) => {
        if let Err(e) = $bot.send_message($msg.chat.id, $text).await {
            tracing::error!("fail to send message: {e}")
        }
    };
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub(super) enum Commands {
    #[command(description = "show what this bot can do")]
    Start,
    #[command(description = "show this text")]
    Help,
    #[command(description = "search restaurants by name or cuisine")]
    Search(String),
    #[command(description = "view all restaurants")]
    List,
    #[command(description = "restaurants around <lat> <lng> [radius km]")]
    Near(String),
    #[command(description = "details of the restaurant with this id")]
    Show(String),
    #[command(description = "search by image, send a photo of a dish")]
    Image,
}

pub(super) fn handler_schema() -> UpdateHandler<anyhow::Error> {
    let command_handler = teloxide::filter_command::<Commands, _>().endpoint(command_handler);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(
            dptree::filter_map(|msg: Message| msg.location().cloned()).endpoint(location_handler),
        )
        .branch(
            dptree::filter_map(|msg: Message| msg.photo().map(<[PhotoSize]>::to_vec))
                .endpoint(photo_handler),
        )
        .branch(
            dptree::filter_map(|msg: Message| msg.document().cloned()).endpoint(document_handler),
        );

    let callback_handler = Update::filter_callback_query().endpoint(callback_handler);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

fn markup(reply: &Reply) -> Option<InlineKeyboardMarkup> {
    if reply.buttons.is_empty() {
        return None;
    }
    let row: Vec<_> = reply
        .buttons
        .iter()
        .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.data.clone()))
        .collect();
    Some(InlineKeyboardMarkup::new(vec![row]))
}

async fn edit(bot: &Bot, msg: &Message, reply: Reply) -> anyhow::Result<()> {
    let request = bot.edit_message_text(msg.chat.id, msg.id, reply.text.clone());
    match markup(&reply) {
        Some(markup) => request.reply_markup(markup).await?,
        None => request.await?,
    };
    Ok(())
}

// Sends the loading placeholder that the result later replaces.
async fn placeholder(bot: &Bot, msg: &Message) -> anyhow::Result<Message> {
    Ok(bot.send_message(msg.chat.id, view::LOADING).await?)
}

async fn deliver(bot: &Bot, placeholder: &Message, reply: Option<Reply>) -> anyhow::Result<()> {
    match reply {
        Some(reply) => edit(bot, placeholder, reply).await,
        // a newer request in this chat took over
        None => {
            bot.delete_message(placeholder.chat.id, placeholder.id)
                .await?;
            Ok(())
        }
    }
}

async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Commands,
    app: Arc<App>,
) -> anyhow::Result<()> {
    let chat = msg.chat.id.0;
    match cmd {
        Commands::Start | Commands::Help => {
            send!(
                [bot, msg],
                format!("{}\n\n{}", view::HOME, Commands::descriptions())
            );
        }
        Commands::Search(term) => {
            let loading = placeholder(&bot, &msg).await?;
            deliver(&bot, &loading, app.search(chat, &term).await).await?;
        }
        Commands::List => {
            let loading = placeholder(&bot, &msg).await?;
            deliver(&bot, &loading, app.search(chat, "").await).await?;
        }
        Commands::Near(args) => match parse_near(&args) {
            Ok(query) => {
                let loading = placeholder(&bot, &msg).await?;
                deliver(&bot, &loading, app.nearby(chat, query).await).await?;
            }
            Err(hint) => {
                send!(
                    [bot, msg],
                    format!("Unable to read your location: {hint}\n\nUsage: /near <lat> <lng> [radius]")
                );
            }
        },
        Commands::Show(id) => {
            let id = id.trim();
            if id.is_empty() {
                send!([bot, msg], "Usage: /show <id>");
                return Ok(());
            }
            let loading = placeholder(&bot, &msg).await?;
            deliver(&bot, &loading, app.details(chat, id, false).await).await?;
        }
        Commands::Image => {
            if let Some(reply) = app.image_search(chat, None).await {
                send!([bot, msg], reply.text);
            }
        }
    }

    Ok(())
}

async fn location_handler(
    bot: Bot,
    msg: Message,
    location: Location,
    app: Arc<App>,
) -> anyhow::Result<()> {
    let Ok(query) = RadiusQuery::around(location.latitude, location.longitude) else {
        send!(
            [bot, msg],
            "Unable to retrieve your location. Please share it again."
        );
        return Ok(());
    };

    let loading = placeholder(&bot, &msg).await?;
    deliver(&bot, &loading, app.nearby(msg.chat.id.0, query).await).await
}

async fn download(bot: &Bot, file_id: &str) -> anyhow::Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let mut bytes = Vec::new();
    bot.download_file(&file.path, &mut bytes).await?;
    Ok(bytes)
}

async fn photo_handler(
    bot: Bot,
    msg: Message,
    photos: Vec<PhotoSize>,
    app: Arc<App>,
) -> anyhow::Result<()> {
    let Some(photo) = photos.iter().max_by_key(|p| p.width * p.height) else {
        send!([bot, msg], view::MISSING_IMAGE);
        return Ok(());
    };

    let loading = placeholder(&bot, &msg).await?;
    let bytes = download(&bot, &photo.file.id).await;
    // telegram re-encodes photos as jpeg
    let reply = app
        .received_image(msg.chat.id.0, "photo.jpg", "image/jpeg", bytes)
        .await;
    deliver(&bot, &loading, reply).await
}

async fn document_handler(
    bot: Bot,
    msg: Message,
    document: Document,
    app: Arc<App>,
) -> anyhow::Result<()> {
    let mime = document
        .mime_type
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    if !is_image_mime(&mime) {
        send!([bot, msg], view::INVALID_IMAGE);
        return Ok(());
    }

    let loading = placeholder(&bot, &msg).await?;
    let bytes = download(&bot, &document.file.id).await;
    let file_name = document
        .file_name
        .clone()
        .unwrap_or_else(|| "image".to_string());
    let reply = app
        .received_image(msg.chat.id.0, file_name, mime, bytes)
        .await;
    deliver(&bot, &loading, reply).await
}

async fn callback_handler(bot: Bot, q: CallbackQuery, app: Arc<App>) -> anyhow::Result<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(data), Some(msg)) = (q.data.as_deref(), q.message.as_ref()) else {
        return Ok(());
    };
    let chat = msg.chat.id.0;

    let reply = match Callback::parse(data) {
        Some(Callback::Page(page)) => app.turn_page(chat, page).await,
        Some(Callback::Details { id, more }) => app.details(chat, &id, more).await,
        None => {
            tracing::warn!("unknown callback data {data}");
            return Ok(());
        }
    };

    if let Some(reply) = reply {
        edit(&bot, msg, reply).await?;
    }
    Ok(())
}
