use teloxide::utils::command::BotCommands;

use crate::bot::commands::Command;
use crate::bot::context::HandlerContext;
use crate::bot::keyboard::main_menu;
use crate::bot::registry::HandlerResult;
use crate::database::models::UserMode;

pub const MENU_TEXT: &str = "📒 Main menu. What would you like to do?";

pub async fn handle_start(ctx: HandlerContext) -> HandlerResult {
    let welcome = format!(
        "👋 Hi {}! I keep small named records for you.\n\n\
        Save one with /set note buy milk, read it back with /get note, \
        or use the buttons below.",
        ctx.update.sender.first_name
    );
    ctx.reply_keyboard(welcome, main_menu())?;
    Ok(())
}

pub async fn handle_help(ctx: HandlerContext) -> HandlerResult {
    let mut text = Command::descriptions().to_string();
    if !ctx.is_admin {
        text = text
            .lines()
            .filter(|line| !line.contains("Admin:"))
            .collect::<Vec<_>>()
            .join("\n");
    }
    ctx.reply(text)?;
    Ok(())
}

pub async fn handle_menu(ctx: HandlerContext) -> HandlerResult {
    ctx.reply_keyboard(MENU_TEXT, main_menu())?;
    Ok(())
}

pub async fn handle_cancel(ctx: HandlerContext) -> HandlerResult {
    if !ctx.mode.is_pending() {
        ctx.feedback().info("Nothing to cancel.")?;
        return Ok(());
    }

    ctx.set_mode(&UserMode::Idle).await?;
    ctx.feedback().success("Cancelled.")?;
    Ok(())
}
