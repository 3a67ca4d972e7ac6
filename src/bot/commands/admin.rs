use crate::bot::context::HandlerContext;
use crate::bot::registry::HandlerResult;
use crate::database::models::User;
use crate::utils::logging::{log_system_event, log_validation_error};
use crate::utils::validation::parse_user_id;

pub const ADMIN_ONLY_TEXT: &str = "This command is only available to bot administrators.";

/// Replies with a refusal and returns false for non-admins.
fn require_admin(ctx: &HandlerContext, command: &str) -> anyhow::Result<bool> {
    if ctx.is_admin {
        return Ok(true);
    }
    tracing::warn!("User {} tried admin command /{}", ctx.user_id(), command);
    ctx.feedback().error(ADMIN_ONLY_TEXT)?;
    Ok(false)
}

pub async fn handle_forget(ctx: HandlerContext) -> HandlerResult {
    if !require_admin(&ctx, "forget")? {
        return Ok(());
    }

    let target = match parse_user_id(ctx.args()) {
        Ok(id) => id,
        Err(e) => {
            log_validation_error("forget", "user_id", ctx.args(), &e.to_string(), ctx.user_id());
            ctx.feedback().validation_error(&e.to_string(), "Try /forget 123456789")?;
            return Ok(());
        }
    };

    match User::forget(ctx.pool(), target).await? {
        Some(records) => {
            log_system_event(
                "User forgotten",
                Some(&format!("user {} by admin {}, {} records", target, ctx.user_id(), records)),
            );
            ctx.feedback()
                .success(&format!("Forgot user {target} and {records} record(s)."))?;
        }
        None => ctx.feedback().warning(&format!("User {target} is unknown."))?,
    }
    Ok(())
}

pub async fn handle_stats(ctx: HandlerContext) -> HandlerResult {
    if !require_admin(&ctx, "stats")? {
        return Ok(());
    }

    let users = User::count(ctx.pool()).await?;
    let records = ctx.store.count().await?;
    let dispatch = ctx.stats.snapshot();

    let text = format!(
        "📊 Keeper statistics\n\n\
        👤 Users: {users}\n\
        📄 Records: {records}\n\n\
        📨 Updates received: {}\n\
        • handled: {}\n\
        • fallback: {}\n\
        • ignored: {}\n\
        • failed: {}",
        dispatch.received, dispatch.handled, dispatch.fallbacks, dispatch.ignored, dispatch.failed
    );
    ctx.reply(text)?;
    Ok(())
}
