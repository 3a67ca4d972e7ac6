pub mod admin;
pub mod records;
pub mod start;

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Keeper Bot commands:")]
pub enum Command {
    #[command(description = "Start the bot and show the main menu")]
    Start,
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Show the main menu")]
    Menu,
    #[command(description = "Save a record: /set <name> <text> or /set <name> key=value ...")]
    Set(String),
    #[command(description = "Show a record: /get <name>")]
    Get(String),
    #[command(description = "Delete a record: /del <name>")]
    Del(String),
    #[command(description = "List your records")]
    List,
    #[command(description = "Abort the current interaction")]
    Cancel,
    #[command(description = "Admin: delete a user and all their records")]
    Forget(String),
    #[command(description = "Admin: show usage statistics")]
    Stats,
}

impl Command {
    /// Registry keys, matching the lowercase rename rule.
    pub const NAMES: [&'static str; 10] =
        ["start", "help", "menu", "set", "get", "del", "list", "cancel", "forget", "stats"];
}
