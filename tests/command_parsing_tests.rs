use keeper_bot::bot::commands::Command;
use keeper_bot::bot::update::{parse_command, ParsedCommand};
use teloxide::utils::command::BotCommands;

#[cfg(test)]
mod command_parsing_tests {
    use super::*;

    #[test]
    fn test_simple_commands_parse() {
        assert_eq!(Command::parse("/start", "testbot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/help", "testbot").unwrap(), Command::Help);
        assert_eq!(Command::parse("/menu", "testbot").unwrap(), Command::Menu);
        assert_eq!(Command::parse("/list", "testbot").unwrap(), Command::List);
        assert_eq!(Command::parse("/cancel", "testbot").unwrap(), Command::Cancel);
        assert_eq!(Command::parse("/stats", "testbot").unwrap(), Command::Stats);
    }

    #[test]
    fn test_argument_commands_keep_the_rest_of_the_text() {
        assert_eq!(
            Command::parse("/set note buy milk", "testbot").unwrap(),
            Command::Set("note buy milk".to_string())
        );
        assert_eq!(
            Command::parse("/get note", "testbot").unwrap(),
            Command::Get("note".to_string())
        );
        assert_eq!(
            Command::parse("/forget 42", "testbot").unwrap(),
            Command::Forget("42".to_string())
        );
    }

    #[test]
    fn test_command_with_bot_mention() {
        assert_eq!(Command::parse("/list@testbot", "testbot").unwrap(), Command::List);
        assert!(Command::parse("/list@otherbot", "testbot").is_err());
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Command::parse("/schedule", "testbot").is_err());
        assert!(Command::parse("not a command", "testbot").is_err());
    }

    #[test]
    fn test_descriptions_mention_every_command() {
        let descriptions = Command::descriptions().to_string();
        for name in Command::NAMES {
            assert!(descriptions.contains(&format!("/{name}")), "missing /{name}");
        }
    }

    #[test]
    fn test_bot_commands_match_registry_names() {
        let published: Vec<String> = Command::bot_commands()
            .into_iter()
            .map(|c| c.command.trim_start_matches('/').to_string())
            .collect();
        assert_eq!(published, Command::NAMES.to_vec());
    }

    #[test]
    fn test_router_parser_agrees_with_enum() {
        for input in ["/start", "/set note buy milk", "/GET note", "/list@TestBot"] {
            let ParsedCommand::Ours { name, .. } = parse_command(input, "testbot") else {
                panic!("{input} should be ours");
            };
            assert!(Command::NAMES.contains(&name.as_str()), "{input} -> {name}");
        }
    }

    #[test]
    fn test_router_parser_splits_arguments() {
        assert_eq!(
            parse_command("/set@testbot profile city=Berlin", "testbot"),
            ParsedCommand::Ours { name: "set".into(), args: "profile city=Berlin" }
        );
        assert_eq!(parse_command("/set@otherbot x", "testbot"), ParsedCommand::ForAnotherBot);
        assert_eq!(parse_command("just text", "testbot"), ParsedCommand::NotACommand);
    }
}
