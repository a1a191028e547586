#[derive(Debug, PartialEq)]
pub enum Command {
    Quit,
    ForceQuit,
    Write,
    WriteQuit,
    Refresh,
    Join,
    Leave,
    /// 1-based position of the day column.
    Day(usize),
    /// Clock hour as shown on the axis.
    Hour(u32),
    Theme(String),
    Help,
    Error(String),
}

pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();

    let Some(command_text) = trimmed.strip_prefix(':') else {
        return Command::Error("Commands must start with ':'".to_string());
    };

    let parts: Vec<&str> = command_text.split_whitespace().collect();

    if parts.is_empty() {
        return Command::Error("Empty command".to_string());
    }

    match parts[0] {
        "q" | "quit" => Command::Quit,
        "q!" | "quit!" => Command::ForceQuit,
        "w" | "write" => Command::Write,
        "wq" | "x" => Command::WriteQuit,
        "e" | "refresh" => Command::Refresh,
        "join" => Command::Join,
        "leave" => Command::Leave,
        "help" => Command::Help,
        "day" => match parts.get(1).map(|raw| raw.parse::<usize>()) {
            Some(Ok(day)) if day >= 1 => Command::Day(day),
            Some(_) => Command::Error(format!("Invalid day: {}", parts[1])),
            None => Command::Error("day requires a column number".to_string()),
        },
        "hour" => match parts.get(1).map(|raw| raw.parse::<u32>()) {
            Some(Ok(hour)) if hour < 24 => Command::Hour(hour),
            Some(_) => Command::Error(format!("Invalid hour: {}", parts[1])),
            None => Command::Error("hour requires an hour between 0 and 23".to_string()),
        },
        "theme" => {
            if parts.len() < 2 {
                Command::Error("theme requires a theme name".to_string())
            } else {
                Command::Theme(parts[1].to_string())
            }
        }
        _ => Command::Error(format!("Unknown command: {}", parts[0])),
    }
}
