use crossbeam_channel::Sender;
use std::io::BufRead;
use std::path::PathBuf;
use std::thread::JoinHandle;

/// User requests delivered to the scheduling thread
#[derive(Clone, Debug, PartialEq)]
pub enum Control {
    Play,
    Stop,
    Load {
        path: PathBuf,
        format: Option<String>,
    },
    Quit,
}

pub const HELP: &str = "commands: play | stop | load <path> [format] | quit";

/// Parse one line of user input. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Control>, String> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };

    let control = match command.to_ascii_lowercase().as_str() {
        "play" => Control::Play,
        "stop" => Control::Stop,
        "quit" | "exit" => Control::Quit,
        "load" => {
            let path = parts.next().ok_or("load needs a file path")?;
            Control::Load {
                path: PathBuf::from(path),
                format: parts.next().map(str::to_string),
            }
        }
        other => return Err(format!("unknown command '{}' ({})", other, HELP)),
    };
    Ok(Some(control))
}

/// Forward commands typed on stdin until EOF or `quit`.
pub fn spawn_stdin_reader(tx: Sender<Control>) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("stdin-commands".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match parse_command(&line) {
                    Ok(Some(control)) => {
                        let quit = control == Control::Quit;
                        if tx.send(control).is_err() || quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(msg) => log::warn!("{}", msg),
                }
            }
            log::debug!("Command input closed");
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command("play"), Ok(Some(Control::Play)));
        assert_eq!(parse_command("  STOP "), Ok(Some(Control::Stop)));
        assert_eq!(parse_command("exit"), Ok(Some(Control::Quit)));
        assert_eq!(parse_command(""), Ok(None));
    }

    #[test]
    fn parses_load_with_optional_format() {
        assert_eq!(
            parse_command("load music/a.bin audio/ogg"),
            Ok(Some(Control::Load {
                path: PathBuf::from("music/a.bin"),
                format: Some("audio/ogg".into()),
            }))
        );
        assert_eq!(
            parse_command("load a.wav"),
            Ok(Some(Control::Load {
                path: PathBuf::from("a.wav"),
                format: None,
            }))
        );
        assert!(parse_command("load").is_err());
    }

    #[test]
    fn rejects_unknown_commands() {
        let err = parse_command("rewind").unwrap_err();
        assert!(err.contains("rewind"));
    }
}
