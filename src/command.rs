use std::time::Duration;

pub const HELP: &str = "\
Commands:
  p, play          start or resume playback
  pause            pause playback
  <enter>          toggle play/pause
  s, stop          stop and rewind
  f, freq <hz>     set switch frequency (1-1000)
  v, vol <pct>     set volume (0-100)
  seek <seconds>   jump to position
  status           print the current status
  h, help          show this help
  q, quit          exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    TogglePause,
    Stop,
    Frequency(i64),
    Volume(u8),
    Seek(Duration),
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Ok(Command::TogglePause);
        };
        let arg = parts.next();

        let command = match word.to_lowercase().as_str() {
            "p" | "play" => Command::Play,
            "pause" => Command::Pause,
            "s" | "stop" => Command::Stop,
            "f" | "freq" | "frequency" => {
                let hz = required(arg, "frequency")?
                    .parse::<i64>()
                    .map_err(|e| format!("Invalid frequency: {}", e))?;
                Command::Frequency(hz)
            }
            "v" | "vol" | "volume" => {
                let percent = required(arg, "volume")?
                    .trim_end_matches('%')
                    .parse::<u8>()
                    .map_err(|e| format!("Invalid volume: {}", e))?;
                Command::Volume(percent)
            }
            "seek" => {
                let seconds = required(arg, "position")?
                    .parse::<f64>()
                    .map_err(|e| format!("Invalid position: {}", e))?;
                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(format!("Invalid position: {}", seconds));
                }
                Command::Seek(Duration::from_secs_f64(seconds))
            }
            "status" => Command::Status,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command '{}' (try 'help')", other)),
        };
        Ok(command)
    }
}

fn required<'a>(arg: Option<&'a str>, what: &str) -> Result<&'a str, String> {
    arg.ok_or_else(|| format!("Missing {}", what))
}
