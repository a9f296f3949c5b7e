use std::{
    future::Future,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    process::{Child, ChildStdout, Command},
};

use crate::error::{Error, Result};

pub trait TitleQuery {
    /// Current title, untrimmed. May be empty when nothing is playing.
    fn current_title(&self) -> impl Future<Output = Result<String>> + Send;
}

pub struct Playerctl {
    program: PathBuf,
    player: Option<String>,
    format: String,
}

impl Playerctl {
    pub fn new(program: &Path, player: Option<&str>, format: &str) -> Self {
        Self {
            program: program.to_path_buf(),
            player: player.map(ToString::to_string),
            format: format.to_string(),
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        if let Some(player) = &self.player {
            command.arg("--player").arg(player);
        }
        command
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }

    fn follow(&self, args: &[&str]) -> Result<FollowStream<BufReader<ChildStdout>>> {
        info!("Following {} {} --follow", self.program_name(), args.join(" "));

        let mut child = self
            .command()
            .args(args)
            .arg("--follow")
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.program_name(),
                source,
            })?;
        let stdout = child.stdout.take().ok_or_else(|| Error::MissingStdout {
            program: self.program_name(),
        })?;

        Ok(FollowStream {
            reader: BufReader::new(stdout),
            child: Some(child),
        })
    }

    pub fn follow_titles(&self) -> Result<FollowStream<BufReader<ChildStdout>>> {
        self.follow(&["metadata", "--format", self.format.as_str()])
    }

    pub fn follow_status(&self) -> Result<FollowStream<BufReader<ChildStdout>>> {
        self.follow(&["status"])
    }
}

impl TitleQuery for Playerctl {
    async fn current_title(&self) -> Result<String> {
        let output = self
            .command()
            .args(["metadata", "--format", self.format.as_str()])
            .stdout(Stdio::piped())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: self.program_name(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::QueryStatus(output.status));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Lines of a follow-mode subprocess. The child, if any, is killed when the stream is dropped.
pub struct FollowStream<R> {
    reader: R,
    child: Option<Child>,
}

impl<R: AsyncBufRead + Unpin> FollowStream<R> {
    #[cfg(test)]
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            child: None,
        }
    }

    pub async fn next_line(&mut self) -> Result<Option<String>> {
        let mut line = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(Error::Read)?;
        if read == 0 {
            if let Some(child) = &mut self.child {
                debug!("Follower exited with {:?}", child.try_wait());
            }
            return Ok(None);
        }

        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn splits_lines_and_tolerates_bad_bytes() {
        let mut stream = FollowStream::from_reader(&b"Playing\r\n\nPa\xffused\nlast"[..]);
        assert_eq!(stream.next_line().await.unwrap().as_deref(), Some("Playing"));
        assert_eq!(stream.next_line().await.unwrap().as_deref(), Some(""));
        assert_eq!(
            stream.next_line().await.unwrap().as_deref(),
            Some("Pa\u{fffd}used")
        );
        assert_eq!(stream.next_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(stream.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn follow_passes_player_and_follow_flag() {
        let echo = Playerctl::new(Path::new("echo"), Some("vlc"), "{{title}}");
        let mut stream = echo.follow_status().unwrap();
        assert_eq!(
            stream.next_line().await.unwrap().as_deref(),
            Some("--player vlc status --follow")
        );
        assert_eq!(stream.next_line().await.unwrap(), None);

        let mut stream = echo.follow_titles().unwrap();
        assert_eq!(
            stream.next_line().await.unwrap().as_deref(),
            Some("--player vlc metadata --format {{title}} --follow")
        );
    }

    #[tokio::test]
    async fn point_query_has_no_follow_flag() {
        let echo = Playerctl::new(Path::new("echo"), None, "{{artist}} - {{title}}");
        assert_eq!(
            echo.current_title().await.unwrap(),
            "metadata --format {{artist}} - {{title}}\n"
        );
    }

    #[tokio::test]
    async fn failures_are_reported() {
        let missing = Playerctl::new(Path::new("/nonexistent/playerctl"), None, "{{title}}");
        assert!(matches!(missing.follow_status(), Err(Error::Spawn { .. })));
        assert!(matches!(
            missing.current_title().await,
            Err(Error::Spawn { .. })
        ));

        let failing = Playerctl::new(Path::new("false"), None, "{{title}}");
        assert!(matches!(
            failing.current_title().await,
            Err(Error::QueryStatus(_))
        ));
    }
}
