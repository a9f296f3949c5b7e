use serde::Deserialize;

fn default_title_prefix() -> String {
    String::from(" ")
}

fn default_playing() -> String {
    String::from("\u{f04b} ")
}

fn default_paused() -> String {
    String::from("\u{f04c} ")
}

fn default_nothing_playing() -> String {
    String::from("\u{f075b} Nothing playing")
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Glyphs {
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,
    #[serde(default = "default_playing")]
    pub playing: String,
    #[serde(default = "default_paused")]
    pub paused: String,
    #[serde(default = "default_nothing_playing")]
    pub nothing_playing: String,
}

impl Default for Glyphs {
    fn default() -> Self {
        Self {
            title_prefix: default_title_prefix(),
            playing: default_playing(),
            paused: default_paused(),
            nothing_playing: default_nothing_playing(),
        }
    }
}

/// A line of `playerctl status`. Anything unknown, `Stopped` included, gets no glyph.
#[derive(Debug, PartialEq, Eq)]
pub enum Status<'a> {
    Playing,
    Paused,
    Other(&'a str),
}

impl<'a> Status<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            "Playing" => Status::Playing,
            "Paused" => Status::Paused,
            other => Status::Other(other),
        }
    }
}

/// Text for a line streamed by `metadata --follow`; an empty line clears the module.
pub fn title_text(line: &str, glyphs: &Glyphs) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{}{line}", glyphs.title_prefix)
    }
}

pub fn status_text(status: &Status<'_>, title: &str, glyphs: &Glyphs) -> String {
    let title = title.trim();
    if title.is_empty() {
        return glyphs.nothing_playing.clone();
    }

    let glyph = match status {
        Status::Playing => glyphs.playing.as_str(),
        Status::Paused => glyphs.paused.as_str(),
        Status::Other(_) => "",
    };
    format!("{glyph}{title}")
}
