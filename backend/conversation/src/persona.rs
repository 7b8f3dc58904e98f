//! Keyword-triggered personas.
//!
//! A persona is the system instruction that decides which streaming service
//! the model recommends from and in what tone.

use std::fmt;

use tracing::debug;

use crate::store::Conversation;

const APPLE_TRIGGERS: &[&str] = &["apple", "アップル"];
const SPOTIFY_TRIGGERS: &[&str] = &["spotify", "スポティファイ"];

const APPLE_INSTRUCTION: &str = "Apple Musicからプレイリストを選んでおすすめしてください。返答は、「Apple Musicなら（プレイリストの名前）がおすすめ！」から文章を始めて、絵文字を多用しながらテンション高めに。";
const SPOTIFY_INSTRUCTION: &str = "Spotifyからプレイリストを選んでおすすめしてください。返答は、「そんなあなたには（プレイリストの名前）がおすすめ！」から文章を始めて、絵文字を多用しながらラジオDJ風に。";
const DEFAULT_INSTRUCTION: &str = "spotifyからプレイリストを選んでおすすめしてください。 返答は、「そんなあなたには（プレイリストの名前）がおすすめ！」から文章を始めて、絵文字を多用しながらラジオDJ風に。urlも送ってください。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    AppleMusic,
    Spotify,
    /// Installed by a conversation reset, before any keyword has been seen.
    Default,
}

impl Persona {
    /// Pick the persona for a message. Apple triggers win over Spotify
    /// triggers; no trigger at all falls back to Spotify.
    pub fn select(text: &str) -> Persona {
        let lowered = text.to_lowercase();
        let matches = |triggers: &[&str]| triggers.iter().any(|t| lowered.contains(t));

        if matches(APPLE_TRIGGERS) {
            Persona::AppleMusic
        } else {
            // Explicit Spotify triggers and the no-trigger case resolve alike.
            Persona::Spotify
        }
    }

    /// Whether the text names Spotify explicitly (as opposed to defaulting to it).
    pub fn mentions_spotify(text: &str) -> bool {
        let lowered = text.to_lowercase();
        SPOTIFY_TRIGGERS.iter().any(|t| lowered.contains(t))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Persona::AppleMusic => "apple_music",
            Persona::Spotify => "spotify",
            Persona::Default => "default",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Persona::AppleMusic => APPLE_INSTRUCTION,
            Persona::Spotify => SPOTIFY_INSTRUCTION,
            Persona::Default => DEFAULT_INSTRUCTION,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Select the persona for `text` and install it at the front of the conversation.
pub fn apply_persona(text: &str, conversation: &mut Conversation) -> Persona {
    let persona = Persona::select(text);
    debug!(
        persona = %persona,
        explicit = persona == Persona::AppleMusic || Persona::mentions_spotify(text),
        "Persona selected"
    );
    conversation.insert_front(persona.instruction());
    persona
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HistoryLimit;
    use tunebot_core::ChatRole;

    #[test]
    fn test_apple_triggers_in_any_case() {
        for text in ["Apple", "apple music please", "APPLE", "アップルで", "I love ApPlE"] {
            assert_eq!(Persona::select(text), Persona::AppleMusic, "text: {text}");
        }
    }

    #[test]
    fn test_spotify_triggers() {
        for text in ["Spotify", "spotifyで何か", "SPOTIFY", "スポティファイ"] {
            assert_eq!(Persona::select(text), Persona::Spotify, "text: {text}");
            assert!(Persona::mentions_spotify(text));
        }
    }

    #[test]
    fn test_no_trigger_defaults_to_spotify() {
        assert_eq!(Persona::select("元気が出る曲"), Persona::Spotify);
        assert_eq!(Persona::select(""), Persona::Spotify);
        assert!(!Persona::mentions_spotify("元気が出る曲"));
    }

    #[test]
    fn test_apple_wins_tie_break() {
        assert_eq!(
            Persona::select("Spotify or Apple Music?"),
            Persona::AppleMusic
        );
        assert_eq!(Persona::select("スポティファイとアップル"), Persona::AppleMusic);
    }

    #[test]
    fn test_apply_persona_sets_front_system_message() {
        let mut conversation = Conversation::new(HistoryLimit::unbounded());
        conversation.append(ChatRole::User, "earlier");

        let persona = apply_persona("I love Apple Music", &mut conversation);
        assert_eq!(persona, Persona::AppleMusic);

        let input = conversation.to_model_input();
        assert_eq!(input[0].role, ChatRole::System);
        assert_eq!(input[0].content, APPLE_INSTRUCTION);
        assert_eq!(input[1].content, "earlier");
    }
}
