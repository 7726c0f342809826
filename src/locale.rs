//! Process-wide "language changed" broadcast and localized scene titles.
//!
//! Scenes subscribe independently of the transition orchestrator; the usual
//! way to switch language is from a midpoint callback so the new strings
//! appear while the veil is fully opaque.

use std::cell::RefCell;
use std::rc::Rc;

use crate::scene::SceneId;

/// Supported UI languages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    English,
    Chinese,
    Russian,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Chinese, Language::Russian];

    /// The language the menu's language button cycles to.
    pub fn next(self) -> Language {
        match self {
            Language::English => Language::Chinese,
            Language::Chinese => Language::Russian,
            Language::Russian => Language::English,
        }
    }
}

/// Window title for a scene, or `None` for scenes without a translation.
pub fn scene_title(scene: &SceneId, language: Language) -> Option<&'static str> {
    let title = match scene.as_str() {
        "MainMenu" | "Game" => match language {
            Language::English => "CHESS",
            Language::Chinese => "国际象棋",
            Language::Russian => "ШАХМАТЫ",
        },
        "Language" => match language {
            Language::English => "LANGUAGE",
            Language::Chinese => "语言",
            Language::Russian => "ЯЗЫК",
        },
        _ => return None,
    };
    Some(title)
}

/// Token returned by [`LanguageNotifier::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Handler = Rc<dyn Fn(Language)>;

#[derive(Default)]
struct NotifierState {
    current: Language,
    handlers: Vec<(Subscription, Handler)>,
    next_id: u64,
}

/// Current language plus its subscribers. Clones share state.
#[derive(Clone, Default)]
pub struct LanguageNotifier {
    state: Rc<RefCell<NotifierState>>,
}

impl LanguageNotifier {
    pub fn new(initial: Language) -> Self {
        Self {
            state: Rc::new(RefCell::new(NotifierState {
                current: initial,
                ..Default::default()
            })),
        }
    }

    pub fn current(&self) -> Language {
        self.state.borrow().current
    }

    /// Register `handler` to run after every language change.
    pub fn subscribe(&self, handler: impl Fn(Language) + 'static) -> Subscription {
        let mut state = self.state.borrow_mut();
        let subscription = Subscription(state.next_id);
        state.next_id += 1;
        state.handlers.push((subscription, Rc::new(handler)));
        subscription
    }

    /// Remove a handler. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.handlers.len();
        state.handlers.retain(|(id, _)| *id != subscription);
        state.handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    /// Switch language and notify subscribers. Setting the current language is a no-op.
    ///
    /// Returns whether the language changed.
    pub fn set_language(&self, language: Language) -> bool {
        let handlers: Vec<Handler> = {
            let mut state = self.state.borrow_mut();
            if state.current == language {
                return false;
            }
            state.current = language;
            state.handlers.iter().map(|(_, h)| Rc::clone(h)).collect()
        };

        tracing::info!(?language, subscribers = handlers.len(), "language changed");
        // Handlers may subscribe or unsubscribe; the state is not borrowed here.
        for handler in handlers {
            handler(language);
        }
        true
    }
}

impl std::fmt::Debug for LanguageNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("LanguageNotifier")
            .field("current", &state.current)
            .field("subscribers", &state.handlers.len())
            .finish()
    }
}
