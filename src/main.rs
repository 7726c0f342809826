//! Demo shell: three coloured scene windows switched from the keyboard.
//!
//! - Menu: `Enter` starts a game (instant), `L` opens the language picker (faded).
//! - Language: `1`/`2`/`3` pick English, Chinese, or Russian and fade back to the menu.
//!   The language switches while the veil is opaque.
//! - Game: `Esc` returns to the menu (direct swap).
//! - Anywhere: `Q` quits.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chess_shell::scene::{SceneId, ShowRequest};
use chess_shell::{
    AudioSink, KeyCode, Language, LanguageNotifier, LogAudio, Shell, ShellConfig, ShellError,
    run_with_config, scene_title,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), ShellError> {
    let config = ShellConfig::new().title("Chess");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    run_with_config(config, |shell| {
        let language = LanguageNotifier::new(Language::English);
        let audio = Rc::new(RefCell::new(LogAudio::new()));

        if let Some(menu) = shell.registry_mut().scene_builder(&SceneId::MAIN_MENU) {
            let audio = Rc::clone(&audio);
            menu.on_shown(move || audio.borrow_mut().play_loop());
        }

        let titled: Vec<_> = shell
            .registry()
            .ids()
            .filter_map(|id| shell.window(id).map(|window| (id.clone(), window)))
            .collect();
        let retitle = move |lang: Language| {
            for (id, window) in &titled {
                if let Some(title) = scene_title(id, lang) {
                    window.set_title(title);
                }
            }
        };
        retitle(language.current());
        language.subscribe(retitle);

        if let Err(err) = shell.show(ShowRequest::new(SceneId::MAIN_MENU)) {
            tracing::error!(%err, "failed to show the main menu");
            shell.exit();
        }

        move |shell: &mut Shell, key: KeyCode| {
            if key == KeyCode::KeyQ {
                shell.exit();
                return;
            }

            let request = match (shell.front().cloned(), key) {
                (Some(front), KeyCode::Enter) if front == SceneId::MAIN_MENU => {
                    audio.borrow_mut().stop();
                    ShowRequest::new(SceneId::GAME).from(front).duration(Duration::ZERO)
                }
                (Some(front), KeyCode::KeyL) if front == SceneId::MAIN_MENU => {
                    ShowRequest::new(SceneId::LANGUAGE)
                        .from(front)
                        .duration(shell.transition_duration())
                }
                (Some(front), KeyCode::Digit1 | KeyCode::Digit2 | KeyCode::Digit3)
                    if front == SceneId::LANGUAGE =>
                {
                    let picked = match key {
                        KeyCode::Digit1 => Language::English,
                        KeyCode::Digit2 => Language::Chinese,
                        _ => Language::Russian,
                    };
                    let language = language.clone();
                    ShowRequest::new(SceneId::MAIN_MENU)
                        .from(front)
                        .duration(shell.transition_duration())
                        .on_midpoint(move || {
                            language.set_language(picked);
                            Ok(())
                        })
                }
                (Some(front), KeyCode::Escape) if front == SceneId::GAME => {
                    ShowRequest::new(SceneId::MAIN_MENU).from(front)
                }
                _ => return,
            };

            if let Err(err) = shell.show(request) {
                tracing::warn!(%err, "transition refused");
            }
        }
    })
}
