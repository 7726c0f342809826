//! What the shell expects from a game-rule engine.
//!
//! The orchestrator never calls these. The scene that hosts the board uses
//! them to decide when to ask for a transition (to a game-over scene, say)
//! and which sound to play after a move.

use std::time::Duration;

use crate::audio::SoundEffect;
use crate::scene::{SceneId, ShowRequest};

pub trait RuleEngine {
    type Position;
    type Move;
    type Player;

    fn legal_moves(&self, position: &Self::Position) -> Vec<Self::Move>;

    fn apply_move(&mut self, mv: Self::Move);

    fn is_game_over(&self) -> bool;

    fn is_in_check(&self, player: Self::Player) -> bool;
}

/// Request a fade from the game scene to `game_over` once the engine says the game ended.
pub fn game_over_request<E: RuleEngine>(
    engine: &E,
    game: SceneId,
    game_over: SceneId,
    duration: Duration,
) -> Option<ShowRequest> {
    engine
        .is_game_over()
        .then(|| ShowRequest::new(game_over).from(game).duration(duration))
}

/// The check chime takes precedence over the regular move sound.
pub fn move_effect<E: RuleEngine>(engine: &E, opponent: E::Player, base: SoundEffect) -> SoundEffect {
    if engine.is_in_check(opponent) {
        SoundEffect::Check
    } else {
        base
    }
}
