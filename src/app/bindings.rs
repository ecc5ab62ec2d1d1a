//! Keyboard debug panel.
//!
//! | Key   | Action                                                    |
//! |-------|-----------------------------------------------------------|
//! | 1..=9 | Toggle the n-th pass after the scene pass                 |
//! | G     | Toggle `go_wild` on the glitch pass                       |
//!
//! All edits go through the chain setters, so they show up on the next frame.

use crate::app::input::{Input, Key};
use crate::renderer::backend::RenderBackend;
use crate::renderer::chain::PassChain;
use crate::renderer::effects::names;
use crate::renderer::uniforms::UniformValue;

/// Applies the keys pressed this frame to the chain.
pub fn apply_debug_bindings<B: RenderBackend>(chain: &mut PassChain<B>, input: &Input) {
    for key in input.keys_down() {
        match key {
            Key::Digit(n @ 1..=9) => toggle_nth(chain, usize::from(n)),
            Key::G => toggle_go_wild(chain),
            _ => {}
        }
    }
}

fn toggle_nth<B: RenderBackend>(chain: &mut PassChain<B>, n: usize) {
    let Some(name) = chain.pass_names().nth(n).map(str::to_owned) else {
        return;
    };
    match chain.toggle(&name) {
        Ok(enabled) => log::info!("{name}: {}", if enabled { "on" } else { "off" }),
        Err(e) => log::warn!("{e}"),
    }
}

fn toggle_go_wild<B: RenderBackend>(chain: &mut PassChain<B>) {
    let Some(UniformValue::Bool(current)) = chain.uniform(names::GLITCH, "go_wild").cloned() else {
        return;
    };
    if let Err(e) = chain.set_uniform(names::GLITCH, "go_wild", !current) {
        log::warn!("{e}");
    } else {
        log::info!("glitch.go_wild: {}", !current);
    }
}
