//! Status badge component.
//!
//! Shows the coarse bring-up state. Detailed failure messages only appear in
//! the terminals.

use leptos::prelude::*;

use crate::app::AppContext;
use crate::models::BringUpState;

stylance::import_crate_style!(css, "src/components/status/status.module.css");

fn state_class(state: &BringUpState) -> &'static str {
    match state {
        BringUpState::Idle => css::idle,
        BringUpState::Importing | BringUpState::Installing | BringUpState::Starting => css::busy,
        BringUpState::Ready => css::ready,
        BringUpState::Error(_) => css::error,
    }
}

#[component]
pub fn StatusBadge() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");
    let status = ctx.status;

    view! {
        <span
            class=move || status.with(|s| format!("{} {}", css::badge, state_class(s)))
            data-status=move || status.with(|s| s.keyword())
            role="status"
        >
            <span class=css::dot></span>
            {move || status.with(|s| s.label())}
        </span>
    }
}
