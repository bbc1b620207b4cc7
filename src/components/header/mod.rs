//! Workbench header: title, import and reset actions, status badge.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::components::status::StatusBadge;
use crate::config::{APP_NAME, SUPPORTED_EXTENSIONS};
use crate::models::BringUpState;
use crate::utils::dom;

stylance::import_crate_style!(css, "src/components/header/header.module.css");

/// File picker restricted to the supported archive formats.
#[component]
pub fn ImportButton() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");
    let disabled = Signal::derive(move || ctx.status.with(|s| *s != BringUpState::Idle));
    let accept = SUPPORTED_EXTENSIONS.join(",");

    let on_change = move |ev: leptos::ev::Event| {
        if let Some(file) = dom::take_selected_file(&ev) {
            ctx.import(file);
        }
    };

    view! {
        <label
            class=move || {
                if disabled.get() {
                    format!("{} {}", css::button, css::disabled)
                } else {
                    css::button.to_string()
                }
            }
            title="Import a project archive"
        >
            <Icon icon=ic::UPLOAD />
            <span class=css::buttonText>"Import project"</span>
            <input
                class=css::fileInput
                type="file"
                accept=accept
                disabled=disabled
                on:change=on_change
            />
        </label>
    }
}

#[component]
pub fn Header() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");
    let idle = Signal::derive(move || ctx.status.with(|s| *s == BringUpState::Idle));

    view! {
        <header class=css::bar>
            <span class=css::title>{APP_NAME}</span>
            <div class=css::actions>
                <ImportButton />
                <button
                    class=css::button
                    disabled=idle
                    title="Stop processes and return to idle"
                    on:click=move |_| ctx.reset()
                >
                    <Icon icon=ic::RESET />
                    <span class=css::buttonText>"Reset"</span>
                </button>
                <StatusBadge />
            </div>
        </header>
    }
}
