//! Terminal panel: one or more terminal views with add/close controls.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::components::terminal::TerminalView;
use crate::config::MAX_TERMINALS;

stylance::import_crate_style!(css, "src/components/terminal/panel.module.css");

#[component]
pub fn TerminalPanel() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");
    let terminals = ctx.terminals;
    let can_add = Signal::derive(move || terminals.with(|t| t.len() < MAX_TERMINALS));
    let can_close = Signal::derive(move || terminals.with(|t| t.len() > 1));

    view! {
        <section class=css::panel>
            <div class=css::toolbar>
                <span class=css::toolbarTitle>
                    <Icon icon=ic::TERMINAL />
                    "Terminal"
                </span>
                <button
                    class=css::iconButton
                    title="New terminal"
                    disabled=move || !can_add.get()
                    on:click=move |_| ctx.add_terminal()
                >
                    <Icon icon=ic::PLUS />
                </button>
            </div>
            <div class=css::views>
                <For
                    each=move || terminals.get()
                    key=|id| *id
                    children=move |id| {
                        view! {
                            <div class=css::view>
                                <Show when=move || can_close.get()>
                                    <button
                                        class=css::closeButton
                                        title="Close terminal"
                                        on:click=move |_| ctx.close_terminal(id)
                                    >
                                        <Icon icon=ic::CLOSE />
                                    </button>
                                </Show>
                                <TerminalView />
                            </div>
                        }
                    }
                />
            </div>
        </section>
    }
}
