//! Top-level layout: header bar, file tree beside the terminals, toasts.

use leptos::prelude::*;

use crate::components::file_tree::FileTree;
use crate::components::header::Header;
use crate::components::terminal::TerminalPanel;
use crate::components::toast::Toasts;

stylance::import_crate_style!(css, "src/components/workbench/workbench.module.css");

#[component]
pub fn Workbench() -> impl IntoView {
    view! {
        <div class=css::workbench>
            <Header />
            <main class=css::body>
                <FileTree />
                <TerminalPanel />
            </main>
            <Toasts />
        </div>
    }
}
