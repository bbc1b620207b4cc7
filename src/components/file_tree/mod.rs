//! File tree panel.
//!
//! Renders the reconciled rows of the mounted project. Clicking a folder
//! toggles it, clicking a file selects it; the trash button deletes after a
//! confirmation prompt.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::config::TREE_INDENT_PX;
use crate::models::FileTreeNode;

stylance::import_crate_style!(css, "src/components/file_tree/file_tree.module.css");

#[component]
fn TreeRow(node: FileTreeNode) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");
    let is_folder = node.kind.is_folder();
    let is_root = node.full_path == "/";

    let path = node.full_path.clone();
    let collapsed = Signal::derive(move || ctx.collapsed.with(|c| c.is_collapsed(&path)));
    let path = node.full_path.clone();
    let selected = Signal::derive(move || ctx.selected.with(|s| s.as_deref() == Some(path.as_str())));

    let path = node.full_path.clone();
    let on_click = move |_| {
        if is_folder {
            ctx.toggle_folder(&path);
        } else {
            ctx.select(&path);
        }
    };

    let path = node.full_path.clone();
    let on_delete = move |ev: leptos::ev::MouseEvent| {
        ev.stop_propagation();
        ctx.delete(path.clone());
    };

    let row_class = move || {
        if selected.get() {
            format!("{} {}", css::row, css::selected)
        } else {
            css::row.to_string()
        }
    };

    view! {
        <div
            class=row_class
            style=format!("padding-left: {}px", TREE_INDENT_PX * node.depth + 4)
            on:click=on_click
            title=node.full_path.clone()
        >
            <span class=css::chevron>
                {move || match (is_folder, collapsed.get()) {
                    (false, _) => None,
                    (true, true) => Some(view! { <Icon icon=ic::CHEVRON_RIGHT /> }.into_any()),
                    (true, false) => Some(view! { <Icon icon=ic::CHEVRON_DOWN /> }.into_any()),
                }}
            </span>
            <span class=if is_folder { css::folderIcon } else { css::fileIcon }>
                {move || match (is_folder, collapsed.get()) {
                    (false, _) => view! { <Icon icon=ic::FILE /> }.into_any(),
                    (true, true) => view! { <Icon icon=ic::FOLDER /> }.into_any(),
                    (true, false) => view! { <Icon icon=ic::FOLDER_OPEN /> }.into_any(),
                }}
            </span>
            <span class=css::name>{node.name.clone()}</span>
            <Show when=move || !is_root>
                <button class=css::deleteButton title="Delete" on:click=on_delete.clone()>
                    <Icon icon=ic::TRASH />
                </button>
            </Show>
        </div>
    }
}

#[component]
pub fn FileTree() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");
    let rows = Memo::new(move |_| ctx.tree_rows());

    view! {
        <aside class=css::panel aria-label="Project files">
            <div class=css::heading>"Files"</div>
            <Show
                when=move || rows.with(|r| !r.is_empty())
                fallback=|| view! { <div class=css::empty>"Import a project to see its files"</div> }
            >
                <div class=css::rows role="tree">
                    <For
                        each=move || rows.get()
                        key=|node| (node.full_path.clone(), node.depth)
                        children=|node| view! { <TreeRow node=node /> }
                    />
                </div>
            </Show>
        </aside>
    }
}
