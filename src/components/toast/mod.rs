//! Toast notifications stacked in the bottom-right corner.

use leptos::prelude::*;

use crate::app::AppContext;
use crate::models::ToastLevel;

stylance::import_crate_style!(css, "src/components/toast/toast.module.css");

fn level_class(level: ToastLevel) -> &'static str {
    match level {
        ToastLevel::Success => css::success,
        ToastLevel::Error => css::error,
        ToastLevel::Info => css::info,
        ToastLevel::Warning => css::warning,
    }
}

#[component]
pub fn Toasts() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");

    view! {
        <div class=css::stack aria-live="polite">
            <For
                each=move || ctx.toasts.get()
                key=|toast| toast.id
                children=move |toast| {
                    let id = toast.id;
                    view! {
                        <div
                            class=format!("{} {}", css::toast, level_class(toast.level))
                            role="status"
                            on:click=move |_| ctx.dismiss_toast(id)
                        >
                            {toast.message}
                        </div>
                    }
                }
            />
        </div>
    }
}
