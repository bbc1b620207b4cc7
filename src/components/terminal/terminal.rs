//! Terminal view component.
//!
//! Read-only view of streamed process output. Each view registers its own
//! sink with the output fan-out while mounted.

use std::rc::Rc;

use leptos::prelude::*;

use crate::app::AppContext;
use crate::config::MAX_TERMINAL_LINES;
use crate::core::TerminalSink;
use crate::models::TerminalBuffer;

stylance::import_crate_style!(css, "src/components/terminal/terminal.module.css");

/// Sink writing into a view's scrollback signal.
struct ViewSink {
    buffer: RwSignal<TerminalBuffer>,
}

impl TerminalSink for ViewSink {
    fn write(&self, text: &str) {
        self.buffer.try_update(|b| b.write(text));
    }
}

#[component]
pub fn TerminalView() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");

    let buffer = RwSignal::new(TerminalBuffer::new(MAX_TERMINAL_LINES));
    let fanout = ctx.fanout();
    let sink: Rc<dyn TerminalSink> = Rc::new(ViewSink { buffer });
    let token = fanout.subscribe(&sink);

    // The fan-out only holds the sink weakly; keep it alive with the view.
    let registration = StoredValue::new_local((fanout, sink));
    on_cleanup(move || {
        registration.try_with_value(|(fanout, _)| fanout.unsubscribe(token));
    });

    // Auto-scroll to the newest line.
    let output_ref = NodeRef::<leptos::html::Div>::new();
    Effect::new(move || {
        buffer.track();
        if let Some(el) = output_ref.get() {
            el.set_scroll_top(el.scroll_height());
        }
    });

    view! {
        <div node_ref=output_ref class=css::output>
            <For
                each=move || buffer.with(|b| b.lines())
                key=|line| (line.id, line.text.clone())
                children=|line| view! { <div class=css::line>{line.text}</div> }
            />
        </div>
    }
}
