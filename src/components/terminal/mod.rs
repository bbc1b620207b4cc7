mod panel;
mod terminal;

pub use panel::TerminalPanel;
pub use terminal::TerminalView;
