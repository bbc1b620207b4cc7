//! Centralized icon definitions.
//!
//! Icon theme is configured in `config.rs` via `ICON_THEME`.
//! This module maps semantic icon names to the selected theme's icons.

use icondata::Icon;

use crate::config::IconTheme;

// =============================================================================
// Theme Imports
// =============================================================================

mod lucide {
    pub use icondata::{
        LuChevronDown as ChevronDown, LuChevronRight as ChevronRight, LuFile as File,
        LuFolder as Folder, LuFolderOpen as FolderOpen, LuPlus as Plus,
        LuRotateCcw as Reset, LuTerminal as Terminal, LuTrash2 as Trash, LuUpload as Upload,
        LuX as Close,
    };
}

mod bootstrap {
    pub use icondata::{
        BsArrowCounterclockwise as Reset, BsChevronDown as ChevronDown,
        BsChevronRight as ChevronRight, BsFileEarmark as File, BsFolder2Open as FolderOpen,
        BsFolderFill as Folder, BsPlusLg as Plus, BsTerminal as Terminal, BsTrash as Trash,
        BsUpload as Upload, BsXLg as Close,
    };
}

// =============================================================================
// Icon Constants (selected based on theme)
// =============================================================================

macro_rules! themed_icon {
    ($name:ident, $theme_name:ident) => {
        pub const $name: Icon = match crate::config::ICON_THEME {
            IconTheme::Lucide => lucide::$theme_name,
            IconTheme::Bootstrap => bootstrap::$theme_name,
        };
    };
}

themed_icon!(CHEVRON_DOWN, ChevronDown);
themed_icon!(CHEVRON_RIGHT, ChevronRight);
themed_icon!(FOLDER, Folder);
themed_icon!(FOLDER_OPEN, FolderOpen);
themed_icon!(FILE, File);
themed_icon!(PLUS, Plus);
themed_icon!(CLOSE, Close);
themed_icon!(TERMINAL, Terminal);
themed_icon!(TRASH, Trash);
themed_icon!(UPLOAD, Upload);
themed_icon!(RESET, Reset);
