// Placeholder name for unlabeled processes and instantiations
pub const UNNAMED: &str = "unnamed";

// Comment token that opts a process into state machine extraction
pub const DEFAULT_FSM_MARKER: &str = "fsm_extract";

// Documentation comments start with this character after the comment marker
pub const DEFAULT_DOC_SYMBOL: &str = "!";

// An identifier with one of these as a `_`-separated part names a reset
pub const RESET_HINTS: &[&str] = &[
    "rst", "rstn", "nrst", "arst", "srst", "reset", "resetn", "nreset", "clr", "clear",
];

// Description tags moved into the unit's info map
pub const INFO_TAGS: &[&str] = &["author", "version", "project", "copyright", "date"];

// Description tags whose text stays in the description
pub const DESCRIPTION_TAGS: &[&str] = &["brief", "details"];

// File size limits
pub const MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024; // 10 MB
