// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

// ---------------------------------------------------------------------------
// Formatting boundaries
// ---------------------------------------------------------------------------

/// Maximum nesting depth when recursively formatting blocks to markdown.
///
/// Children below this depth are dropped with a warning; the render itself
/// still succeeds.
pub const BLOCK_MAX_RENDER_DEPTH: usize = 100;

/// Number of spaces per indentation level in formatted output.
pub const INDENT_SPACES: usize = 2;

/// Shortest fence used around code blocks.
pub const CODE_FENCE_MIN_BACKTICKS: usize = 3;

/// Icon shown in front of a callout when the block carries none.
pub const CALLOUT_DEFAULT_ICON: &str = "💡";

// ---------------------------------------------------------------------------
// Titles and URLs
// ---------------------------------------------------------------------------

/// Title used when nothing in the property bag yields visible text.
pub const UNTITLED_PLACEHOLDER: &str = "Untitled";

/// Heading text for a child page block with an empty title.
pub const UNTITLED_CHILD_PAGE: &str = "Untitled Page";

/// Heading text for a child database block with an empty title.
pub const UNTITLED_CHILD_DATABASE: &str = "Untitled Database";

/// Prefix for synthesized entity URLs.
pub const NOTION_PAGE_BASE_URL: &str = "https://www.notion.so/";

// ---------------------------------------------------------------------------
// Notification boundaries
// ---------------------------------------------------------------------------

/// How many container envelopes a notification may nest before it is
/// rejected.
pub const NOTIFICATION_MAX_NESTING: usize = 8;

/// Subject kind assumed when an event does not name one.
pub const DEFAULT_SUBJECT_KIND: &str = "page";

// ---------------------------------------------------------------------------
// String capacity hints (performance, not correctness)
// ---------------------------------------------------------------------------

/// Estimated characters per block, used to pre-allocate output strings.
pub const CHARS_PER_BLOCK_ESTIMATE: usize = 64;
