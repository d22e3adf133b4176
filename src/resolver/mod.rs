//! # Resolver Module
//!
//! Maps a rewritten path to `(controller, action, args)`.
//!
//! 1. The path is normalized: query string and fragment are dropped, empty
//!    segments removed, so `/foo//bar/` equals `/foo/bar`.
//! 2. The longest mount path that is a segment-wise prefix selects a controller.
//! 3. Leftover segments are tried as action names longest first, joined with
//!    `__` (`/foo/bar/baz` tries `bar__baz`, then `bar`), then the default action.
//!    A candidate must be declared, not excluded, and accept the remaining
//!    segments as arguments.
//! 4. If the controller cannot resolve the suffix, shorter mount prefixes are tried.
//!
//! Only prefix lengths some mount actually has are tried, and nested action
//! candidates never span more segments than the controller's longest action
//! name, so resolution stays linear in the path length.
//!
//! Each controller memoizes suffix resolutions, misses included. Suffixes
//! longer than [`MAX_CACHED_SUFFIX_LEN`](crate::controller::MAX_CACHED_SUFFIX_LEN)
//! bytes are resolved but not cached.

mod core;

pub use core::{normalize, normalize_mount, Resolved, Resolver};
