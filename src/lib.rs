//! Wikiticker: Wikipedia recent-changes feed decoder
//!
//! Each edit on a Wikipedia wiki is announced on an IRC channel (`#en.wikipedia`,
//! `#fr.wikipedia`, ...) as a single colour-coded line. This crate turns those
//! lines into flat rows for a time-series store:
//!
//! 1. **Grammar** -- Match the whole line and capture page, flags, diff URL,
//!    editor, summary with optional size delta, and comment
//! 2. **Classification** -- Language from the channel, namespace from the title
//!    prefix, anonymity from the editor name, unpatrolled/new/bot from the flags
//! 3. **Enrichment** -- Locate anonymous editors through a pluggable geo lookup;
//!    failures only cost the location, never the row
//! 4. **Row** -- Timestamp, twelve fixed dimensions, and `delta`/`added`/`deleted`
//!
//! # Key Modules
//!
//! - [`grammar`] -- Compiled feed-line, channel, and anonymous-editor patterns
//! - [`decoder`] -- `EditDecoder`, the line-to-row transformation
//! - [`namespace`] -- Title prefix to namespace label table
//! - [`geo`] -- `GeoLookup` trait plus a CSV-backed network table
//! - [`models`] -- `Row`, dimension and metric names, `FeedMessage`
//! - [`stream`] -- Batch-parallel decoding of a line stream into JSON rows
//! - [`stats`] -- Thread-safe counters for a decoding run
//! - [`error`] -- Per-line format errors and geo lookup errors
//! - [`config`] -- Constants and the decoder's JSON config
//!
//! # Example Usage
//!
//! ```bash
//! # Decode a captured #en.wikipedia log, locating anonymous editors
//! wikiticker -v decode -i en.log -o rows.jsonl --config decoder.json --channel '#en.wikipedia'
//!
//! # Replay JSON-lines messages from stdin
//! wikiticker decode --input-format json < capture.jsonl
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod geo;
pub mod grammar;
pub mod models;
pub mod namespace;
pub mod stats;
pub mod stream;
