//! Tree manglers: passes rewriting a flat parse into its final structure.
//!
//! Each pass takes a treepath and returns one on the rewritten tree. None of them touches the
//! tree it was given.

pub mod embedded_list;
pub mod level;
pub mod list;
pub mod metadata;
pub mod separators;
pub mod tag;
pub mod tag_filter;
pub mod url;

use crate::error::ManglingError;
use crate::treepath::Treepath;

/// Passes every freshly read document goes through, in order.
pub fn mangle_novella(treepath: &Treepath) -> Result<Treepath, ManglingError> {
    let treepath = url::fix_named_urls(treepath)?;
    let treepath = embedded_list::rehierarchize_embedded_lists(&treepath)?;
    let treepath = separators::remove_separators(&treepath);
    let treepath = level::rehierarchize_levels(&treepath)?;
    Ok(tag::enhance(&treepath))
}
