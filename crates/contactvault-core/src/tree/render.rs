//! Plain-text listing of a folder subtree.
//!
//! Each folder prints its name and creation time, then its contacts, then
//! each subfolder after a blank line. Children are indented one tab deeper
//! than their folder.

use std::fmt::{self, Write};

use super::{FolderId, Tree};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render `folder` and everything below it.
///
/// An invalid handle renders as an empty string.
pub fn render(tree: &Tree, folder: FolderId) -> String {
    let mut out = String::new();
    match write_folder(tree, folder, 0, &mut out) {
        Ok(()) => out,
        Err(_) => String::new(),
    }
}

fn write_folder(tree: &Tree, folder: FolderId, depth: usize, out: &mut String) -> fmt::Result {
    let Ok(item) = tree.item(folder) else {
        return Ok(());
    };
    let indent = "\t".repeat(depth);
    writeln!(
        out,
        "{indent}{}\t(created {})",
        item.name(),
        item.created_at().format(TIMESTAMP_FORMAT)
    )?;

    for id in tree.contacts(folder) {
        let (Ok(name), Ok(contact)) = (tree.name(id), tree.contact(id)) else {
            continue;
        };
        writeln!(
            out,
            "{indent}\t-\t{}\t{name}\t{} at {}: {}",
            contact.first_name(),
            contact.relation(),
            contact.company(),
            contact.mail_address()
        )?;
    }

    for child in tree.folders(folder) {
        out.push('\n');
        write_folder(tree, child, depth + 1, out)?;
    }
    Ok(())
}
