//! JSON import/export module for flashcard sets.
//! An exported set carries its name, tags and cards; review statistics stay in the database.

use crate::database::Store;
use crate::error::{ExportError, StoreError};
use crate::models::{NewCard, SetDraft};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Exports a stored set to a JSON file at the specified path.
pub fn export_set_to_path(store: &Store, set_name: &str, path: &Path) -> Result<(), ExportError> {
    let set = store
        .find_set(set_name)?
        .ok_or_else(|| StoreError::SetNotFound(set_name.to_string()))?;
    let cards = store
        .cards_in_set(set_name)?
        .into_iter()
        .map(|card| NewCard {
            word: card.word,
            definition: card.definition,
            example: card.example,
        })
        .collect();

    let draft = SetDraft {
        name: set.name,
        tags: set.tags,
        cards,
    };
    write_draft(&draft, path)?;

    tracing::info!(set = set_name, path = %path.display(), "set exported");
    Ok(())
}

/// Writes a draft as pretty-printed JSON.
pub fn write_draft(draft: &SetDraft, path: &Path) -> Result<(), ExportError> {
    let json_string = serde_json::to_string_pretty(draft)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}

/// Reads a set from a JSON file.
/// The result still has to go through `Store::create_set`, which validates it.
pub fn import_set_from_path(path: &Path) -> Result<SetDraft, ExportError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let draft: SetDraft = serde_json::from_str(&contents)?;

    tracing::info!(set = %draft.name, path = %path.display(), "set imported");
    Ok(draft)
}
