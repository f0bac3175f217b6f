mod entry;
mod row;

pub use self::entry::{BackfillField, EntryFields, EntryId, LibraryEntry, NewEntry};
pub(crate) use self::row::EntryRow;
