use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0002_catalog_indexes")
        .depends_on(&["0001_initial_schema"])
        .operation(AddIndex::new(
            "files",
            Index::new("idx_files_congress_format")
                .column("congress")
                .column("format"),
        ))
        .operation(AddIndex::new(
            "files",
            Index::new("idx_files_with_path")
                .column("congress")
                .filter("path IS NOT NULL"),
        ))
        .operation(AddIndex::new(
            "documents",
            Index::new("idx_documents_congress_complete")
                .column("congress")
                .column("complete"),
        ))
        .operation(AddIndex::new(
            "entries",
            Index::new("idx_entries_document").column("document"),
        ))
}
