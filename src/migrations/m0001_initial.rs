use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0001_initial_schema")
        // congresses - must come first for FK references
        .operation(
            CreateTable::new("congresses")
                .add_field(Field::new("number", FieldType::Integer).primary_key()),
        )
        // documents
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    committee TEXT NOT NULL,
    subcommittee TEXT,
    congress INTEGER NOT NULL,
    chairperson TEXT,
    complete INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (congress) REFERENCES congresses(number),
    FOREIGN KEY (chairperson) REFERENCES participants(id)
)"#,
        ))
        // legislators - one row per person per session
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS legislators (
    bioguide TEXT NOT NULL,
    congress INTEGER NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    gender TEXT NOT NULL,
    state TEXT NOT NULL,
    party TEXT NOT NULL CHECK (party IN ('D', 'I', 'R')),
    PRIMARY KEY (bioguide, congress),
    FOREIGN KEY (congress) REFERENCES congresses(number)
)"#,
        ))
        // participants
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS participants (
    id TEXT PRIMARY KEY NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    title TEXT,
    state TEXT,
    role TEXT NOT NULL CHECK (role IN ('legislator', 'witness')),
    bioguide TEXT
)"#,
        ))
        // participants_documents
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS participants_documents (
    participant TEXT NOT NULL,
    document TEXT NOT NULL,
    PRIMARY KEY (participant, document),
    FOREIGN KEY (participant) REFERENCES participants(id),
    FOREIGN KEY (document) REFERENCES documents(id) ON DELETE CASCADE
)"#,
        ))
        // entries
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document TEXT NOT NULL,
    date TEXT NOT NULL,
    participant TEXT,
    content TEXT NOT NULL,
    FOREIGN KEY (document) REFERENCES documents(id) ON DELETE CASCADE,
    FOREIGN KEY (participant) REFERENCES participants(id)
)"#,
        ))
        // files - acquisition records, path is NULL until fetched
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS files (
    id TEXT NOT NULL,
    format TEXT NOT NULL CHECK (format IN ('txt', 'pdf', 'xml')),
    congress INTEGER NOT NULL,
    path TEXT,
    PRIMARY KEY (id, format),
    FOREIGN KEY (congress) REFERENCES congresses(number)
)"#,
        ))
}
