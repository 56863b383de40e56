//! Institution name normalization
//!
//! The admin console receives bank names as free text (form input, persisted
//! records from different eras of the backend). Rate tables are keyed by a
//! canonical uppercase name, so every entry point funnels through
//! [`canonical_key`] before touching a table.

/// Display-name aliases observed in the wild, mapped to table keys.
const ALIASES: &[(&str, &str)] = &[
    ("Chile", "BANCO CHILE"),
    ("Banco de Chile", "BANCO CHILE"),
    ("Edwards", "BANCO CHILE"),
    ("Santander", "BANCO SANTANDER"),
    ("Banco Santander", "BANCO SANTANDER"),
    ("BCI", "BANCO BCI"),
    ("Banco BCI", "BANCO BCI"),
    ("Estado", "BANCO ESTADO"),
    ("BancoEstado", "BANCO ESTADO"),
    ("Banco Estado", "BANCO ESTADO"),
    ("Itaú", "BANCO ITAU-CORPBANCA"),
    ("Itaú - Corpbanca", "BANCO ITAU-CORPBANCA"),
    ("Itau Corpbanca", "BANCO ITAU-CORPBANCA"),
    ("Falabella", "BANCO FALABELLA"),
    ("Banco Falabella", "BANCO FALABELLA"),
    ("Scotiabank", "SCOTIABANK"),
    ("Scotiabank Chile", "SCOTIABANK"),
    ("Ripley", "BANCO RIPLEY"),
    ("Banco Ripley", "BANCO RIPLEY"),
];

/// Resolve a display name to the canonical rate-table key.
///
/// Unknown names are not an error: the uppercased input is passed through
/// verbatim and the table lookup decides whether data exists for it.
pub fn canonical_key(display_name: &str) -> String {
    let trimmed = display_name.trim();
    for (alias, canonical) in ALIASES {
        if *alias == trimmed {
            return (*canonical).to_string();
        }
    }
    trimmed.to_uppercase()
}
