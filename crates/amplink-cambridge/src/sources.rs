//! Source name <-> wire code lookup.
//!
//! A [`SourceTable`] is built once from a model's static source list and
//! never changes afterwards. Selection goes name -> select code; the
//! current-source reply goes reply code -> name.

use std::collections::HashMap;

use amplink_core::{Error, Result};

use crate::models::SourceDef;

/// Bidirectional source lookup for one amplifier model.
#[derive(Debug, Clone)]
pub struct SourceTable {
    names: Vec<&'static str>,
    select_codes: HashMap<&'static str, &'static str>,
    reply_names: HashMap<&'static str, &'static str>,
}

impl SourceTable {
    /// Build the table, rejecting duplicate names or codes so that every
    /// name has exactly one reply code mapping back to it.
    pub fn from_defs(defs: &[SourceDef]) -> Result<Self> {
        let mut names = Vec::with_capacity(defs.len());
        let mut select_codes = HashMap::with_capacity(defs.len());
        let mut reply_names = HashMap::with_capacity(defs.len());
        let mut seen_select = HashMap::with_capacity(defs.len());

        for def in defs {
            if select_codes.insert(def.name, def.select_code).is_some() {
                return Err(Error::InvalidParameter(format!(
                    "duplicate source name {:?}",
                    def.name
                )));
            }
            if seen_select.insert(def.select_code, def.name).is_some() {
                return Err(Error::InvalidParameter(format!(
                    "duplicate select code {:?}",
                    def.select_code
                )));
            }
            if reply_names.insert(def.reply_code, def.name).is_some() {
                return Err(Error::InvalidParameter(format!(
                    "duplicate reply code {:?}",
                    def.reply_code
                )));
            }
            names.push(def.name);
        }

        Ok(SourceTable {
            names,
            select_codes,
            reply_names,
        })
    }

    /// Selection command for a source name.
    pub fn select_code(&self, name: &str) -> Result<&'static str> {
        self.select_codes
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSource(name.to_string()))
    }

    /// Source name for a current-source reply, or `None` if unmapped.
    pub fn name_for_reply(&self, reply: &str) -> Option<&'static str> {
        self.reply_names.get(reply).copied()
    }

    /// Source names in display order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cxr200;

    fn table() -> SourceTable {
        SourceTable::from_defs(cxr200().sources).unwrap()
    }

    #[test]
    fn select_code_lookup() {
        assert_eq!(table().select_code("FM").unwrap(), "#3,04,11");
        assert_eq!(table().select_code("Source 1").unwrap(), "#3,04,00");
    }

    #[test]
    fn unknown_name_is_error() {
        assert!(matches!(
            table().select_code("Phono"),
            Err(Error::UnknownSource(name)) if name == "Phono"
        ));
    }

    #[test]
    fn reply_lookup() {
        assert_eq!(table().name_for_reply("#4,01,14"), Some("Bluetooth"));
        assert_eq!(table().name_for_reply("#4,01,99"), None);
        assert_eq!(table().name_for_reply(""), None);
    }

    #[test]
    fn every_name_maps_back_through_its_reply_code() {
        let table = table();
        let model = cxr200();
        for def in model.sources {
            let code = table.select_code(def.name).unwrap();
            assert_eq!(code, def.select_code);
            assert_eq!(table.name_for_reply(def.reply_code), Some(def.name));
        }
        assert_eq!(table.select_codes.len(), table.reply_names.len());
    }

    #[test]
    fn names_keep_model_order() {
        let table = table();
        assert_eq!(table.len(), 15);
        assert_eq!(table.names()[0], "Source 1");
        assert_eq!(table.names()[8], "TV ARC");
        assert_eq!(table.names()[14], "Bluetooth");
    }

    #[test]
    fn duplicate_name_rejected() {
        let defs = [
            SourceDef {
                name: "FM",
                select_code: "#3,04,11",
                reply_code: "#4,01,11",
            },
            SourceDef {
                name: "FM",
                select_code: "#3,04,12",
                reply_code: "#4,01,12",
            },
        ];
        assert!(SourceTable::from_defs(&defs).is_err());
    }

    #[test]
    fn duplicate_reply_code_rejected() {
        let defs = [
            SourceDef {
                name: "FM",
                select_code: "#3,04,11",
                reply_code: "#4,01,11",
            },
            SourceDef {
                name: "AM",
                select_code: "#3,04,12",
                reply_code: "#4,01,11",
            },
        ];
        assert!(SourceTable::from_defs(&defs).is_err());
    }

    #[test]
    fn empty_table() {
        let table = SourceTable::from_defs(&[]).unwrap();
        assert!(table.is_empty());
        assert!(table.select_code("FM").is_err());
    }
}
