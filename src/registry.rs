use std::fmt;
use std::io::Read;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OuidexError;

/// IEEE vendor-assignment registries, by shrinking block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryName {
    MaL,
    MaM,
    MaS,
    Cid,
}

impl RegistryName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryName::MaL => "MA-L",
            RegistryName::MaM => "MA-M",
            RegistryName::MaS => "MA-S",
            RegistryName::Cid => "CID",
        }
    }
}

impl fmt::Display for RegistryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RegistryName {
    type Err = OuidexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MA-L" => Ok(RegistryName::MaL),
            "MA-M" => Ok(RegistryName::MaM),
            "MA-S" => Ok(RegistryName::MaS),
            "CID" => Ok(RegistryName::Cid),
            _ => Err(OuidexError::UnknownRegistry(value.to_string())),
        }
    }
}

/// One registry row: an assignment prefix and the organization holding it.
/// The assignment is a run of uppercase hex characters whose length depends
/// on the registry scope (6 for MA-L/CID, 7 for MA-M, 9 for MA-S).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub assignment: String,
    pub registry: RegistryName,
    pub org_name: String,
    pub org_address: String,
}

impl Record {
    /// Stable composite key for callers that need deterministic ordering;
    /// trie traversal order itself is unspecified.
    pub fn sort_key(&self) -> (&str, &str, &str) {
        (&self.assignment, &self.org_name, &self.org_address)
    }
}

/// Parses the four-column registry CSV (registry, assignment, organization
/// name, organization address). The header row is discarded, fields are
/// trimmed and the assignment is uppercased. Any malformed row aborts the
/// whole file; there is no partial result.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<Record>, OuidexError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, row) in csv_reader.records().enumerate() {
        // Header is row 1, the first data row is row 2.
        let row_number = idx as u64 + 2;
        let row = row.map_err(|err| OuidexError::Parse {
            row: row_number,
            message: err.to_string(),
        })?;
        if row.len() != 4 {
            return Err(OuidexError::Parse {
                row: row_number,
                message: format!("expected 4 columns, got {}", row.len()),
            });
        }

        let registry = row[0]
            .trim()
            .parse::<RegistryName>()
            .map_err(|err| OuidexError::Parse {
                row: row_number,
                message: err.to_string(),
            })?;
        records.push(Record {
            assignment: row[1].trim().to_uppercase(),
            registry,
            org_name: row[2].trim().to_string(),
            org_address: row[3].trim().to_string(),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_registry_names() {
        assert_eq!("MA-L".parse::<RegistryName>().unwrap(), RegistryName::MaL);
        assert_eq!("CID".parse::<RegistryName>().unwrap(), RegistryName::Cid);
        assert_eq!(RegistryName::MaS.to_string(), "MA-S");

        let err = "MA-X".parse::<RegistryName>().unwrap_err();
        assert_matches!(err, OuidexError::UnknownRegistry(value) if value == "MA-X");
    }

    #[test]
    fn parse_records_from_csv() {
        let input = "\
Registry,Assignment,Organization Name,Organization Address
MA-S,8C1F64ABA,\"COOL DEVICES, INC\",32 NORTHWESTERN HH AA US 01079
MA-S,8c1b649b9,\"EVEN COOLER DEVICES, S.L.\",Av. Onze de Setembre 13 Reus Tarragona ES 49203
MA-S,8C1F6480A,ASDF Corporation,\"Address: 20F.-1, No. 8, County TW 30244 \"
";
        let records = parse_records(input.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                Record {
                    assignment: "8C1F64ABA".to_string(),
                    registry: RegistryName::MaS,
                    org_name: "COOL DEVICES, INC".to_string(),
                    org_address: "32 NORTHWESTERN HH AA US 01079".to_string(),
                },
                Record {
                    assignment: "8C1B649B9".to_string(),
                    registry: RegistryName::MaS,
                    org_name: "EVEN COOLER DEVICES, S.L.".to_string(),
                    org_address: "Av. Onze de Setembre 13 Reus Tarragona ES 49203".to_string(),
                },
                Record {
                    assignment: "8C1F6480A".to_string(),
                    registry: RegistryName::MaS,
                    org_name: "ASDF Corporation".to_string(),
                    org_address: "Address: 20F.-1, No. 8, County TW 30244".to_string(),
                },
            ]
        );
    }

    #[test]
    fn parse_records_empty_input_is_empty() {
        let input = "Registry,Assignment,Organization Name,Organization Address\n";
        assert!(parse_records(input.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn parse_records_rejects_unknown_registry() {
        let input = "\
Registry,Assignment,Organization Name,Organization Address
MA-L,AABBCC,Example Corp,Somewhere
XX-Y,DDEEFF,Other Corp,Elsewhere
";
        let err = parse_records(input.as_bytes()).unwrap_err();
        assert_matches!(err, OuidexError::Parse { row: 3, .. });
    }

    #[test]
    fn parse_records_rejects_wrong_column_count() {
        let input = "\
Registry,Assignment,Organization Name,Organization Address
MA-L,AABBCC,Example Corp
";
        let err = parse_records(input.as_bytes()).unwrap_err();
        assert_matches!(err, OuidexError::Parse { row: 2, .. });
    }
}
