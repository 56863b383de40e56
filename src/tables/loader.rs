//! JSON table-document loader
//!
//! The host application ships rate tables as nested key-value JSON documents.
//! String keys (amount rows, installment counts, tranche and age-band names)
//! are validated and parsed into typed maps here, at load time, so a
//! malformed document is a load error instead of a silent miss during a
//! calculation.
//!
//! Document names under the table directory:
//! - `desgravamen.json`               bank desgravamen rates
//! - `desgravamen_preferencial.json`  the four preferential desgravamen rates
//! - `cesantia.json`                  bank cesantía tranche rates
//! - `cesantia_preferencial.json`     preferential cesantía tranche rates

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use super::cesantia::{
    PreferentialUnemploymentTable, Tranche, TrancheBand, UnemploymentTable,
};
use super::desgravamen::{AgeBand, DesgravamenTable, PreferentialDesgravamenRates};

/// Errors raised while loading rate-table documents
#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("failed to read table document {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed table document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid age band key '{key}' for {institution}")]
    BadAgeBandKey { institution: String, key: String },

    #[error("invalid amount key '{key}' for {institution}")]
    BadAmountKey { institution: String, key: String },

    #[error("invalid installment-count key '{key}' for {institution}")]
    BadInstallmentKey { institution: String, key: String },

    #[error("invalid tranche key '{key}' in {context}")]
    BadTrancheKey { context: String, key: String },

    #[error("preferential cesantía table is missing {tranche}")]
    MissingTranche { tranche: &'static str },

    #[error("non-finite or negative rate {rate} in {context}")]
    BadRate { context: String, rate: f64 },
}

fn check_rate(rate: f64, context: impl FnOnce() -> String) -> Result<f64, TableLoadError> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(TableLoadError::BadRate {
            context: context(),
            rate,
        });
    }
    Ok(rate)
}

/// Raw shape of `desgravamen.json`:
/// institution -> age band -> amount -> installment count -> rate
type RawDesgravamen = HashMap<String, HashMap<String, HashMap<String, HashMap<String, f64>>>>;

/// Parse the bank desgravamen document
pub fn parse_desgravamen(json: &str) -> Result<DesgravamenTable, TableLoadError> {
    let raw: RawDesgravamen = serde_json::from_str(json)?;
    let mut table = DesgravamenTable::new();

    for (institution, bands) in raw {
        for (band_key, rows) in bands {
            let band = AgeBand::from_key(&band_key).ok_or_else(|| {
                TableLoadError::BadAgeBandKey {
                    institution: institution.clone(),
                    key: band_key.clone(),
                }
            })?;

            for (amount_key, rates) in rows {
                let amount: u64 =
                    amount_key
                        .parse()
                        .map_err(|_| TableLoadError::BadAmountKey {
                            institution: institution.clone(),
                            key: amount_key.clone(),
                        })?;

                for (count_key, rate) in rates {
                    let installments: u32 =
                        count_key
                            .parse()
                            .map_err(|_| TableLoadError::BadInstallmentKey {
                                institution: institution.clone(),
                                key: count_key.clone(),
                            })?;
                    let rate = check_rate(rate, || {
                        format!("{institution}/{band_key}/{amount_key}/{count_key}")
                    })?;
                    table.insert_rate(&institution, band, amount, installments, rate);
                }
            }
        }
    }

    Ok(table)
}

/// Raw shape of `desgravamen_preferencial.json`
#[derive(Debug, Deserialize)]
struct RawPreferentialDesgravamen {
    hasta_20m_hasta_55: f64,
    hasta_20m_mayor_55: f64,
    sobre_20m_hasta_55: f64,
    sobre_20m_mayor_55: f64,
}

/// Parse the preferential desgravamen document
pub fn parse_desgravamen_preferential(
    json: &str,
) -> Result<PreferentialDesgravamenRates, TableLoadError> {
    let raw: RawPreferentialDesgravamen = serde_json::from_str(json)?;
    let context = "desgravamen_preferencial";

    Ok(PreferentialDesgravamenRates {
        up_to_20m_up_to_55: check_rate(raw.hasta_20m_hasta_55, || context.to_string())?,
        up_to_20m_over_55: check_rate(raw.hasta_20m_mayor_55, || context.to_string())?,
        over_20m_up_to_55: check_rate(raw.sobre_20m_hasta_55, || context.to_string())?,
        over_20m_over_55: check_rate(raw.sobre_20m_mayor_55, || context.to_string())?,
    })
}

/// Raw shape of `cesantia.json`: institution -> tranche -> band
type RawCesantia = HashMap<String, HashMap<String, TrancheBand>>;

/// Parse the bank cesantía document
pub fn parse_cesantia(json: &str) -> Result<UnemploymentTable, TableLoadError> {
    let raw: RawCesantia = serde_json::from_str(json)?;
    let mut table = UnemploymentTable::new();

    for (institution, tranches) in raw {
        for (tranche_key, band) in tranches {
            let tranche =
                Tranche::from_key(&tranche_key).ok_or_else(|| TableLoadError::BadTrancheKey {
                    context: institution.clone(),
                    key: tranche_key.clone(),
                })?;
            check_rate(band.monthly_rate, || format!("{institution}/{tranche_key}"))?;
            table.insert_band(&institution, tranche, band);
        }
    }

    Ok(table)
}

/// Parse the preferential cesantía document.
///
/// The preferential table must be complete: a missing tranche is a load
/// error, never a runtime fallback.
pub fn parse_cesantia_preferential(
    json: &str,
) -> Result<PreferentialUnemploymentTable, TableLoadError> {
    let raw: HashMap<String, TrancheBand> = serde_json::from_str(json)?;

    let mut rates = [0.0f64; 5];
    for (i, tranche) in Tranche::ALL.iter().enumerate() {
        let band = raw
            .get(tranche.as_str())
            .ok_or(TableLoadError::MissingTranche {
                tranche: tranche.as_str(),
            })?;
        rates[i] = check_rate(band.monthly_rate, || {
            format!("cesantia_preferencial/{}", tranche.as_str())
        })?;
    }

    for key in raw.keys() {
        if Tranche::from_key(key).is_none() {
            return Err(TableLoadError::BadTrancheKey {
                context: "cesantia_preferencial".to_string(),
                key: key.clone(),
            });
        }
    }

    Ok(PreferentialUnemploymentTable::new(rates))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_desgravamen_document() {
        let json = r#"{
            "BANCO CHILE": {
                "hasta_55": { "4000000": { "24": 0.01008, "36": 0.01512 } },
                "mayor_55": { "4000000": { "24": 0.0192 } }
            }
        }"#;

        let table = parse_desgravamen(json).unwrap();
        let quote = table.bank_rate("BANCO CHILE", 40, 4_000_000.0, 24).unwrap();
        assert_eq!(quote.rate, 0.01008);

        let quote = table.bank_rate("BANCO CHILE", 60, 4_000_000.0, 24).unwrap();
        assert_eq!(quote.rate, 0.0192);
    }

    #[test]
    fn test_bad_amount_key_is_rejected() {
        let json = r#"{ "BANCO CHILE": { "hasta_55": { "cuatro": { "24": 0.01 } } } }"#;
        let err = parse_desgravamen(json).unwrap_err();
        assert!(matches!(err, TableLoadError::BadAmountKey { .. }));
    }

    #[test]
    fn test_bad_age_band_key_is_rejected() {
        let json = r#"{ "BANCO CHILE": { "hasta_60": { "4000000": { "24": 0.01 } } } }"#;
        let err = parse_desgravamen(json).unwrap_err();
        assert!(matches!(err, TableLoadError::BadAgeBandKey { .. }));
    }

    #[test]
    fn test_negative_rate_is_rejected() {
        let json = r#"{ "BANCO CHILE": { "hasta_55": { "4000000": { "24": -0.01 } } } }"#;
        let err = parse_desgravamen(json).unwrap_err();
        assert!(matches!(err, TableLoadError::BadRate { .. }));
    }

    #[test]
    fn test_parse_cesantia_document() {
        let json = r#"{
            "BANCO CHILE": {
                "tramo_1": { "lowerBound": 500000, "upperBound": 1000000, "monthlyRate": 0.0012 },
                "tramo_5": { "lowerBound": 7000001, "upperBound": null, "monthlyRate": 0.00072 }
            }
        }"#;

        let table = parse_cesantia(json).unwrap();
        assert_eq!(table.monthly_rate("BANCO CHILE", Tranche::Tramo1), Some(0.0012));
        assert_eq!(table.monthly_rate("BANCO CHILE", Tranche::Tramo5), Some(0.00072));
        assert_eq!(table.monthly_rate("BANCO CHILE", Tranche::Tramo2), None);
    }

    #[test]
    fn test_incomplete_preferential_cesantia_is_rejected() {
        let json = r#"{
            "tramo_1": { "lowerBound": 500000, "upperBound": 1000000, "monthlyRate": 0.00058 }
        }"#;
        let err = parse_cesantia_preferential(json).unwrap_err();
        assert!(matches!(err, TableLoadError::MissingTranche { .. }));
    }

    #[test]
    fn test_parse_preferential_desgravamen() {
        let json = r#"{
            "hasta_20m_hasta_55": 0.00019,
            "hasta_20m_mayor_55": 0.00036,
            "sobre_20m_hasta_55": 0.00016,
            "sobre_20m_mayor_55": 0.00031
        }"#;

        let rates = parse_desgravamen_preferential(json).unwrap();
        assert_eq!(rates.monthly_rate(4_500_000.0, 34), 0.00019);
        assert_eq!(rates.monthly_rate(25_000_000.0, 61), 0.00031);
    }
}
