//! Typed records for the currency-exchange registry.
//!
//! These are the record shapes the data service hands to the dashboard:
//! exchange houses, their working points, and the yearly financial filings
//! attached to each fiscal code.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A licensed currency exchange house (casa de schimb valutar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasaSchimb {
    /// Registry code, e.g. `CS123`.
    pub cod: String,

    /// Registered company name.
    pub denumire: String,

    /// Fiscal identification code (CUI).
    pub cod_fiscal: u64,

    /// Registered office address.
    pub sediu_social: String,

    /// County, or Bucharest sector for the capital.
    pub judet: String,

    /// Date the exchange license was granted.
    pub data_autorizare: NaiveDate,

    /// License expiry date.
    pub valabilitate: NaiveDate,

    /// Date the house was closed, if it no longer operates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_inchidere: Option<NaiveDate>,
}

impl CasaSchimb {
    /// An exchange house is active while it has no closing date.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.data_inchidere.is_none()
    }
}

/// A working point (punct de schimb) operated by an exchange house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunctSchimb {
    /// Registry code of the owning exchange house.
    pub cod_casa: String,

    /// Working point code, e.g. `P001`.
    pub cod_punct: String,

    /// Name of the owning exchange house.
    pub denumire_casa: String,

    /// Street address of the working point.
    pub adresa: String,

    /// County, or Bucharest sector.
    pub judet: String,

    /// Date the working point was authorized.
    pub data_autorizare: NaiveDate,

    /// Authorization expiry date.
    pub valabilitate: NaiveDate,

    /// Date the working point was closed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_inchidere: Option<NaiveDate>,

    /// Whether the working point currently operates.
    pub activ: bool,
}

/// Yearly financial filing for an exchange house, keyed by fiscal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFinanciare {
    /// Reference year of the filing.
    pub an_referinta: i32,

    /// Fiscal identification code the filing belongs to.
    pub cui: u64,

    /// Company name as filed.
    pub denumire: String,

    /// Whether a balance sheet was filed for the year.
    pub are_bilant: bool,

    /// Average employee count over the year.
    pub numar_salariati: u32,

    /// Total salary fund, RON.
    pub fond_salarii: i64,

    /// Profit (positive) or loss (negative), RON.
    pub profit_pierdere: i64,

    /// Contributions to the consolidated state budget, RON.
    pub incasari_buget_consolidat: i64,

    /// Contributions to the state budget, RON.
    pub incasari_buget_stat: i64,

    /// Pension fund contributions, RON.
    pub incasari_pensii: i64,

    /// Health fund contributions, RON.
    pub incasari_sanatate: i64,

    /// Unemployment fund contributions, RON.
    pub somaj: i64,
}

impl DateFinanciare {
    /// Whether the filing reports a loss for the year.
    #[must_use]
    pub fn is_loss(&self) -> bool {
        self.profit_pierdere < 0
    }
}

/// Yearly headcount record for an exchange house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAngajati {
    /// Reference year.
    pub an_referinta: i32,

    /// Fiscal identification code.
    pub cui: u64,

    /// Employee count reported for the year.
    pub numar_angajati: u32,
}
