//! Embedded sample registry dataset.
//!
//! The first deployment stages run entirely off this dataset, and the live
//! data service falls back to it whenever a fetch fails.

use chrono::NaiveDate;

use crate::records::{CasaSchimb, DateAngajati, DateFinanciare, PunctSchimb};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
}

/// Sample exchange houses.
#[must_use]
pub fn case_schimb() -> Vec<CasaSchimb> {
    vec![
        CasaSchimb {
            cod: "CS123".to_string(),
            denumire: "Exchange House 1".to_string(),
            cod_fiscal: 12_345_678,
            sediu_social: "Calea Victoriei 1, București".to_string(),
            judet: "București Sectorul 1".to_string(),
            data_autorizare: date(2022, 1, 30),
            valabilitate: date(2025, 1, 30),
            data_inchidere: None,
        },
        CasaSchimb {
            cod: "CS456".to_string(),
            denumire: "Exchange House 2".to_string(),
            cod_fiscal: 23_456_789,
            sediu_social: "Strada Republicii 10, Cluj-Napoca".to_string(),
            judet: "Cluj".to_string(),
            data_autorizare: date(2021, 10, 20),
            valabilitate: date(2024, 10, 20),
            data_inchidere: None,
        },
        CasaSchimb {
            cod: "CS789".to_string(),
            denumire: "Exchange House 3".to_string(),
            cod_fiscal: 34_567_890,
            sediu_social: "Bulevardul Independenței 25, Iași".to_string(),
            judet: "Iași".to_string(),
            data_autorizare: date(2020, 5, 25),
            valabilitate: date(2023, 5, 25),
            data_inchidere: Some(date(2023, 6, 1)),
        },
    ]
}

/// Sample working points.
#[must_use]
pub fn puncte_schimb() -> Vec<PunctSchimb> {
    vec![
        PunctSchimb {
            cod_casa: "CS123".to_string(),
            cod_punct: "P001".to_string(),
            denumire_casa: "Exchange House 1".to_string(),
            adresa: "Calea Victoriei 1, București".to_string(),
            judet: "București Sectorul 1".to_string(),
            data_autorizare: date(2022, 1, 30),
            valabilitate: date(2025, 1, 30),
            data_inchidere: None,
            activ: true,
        },
        PunctSchimb {
            cod_casa: "CS123".to_string(),
            cod_punct: "P002".to_string(),
            denumire_casa: "Exchange House 1".to_string(),
            adresa: "Strada Lipscani 20, București".to_string(),
            judet: "București Sectorul 3".to_string(),
            data_autorizare: date(2022, 2, 25),
            valabilitate: date(2025, 2, 25),
            data_inchidere: None,
            activ: true,
        },
        PunctSchimb {
            cod_casa: "CS456".to_string(),
            cod_punct: "P003".to_string(),
            denumire_casa: "Exchange House 2".to_string(),
            adresa: "Strada Republicii 10, Cluj-Napoca".to_string(),
            judet: "Cluj".to_string(),
            data_autorizare: date(2021, 10, 20),
            valabilitate: date(2024, 10, 20),
            data_inchidere: None,
            activ: true,
        },
        PunctSchimb {
            cod_casa: "CS456".to_string(),
            cod_punct: "P004".to_string(),
            denumire_casa: "Exchange House 2".to_string(),
            adresa: "Strada Horea 5, Cluj-Napoca".to_string(),
            judet: "Cluj".to_string(),
            data_autorizare: date(2021, 11, 30),
            valabilitate: date(2024, 11, 30),
            data_inchidere: None,
            activ: true,
        },
        PunctSchimb {
            cod_casa: "CS789".to_string(),
            cod_punct: "P005".to_string(),
            denumire_casa: "Exchange House 3".to_string(),
            adresa: "Bulevardul Independenței 25, Iași".to_string(),
            judet: "Iași".to_string(),
            data_autorizare: date(2020, 5, 25),
            valabilitate: date(2023, 5, 25),
            data_inchidere: Some(date(2023, 6, 1)),
            activ: false,
        },
    ]
}

/// Sample financial filings for the 2022 reference year.
#[must_use]
pub fn date_financiare() -> Vec<DateFinanciare> {
    vec![
        DateFinanciare {
            an_referinta: 2022,
            cui: 12_345_678,
            denumire: "Exchange House 1".to_string(),
            are_bilant: true,
            numar_salariati: 10,
            fond_salarii: 500_000,
            profit_pierdere: 350_000,
            incasari_buget_consolidat: 120_000,
            incasari_buget_stat: 70_000,
            incasari_pensii: 30_000,
            incasari_sanatate: 15_000,
            somaj: 5_000,
        },
        DateFinanciare {
            an_referinta: 2022,
            cui: 23_456_789,
            denumire: "Exchange House 2".to_string(),
            are_bilant: true,
            numar_salariati: 15,
            fond_salarii: 750_000,
            profit_pierdere: 420_000,
            incasari_buget_consolidat: 150_000,
            incasari_buget_stat: 85_000,
            incasari_pensii: 40_000,
            incasari_sanatate: 20_000,
            somaj: 5_000,
        },
        DateFinanciare {
            an_referinta: 2022,
            cui: 34_567_890,
            denumire: "Exchange House 3".to_string(),
            are_bilant: true,
            numar_salariati: 5,
            fond_salarii: 250_000,
            profit_pierdere: -50_000,
            incasari_buget_consolidat: 30_000,
            incasari_buget_stat: 15_000,
            incasari_pensii: 10_000,
            incasari_sanatate: 4_000,
            somaj: 1_000,
        },
    ]
}

/// Sample headcount records. Empty in the minimal dataset.
#[must_use]
pub fn date_angajati() -> Vec<DateAngajati> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_counts() {
        assert_eq!(case_schimb().len(), 3);
        assert_eq!(puncte_schimb().len(), 5);
        assert_eq!(date_financiare().len(), 3);
        assert!(date_angajati().is_empty());
    }

    #[test]
    fn test_every_punct_belongs_to_a_casa() {
        let case = case_schimb();
        for punct in puncte_schimb() {
            assert!(
                case.iter().any(|c| c.cod == punct.cod_casa),
                "orphan working point {}",
                punct.cod_punct
            );
        }
    }

    #[test]
    fn test_every_filing_matches_a_fiscal_code() {
        let case = case_schimb();
        for filing in date_financiare() {
            assert!(case.iter().any(|c| c.cod_fiscal == filing.cui));
        }
    }

    #[test]
    fn test_closed_casa_has_inactive_points() {
        let closed: Vec<_> = case_schimb()
            .into_iter()
            .filter(|c| !c.is_active())
            .map(|c| c.cod)
            .collect();
        for punct in puncte_schimb() {
            if closed.contains(&punct.cod_casa) {
                assert!(!punct.activ);
            }
        }
    }
}
