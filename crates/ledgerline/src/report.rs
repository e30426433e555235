//! Report payload types.

use crate::lookup::Lookup;
use ledgerline_data::FactMapping;
use serde::Serialize;
use serde_json::Value;

/// A company name resolved to its registry id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyIdentity {
    /// Name as requested
    pub name: String,
    /// Registry id of the best search match
    pub company_id: String,
}

/// Everything known about one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyReport {
    /// Inline-XBRL facts from the latest accounts filing
    pub financial_data: Lookup<FactMapping>,
    /// Registry id
    pub company_id: String,
    /// Name as requested
    pub company_name: String,
    /// Registry profile, passed through
    pub company_profile: Lookup<Value>,
    /// Officer list, passed through
    pub officers: Lookup<Value>,
    /// Persons with significant control, passed through
    pub psc: Lookup<Value>,
}

impl CompanyReport {
    /// The company this report describes.
    pub fn identity(&self) -> CompanyIdentity {
        CompanyIdentity {
            name: self.company_name.clone(),
            company_id: self.company_id.clone(),
        }
    }

    /// Wire names of the fields that could not be filled.
    pub fn degraded_fields(&self) -> Vec<&'static str> {
        [
            ("financialData", self.financial_data.is_found()),
            ("companyProfile", self.company_profile.is_found()),
            ("officers", self.officers.is_found()),
            ("psc", self.psc.is_found()),
        ]
        .into_iter()
        .filter(|(_, found)| !found)
        .map(|(name, _)| name)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> CompanyReport {
        let mut facts = FactMapping::new();
        facts.push("core:Equity", "FY2024", "25,000");
        CompanyReport {
            financial_data: Lookup::Found(facts),
            company_id: "01234567".into(),
            company_name: "Acme Ltd".into(),
            company_profile: Lookup::Found(json!({"company_name": "ACME LTD"})),
            officers: Lookup::Absent,
            psc: Lookup::Unavailable {
                reason: "timeout".into(),
            },
        }
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(report()).unwrap();
        assert_eq!(
            value,
            json!({
                "financialData": {"core:Equity": [["FY2024", "25,000"]]},
                "companyId": "01234567",
                "companyName": "Acme Ltd",
                "companyProfile": {"company_name": "ACME LTD"},
                "officers": {},
                "psc": {}
            })
        );
    }

    #[test]
    fn test_key_order() {
        let text = serde_json::to_string(&report()).unwrap();
        let positions: Vec<usize> = [
            "financialData",
            "companyId",
            "companyName",
            "companyProfile",
            "officers",
            "psc",
        ]
        .iter()
        .map(|key| text.find(&format!("\"{}\"", key)).unwrap())
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_degraded_fields() {
        assert_eq!(report().degraded_fields(), vec!["officers", "psc"]);
        assert_eq!(report().identity().company_id, "01234567");
    }
}
