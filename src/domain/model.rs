use crate::domain::swift_code::{CountryCode, SwiftCode};
use serde::{Deserialize, Serialize};

/// A branch embedded in its headquarter's document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub swift_code: SwiftCode,
    pub bank_name: String,
    pub address: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: CountryCode,
    pub country_name: String,
    pub is_headquarter: bool,
}

impl Branch {
    pub fn new(
        swift_code: SwiftCode,
        bank_name: impl Into<String>,
        address: impl Into<String>,
        country_iso2: CountryCode,
        country_name: impl Into<String>,
    ) -> Self {
        Self {
            swift_code,
            bank_name: bank_name.into(),
            address: address.into(),
            country_iso2,
            country_name: country_name.into(),
            is_headquarter: false,
        }
    }
}

/// One persisted document: a headquarter owning its branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headquarter {
    pub swift_code: SwiftCode,
    pub bank_name: String,
    pub address: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: CountryCode,
    pub country_name: String,
    pub is_headquarter: bool,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

impl Headquarter {
    pub fn new(
        swift_code: SwiftCode,
        bank_name: impl Into<String>,
        address: impl Into<String>,
        country_iso2: CountryCode,
        country_name: impl Into<String>,
    ) -> Self {
        Self {
            swift_code,
            bank_name: bank_name.into(),
            address: address.into(),
            country_iso2,
            country_name: country_name.into(),
            is_headquarter: true,
            branches: Vec::new(),
        }
    }

    pub fn branch(&self, swift_code: &SwiftCode) -> Option<&Branch> {
        self.branches.iter().find(|b| &b.swift_code == swift_code)
    }

    pub fn has_branch(&self, swift_code: &SwiftCode) -> bool {
        self.branch(swift_code).is_some()
    }
}

/// Either side of the hierarchy, for callers that look a code up without knowing its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankEntity {
    Headquarter(Headquarter),
    Branch(Branch),
}

impl BankEntity {
    pub fn swift_code(&self) -> &SwiftCode {
        match self {
            BankEntity::Headquarter(hq) => &hq.swift_code,
            BankEntity::Branch(b) => &b.swift_code,
        }
    }

    pub fn bank_name(&self) -> &str {
        match self {
            BankEntity::Headquarter(hq) => &hq.bank_name,
            BankEntity::Branch(b) => &b.bank_name,
        }
    }

    pub fn address(&self) -> &str {
        match self {
            BankEntity::Headquarter(hq) => &hq.address,
            BankEntity::Branch(b) => &b.address,
        }
    }

    pub fn country_iso2(&self) -> &CountryCode {
        match self {
            BankEntity::Headquarter(hq) => &hq.country_iso2,
            BankEntity::Branch(b) => &b.country_iso2,
        }
    }

    pub fn country_name(&self) -> &str {
        match self {
            BankEntity::Headquarter(hq) => &hq.country_name,
            BankEntity::Branch(b) => &b.country_name,
        }
    }

    pub fn is_headquarter(&self) -> bool {
        matches!(self, BankEntity::Headquarter(_))
    }
}

/// Unvalidated bank details as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub swift_code: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub is_headquarter: bool,
}

impl BankDetails {
    /// Names are stored upper-cased and addresses trimmed.
    pub fn normalized(mut self) -> Self {
        self.bank_name = self.bank_name.trim().to_uppercase();
        self.country_name = self.country_name.trim().to_uppercase();
        self.address = self.address.trim().to_string();
        self
    }
}

/// One row of the imported spreadsheet, columns in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    pub country_iso2: String,
    pub swift_code: String,
    pub code_type: String,
    pub name: String,
    pub address: String,
    pub town_name: String,
    pub country_name: String,
    pub time_zone: String,
}

/// A validated, normalized import row ready for the transformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub swift_code: SwiftCode,
    pub bank_name: String,
    pub address: String,
    pub country_iso2: CountryCode,
    pub country_name: String,
}

impl BankRecord {
    /// Validates the code fields, collecting every problem instead of stopping at the first.
    pub fn validate(&self) -> std::result::Result<ImportRecord, Vec<String>> {
        let mut errors = Vec::new();

        let swift_code = SwiftCode::parse(&self.swift_code)
            .map_err(|e| errors.push(format!("SwiftCode: {}", e)))
            .ok();
        let country_iso2 = CountryCode::parse(&self.country_iso2)
            .map_err(|e| errors.push(format!("CountryISO2Code: {}", e)))
            .ok();

        match (swift_code, country_iso2) {
            (Some(swift_code), Some(country_iso2)) => Ok(ImportRecord {
                swift_code,
                bank_name: self.name.trim().to_uppercase(),
                address: self.address.trim().to_string(),
                country_iso2,
                country_name: self.country_name.trim().to_uppercase(),
            }),
            _ => Err(errors),
        }
    }
}

impl ImportRecord {
    pub fn into_headquarter(self) -> Headquarter {
        Headquarter::new(
            self.swift_code.expanded(),
            self.bank_name,
            self.address,
            self.country_iso2,
            self.country_name,
        )
    }

    pub fn into_branch(self) -> Branch {
        Branch::new(
            self.swift_code,
            self.bank_name,
            self.address,
            self.country_iso2,
            self.country_name,
        )
    }
}
