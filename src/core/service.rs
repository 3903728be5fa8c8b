use crate::core::repository::BankRepository;
use crate::domain::model::{BankDetails, BankEntity, Branch, Headquarter};
use crate::domain::ports::Deadline;
use crate::domain::swift_code::{CountryCode, SwiftCode};
use crate::utils::error::{BankError, Result};

/// Business rules in front of the repository.
///
/// Formats and the headquarter/branch classification are checked before any store call, so an
/// invalid request never reaches the store. `NotFound` and `AlreadyExists` from the repository
/// are passed through untouched.
#[derive(Clone)]
pub struct BankService {
    repo: BankRepository,
}

impl BankService {
    pub fn new(repo: BankRepository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &BankRepository {
        &self.repo
    }

    pub async fn get_headquarter(&self, swift_code: &str, deadline: Deadline) -> Result<Headquarter> {
        let code = headquarter_code(swift_code)?;
        self.repo.find_headquarter(&code, deadline).await
    }

    pub async fn get_branch(&self, swift_code: &str, deadline: Deadline) -> Result<Branch> {
        let code = branch_code(swift_code)?;
        self.repo.find_branch(&code, deadline).await
    }

    /// Looks a code up as a headquarter when it carries the `XXX` suffix, as a branch otherwise.
    pub async fn get_swift_code(&self, swift_code: &str, deadline: Deadline) -> Result<BankEntity> {
        let code = SwiftCode::parse(swift_code)?;
        if code.is_headquarter() {
            self.repo
                .find_headquarter(&code.expanded(), deadline)
                .await
                .map(BankEntity::Headquarter)
        } else {
            self.repo
                .find_branch(&code, deadline)
                .await
                .map(BankEntity::Branch)
        }
    }

    pub async fn get_banks_by_country(
        &self,
        country_iso2: &str,
        deadline: Deadline,
    ) -> Result<Vec<Headquarter>> {
        let country = CountryCode::parse(country_iso2)?;
        self.repo.find_by_country(&country, deadline).await
    }

    pub async fn add_headquarter(&self, details: BankDetails, deadline: Deadline) -> Result<Headquarter> {
        let details = details.normalized();
        let code = headquarter_code(&details.swift_code)?;
        if !details.is_headquarter {
            return Err(BankError::validation(
                "SWIFT code ends with XXX but isHeadquarter is false",
            ));
        }
        let country = validate_common(&details)?;

        let hq = Headquarter::new(
            code,
            details.bank_name,
            details.address,
            country,
            details.country_name,
        );
        self.repo.create_headquarter(&hq, deadline).await?;
        tracing::info!("🏦 Added headquarter {}", hq.swift_code);
        Ok(hq)
    }

    /// Adds a branch under the headquarter derived from its own code.
    pub async fn add_branch(&self, details: BankDetails, deadline: Deadline) -> Result<Branch> {
        let details = details.normalized();
        let code = branch_code(&details.swift_code)?;
        if details.is_headquarter {
            return Err(BankError::validation(
                "isHeadquarter is true but the SWIFT code does not end with XXX",
            ));
        }
        let country = validate_common(&details)?;

        let parent = code.parent_key();
        let branch = Branch::new(
            code,
            details.bank_name,
            details.address,
            country,
            details.country_name,
        );
        self.repo.add_branch(&parent, &branch, deadline).await?;
        tracing::info!("🏢 Added branch {} under {}", branch.swift_code, parent);
        Ok(branch)
    }

    /// Like [`Self::add_branch`], but also checks a caller-supplied parent against the derived one.
    pub async fn add_branch_under(
        &self,
        parent_swift_code: &str,
        details: BankDetails,
        deadline: Deadline,
    ) -> Result<Branch> {
        let parent = headquarter_code(parent_swift_code)?.expanded();
        let code = branch_code(&details.swift_code)?;
        if code.parent_key() != parent {
            return Err(BankError::validation(format!(
                "Branch {} does not belong to headquarter {} (expected parent {})",
                code,
                parent,
                code.parent_key()
            )));
        }
        self.add_branch(details, deadline).await
    }

    /// Dispatches on the code suffix and rejects a contradicting `isHeadquarter` flag.
    pub async fn add_swift_code(&self, details: BankDetails, deadline: Deadline) -> Result<BankEntity> {
        let code = SwiftCode::parse(&details.swift_code)?;
        CountryCode::parse(&details.country_iso2)?;

        if code.is_headquarter() {
            self.add_headquarter(details, deadline)
                .await
                .map(BankEntity::Headquarter)
        } else {
            self.add_branch(details, deadline)
                .await
                .map(BankEntity::Branch)
        }
    }

    pub async fn delete_headquarter(&self, swift_code: &str, deadline: Deadline) -> Result<()> {
        let code = headquarter_code(swift_code)?.expanded();
        self.repo.delete_headquarter(&code, deadline).await?;
        tracing::info!("🗑️ Deleted headquarter {} with its branches", code);
        Ok(())
    }

    pub async fn delete_branch(&self, swift_code: &str, deadline: Deadline) -> Result<()> {
        let code = branch_code(swift_code)?;
        self.repo.delete_branch(&code, deadline).await?;
        tracing::info!("🗑️ Deleted branch {}", code);
        Ok(())
    }

    pub async fn delete_swift_code(&self, swift_code: &str, deadline: Deadline) -> Result<BankKind> {
        let code = SwiftCode::parse(swift_code)?;
        if code.is_headquarter() {
            self.delete_headquarter(swift_code, deadline).await?;
            Ok(BankKind::Headquarter)
        } else {
            self.delete_branch(swift_code, deadline).await?;
            Ok(BankKind::Branch)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankKind {
    Headquarter,
    Branch,
}

fn headquarter_code(raw: &str) -> Result<SwiftCode> {
    let code = SwiftCode::parse(raw)?;
    if !code.is_headquarter() {
        return Err(BankError::validation(format!(
            "Headquarter SWIFT code must end with XXX: {}",
            raw
        )));
    }
    Ok(code.expanded())
}

fn branch_code(raw: &str) -> Result<SwiftCode> {
    let code = SwiftCode::parse(raw)?;
    if code.is_headquarter() {
        return Err(BankError::validation(format!(
            "Branch SWIFT code cannot end with XXX: {}",
            raw
        )));
    }
    Ok(code)
}

fn validate_common(details: &BankDetails) -> Result<CountryCode> {
    let country = CountryCode::parse(&details.country_iso2)?;
    if details.bank_name.is_empty() {
        return Err(BankError::validation("bank name is required"));
    }
    Ok(country)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(5))
    }

    fn service() -> BankService {
        BankService::new(BankRepository::new(Arc::new(MemoryStore::new())))
    }

    fn details(swift: &str, is_headquarter: bool) -> BankDetails {
        BankDetails {
            swift_code: swift.to_string(),
            bank_name: "Deutsche Bank".to_string(),
            address: " Taunusanlage 12 ".to_string(),
            country_iso2: "DE".to_string(),
            country_name: "Germany".to_string(),
            is_headquarter,
        }
    }

    #[tokio::test]
    async fn test_add_headquarter_normalizes() {
        let service = service();
        let hq = service
            .add_headquarter(details("DEUTDEFFXXX", true), deadline())
            .await
            .unwrap();
        assert_eq!(hq.bank_name, "DEUTSCHE BANK");
        assert_eq!(hq.address, "Taunusanlage 12");
        assert_eq!(hq.country_name, "GERMANY");
    }

    #[tokio::test]
    async fn test_eight_character_headquarter_is_expanded() {
        let service = service();
        let hq = service
            .add_headquarter(details("DEUTDEFF", true), deadline())
            .await
            .unwrap();
        assert_eq!(hq.swift_code.as_str(), "DEUTDEFFXXX");

        let found = service.get_swift_code("DEUTDEFF", deadline()).await.unwrap();
        assert!(found.is_headquarter());
    }

    #[tokio::test]
    async fn test_flag_and_suffix_must_agree() {
        let service = service();
        let hq_flag_off = service
            .add_swift_code(details("DEUTDEFFXXX", false), deadline())
            .await;
        assert!(matches!(hq_flag_off, Err(BankError::ValidationError { .. })));

        let branch_flag_on = service
            .add_swift_code(details("DEUTDEFF500", true), deadline())
            .await;
        assert!(matches!(branch_flag_on, Err(BankError::ValidationError { .. })));

        assert_eq!(service.repository().count(deadline()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_formats_fail_before_store() {
        let service = service();
        let bad_code = service.add_swift_code(details("deut", true), deadline()).await;
        assert!(matches!(bad_code, Err(BankError::InvalidFormat { .. })));

        let mut bad_country = details("DEUTDEFFXXX", true);
        bad_country.country_iso2 = "D3".to_string();
        let result = service.add_swift_code(bad_country, deadline()).await;
        assert!(matches!(result, Err(BankError::InvalidFormat { .. })));

        let result = service.get_banks_by_country("deu", deadline()).await;
        assert!(matches!(result, Err(BankError::InvalidFormat { .. })));
    }

    #[tokio::test]
    async fn test_branch_without_headquarter_is_not_found() {
        let service = service();
        let result = service
            .add_swift_code(details("DEUTDEFF100", false), deadline())
            .await;
        assert!(matches!(result, Err(BankError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_branch_lifecycle() {
        let service = service();
        service
            .add_swift_code(details("DEUTDEFFXXX", true), deadline())
            .await
            .unwrap();
        service
            .add_swift_code(details("DEUTDEFF100", false), deadline())
            .await
            .unwrap();

        let entity = service.get_swift_code("DEUTDEFF100", deadline()).await.unwrap();
        assert!(!entity.is_headquarter());
        assert_eq!(entity.bank_name(), "DEUTSCHE BANK");

        let duplicate = service
            .add_swift_code(details("DEUTDEFF100", false), deadline())
            .await;
        assert!(matches!(duplicate, Err(BankError::AlreadyExists { .. })));

        assert_eq!(
            service.delete_swift_code("DEUTDEFF100", deadline()).await.unwrap(),
            BankKind::Branch
        );
        assert!(matches!(
            service.delete_swift_code("DEUTDEFF100", deadline()).await,
            Err(BankError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_parent_must_match_derivation() {
        let service = service();
        service
            .add_swift_code(details("DEUTDEFFXXX", true), deadline())
            .await
            .unwrap();

        let wrong = service
            .add_branch_under("COBADEFFXXX", details("DEUTDEFF100", false), deadline())
            .await;
        assert!(matches!(wrong, Err(BankError::ValidationError { .. })));

        let right = service
            .add_branch_under("DEUTDEFFXXX", details("DEUTDEFF100", false), deadline())
            .await;
        assert!(right.is_ok());
    }

    #[tokio::test]
    async fn test_kind_specific_lookups_check_suffix() {
        let service = service();
        assert!(matches!(
            service.get_headquarter("DEUTDEFF100", deadline()).await,
            Err(BankError::ValidationError { .. })
        ));
        assert!(matches!(
            service.get_branch("DEUTDEFFXXX", deadline()).await,
            Err(BankError::ValidationError { .. })
        ));
        assert!(matches!(
            service.delete_branch("DEUTDEFFXXX", deadline()).await,
            Err(BankError::ValidationError { .. })
        ));
    }
}
