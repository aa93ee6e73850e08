use std::collections::BTreeMap;

use appsync_provider::{IamProvider, ProviderError, RoleInfo};
use async_trait::async_trait;
use dashmap::DashMap;

use crate::journal::CallJournal;

#[derive(Debug, Clone)]
struct RoleRecord {
    info: RoleInfo,
    assume_role_policy: String,
    policies: BTreeMap<String, String>,
}

/// In-memory identity service holding roles and their inline policies.
#[derive(Debug)]
pub struct InMemoryIam {
    account_id: String,
    roles: DashMap<String, RoleRecord>,
    journal: CallJournal,
}

impl Default for InMemoryIam {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIam {
    pub fn new() -> Self {
        Self::with_account("123456789012")
    }

    pub fn with_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            roles: DashMap::new(),
            journal: CallJournal::new(),
        }
    }

    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    pub fn fail_on(&self, operation: &str, error: ProviderError) {
        self.journal.fail_on(operation, error);
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn policy(&self, role_name: &str, policy_name: &str) -> Option<String> {
        self.roles
            .get(role_name)
            .and_then(|role| role.policies.get(policy_name).cloned())
    }

    pub fn assume_role_policy(&self, role_name: &str) -> Option<String> {
        self.roles
            .get(role_name)
            .map(|role| role.assume_role_policy.clone())
    }
}

#[async_trait]
impl IamProvider for InMemoryIam {
    async fn get_role(&self, role_name: &str) -> Result<Option<RoleInfo>, ProviderError> {
        self.journal.record("get_role", role_name)?;
        Ok(self.roles.get(role_name).map(|role| role.info.clone()))
    }

    async fn create_role(
        &self,
        role_name: &str,
        assume_role_policy: &str,
    ) -> Result<RoleInfo, ProviderError> {
        self.journal.record("create_role", role_name)?;
        if self.roles.contains_key(role_name) {
            return Err(ProviderError::conflict("role", role_name, "already exists"));
        }
        let info = RoleInfo {
            name: role_name.to_string(),
            arn: format!("arn:aws:iam::{}:role/{}", self.account_id, role_name),
        };
        self.roles.insert(
            role_name.to_string(),
            RoleRecord {
                info: info.clone(),
                assume_role_policy: assume_role_policy.to_string(),
                policies: BTreeMap::new(),
            },
        );
        Ok(info)
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), ProviderError> {
        self.journal
            .record("put_role_policy", format!("{role_name}/{policy_name}"))?;
        let mut role = self
            .roles
            .get_mut(role_name)
            .ok_or_else(|| ProviderError::not_found("role", role_name))?;
        role.policies
            .insert(policy_name.to_string(), policy_document.to_string());
        Ok(())
    }

    async fn delete_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<(), ProviderError> {
        self.journal
            .record("delete_role_policy", format!("{role_name}/{policy_name}"))?;
        let mut role = self
            .roles
            .get_mut(role_name)
            .ok_or_else(|| ProviderError::not_found("role", role_name))?;
        role.policies
            .remove(policy_name)
            .map(|_| ())
            .ok_or_else(|| ProviderError::not_found("role policy", policy_name))
    }

    async fn delete_role(&self, role_name: &str) -> Result<(), ProviderError> {
        self.journal.record("delete_role", role_name)?;
        let attached = self
            .roles
            .get(role_name)
            .map(|role| !role.policies.is_empty())
            .ok_or_else(|| ProviderError::not_found("role", role_name))?;
        if attached {
            return Err(ProviderError::conflict(
                "role",
                role_name,
                "inline policies must be deleted first",
            ));
        }
        self.roles.remove(role_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    #[test]
    fn test_faults_and_journal() {
        let iam = InMemoryIam::with_account("999999999999");
        iam.fail_on("create_role", ProviderError::throttled("slow down"));
        block_on(async {
            assert!(iam.create_role("r", "{}").await.is_err());
            let role = iam.create_role("r", "{\"Version\":\"2012-10-17\"}").await.unwrap();
            assert_eq!(role.arn, "arn:aws:iam::999999999999:role/r");
        });
        assert_eq!(iam.journal().count("create_role"), 2);
        assert_eq!(
            iam.assume_role_policy("r").as_deref(),
            Some("{\"Version\":\"2012-10-17\"}")
        );
    }

    #[tokio::test]
    async fn test_role_lifecycle() {
        let iam = InMemoryIam::new();
        assert!(iam.get_role("r").await.unwrap().is_none());

        let role = iam.create_role("r", "{}").await.unwrap();
        assert_eq!(role.arn, "arn:aws:iam::123456789012:role/r");
        assert!(iam.create_role("r", "{}").await.unwrap_err().is_conflict());

        iam.put_role_policy("r", "p", "{\"Version\":\"2012-10-17\"}")
            .await
            .unwrap();
        assert!(iam.policy("r", "p").is_some());
        assert!(iam.delete_role("r").await.unwrap_err().is_conflict());

        iam.delete_role_policy("r", "p").await.unwrap();
        iam.delete_role("r").await.unwrap();
        assert!(iam.role_names().is_empty());
        assert!(iam.delete_role("r").await.unwrap_err().is_not_found());
    }
}
