//! 进程内存储
//!
//! 单个读写锁保护全部表，每次调用持锁期间完成全部约束检查，
//! 因此并发的重复注册只有一个能成功。

use super::{DataStore, HealthStatus, StoreError, StoreResult};
use crate::models::{
    assessment::Assessment,
    common::ListWindow,
    identity::{Credential, Identity},
    subject::Subject,
    training::Training,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    identities: BTreeMap<String, Identity>,
    credentials: HashMap<String, Credential>,
    subjects: BTreeMap<String, Subject>,
    trainings: BTreeMap<String, Training>,
    assessments: BTreeMap<(String, String), Assessment>,
}

impl Tables {
    fn email_taken(&self, email: &str, except_id: Option<&str>) -> bool {
        self.identities
            .values()
            .any(|i| i.email == email && Some(i.id.as_str()) != except_id)
    }

    fn check_training_refs(&self, training: &Training) -> StoreResult<()> {
        if !self.subjects.contains_key(&training.subject_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "subject {} does not exist",
                training.subject_id
            )));
        }
        Ok(())
    }

    fn check_assessment_refs(&self, assessment: &Assessment) -> StoreResult<()> {
        if !self.identities.contains_key(&assessment.user_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "user {} does not exist",
                assessment.user_id
            )));
        }
        if !self.trainings.contains_key(&assessment.training_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "training {} does not exist",
                assessment.training_id
            )));
        }
        Ok(())
    }
}

fn page<'a, T: Clone + 'a>(items: impl Iterator<Item = &'a T>, window: ListWindow) -> Vec<T> {
    items
        .skip(window.offset())
        .take(window.limit())
        .cloned()
        .collect()
}

/// 内存存储，用于开发与测试
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus::Healthy
    }

    async fn find_identity(&self, id: &str) -> StoreResult<Option<Identity>> {
        Ok(self.tables.read().await.identities.get(id).cloned())
    }

    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables.identities.values().find(|i| i.email == email).cloned())
    }

    async fn list_identities(&self, window: ListWindow) -> StoreResult<Vec<Identity>> {
        Ok(page(self.tables.read().await.identities.values(), window))
    }

    async fn create_identity(
        &self,
        identity: Identity,
        credential: Credential,
    ) -> StoreResult<Identity> {
        let mut tables = self.tables.write().await;

        if tables.identities.contains_key(&identity.id) {
            return Err(StoreError::ConstraintViolation(format!(
                "user {} already exists",
                identity.id
            )));
        }
        if tables.email_taken(&identity.email, None) {
            return Err(StoreError::ConstraintViolation(format!(
                "email {} is already registered",
                identity.email
            )));
        }
        if credential.identity_id != identity.id {
            return Err(StoreError::ConstraintViolation(
                "credential does not belong to the new user".to_string(),
            ));
        }

        tables.credentials.insert(identity.id.clone(), credential);
        tables.identities.insert(identity.id.clone(), identity.clone());
        Ok(identity)
    }

    async fn update_identity(&self, identity: Identity) -> StoreResult<Option<Identity>> {
        let mut tables = self.tables.write().await;

        if !tables.identities.contains_key(&identity.id) {
            return Ok(None);
        }
        if tables.email_taken(&identity.email, Some(&identity.id)) {
            return Err(StoreError::ConstraintViolation(format!(
                "email {} is already registered",
                identity.email
            )));
        }

        tables.identities.insert(identity.id.clone(), identity.clone());
        Ok(Some(identity))
    }

    async fn delete_identity(&self, id: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        if tables.identities.remove(id).is_none() {
            return Ok(false);
        }
        tables.credentials.remove(id);
        tables.assessments.retain(|(user_id, _), _| user_id != id);
        Ok(true)
    }

    async fn find_credential(&self, identity_id: &str) -> StoreResult<Option<Credential>> {
        Ok(self.tables.read().await.credentials.get(identity_id).cloned())
    }

    async fn replace_credential(&self, credential: Credential) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        if !tables.identities.contains_key(&credential.identity_id) {
            return Ok(false);
        }
        tables
            .credentials
            .insert(credential.identity_id.clone(), credential);
        Ok(true)
    }

    async fn find_subject(&self, id: &str) -> StoreResult<Option<Subject>> {
        Ok(self.tables.read().await.subjects.get(id).cloned())
    }

    async fn list_subjects(&self, window: ListWindow) -> StoreResult<Vec<Subject>> {
        Ok(page(self.tables.read().await.subjects.values(), window))
    }

    async fn create_subject(&self, subject: Subject) -> StoreResult<Subject> {
        let mut tables = self.tables.write().await;

        if tables.subjects.contains_key(&subject.id) {
            return Err(StoreError::ConstraintViolation(format!(
                "subject {} already exists",
                subject.id
            )));
        }
        tables.subjects.insert(subject.id.clone(), subject.clone());
        Ok(subject)
    }

    async fn update_subject(&self, subject: Subject) -> StoreResult<Option<Subject>> {
        let mut tables = self.tables.write().await;

        match tables.subjects.get_mut(&subject.id) {
            Some(existing) => {
                *existing = subject.clone();
                Ok(Some(subject))
            }
            None => Ok(None),
        }
    }

    async fn delete_subject(&self, id: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        if tables.trainings.values().any(|t| t.subject_id == id) {
            return Err(StoreError::ConstraintViolation(format!(
                "subject {} is referenced by trainings",
                id
            )));
        }
        Ok(tables.subjects.remove(id).is_some())
    }

    async fn find_training(&self, id: &str) -> StoreResult<Option<Training>> {
        Ok(self.tables.read().await.trainings.get(id).cloned())
    }

    async fn list_trainings(
        &self,
        subject_id: Option<&str>,
        window: ListWindow,
    ) -> StoreResult<Vec<Training>> {
        let tables = self.tables.read().await;
        let matching = tables
            .trainings
            .values()
            .filter(|t| subject_id.map_or(true, |s| t.subject_id == s));
        Ok(page(matching, window))
    }

    async fn create_training(&self, training: Training) -> StoreResult<Training> {
        let mut tables = self.tables.write().await;

        if tables.trainings.contains_key(&training.id) {
            return Err(StoreError::ConstraintViolation(format!(
                "training {} already exists",
                training.id
            )));
        }
        tables.check_training_refs(&training)?;

        tables.trainings.insert(training.id.clone(), training.clone());
        Ok(training)
    }

    async fn update_training(&self, training: Training) -> StoreResult<Option<Training>> {
        let mut tables = self.tables.write().await;

        if !tables.trainings.contains_key(&training.id) {
            return Ok(None);
        }
        tables.check_training_refs(&training)?;

        tables.trainings.insert(training.id.clone(), training.clone());
        Ok(Some(training))
    }

    async fn delete_training(&self, id: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        if tables.assessments.keys().any(|(_, training_id)| training_id == id) {
            return Err(StoreError::ConstraintViolation(format!(
                "training {} is referenced by assessments",
                id
            )));
        }
        Ok(tables.trainings.remove(id).is_some())
    }

    async fn find_assessment(
        &self,
        user_id: &str,
        training_id: &str,
    ) -> StoreResult<Option<Assessment>> {
        let key = (user_id.to_string(), training_id.to_string());
        Ok(self.tables.read().await.assessments.get(&key).cloned())
    }

    async fn list_assessments(
        &self,
        user_id: Option<&str>,
        training_id: Option<&str>,
        window: ListWindow,
    ) -> StoreResult<Vec<Assessment>> {
        let tables = self.tables.read().await;
        let matching = tables.assessments.values().filter(|a| {
            user_id.map_or(true, |u| a.user_id == u)
                && training_id.map_or(true, |t| a.training_id == t)
        });
        Ok(page(matching, window))
    }

    async fn create_assessment(&self, assessment: Assessment) -> StoreResult<Assessment> {
        let mut tables = self.tables.write().await;
        let key = (assessment.user_id.clone(), assessment.training_id.clone());

        if tables.assessments.contains_key(&key) {
            return Err(StoreError::ConstraintViolation(format!(
                "assessment for user {} in training {} already exists",
                key.0, key.1
            )));
        }
        tables.check_assessment_refs(&assessment)?;

        tables.assessments.insert(key, assessment.clone());
        Ok(assessment)
    }

    async fn update_assessment(&self, assessment: Assessment) -> StoreResult<Option<Assessment>> {
        let mut tables = self.tables.write().await;
        let key = (assessment.user_id.clone(), assessment.training_id.clone());

        match tables.assessments.get_mut(&key) {
            Some(existing) => {
                *existing = assessment.clone();
                Ok(Some(assessment))
            }
            None => Ok(None),
        }
    }

    async fn delete_assessment(&self, user_id: &str, training_id: &str) -> StoreResult<bool> {
        let key = (user_id.to_string(), training_id.to_string());
        Ok(self.tables.write().await.assessments.remove(&key).is_some())
    }
}
